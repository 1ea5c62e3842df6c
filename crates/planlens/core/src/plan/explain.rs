// PlanLens
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use planlens_common::Row;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::node::PlanNode;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Explain returned no rows")]
    EmptyResult,
    #[error("Explain document contains no plan")]
    MissingPlan,
    #[error("Malformed explain output: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Options of the `EXPLAIN` statement issued for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainOptions {
    /// Execute the query to collect actual rows and buffer counters.
    pub analyze: bool,
}

impl Default for ExplainOptions {
    fn default() -> Self {
        Self { analyze: true }
    }
}

impl ExplainOptions {
    pub fn statement(&self, query: &str) -> String {
        let analyze = if self.analyze { "ANALYZE, " } else { "" };
        format!("EXPLAIN ({analyze}COSTS, SETTINGS, VERBOSE, BUFFERS, SUMMARY, FORMAT JSON) {query}")
    }
}

#[derive(Debug, Deserialize)]
struct ExplainDocument {
    #[serde(rename = "Plan")]
    plan: Option<PlanNode>,
    #[serde(rename = "Planning Time", default)]
    planning_time: Option<f64>,
    #[serde(rename = "Execution Time", default)]
    execution_time: Option<f64>,
}

/// A root plan node together with the timings reported next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainedPlan {
    pub root: PlanNode,
    pub planning_time_ms: Option<f64>,
    pub execution_time_ms: Option<f64>,
}

impl ExplainedPlan {
    pub fn from_json(text: &str) -> Result<Self, PlanError> {
        let documents: Vec<ExplainDocument> = serde_json::from_str(text)?;
        let document = documents.into_iter().next().ok_or(PlanError::MissingPlan)?;
        let root = document.plan.ok_or(PlanError::MissingPlan)?;
        Ok(Self {
            root,
            planning_time_ms: document.planning_time,
            execution_time_ms: document.execution_time,
        })
    }

    /// Reads the plan out of the single text cell an explain statement returns.
    pub fn from_rows(rows: &[Row]) -> Result<Self, PlanError> {
        let text = rows.first().and_then(|row| row.get(0)).ok_or(PlanError::EmptyResult)?;
        Self::from_json(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::single_value_row;

    const DOCUMENT: &str = r#"[{"Plan": {"Node Type": "Seq Scan", "Relation Name": "nation", "Total Cost": 1.25},
        "Planning Time": 0.08, "Execution Time": 0.02}]"#;

    #[test]
    fn test_statement() {
        let options = ExplainOptions::default();
        assert_eq!(
            options.statement("SELECT 1"),
            "EXPLAIN (ANALYZE, COSTS, SETTINGS, VERBOSE, BUFFERS, SUMMARY, FORMAT JSON) SELECT 1"
        );
        let estimate_only = ExplainOptions { analyze: false };
        assert_eq!(estimate_only.statement("SELECT 1"), "EXPLAIN (COSTS, SETTINGS, VERBOSE, BUFFERS, SUMMARY, FORMAT JSON) SELECT 1");
    }

    #[test]
    fn test_from_rows() {
        let plan = ExplainedPlan::from_rows(&[single_value_row(DOCUMENT)]).unwrap();
        assert_eq!(plan.root.node_type, "Seq Scan");
        assert_eq!(plan.root.relation_name.as_deref(), Some("nation"));
        assert_eq!(plan.planning_time_ms, Some(0.08));
        assert_eq!(plan.execution_time_ms, Some(0.02));
    }

    #[test]
    fn test_empty_and_malformed_output() {
        assert!(matches!(ExplainedPlan::from_rows(&[]), Err(PlanError::EmptyResult)));
        assert!(matches!(ExplainedPlan::from_json("[]"), Err(PlanError::MissingPlan)));
        assert!(matches!(ExplainedPlan::from_json("not json"), Err(PlanError::Malformed(_))));
        assert!(matches!(ExplainedPlan::from_json(r#"[{"Plan": {"Total Cost": 1.0}}]"#), Err(PlanError::Malformed(_))));
    }
}
