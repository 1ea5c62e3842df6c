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

//! Explain pipeline over one executor session.

use planlens_common::ExecutionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::blocks::{BlockAnalysis, BlockContents, TableAliasMap, analyze_blocks, inspect_block, list_tables, resolve_aliases};
use crate::executor::QueryExecutor;
use crate::hints::{annotate_query, synthesize_strings};
use crate::plan::{ExplainOptions, ExplainedPlan, PlanError, PlanSummary};
use crate::whatif::{Rewrite, WhatIfError, WhatIfScenario, generate_questions, rewrite};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    WhatIf(#[from] WhatIfError),
}

impl PipelineError {
    /// The engine error behind this failure, if the engine reported one.
    pub fn execution(&self) -> Option<&ExecutionError> {
        match self {
            Self::Execution(e) => Some(e),
            _ => None,
        }
    }
}

/// Everything derived from explaining one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryReport {
    pub plan: ExplainedPlan,
    pub summary: PlanSummary,
    pub hints: Vec<String>,
    pub query_with_hints: String,
    pub specific_questions: Vec<String>,
    pub general_questions: Vec<String>,
    pub block_analysis: Option<BlockAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatIfReport {
    pub rewrite: Rewrite,
    pub plan: ExplainedPlan,
    pub summary: PlanSummary,
    pub hints: Vec<String>,
}

/// Splits leading `SET ...;` statements off a query. Returns the statements
/// (each with its `;`) and the remaining body.
pub fn split_prelude(query: &str) -> (Vec<&str>, &str) {
    let mut statements = Vec::new();
    let mut rest = query.trim_start();
    while rest.get(..4).is_some_and(|head| head.eq_ignore_ascii_case("SET ")) {
        let Some(end) = rest.find(';') else {
            break;
        };
        statements.push(&rest[..=end]);
        rest = rest[end + 1..].trim_start();
    }
    (statements, rest)
}

/// `RESET <name>;` for every `SET <name> ...;` statement.
pub fn reset_statements(prelude: &[&str]) -> Option<String> {
    let resets: Vec<String> = prelude
        .iter()
        .filter_map(|statement| statement.split_whitespace().nth(1))
        .map(|name| format!("RESET {};", name.trim_end_matches(';')))
        .collect();
    (!resets.is_empty()).then(|| resets.join(" "))
}

/// Statements issued through a session run in order on the same executor,
/// so settings from a `SET` prelude apply to the explain that follows.
pub struct Session<E> {
    executor: E,
    options: ExplainOptions,
}

impl<E: QueryExecutor> Session<E> {
    pub fn new(executor: E) -> Self {
        Self::with_options(executor, ExplainOptions::default())
    }

    pub fn with_options(executor: E, options: ExplainOptions) -> Self {
        Self { executor, options }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn options(&self) -> ExplainOptions {
        self.options
    }

    /// Explains `query`. A `SET` prelude is applied before the explain and
    /// undone afterwards.
    pub fn explain(&self, query: &str) -> Result<ExplainedPlan, PipelineError> {
        let (prelude, _) = split_prelude(query);
        let reset = reset_statements(&prelude);
        self.explain_with_reset(query, reset.as_deref())
    }

    /// Explains `query`, running `reset` afterwards whether or not the
    /// explain succeeded.
    pub fn explain_with_reset(&self, query: &str, reset: Option<&str>) -> Result<ExplainedPlan, PipelineError> {
        let (prelude, body) = split_prelude(query);
        let outcome = self.run_explain(&prelude, body);

        if let Some(reset) = reset {
            debug!("Restoring session: {}", reset);
            if let Err(e) = self.executor.execute(reset) {
                warn!("Failed to restore planner settings: {}", e);
                if outcome.is_ok() {
                    return Err(e.into());
                }
            }
        }
        outcome
    }

    fn run_explain(&self, prelude: &[&str], body: &str) -> Result<ExplainedPlan, PipelineError> {
        for statement in prelude {
            debug!("Applying session setting: {}", statement);
            self.executor.execute(statement)?;
        }
        let rows = self.executor.execute(&self.options.statement(body))?;
        let plan = ExplainedPlan::from_rows(&rows)?;
        metrics::counter!("planlens_explain_total", 1);
        info!("Explained query with {} plan nodes", plan.root.node_count());
        Ok(plan)
    }

    pub fn tables(&self) -> Result<Vec<String>, ExecutionError> {
        list_tables(&self.executor)
    }

    /// Table tokens of `query`, resolved against the database's tables.
    pub fn aliases(&self, query: &str) -> Result<TableAliasMap, ExecutionError> {
        let tables = self.tables()?;
        Ok(resolve_aliases(query, &tables))
    }

    /// Explains `query` and derives hints, questions and block usage. A failed
    /// block analysis leaves `block_analysis` empty.
    pub fn analyze(&self, query: &str, aliases: &TableAliasMap) -> Result<QueryReport, PipelineError> {
        let plan = self.explain(query)?;
        let summary = PlanSummary::of(&plan.root);
        let hints = synthesize_strings(&plan.root);
        let query_with_hints = annotate_query(query, &hints);
        let questions = generate_questions(&hints);

        let block_analysis = match analyze_blocks(&self.executor, query, aliases) {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                warn!("Block analysis unavailable: {}", e);
                None
            }
        };

        Ok(QueryReport {
            plan,
            summary,
            hints,
            query_with_hints,
            specific_questions: questions.specific,
            general_questions: questions.general,
            block_analysis,
        })
    }

    /// Rewrites `query` for the selected scenarios and explains the result.
    pub fn what_if(&self, query: &str, scenarios: &[WhatIfScenario]) -> Result<WhatIfReport, PipelineError> {
        let rewrite = rewrite(query, scenarios)?;
        let plan = self.explain_with_reset(&rewrite.query, rewrite.reset.as_deref())?;
        let summary = PlanSummary::of(&plan.root);
        let hints = synthesize_strings(&plan.root);
        Ok(WhatIfReport { rewrite, plan, summary, hints })
    }

    pub fn inspect_block(&self, relation: &str, block: u64) -> Result<BlockContents, ExecutionError> {
        inspect_block(&self.executor, relation, block)
    }
}
