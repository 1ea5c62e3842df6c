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

pub mod blocks;
pub mod config;
pub mod plan;
pub mod whatif;

use crate::config::PlanLensConfig;
use anyhow::{Context, Result, anyhow};
use planlens_core::whatif::WhatIfScenario;
use planlens_core::{ExplainedPlan, PgExecutor, Session};
use serde::Serialize;
use std::path::Path;
use tracing::info;

pub struct CommandContext {
    pub config: PlanLensConfig,
    pub json: bool,
}

impl CommandContext {
    pub fn new(config: PlanLensConfig, json: bool) -> Self {
        Self { config, json }
    }

    /// Opens a database session. Offline commands never call this.
    pub fn session(&self) -> Result<Session<PgExecutor>> {
        let executor = PgExecutor::connect(&self.config.connection)?;
        Ok(Session::with_options(executor, self.config.explain))
    }

    /// Plan from a saved `EXPLAIN (FORMAT JSON)` file, or explained live.
    pub fn load_plan(&self, plan: Option<&Path>, query: Option<&str>) -> Result<ExplainedPlan> {
        match (plan, query) {
            (Some(path), _) => {
                let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read plan file {}", path.display()))?;
                info!("Loaded plan from {}", path.display());
                Ok(ExplainedPlan::from_json(&text)?)
            }
            (None, Some(query)) => Ok(self.session()?.explain(query)?),
            (None, None) => Err(anyhow!("Either --plan or --query is required")),
        }
    }

    /// Prints `value` as JSON when `--json` is set, otherwise runs `text`.
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text();
        }
        Ok(())
    }
}

/// `--scenario` texts and `--instance '<hint>=<Node Type>'` selections as
/// scenarios for one rewrite.
pub fn parse_scenarios(scenarios: &[String], instances: &[String]) -> Result<Vec<WhatIfScenario>> {
    let mut selected: Vec<WhatIfScenario> = scenarios.iter().cloned().map(WhatIfScenario::from_question).collect();
    for instance in instances {
        let (hint, target) = instance
            .split_once('=')
            .ok_or_else(|| anyhow!("Instance `{instance}` must look like '<hint>=<Node Type>'"))?;
        selected.push(WhatIfScenario::for_instance(hint.trim(), target.trim())?);
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use planlens_core::whatif::ScenarioKind;
    use std::io::Write;

    #[test]
    fn test_parse_scenarios() {
        let scenarios = parse_scenarios(&[], &["HashJoin(customer nation) = Merge Join".to_string()]).unwrap();
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].kind(), ScenarioKind::SpecificByInstance);

        let scenarios = parse_scenarios(&["What happens if I don't use Hash Join at all?".to_string()], &[]).unwrap();
        assert_eq!(scenarios[0].kind(), ScenarioKind::General);

        assert!(parse_scenarios(&[], &["HashJoin(customer nation)".to_string()]).is_err());
        assert!(parse_scenarios(&[], &["HashJoin(customer nation)=Hash".to_string()]).is_err());
    }

    #[test]
    fn test_load_plan_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"Plan": {{"Node Type": "Seq Scan", "Relation Name": "region"}}}}]"#).unwrap();

        let ctx = CommandContext::new(PlanLensConfig::default(), false);
        let plan = ctx.load_plan(Some(file.path()), None).unwrap();
        assert_eq!(plan.root.relation_name.as_deref(), Some("region"));
        assert!(ctx.load_plan(None, None).is_err());
    }
}
