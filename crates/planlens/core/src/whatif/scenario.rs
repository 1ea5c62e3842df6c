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

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use super::WhatIfError;
use super::phrases::{PlannerToggle, Substitution, match_phrase};
use crate::hints::Operator;

static TABLE_PAIR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"for tables (\w+) and (\w+)").expect("table pair pattern is valid"));
static SINGLE_TABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:for|on) table (\w+)").expect("single table pattern is valid"));

/// Tables named by a specific scenario, in the order the text names them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableTarget {
    Single(String),
    Pair(String, String),
}

impl TableTarget {
    pub fn parse(text: &str) -> Option<Self> {
        if let Some(caps) = TABLE_PAIR.captures(text) {
            return Some(Self::Pair(caps[1].to_string(), caps[2].to_string()));
        }
        SINGLE_TABLE.captures(text).map(|caps| Self::Single(caps[1].to_string()))
    }

    /// Argument list as it appears inside a hint: `a` or `a b`.
    pub fn hint_args(&self) -> String {
        match self {
            Self::Single(table) => table.clone(),
            Self::Pair(first, second) => format!("{first} {second}"),
        }
    }
}

/// A substitution bound to the tables it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRewrite {
    pub substitution: Substitution,
    pub tables: TableTarget,
}

impl NamedRewrite {
    pub fn parse(text: &str) -> Option<Self> {
        let phrase = match_phrase(text)?;
        let tables = TableTarget::parse(text)?;
        Some(Self {
            substitution: phrase.substitution,
            tables,
        })
    }

    pub fn old_token(&self) -> String {
        format!("{}({})", self.substitution.from.keyword(), self.tables.hint_args())
    }

    pub fn new_token(&self) -> String {
        format!("{}({})", self.substitution.to.keyword(), self.tables.hint_args())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioKind {
    General,
    SpecificByName,
    SpecificByInstance,
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::General => "general",
            Self::SpecificByName => "specific (by name)",
            Self::SpecificByInstance => "specific (by instance)",
        };
        f.write_str(name)
    }
}

/// One selected what-if scenario. Scenarios are built fresh from the
/// questions of a plan and consumed by a single rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhatIfScenario {
    /// Disable an operator for the whole session.
    General { question: String, toggle: PlannerToggle },
    /// Swap a hint named by table(s) in the question text. `rewrite` is
    /// `None` when the text matches no registered phrase.
    SpecificByName { question: String, rewrite: Option<NamedRewrite> },
    /// Swap the operator of a hint captured from a selected plan node.
    SpecificByInstance { hint: String, target: Operator },
}

impl WhatIfScenario {
    /// Classifies a question produced by the generator. General questions
    /// must match exactly; anything else is treated as a specific question.
    pub fn from_question(question: impl Into<String>) -> Self {
        let question = question.into();
        match PlannerToggle::from_question(&question) {
            Some(toggle) => Self::General { question, toggle },
            None => {
                let rewrite = NamedRewrite::parse(&question);
                Self::SpecificByName { question, rewrite }
            }
        }
    }

    /// Scenario for a selected plan node: its hint and the node type the
    /// caller wants instead (`Merge Join`, `Index Scan`, ...).
    pub fn for_instance(hint: impl Into<String>, target_node_type: &str) -> Result<Self, WhatIfError> {
        let target = Operator::from_node_type(target_node_type).ok_or_else(|| WhatIfError::UnknownTarget(target_node_type.to_string()))?;
        Ok(Self::SpecificByInstance { hint: hint.into(), target })
    }

    pub fn kind(&self) -> ScenarioKind {
        match self {
            Self::General { .. } => ScenarioKind::General,
            Self::SpecificByName { .. } => ScenarioKind::SpecificByName,
            Self::SpecificByInstance { .. } => ScenarioKind::SpecificByInstance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hints::Directive;

    #[test]
    fn test_table_target() {
        assert_eq!(
            TableTarget::parse("prevent the use of Hash Join for tables customer and nation"),
            Some(TableTarget::Pair("customer".into(), "nation".into()))
        );
        assert_eq!(TableTarget::parse("replace Index Scan with a BitMap Scan on table orders"), Some(TableTarget::Single("orders".into())));
        assert_eq!(TableTarget::parse("prevent the use of Sequential Scan for table customer"), Some(TableTarget::Single("customer".into())));
        assert_eq!(TableTarget::parse("What happens if I don't use Hash Join at all?"), None);
    }

    #[test]
    fn test_named_rewrite_tokens() {
        let rewrite = NamedRewrite::parse("What happens if I prevent the use of Sequential Scan for table customer?").unwrap();
        assert_eq!(rewrite.old_token(), "SeqScan(customer)");
        assert_eq!(rewrite.new_token(), "NoSeqScan(customer)");

        let rewrite = NamedRewrite::parse("What happens if I replace Nested Loop Join with a Hash Join for tables nation and customer?").unwrap();
        assert_eq!(rewrite.old_token(), "NestLoop(nation customer)");
        assert_eq!(rewrite.new_token(), "HashJoin(nation customer)");
    }

    #[test]
    fn test_classification() {
        let general = WhatIfScenario::from_question("What happens if I don't use Merge Join at all?");
        assert_eq!(general.kind(), ScenarioKind::General);

        let named = WhatIfScenario::from_question("What happens if I replace Index Scan with a Sequential Scan for table nation?");
        match named {
            WhatIfScenario::SpecificByName { rewrite: Some(rewrite), .. } => {
                assert_eq!(rewrite.substitution.to, Directive::Use(Operator::SeqScan));
            }
            other => panic!("unexpected scenario {other:?}"),
        }

        let unknown = WhatIfScenario::from_question("What happens if I add more memory?");
        assert!(matches!(unknown, WhatIfScenario::SpecificByName { rewrite: None, .. }));
    }

    #[test]
    fn test_for_instance() {
        let scenario = WhatIfScenario::for_instance("HashJoin(customer nation)", "Merge Join").unwrap();
        assert_eq!(scenario.kind(), ScenarioKind::SpecificByInstance);
        assert!(matches!(
            WhatIfScenario::for_instance("HashJoin(customer nation)", "Hash"),
            Err(WhatIfError::UnknownTarget(_))
        ));
    }
}
