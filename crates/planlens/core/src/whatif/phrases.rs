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

//! Scenario phrase tables.
//!
//! Rewrites are driven by the wording of a scenario, so these tables are the
//! contract between the question generator and the rewrite engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::hints::{Directive, Operator};

/// Session-level planner switch that disables one operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlannerToggle {
    BitmapScan,
    IndexScan,
    SeqScan,
    NestLoop,
    MergeJoin,
    HashJoin,
}

impl PlannerToggle {
    pub const ALL: [PlannerToggle; 6] = [
        PlannerToggle::BitmapScan,
        PlannerToggle::IndexScan,
        PlannerToggle::SeqScan,
        PlannerToggle::NestLoop,
        PlannerToggle::MergeJoin,
        PlannerToggle::HashJoin,
    ];

    pub fn guc(self) -> &'static str {
        match self {
            Self::BitmapScan => "enable_bitmapscan",
            Self::IndexScan => "enable_indexscan",
            Self::SeqScan => "enable_seqscan",
            Self::NestLoop => "enable_nestloop",
            Self::MergeJoin => "enable_mergejoin",
            Self::HashJoin => "enable_hashjoin",
        }
    }

    pub fn operator(self) -> Operator {
        match self {
            Self::BitmapScan => Operator::BitmapScan,
            Self::IndexScan => Operator::IndexScan,
            Self::SeqScan => Operator::SeqScan,
            Self::NestLoop => Operator::NestLoop,
            Self::MergeJoin => Operator::MergeJoin,
            Self::HashJoin => Operator::HashJoin,
        }
    }

    pub fn set_statement(self) -> String {
        format!("SET {} to off;", self.guc())
    }

    pub fn reset_statement(self) -> String {
        format!("RESET {};", self.guc())
    }

    /// `What happens if I don't use <Operator> at all?`
    pub fn question(self) -> String {
        general_question(self.operator())
    }

    /// Inverse of [`PlannerToggle::question`]; exact match only.
    pub fn from_question(question: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|toggle| toggle.question() == question)
    }
}

impl From<Operator> for PlannerToggle {
    fn from(op: Operator) -> Self {
        match op {
            Operator::BitmapScan => Self::BitmapScan,
            Operator::IndexScan => Self::IndexScan,
            Operator::SeqScan => Self::SeqScan,
            Operator::NestLoop => Self::NestLoop,
            Operator::MergeJoin => Self::MergeJoin,
            Operator::HashJoin => Self::HashJoin,
        }
    }
}

pub fn general_question(op: Operator) -> String {
    format!("What happens if I don't use {} at all?", op.display_name())
}

/// Hint keyword swap a specific scenario asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Substitution {
    pub from: Operator,
    pub to: Directive,
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from.keyword(), self.to.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    pub description: String,
    pub substitution: Substitution,
}

/// Phrase order used when generating questions and when matching them.
const PHRASE_ORDER: [Operator; 6] = [
    Operator::SeqScan,
    Operator::IndexScan,
    Operator::BitmapScan,
    Operator::NestLoop,
    Operator::MergeJoin,
    Operator::HashJoin,
];

static PHRASES: LazyLock<Vec<Phrase>> = LazyLock::new(|| PHRASE_ORDER.into_iter().flat_map(phrases_for).collect());

/// All registered phrases, three per operator, in a fixed order.
pub fn phrases() -> &'static [Phrase] {
    &PHRASES
}

/// Two "replace with a sibling" phrases followed by the "prevent" phrase.
pub fn phrases_for(op: Operator) -> [Phrase; 3] {
    let [first, second] = op.siblings();
    [
        replace_phrase(op, first),
        replace_phrase(op, second),
        Phrase {
            description: format!("prevent the use of {}", op.display_name()),
            substitution: Substitution {
                from: op,
                to: Directive::Prevent(op),
            },
        },
    ]
}

fn replace_phrase(from: Operator, to: Operator) -> Phrase {
    let name = to.display_name();
    let article = if name.starts_with(['A', 'E', 'I', 'O', 'U']) { "an" } else { "a" };
    Phrase {
        description: format!("replace {} with {article} {name}", from.display_name()),
        substitution: Substitution {
            from,
            to: Directive::Use(to),
        },
    }
}

/// First registered phrase contained in `text`.
pub fn match_phrase(text: &str) -> Option<&'static Phrase> {
    phrases().iter().find(|phrase| text.contains(phrase.description.as_str()))
}
