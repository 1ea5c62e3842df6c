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

//! What-If Question Generator

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::phrases::{general_question, phrases_for};
use crate::hints::{Directive, Hint, Operator};

/// Scenario texts derived from one hint list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatIfQuestions {
    /// Three table-specific questions per distinct hint.
    pub specific: Vec<String>,
    /// One session-wide question per distinct operator.
    pub general: Vec<String>,
}

/// `for table <t>` or `for tables <a> and <b>`.
pub fn table_suffix(tables: &[String]) -> Option<String> {
    match tables {
        [table] => Some(format!("for table {table}")),
        [first, second] => Some(format!("for tables {first} and {second}")),
        _ => None,
    }
}

pub fn specific_questions(hint: &Hint) -> Vec<String> {
    let Some(suffix) = table_suffix(&hint.tables) else {
        return Vec::new();
    };
    phrases_for(hint.operator())
        .iter()
        .map(|phrase| format!("What happens if I {} {suffix}?", phrase.description))
        .collect()
}

/// Builds the specific and general questions for `hints`, following the
/// order of the list. Hints that do not parse, hints that already forbid an
/// operator and hints whose table list cannot be phrased are skipped for the
/// specific block.
pub fn generate<S: AsRef<str>>(hints: &[S]) -> WhatIfQuestions {
    let mut questions = WhatIfQuestions::default();
    let mut seen_hints = HashSet::new();
    let mut seen_operators: HashSet<Operator> = HashSet::new();

    for raw in hints {
        let raw = raw.as_ref();
        let hint: Hint = match raw.parse() {
            Ok(hint) => hint,
            Err(e) => {
                debug!("Skipping hint {}: {}", raw, e);
                continue;
            }
        };
        let Directive::Use(op) = hint.directive else {
            continue;
        };

        if seen_hints.insert(hint.clone()) {
            let block = specific_questions(&hint);
            if block.is_empty() {
                debug!("No specific questions for {}: {} tables extracted", hint, hint.tables.len());
            }
            questions.specific.extend(block);
        }
        if seen_operators.insert(op) {
            questions.general.push(general_question(op));
        }
    }

    questions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_nation_questions() {
        let questions = generate(&["IndexScan(nation)", "SeqScan(customer)", "NestLoop(customer nation)"]);

        let prevent = "What happens if I prevent the use of Index Scan for table nation?";
        assert_eq!(questions.specific.iter().filter(|q| *q == prevent).count(), 1);

        let general = "What happens if I don't use Nested Loop Join at all?";
        assert_eq!(questions.general.iter().filter(|q| *q == general).count(), 1);

        assert_eq!(questions.specific.len(), 9);
        assert_eq!(questions.general, vec![
            "What happens if I don't use Index Scan at all?",
            "What happens if I don't use Sequential Scan at all?",
            "What happens if I don't use Nested Loop Join at all?",
        ]);
    }

    #[test]
    fn test_specific_block_shape() {
        let questions = generate(&["HashJoin(customer nation)"]);
        assert_eq!(questions.specific, vec![
            "What happens if I replace Hash Join with a Nested Loop Join for tables customer and nation?",
            "What happens if I replace Hash Join with a Merge Join for tables customer and nation?",
            "What happens if I prevent the use of Hash Join for tables customer and nation?",
        ]);
    }

    #[test]
    fn test_general_once_per_kind() {
        let questions = generate(&["SeqScan(nation)", "SeqScan(customer)", "SeqScan(nation)"]);
        assert_eq!(questions.general, vec!["What happens if I don't use Sequential Scan at all?"]);
        // the repeated SeqScan(nation) adds no second block
        assert_eq!(questions.specific.len(), 6);
        assert!(questions.specific[3].ends_with("for table customer?"));
    }

    #[test]
    fn test_unphrasable_hints_only_feed_general() {
        let questions = generate(&["NestLoop(customer customer nation)", "NoSeqScan(nation)", "garbage"]);
        assert!(questions.specific.is_empty());
        assert_eq!(questions.general, vec!["What happens if I don't use Nested Loop Join at all?"]);
    }
}
