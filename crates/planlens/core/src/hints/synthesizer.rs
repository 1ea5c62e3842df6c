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

//! Hint synthesis over an explain plan.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::hint::Hint;
use super::operator::Operator;
use crate::plan::PlanNode;

/// An identifier immediately followed by a dot: the table qualifier of a
/// column reference such as `customer.c_nationkey`.
static QUALIFIER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\w+)\.").expect("qualifier pattern is valid"));

/// Produces one hint per node whose type is a hintable operator.
///
/// Nodes are visited breadth-first from the root and the resulting list is
/// reversed, so the last visited nodes come first. Hint blocks rebuilt from
/// this list depend on that order.
pub fn synthesize(root: &PlanNode) -> Vec<Hint> {
    let mut hints: Vec<Hint> = root.iter_bfs().filter_map(hint_for).collect();
    hints.reverse();
    debug!("Synthesized {} hints from {} plan nodes", hints.len(), root.node_count());
    metrics::counter!("planlens_hints_total", hints.len() as u64);
    hints
}

/// [`synthesize`], rendered as hint strings.
pub fn synthesize_strings(root: &PlanNode) -> Vec<String> {
    synthesize(root).iter().map(ToString::to_string).collect()
}

/// The hint for a single node, or `None` when its type is not hintable.
pub fn hint_for(node: &PlanNode) -> Option<Hint> {
    let operator = Operator::from_node_type(&node.node_type)?;
    let tables = match operator {
        Operator::BitmapScan | Operator::IndexScan | Operator::SeqScan => node.relation_name.iter().cloned().collect(),
        Operator::HashJoin => qualifiers(node.hash_cond.as_deref().unwrap_or_default()),
        Operator::MergeJoin => qualifiers(node.merge_cond.as_deref().unwrap_or_default()),
        Operator::NestLoop => node
            .output
            .iter()
            .flatten()
            .filter_map(|column| first_qualifier(column))
            .collect(),
    };
    let hint = Hint::new(operator, tables);
    if !hint.has_expected_arity() {
        debug!("Hint {} for {} does not carry {} tables", hint, node.node_type, operator.arity());
    }
    Some(hint)
}

/// Every table qualifier in `expr`, in order of appearance, repeats kept.
fn qualifiers(expr: &str) -> Vec<String> {
    QUALIFIER.captures_iter(expr).map(|c| c[1].to_string()).collect()
}

fn first_qualifier(expr: &str) -> Option<String> {
    QUALIFIER.captures(expr).map(|c| c[1].to_string())
}
