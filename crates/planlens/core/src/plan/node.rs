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

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::fmt;

/// One operator of an explain plan, as reported by `EXPLAIN (FORMAT JSON)`.
///
/// Only the fields PlanLens reasons about are typed; everything else the
/// engine reports is kept in `extra` so a plan survives a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanNode {
    #[serde(rename = "Node Type")]
    pub node_type: String,
    #[serde(rename = "Relation Name", default, skip_serializing_if = "Option::is_none")]
    pub relation_name: Option<String>,
    #[serde(rename = "Alias", default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(rename = "Index Name", default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    #[serde(rename = "Hash Cond", default, skip_serializing_if = "Option::is_none")]
    pub hash_cond: Option<String>,
    #[serde(rename = "Merge Cond", default, skip_serializing_if = "Option::is_none")]
    pub merge_cond: Option<String>,
    #[serde(rename = "Output", default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<String>>,
    #[serde(rename = "Total Cost", default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    #[serde(rename = "Actual Rows", default, skip_serializing_if = "Option::is_none")]
    pub actual_rows: Option<f64>,
    #[serde(rename = "Shared Hit Blocks", default)]
    pub shared_hit_blocks: u64,
    #[serde(rename = "Shared Read Blocks", default)]
    pub shared_read_blocks: u64,
    #[serde(rename = "Shared Dirtied Blocks", default)]
    pub shared_dirtied_blocks: u64,
    #[serde(rename = "Shared Written Blocks", default)]
    pub shared_written_blocks: u64,
    #[serde(rename = "Plans", default, skip_serializing_if = "Vec::is_empty")]
    pub plans: Vec<PlanNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlanNode {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            relation_name: None,
            alias: None,
            index_name: None,
            hash_cond: None,
            merge_cond: None,
            output: None,
            total_cost: None,
            actual_rows: None,
            shared_hit_blocks: 0,
            shared_read_blocks: 0,
            shared_dirtied_blocks: 0,
            shared_written_blocks: 0,
            plans: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation_name = Some(relation.into());
        self
    }

    pub fn with_hash_cond(mut self, cond: impl Into<String>) -> Self {
        self.hash_cond = Some(cond.into());
        self
    }

    pub fn with_merge_cond(mut self, cond: impl Into<String>) -> Self {
        self.merge_cond = Some(cond.into());
        self
    }

    pub fn with_output<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_child(mut self, child: PlanNode) -> Self {
        self.plans.push(child);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.plans.is_empty()
    }

    /// Pages touched by this node: hit + read + dirtied + written.
    pub fn buffer(&self) -> u64 {
        self.shared_hit_blocks + self.shared_read_blocks + self.shared_dirtied_blocks + self.shared_written_blocks
    }

    pub fn label(&self) -> NodeLabel {
        NodeLabel {
            node_type: self.node_type.clone(),
            cost: self.total_cost,
            buffer: self.buffer(),
            rows: self.actual_rows,
        }
    }

    /// Visits this node and its descendants level by level, children in
    /// the order the engine listed them.
    pub fn iter_bfs(&self) -> BreadthFirst<'_> {
        BreadthFirst {
            queue: VecDeque::from([self]),
        }
    }

    pub fn node_count(&self) -> usize {
        self.iter_bfs().count()
    }

    /// Looks up an engine field PlanLens does not model, such as `Join Type`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

pub struct BreadthFirst<'a> {
    queue: VecDeque<&'a PlanNode>,
}

impl<'a> Iterator for BreadthFirst<'a> {
    type Item = &'a PlanNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        self.queue.extend(node.plans.iter());
        Some(node)
    }
}

/// Display label of a node: `{type, cost, buffer, rows}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLabel {
    pub node_type: String,
    pub cost: Option<f64>,
    pub buffer: u64,
    pub rows: Option<f64>,
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.node_type)?;
        match self.cost {
            Some(cost) => writeln!(f, "Cost: {cost}")?,
            None => writeln!(f, "Cost: N/A")?,
        }
        writeln!(f, "Buffer: {}", self.buffer)?;
        match self.rows {
            Some(rows) => write!(f, "Rows: {rows}"),
            None => write!(f, "Rows: N/A"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> PlanNode {
        PlanNode::from_value(json!({
            "Node Type": "Hash Join",
            "Join Type": "Inner",
            "Total Cost": 22.15,
            "Actual Rows": 3,
            "Shared Hit Blocks": 4,
            "Shared Read Blocks": 2,
            "Hash Cond": "(customer.c_nationkey = nation.n_nationkey)",
            "Plans": [
                {"Node Type": "Seq Scan", "Relation Name": "customer", "Shared Hit Blocks": 3},
                {"Node Type": "Hash", "Plans": [
                    {"Node Type": "Seq Scan", "Relation Name": "nation", "Shared Read Blocks": 1}
                ]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_known_and_extra_fields() {
        let node = sample();
        assert_eq!(node.node_type, "Hash Join");
        assert_eq!(node.hash_cond.as_deref(), Some("(customer.c_nationkey = nation.n_nationkey)"));
        assert_eq!(node.plans.len(), 2);
        assert_eq!(node.field("Join Type"), Some(&json!("Inner")));
        assert!(node.merge_cond.is_none());
        assert!(node.output.is_none());
    }

    #[test]
    fn test_missing_node_type_is_rejected() {
        let err = PlanNode::from_value(json!({"Relation Name": "nation"})).unwrap_err();
        assert!(err.to_string().contains("Node Type"));
    }

    #[test]
    fn test_buffer_defaults_missing_counters_to_zero() {
        let node = sample();
        assert_eq!(node.buffer(), 6);
        assert_eq!(node.plans[0].buffer(), 3);
        assert_eq!(node.plans[1].buffer(), 0);
    }

    #[test]
    fn test_label_renders_absent_values() {
        let node = sample();
        assert_eq!(node.label().to_string(), "Hash Join\nCost: 22.15\nBuffer: 6\nRows: 3");

        let leaf = &node.plans[0];
        let label = leaf.label();
        assert_eq!(label.cost, None);
        assert_eq!(label.to_string(), "Seq Scan\nCost: N/A\nBuffer: 3\nRows: N/A");
    }

    #[test]
    fn test_breadth_first_order() {
        let node = sample();
        let order: Vec<&str> = node.iter_bfs().map(|n| n.node_type.as_str()).collect();
        assert_eq!(order, vec!["Hash Join", "Seq Scan", "Hash", "Seq Scan"]);
        assert_eq!(node.node_count(), 4);
        assert!(node.plans[0].is_leaf());
    }

    #[test]
    fn test_round_trip_keeps_extra_fields() {
        let node = sample();
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["Join Type"], json!("Inner"));
        assert_eq!(PlanNode::from_value(value).unwrap(), node);
    }
}
