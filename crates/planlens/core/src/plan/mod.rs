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

//! Plan Tree Model
//!
//! Typed view of the plan an engine reports for `EXPLAIN (FORMAT JSON)`,
//! with the derived metrics used for display and summaries.

pub mod explain;
pub mod node;

pub use explain::{ExplainOptions, ExplainedPlan, PlanError};
pub use node::{BreadthFirst, NodeLabel, PlanNode};

use serde::{Deserialize, Serialize};

/// Headline numbers of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_cost: Option<f64>,
    pub hit_blocks: u64,
    pub read_blocks: u64,
    pub nodes_count: usize,
}

impl PlanSummary {
    pub fn of(root: &PlanNode) -> Self {
        Self {
            total_cost: root.total_cost,
            hit_blocks: root.shared_hit_blocks,
            read_blocks: root.shared_read_blocks,
            nodes_count: root.node_count(),
        }
    }

    /// Pages the root reports as hit or read.
    pub fn buffer_size(&self) -> u64 {
        self.hit_blocks + self.read_blocks
    }
}
