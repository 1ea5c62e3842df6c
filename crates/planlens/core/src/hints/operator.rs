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
use std::fmt;

/// Physical operators PlanLens can express as a planner hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operator {
    BitmapScan,
    IndexScan,
    SeqScan,
    HashJoin,
    MergeJoin,
    NestLoop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorFamily {
    Scan,
    Join,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Operator::BitmapScan,
        Operator::IndexScan,
        Operator::SeqScan,
        Operator::HashJoin,
        Operator::MergeJoin,
        Operator::NestLoop,
    ];

    /// Maps an engine `Node Type` to the operator it hints. Node types not
    /// listed here (Hash, Sort, Aggregate, ...) produce no hint.
    pub fn from_node_type(node_type: &str) -> Option<Self> {
        match node_type {
            "Bitmap Heap Scan" => Some(Self::BitmapScan),
            "Index Scan" => Some(Self::IndexScan),
            "Seq Scan" => Some(Self::SeqScan),
            "Hash Join" => Some(Self::HashJoin),
            "Merge Join" => Some(Self::MergeJoin),
            "Nested Loop" => Some(Self::NestLoop),
            _ => None,
        }
    }

    pub fn node_type(self) -> &'static str {
        match self {
            Self::BitmapScan => "Bitmap Heap Scan",
            Self::IndexScan => "Index Scan",
            Self::SeqScan => "Seq Scan",
            Self::HashJoin => "Hash Join",
            Self::MergeJoin => "Merge Join",
            Self::NestLoop => "Nested Loop",
        }
    }

    /// Hint keyword, e.g. `SeqScan` in `SeqScan(nation)`.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::BitmapScan => "BitmapScan",
            Self::IndexScan => "IndexScan",
            Self::SeqScan => "SeqScan",
            Self::HashJoin => "HashJoin",
            Self::MergeJoin => "MergeJoin",
            Self::NestLoop => "NestLoop",
        }
    }

    /// Keyword that forbids the operator, e.g. `NoSeqScan`.
    pub fn negated_keyword(self) -> &'static str {
        match self {
            Self::BitmapScan => "NoBitmapScan",
            Self::IndexScan => "NoIndexScan",
            Self::SeqScan => "NoSeqScan",
            Self::HashJoin => "NoHashJoin",
            Self::MergeJoin => "NoMergeJoin",
            Self::NestLoop => "NoNestLoop",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.keyword() == keyword)
    }

    /// Name used in what-if questions.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::BitmapScan => "BitMap Scan",
            Self::IndexScan => "Index Scan",
            Self::SeqScan => "Sequential Scan",
            Self::HashJoin => "Hash Join",
            Self::MergeJoin => "Merge Join",
            Self::NestLoop => "Nested Loop Join",
        }
    }

    pub fn family(self) -> OperatorFamily {
        match self {
            Self::BitmapScan | Self::IndexScan | Self::SeqScan => OperatorFamily::Scan,
            Self::HashJoin | Self::MergeJoin | Self::NestLoop => OperatorFamily::Join,
        }
    }

    /// Number of table names a hint for this operator carries.
    pub fn arity(self) -> usize {
        match self.family() {
            OperatorFamily::Scan => 1,
            OperatorFamily::Join => 2,
        }
    }

    /// The two other operators of the same family, in question order.
    pub fn siblings(self) -> [Operator; 2] {
        match self {
            Self::SeqScan => [Self::IndexScan, Self::BitmapScan],
            Self::IndexScan => [Self::SeqScan, Self::BitmapScan],
            Self::BitmapScan => [Self::SeqScan, Self::IndexScan],
            Self::NestLoop => [Self::MergeJoin, Self::HashJoin],
            Self::MergeJoin => [Self::NestLoop, Self::HashJoin],
            Self::HashJoin => [Self::NestLoop, Self::MergeJoin],
        }
    }

    /// Node types offered as alternatives when a plan node is selected.
    pub fn alternatives_for(node_type: &str) -> &'static [&'static str] {
        match Self::from_node_type(node_type).map(Self::family) {
            Some(OperatorFamily::Scan) => &["Seq Scan", "Index Scan", "Bitmap Heap Scan"],
            Some(OperatorFamily::Join) => &["Hash Join", "Merge Join", "Nested Loop"],
            None => &[],
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// What a hint tells the planner to do with an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Directive {
    Use(Operator),
    Prevent(Operator),
}

impl Directive {
    pub fn operator(self) -> Operator {
        match self {
            Self::Use(op) | Self::Prevent(op) => op,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Use(op) => op.keyword(),
            Self::Prevent(op) => op.negated_keyword(),
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Operator::ALL.into_iter().find_map(|op| {
            if op.keyword() == keyword {
                Some(Self::Use(op))
            } else if op.negated_keyword() == keyword {
                Some(Self::Prevent(op))
            } else {
                None
            }
        })
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
