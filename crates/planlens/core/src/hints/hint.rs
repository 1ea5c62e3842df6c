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
use std::str::FromStr;
use thiserror::Error;

use super::operator::{Directive, Operator};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HintParseError {
    #[error("Hint `{0}` is not of the form Kind(args)")]
    Shape(String),
    #[error("Unknown hint keyword `{0}`")]
    UnknownKeyword(String),
}

/// One planner hint, `Kind(t1)` or `Kind(t1 t2)`.
///
/// The table list is kept exactly as extracted, so a degenerate extraction
/// (a self join, an unqualified column) yields a hint with fewer or more
/// tables than the operator's arity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hint {
    pub directive: Directive,
    pub tables: Vec<String>,
}

impl Hint {
    pub fn new(operator: Operator, tables: Vec<String>) -> Self {
        Self {
            directive: Directive::Use(operator),
            tables,
        }
    }

    pub fn operator(&self) -> Operator {
        self.directive.operator()
    }

    /// True when the table list matches what the operator expects.
    pub fn has_expected_arity(&self) -> bool {
        self.tables.len() == self.operator().arity()
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.directive.keyword(), self.tables.join(" "))
    }
}

impl FromStr for Hint {
    type Err = HintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (keyword, rest) = s.split_once('(').ok_or_else(|| HintParseError::Shape(s.to_string()))?;
        let args = rest.strip_suffix(')').ok_or_else(|| HintParseError::Shape(s.to_string()))?;
        let directive = Directive::from_keyword(keyword.trim()).ok_or_else(|| HintParseError::UnknownKeyword(keyword.to_string()))?;
        Ok(Self {
            directive,
            tables: args.split_whitespace().map(str::to_string).collect(),
        })
    }
}
