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

//! The execution collaborator seam.

use planlens_common::{ExecutionError, Row};

/// Executes one SQL statement and returns its rows as text.
///
/// Implementations own the session. Statements issued through the same
/// executor run sequentially on that session, so planner settings changed by
/// a `SET` are observed by the statements that follow it.
#[cfg_attr(test, mockall::automock)]
pub trait QueryExecutor {
    fn execute(&self, sql: &str) -> Result<Vec<Row>, ExecutionError>;
}

impl<T: QueryExecutor + ?Sized> QueryExecutor for &T {
    fn execute(&self, sql: &str) -> Result<Vec<Row>, ExecutionError> {
        (**self).execute(sql)
    }
}

impl<T: QueryExecutor + ?Sized> QueryExecutor for Box<T> {
    fn execute(&self, sql: &str) -> Result<Vec<Row>, ExecutionError> {
        (**self).execute(sql)
    }
}

/// Builds a single-column text row, mostly for plan and `MAX(ctid)` results.
pub fn single_value_row(value: impl Into<String>) -> Row {
    Row::new(vec![Some(value.into())])
}
