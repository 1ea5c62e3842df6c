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

//! Hint Synthesizer
//!
//! Derives planner hints (`SeqScan(nation)`, `HashJoin(customer nation)`)
//! from the operators an explain plan chose, and reads or writes them in a
//! query's `/*+ ... */` block.

pub mod block;
pub mod hint;
pub mod operator;
pub mod synthesizer;

pub use block::{HintBlock, annotate_query, hints_in, render_block};
pub use hint::{Hint, HintParseError};
pub use operator::{Directive, Operator, OperatorFamily};
pub use synthesizer::{hint_for, synthesize, synthesize_strings};
