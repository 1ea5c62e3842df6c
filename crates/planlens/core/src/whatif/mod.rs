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

//! What-if analysis: scenario questions derived from a plan's hints, and
//! the rewrites that turn a selection of them into a counterfactual query.

pub mod phrases;
pub mod questions;
pub mod rewrite;
pub mod scenario;

pub use phrases::{Phrase, PlannerToggle, Substitution};
pub use questions::{WhatIfQuestions, generate as generate_questions};
pub use rewrite::{Rewrite, rewrite, rewrite_hint};
pub use scenario::{NamedRewrite, ScenarioKind, TableTarget, WhatIfScenario};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WhatIfError {
    #[error("No what-if scenario selected")]
    EmptySelection,
    #[error("Cannot combine {found} scenarios with {expected} scenarios in one rewrite")]
    MixedKinds { expected: ScenarioKind, found: ScenarioKind },
    #[error("`{0}` is not an operator a hint can target")]
    UnknownTarget(String),
}
