//! PlanLens core
//!
//! Reads the plan a PostgreSQL engine reports for a query, turns the operators
//! it chose into `pg_hint_plan` hints, proposes what-if scenarios over those
//! hints and rewrites the query to explore them. A block analysis maps result
//! rows back to the heap pages they were read from.

pub mod blocks;
pub mod executor;
pub mod hints;
pub mod pg;
pub mod plan;
pub mod session;
pub mod whatif;

pub use executor::QueryExecutor;
pub use pg::PgExecutor;
pub use plan::{ExplainOptions, ExplainedPlan, PlanNode, PlanSummary};
pub use session::{PipelineError, QueryReport, Session, WhatIfReport};
