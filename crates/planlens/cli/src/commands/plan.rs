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

use super::CommandContext;
use anyhow::Result;
use planlens_core::PlanSummary;
use planlens_core::hints::{annotate_query, synthesize_strings};
use planlens_core::whatif::generate_questions;
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
struct HintsOutput<'a> {
    summary: PlanSummary,
    hints: &'a [String],
    query_with_hints: Option<String>,
}

pub fn show_hints(ctx: &CommandContext, plan: Option<&Path>, query: Option<&str>) -> Result<()> {
    let explained = ctx.load_plan(plan, query)?;
    let hints = synthesize_strings(&explained.root);
    let summary = PlanSummary::of(&explained.root);
    let query_with_hints = query.map(|q| annotate_query(q, &hints));
    info!("Synthesized {} hints", hints.len());

    let output = HintsOutput {
        summary,
        hints: &hints,
        query_with_hints,
    };
    ctx.emit(&output, || {
        println!("Plan Summary:");
        println!("  Total Cost: {}", output.summary.total_cost.map_or("N/A".to_string(), |c| c.to_string()));
        println!("  Buffer Size: {}", output.summary.buffer_size());
        println!("  Nodes: {}", output.summary.nodes_count);
        println!();

        if output.hints.is_empty() {
            println!("No hintable operators in plan.");
        } else {
            println!("Hints:");
            for hint in output.hints {
                println!("  {hint}");
            }
        }
        if let Some(query) = &output.query_with_hints {
            println!();
            println!("Query with hints:");
            println!("  {query}");
        }
    })
}

pub fn show_questions(ctx: &CommandContext, plan: Option<&Path>, query: Option<&str>) -> Result<()> {
    let explained = ctx.load_plan(plan, query)?;
    let hints = synthesize_strings(&explained.root);
    let questions = generate_questions(&hints);
    info!("Generated {} specific and {} general questions", questions.specific.len(), questions.general.len());

    ctx.emit(&questions, || {
        println!("Specific:");
        for question in &questions.specific {
            println!("  {question}");
        }
        println!();
        println!("General:");
        for question in &questions.general {
            println!("  {question}");
        }
    })
}

pub fn analyze_query(ctx: &CommandContext, query: &str) -> Result<()> {
    let session = ctx.session()?;
    let aliases = session.aliases(query)?;
    let report = session.analyze(query, &aliases)?;

    ctx.emit(&report, || {
        println!("Query with hints:");
        println!("  {}", report.query_with_hints);
        println!();
        println!("Total Cost: {}", report.summary.total_cost.map_or("N/A".to_string(), |c| c.to_string()));
        println!("Buffer Size: {}", report.summary.buffer_size());
        if let Some(ms) = report.plan.execution_time_ms {
            println!("Execution Time: {ms} ms");
        }
        println!();
        println!("What if I...");
        for question in report.specific_questions.iter().chain(&report.general_questions) {
            println!("  {question}");
        }
        println!();
        match &report.block_analysis {
            Some(blocks) if blocks.have_ctids => {
                for summary in &blocks.blocks_by_relation {
                    println!("{}: {} of {} blocks", summary.relation_name, summary.used_blocks.number, summary.total_blocks);
                }
            }
            _ => println!("Block usage is not available for this query."),
        }
    })
}
