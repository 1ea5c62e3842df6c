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

use super::{CommandContext, parse_scenarios};
use anyhow::Result;
use planlens_core::whatif::rewrite;
use tracing::info;

pub fn rewrite_query(ctx: &CommandContext, query: &str, scenarios: &[String], instances: &[String]) -> Result<()> {
    let selected = parse_scenarios(scenarios, instances)?;
    let rewritten = rewrite(query, &selected)?;
    info!("Rewrote query for {} scenarios", selected.len());

    ctx.emit(&rewritten, || {
        println!("{}", rewritten.query);
        if let Some(reset) = &rewritten.reset {
            println!();
            println!("Reset with:");
            println!("  {reset}");
        }
    })
}

pub fn run_what_if(ctx: &CommandContext, query: &str, scenarios: &[String], instances: &[String]) -> Result<()> {
    let selected = parse_scenarios(scenarios, instances)?;
    let session = ctx.session()?;
    let original = session.explain(query)?;
    let report = session.what_if(query, &selected)?;

    ctx.emit(&report, || {
        println!("Rewritten query:");
        println!("  {}", report.rewrite.query);
        println!();
        println!("{:<16} {:>14} {:>14}", "", "Original", "What-if");
        println!("{}", "-".repeat(46));
        let cost = |c: Option<f64>| c.map_or("N/A".to_string(), |c| format!("{c:.2}"));
        println!("{:<16} {:>14} {:>14}", "Total Cost", cost(original.root.total_cost), cost(report.summary.total_cost));
        println!("{:<16} {:>14} {:>14}", "Hit Blocks", original.root.shared_hit_blocks, report.summary.hit_blocks);
        println!("{:<16} {:>14} {:>14}", "Read Blocks", original.root.shared_read_blocks, report.summary.read_blocks);
        println!("{:<16} {:>14} {:>14}", "Nodes", original.root.node_count(), report.summary.nodes_count);
        println!();
        println!("Hints:");
        for hint in &report.hints {
            println!("  {hint}");
        }
    })
}
