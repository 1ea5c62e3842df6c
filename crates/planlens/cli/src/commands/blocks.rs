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
use planlens_core::blocks::analyze_blocks;
use tracing::info;

pub fn show_blocks(ctx: &CommandContext, query: &str) -> Result<()> {
    let session = ctx.session()?;
    let aliases = session.aliases(query)?;
    let analysis = analyze_blocks(session.executor(), query, &aliases)?;

    ctx.emit(&analysis, || {
        if !analysis.have_ctids {
            println!("Block usage is not available for this query.");
            println!("Rows returned: {}", analysis.sql_response.result.len());
            return;
        }

        println!("{:<24} {:>12} {:>12}  {}", "Relation", "Used", "Total", "Blocks");
        println!("{}", "-".repeat(72));
        for summary in &analysis.blocks_by_relation {
            let indexes: Vec<String> = summary.used_blocks.indexes.iter().map(u64::to_string).collect();
            println!(
                "{:<24} {:>12} {:>12}  {}",
                summary.relation_name,
                summary.used_blocks.number,
                summary.total_blocks,
                indexes.join(",")
            );
        }
        println!();
        println!("Rows returned: {}", analysis.sql_response.result.len());
    })
}

pub fn inspect_block(ctx: &CommandContext, relation: &str, block: u64) -> Result<()> {
    let contents = ctx.session()?.inspect_block(relation, block)?;
    info!("Read {} rows from block {} of {}", contents.rows.len(), block, relation);

    ctx.emit(&contents, || {
        let mut header = vec!["ctid".to_string()];
        header.extend(contents.columns.iter().cloned());
        println!("{}", header.join(" | "));
        for row in &contents.rows {
            let values: Vec<&str> = row.values().iter().map(|v| v.as_deref().unwrap_or("NULL")).collect();
            println!("{}", values.join(" | "));
        }
    })
}

pub fn list_tables(ctx: &CommandContext) -> Result<()> {
    let tables = ctx.session()?.tables()?;
    ctx.emit(&tables, || {
        if tables.is_empty() {
            println!("No tables found");
        } else {
            println!("Tables:");
            for table in &tables {
                println!("  {table}");
            }
        }
    })
}
