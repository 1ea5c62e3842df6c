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

pub fn show_config(ctx: &CommandContext) -> Result<()> {
    let mut shown = ctx.config.clone();
    if !shown.connection.password.is_empty() {
        shown.connection.password = "********".to_string();
    }

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    println!("Connection: {}", shown.connection.describe());
    println!("Explain: {}", ctx.config.explain.statement("<query>"));
    println!();
    print!("{}", shown.to_toml()?);
    Ok(())
}
