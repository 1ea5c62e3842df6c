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

//! What-If Rewrite Engine
//!
//! Turns a batch of selected scenarios into a modified query. Only the hint
//! block changes; the query body is left byte-for-byte intact.

use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::WhatIfError;
use super::phrases::PlannerToggle;
use super::scenario::{NamedRewrite, ScenarioKind, WhatIfScenario};
use crate::hints::{HintBlock, Operator};

/// A rewritten query plus, for general scenarios, the statements that
/// restore the session afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewrite {
    pub query: String,
    pub reset: Option<String>,
}

/// Rewrites `query` for `scenarios`, which must be non-empty and all of the
/// same kind.
pub fn rewrite(query: &str, scenarios: &[WhatIfScenario]) -> Result<Rewrite, WhatIfError> {
    let first = scenarios.first().ok_or(WhatIfError::EmptySelection)?.kind();
    if let Some(other) = scenarios.iter().map(WhatIfScenario::kind).find(|kind| *kind != first) {
        return Err(WhatIfError::MixedKinds { expected: first, found: other });
    }

    let rewrite = match first {
        ScenarioKind::General => {
            let toggles: Vec<PlannerToggle> = scenarios
                .iter()
                .filter_map(|s| match s {
                    WhatIfScenario::General { toggle, .. } => Some(*toggle),
                    _ => None,
                })
                .collect();
            rewrite_general(query, &toggles)
        }
        ScenarioKind::SpecificByName => {
            let rewrites: Vec<&NamedRewrite> = scenarios
                .iter()
                .filter_map(|s| match s {
                    WhatIfScenario::SpecificByName { question, rewrite } => {
                        if rewrite.is_none() {
                            warn!("No rewrite registered for scenario: {}", question);
                            metrics::counter!("planlens_whatif_skipped_total", 1);
                        }
                        rewrite.as_ref()
                    }
                    _ => None,
                })
                .collect();
            Rewrite {
                query: rewrite_by_name(query, &rewrites),
                reset: None,
            }
        }
        ScenarioKind::SpecificByInstance => {
            let instances: Vec<(&str, Operator)> = scenarios
                .iter()
                .filter_map(|s| match s {
                    WhatIfScenario::SpecificByInstance { hint, target } => Some((hint.as_str(), *target)),
                    _ => None,
                })
                .collect();
            Rewrite {
                query: rewrite_by_instance(query, &instances),
                reset: None,
            }
        }
    };

    info!("Rewrote query for {} {} scenario(s)", scenarios.len(), first);
    metrics::counter!("planlens_whatif_rewrites_total", 1);
    Ok(rewrite)
}

/// Replaces the hint block with `SET <guc> to off;` statements. The block
/// is dropped because the session settings supersede it; with no block the
/// statements are prepended.
pub fn rewrite_general(query: &str, toggles: &[PlannerToggle]) -> Rewrite {
    let set = toggles.iter().map(|t| t.set_statement()).collect::<Vec<_>>().join(" ");
    let reset = toggles.iter().map(|t| t.reset_statement()).collect::<Vec<_>>().join(" ");

    let query = match HintBlock::find(query) {
        Some(block) => block.replace_with(&set),
        None => format!("{set} {query}"),
    };
    debug!("General rewrite: {}", query);
    Rewrite { query, reset: Some(reset) }
}

/// Applies every named substitution to the query, cumulatively. Patterns
/// that match nothing leave the query unchanged.
pub fn rewrite_by_name(query: &str, rewrites: &[&NamedRewrite]) -> String {
    rewrites
        .iter()
        .fold(query.to_string(), |acc, rewrite| rewrite_hint(&acc, &rewrite.old_token(), &rewrite.new_token()))
}

/// Replaces every occurrence of the hint `old` that starts on a word
/// boundary with `new`, e.g. `SeqScan(customer)` with `NoSeqScan(customer)`.
/// Only the hint block is searched; a query without one is returned as is.
pub fn rewrite_hint(query: &str, old: &str, new: &str) -> String {
    let Some(block) = HintBlock::find(query) else {
        debug!("Query has no hint block; {} left unchanged", old);
        return query.to_string();
    };
    let pattern = format!(r"\b{}", regex::escape(old));
    match Regex::new(&pattern) {
        Ok(re) => {
            let body = re.replace_all(block.body(), NoExpand(new));
            block.replace_with(&format!("/*+{body}*/"))
        }
        Err(e) => {
            warn!("Cannot build pattern for hint {}: {}", old, e);
            query.to_string()
        }
    }
}

/// Swaps the operator keyword of `hint`, keeping its argument list.
/// Returns `None` when the hint has no argument list.
pub fn retarget_hint(hint: &str, target: Operator) -> Option<String> {
    let open = hint.find('(')?;
    Some(format!("{}{}", target.keyword(), &hint[open..]))
}

/// For each (hint, target) pair, left to right, replaces the first
/// occurrence of the hint inside the hint block.
pub fn rewrite_by_instance(query: &str, instances: &[(&str, Operator)]) -> String {
    let mut current = query.to_string();
    for (hint, target) in instances {
        let Some(replacement) = retarget_hint(hint, *target) else {
            warn!("Selected hint {} has no argument list", hint);
            metrics::counter!("planlens_whatif_skipped_total", 1);
            continue;
        };
        let Some(block) = HintBlock::find(&current) else {
            debug!("Query has no hint block; {} left unchanged", hint);
            continue;
        };
        let body = block.range().start + 3;
        let Some(offset) = find_hint(block.body(), hint) else {
            debug!("Hint {} not present in block", hint);
            continue;
        };
        let start = body + offset;
        current.replace_range(start..start + hint.len(), &replacement);
    }
    current
}

/// First occurrence of `hint` in `body` not preceded by an identifier
/// character, so `SeqScan(t)` never matches inside `NoSeqScan(t)`.
fn find_hint(body: &str, hint: &str) -> Option<usize> {
    body.match_indices(hint).map(|(i, _)| i).find(|&i| {
        body[..i]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
    })
}
