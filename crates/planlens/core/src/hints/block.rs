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

//! The `/*+ ... */` hint-comment block of a query.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*\+.*?\*/").expect("hint block pattern is valid"));
static HINT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\([^)]*\)").expect("hint pattern is valid"));

/// Location of the first hint block in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HintBlock<'a> {
    query: &'a str,
    start: usize,
    end: usize,
}

impl<'a> HintBlock<'a> {
    pub fn find(query: &'a str) -> Option<Self> {
        BLOCK.find(query).map(|m| Self {
            query,
            start: m.start(),
            end: m.end(),
        })
    }

    /// Byte range of the whole block, delimiters included.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn as_str(&self) -> &'a str {
        &self.query[self.start..self.end]
    }

    /// Text between `/*+` and `*/`.
    pub fn body(&self) -> &'a str {
        &self.query[self.start + 3..self.end - 2]
    }

    /// Hint tokens in the block, left to right.
    pub fn hints(&self) -> Vec<&'a str> {
        HINT.find_iter(self.body()).map(|m| m.as_str()).collect()
    }

    /// Returns the query with the block replaced by `replacement`.
    pub fn replace_with(&self, replacement: &str) -> String {
        let mut out = String::with_capacity(self.query.len() + replacement.len());
        out.push_str(&self.query[..self.start]);
        out.push_str(replacement);
        out.push_str(&self.query[self.end..]);
        out
    }
}

/// Hint tokens of the query's hint block; empty when there is none.
pub fn hints_in(query: &str) -> Vec<String> {
    HintBlock::find(query)
        .map(|block| block.hints().into_iter().map(str::to_string).collect())
        .unwrap_or_default()
}

pub fn render_block<S: AsRef<str>>(hints: &[S]) -> String {
    let joined: Vec<&str> = hints.iter().map(AsRef::as_ref).collect();
    format!("/*+ {} */", joined.join(" "))
}

/// Embeds `hints` as the query's hint block, replacing any existing block or
/// prepending a new one. A query is returned unchanged when there are no
/// hints to embed.
pub fn annotate_query<S: AsRef<str>>(query: &str, hints: &[S]) -> String {
    if hints.is_empty() {
        return query.to_string();
    }
    let block = render_block(hints);
    match HintBlock::find(query) {
        Some(existing) => existing.replace_with(&block),
        None => format!("{block} {query}"),
    }
}
