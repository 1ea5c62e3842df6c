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

//! Table/Alias Resolver

use planlens_common::ExecutionError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::executor::QueryExecutor;

const LIST_TABLES: &str = "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public' AND table_type = 'BASE TABLE';";

/// Words that can follow a table name without being its alias.
const KEYWORDS: &[&str] = &[
    "FROM", "JOIN", "WHERE", "ON", "GROUP", "ORDER", "LIMIT", "OFFSET", "FETCH", "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "CROSS", "NATURAL",
    "USING", "HAVING", "UNION", "INTERSECT", "EXCEPT", "WINDOW", "SELECT", "AND", "OR", "FOR", "SET", "VALUES", "RETURNING", "LATERAL",
    "TABLESAMPLE",
];

/// How a query refers to one relation: the alias when it has one, the bare
/// name otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReference {
    pub token: String,
    pub relation: String,
}

/// Query tokens (table names and aliases) mapped to canonical relation
/// names. Tokens and names are lower case; insertion order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableAliasMap {
    entries: Vec<(String, String)>,
}

impl TableAliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: &str, relation: &str) {
        let token = token.to_lowercase();
        let relation = relation.to_lowercase();
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some(entry) => entry.1 = relation,
            None => self.entries.push((token, relation)),
        }
    }

    pub fn resolve(&self, token: &str) -> Option<&str> {
        let token = token.to_lowercase();
        self.entries.iter().find(|(t, _)| *t == token).map(|(_, r)| r.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, r)| (t.as_str(), r.as_str()))
    }

    /// Distinct relations in first-seen order.
    pub fn relations(&self) -> Vec<&str> {
        let mut relations: Vec<&str> = Vec::new();
        for (_, relation) in &self.entries {
            if !relations.contains(&relation.as_str()) {
                relations.push(relation);
            }
        }
        relations
    }

    /// One reference per relation, preferring an alias over the bare name
    /// since an aliased table cannot be referenced by name.
    pub fn references(&self) -> Vec<TableReference> {
        self.relations()
            .into_iter()
            .map(|relation| {
                let token = self
                    .entries
                    .iter()
                    .find(|(t, r)| r == relation && t != relation)
                    .map_or(relation, |(t, _)| t.as_str());
                TableReference {
                    token: token.to_string(),
                    relation: relation.to_string(),
                }
            })
            .collect()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for TableAliasMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (token, relation) in iter {
            map.insert(token.as_ref(), relation.as_ref());
        }
        map
    }
}

/// Base tables of the `public` schema.
pub fn list_tables<E: QueryExecutor + ?Sized>(executor: &E) -> Result<Vec<String>, ExecutionError> {
    let rows = executor.execute(LIST_TABLES)?;
    Ok(rows.iter().filter_map(|row| row.get(0)).map(str::to_lowercase).collect())
}

/// Finds the known `tables` a query mentions and the aliases given to them.
pub fn resolve_aliases<S: AsRef<str>>(query: &str, tables: &[S]) -> TableAliasMap {
    let is_table = |word: &str| tables.iter().any(|t| t.as_ref().eq_ignore_ascii_case(word));
    let tokens: Vec<&str> = query.split_whitespace().collect();
    let mut map = TableAliasMap::new();

    for (i, raw) in tokens.iter().enumerate() {
        let (word, ends_item) = clean(raw);
        if !is_table(word) {
            continue;
        }
        map.insert(word, word);
        if ends_item {
            continue;
        }

        let mut next = i + 1;
        if tokens.get(next).is_some_and(|t| clean(t).0.eq_ignore_ascii_case("AS")) {
            next += 1;
        }
        let Some(candidate) = tokens.get(next).map(|t| clean(t).0) else {
            continue;
        };
        if is_alias(candidate) && !is_table(candidate) {
            map.insert(candidate, word);
        }
    }

    debug!("Resolved {} table tokens in query", map.len());
    map
}

/// Strips list and statement punctuation from a token. The flag is set when
/// the token closed a list item, so no alias can follow it.
fn clean(token: &str) -> (&str, bool) {
    let trimmed = token.trim_start_matches('(');
    let word = trimmed.trim_end_matches([',', ';', ')']);
    (word, word.len() != trimmed.len())
}

fn is_alias(word: &str) -> bool {
    !word.is_empty()
        && word.chars().all(|c| c.is_alphanumeric() || c == '_')
        && !word.starts_with(|c: char| c.is_ascii_digit())
        && !KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}
