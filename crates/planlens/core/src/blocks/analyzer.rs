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

//! Block/Buffer Analyzer
//!
//! Finds which physical pages of each relation a query's result rows come
//! from, by re-running the query with every relation's `ctid` selected.

use planlens_common::{ExecutionError, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::resolver::{TableAliasMap, TableReference};
use crate::executor::QueryExecutor;

const AGGREGATES: [&str; 5] = ["SUM", "MAX", "MIN", "AVG", "COUNT"];

#[derive(Debug, Error)]
pub enum BlockAnalysisError {
    #[error("Block analysis failed: {0}")]
    Failed(#[from] ExecutionError),
    #[error("Malformed row identifier `{0}`")]
    MalformedRowId(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedBlocks {
    pub number: usize,
    pub indexes: BTreeSet<u64>,
}

impl UsedBlocks {
    fn from_set(indexes: BTreeSet<u64>) -> Self {
        Self {
            number: indexes.len(),
            indexes,
        }
    }
}

/// Pages of one relation touched by a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockUsageSummary {
    pub relation_name: String,
    pub used_blocks: UsedBlocks,
    /// Block index of the relation's last row identifier, plus one.
    pub total_blocks: u64,
}

/// Rows returned while analysing: the instrumented rows (`records`) and the
/// rows of the query itself (`result`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlResponse {
    pub columns: Option<Vec<String>>,
    pub records: Option<Vec<Row>>,
    pub result: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAnalysis {
    pub sql_response: SqlResponse,
    pub blocks_by_relation: Vec<BlockUsageSummary>,
    pub have_ctids: bool,
    pub is_aggregation: bool,
}

/// The query rewritten to select row identifiers ahead of its projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentedQuery {
    pub sql: String,
    pub columns: Vec<String>,
    pub is_aggregation: bool,
}

/// Case-insensitive literal check for an aggregate function name.
pub fn is_aggregation(query: &str) -> bool {
    let upper = query.to_ascii_uppercase();
    AGGREGATES.iter().any(|f| upper.contains(f))
}

pub fn has_nested_select(query: &str) -> bool {
    query.to_ascii_uppercase().contains("FROM (")
}

/// Builds the row-identifier query for `query`. Aggregating queries are cut
/// before `GROUP BY` so identifiers are collected before rows are merged.
/// Returns `None` when there is no relation to instrument or no
/// `SELECT ... FROM` to instrument it in.
pub fn instrument(query: &str, references: &[TableReference]) -> Option<InstrumentedQuery> {
    if references.is_empty() {
        return None;
    }
    let upper = query.to_ascii_uppercase();
    let select = upper.find("SELECT")?;
    let prefix = &query[..select];
    let ctids = references.iter().map(|r| format!("{}.ctid", r.token)).collect::<Vec<_>>().join(", ");
    let mut columns: Vec<String> = references.iter().map(|r| format!("ctid_of_{}", r.relation)).collect();

    if is_aggregation(query) {
        let from = top_level_keyword(&upper, select, "FROM")?;
        let end = top_level_keyword(&upper, from, "GROUP BY").unwrap_or(query.len());
        let clause = query[from..end].trim_end();
        return Some(InstrumentedQuery {
            sql: format!("{prefix}SELECT {ctids} {clause}"),
            columns,
            is_aggregation: true,
        });
    }

    let projection = query[select + "SELECT".len()..].trim_start();
    columns.push("record_data".to_string());
    Some(InstrumentedQuery {
        sql: format!("{prefix}SELECT {ctids}, {projection}"),
        columns,
        is_aggregation: false,
    })
}

/// Offset of the first `keyword` at or after `start` that stands as a word
/// outside any parentheses, so `EXTRACT(YEAR FROM d)` is not taken for the
/// `FROM` clause.
fn top_level_keyword(upper: &str, start: usize, keyword: &str) -> Option<usize> {
    let bytes = upper.as_bytes();
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            _ if depth == 0 && bytes[i..].starts_with(keyword.as_bytes()) => {
                let before = i.checked_sub(1).map(|j| bytes[j]);
                let after = bytes.get(i + keyword.len()).copied();
                if !before.is_some_and(is_word) && !after.is_some_and(is_word) {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Block index of a row identifier: the first number of `(block,offset)`.
pub fn block_of(row_id: &str) -> Result<u64, BlockAnalysisError> {
    row_id
        .trim()
        .trim_start_matches('(')
        .split(',')
        .next()
        .and_then(|block| block.trim().parse().ok())
        .ok_or_else(|| BlockAnalysisError::MalformedRowId(row_id.to_string()))
}

/// Number of blocks up to and including the one holding the relation's
/// last row identifier; zero for an empty relation.
pub fn total_blocks<E: QueryExecutor + ?Sized>(executor: &E, relation: &str) -> Result<u64, BlockAnalysisError> {
    let rows = executor.execute(&format!("SELECT MAX(ctid) FROM {relation};"))?;
    match rows.first().and_then(|row| row.get(0)) {
        Some(row_id) => Ok(block_of(row_id)? + 1),
        None => Ok(0),
    }
}

/// Runs the query twice, once instrumented with row identifiers, and
/// summarises the blocks each relation contributed. Any failure aborts the
/// whole analysis.
pub fn analyze_blocks<E: QueryExecutor + ?Sized>(executor: &E, query: &str, aliases: &TableAliasMap) -> Result<BlockAnalysis, BlockAnalysisError> {
    info!("Starting block analysis");
    let references = aliases.references();

    let instrumented = if has_nested_select(query) {
        debug!("Nested select detected, skipping row identifiers");
        None
    } else {
        instrument(query, &references)
    };

    let Some(instrumented) = instrumented else {
        info!("Query not instrumented, running it as is");
        let result = executor.execute(query).inspect_err(|_| count_failure())?;
        return Ok(BlockAnalysis {
            sql_response: SqlResponse {
                columns: None,
                records: None,
                result,
            },
            ..BlockAnalysis::default()
        });
    };

    let collected = collect(executor, query, &instrumented, &references);
    collected.inspect_err(|e| {
        warn!("Block analysis failed: {}", e);
        count_failure();
    })
}

fn collect<E: QueryExecutor + ?Sized>(
    executor: &E,
    query: &str,
    instrumented: &InstrumentedQuery,
    references: &[TableReference],
) -> Result<BlockAnalysis, BlockAnalysisError> {
    debug!("Instrumented query: {}", instrumented.sql);
    let records = executor.execute(&instrumented.sql)?;
    let result = executor.execute(query)?;

    let mut blocks: Vec<BTreeSet<u64>> = vec![BTreeSet::new(); references.len()];
    for record in &records {
        for (i, set) in blocks.iter_mut().enumerate() {
            // outer joins leave the identifier of a missing side NULL
            if let Some(row_id) = record.get(i) {
                set.insert(block_of(row_id)?);
            }
        }
    }

    let mut blocks_by_relation = Vec::with_capacity(references.len());
    for (reference, set) in references.iter().zip(blocks) {
        blocks_by_relation.push(BlockUsageSummary {
            relation_name: reference.relation.clone(),
            used_blocks: UsedBlocks::from_set(set),
            total_blocks: total_blocks(executor, &reference.relation)?,
        });
    }

    info!("Finished block analysis for {} relations", blocks_by_relation.len());
    Ok(BlockAnalysis {
        sql_response: SqlResponse {
            columns: Some(instrumented.columns.clone()),
            records: Some(records),
            result,
        },
        blocks_by_relation,
        have_ctids: true,
        is_aggregation: instrumented.is_aggregation,
    })
}

fn count_failure() {
    metrics::counter!("planlens_block_analysis_failures_total", 1);
}

/// Rows stored in one physical block of a relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContents {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Reads the rows of `block` in `relation`, with the relation's columns in
/// ordinal order (the `ctid` column comes first in every row).
pub fn inspect_block<E: QueryExecutor + ?Sized>(executor: &E, relation: &str, block: u64) -> Result<BlockContents, ExecutionError> {
    let rows = executor.execute(&format!("SELECT ctid, * FROM {relation} WHERE (ctid::text::point)[0] = {block};"))?;
    let columns = executor.execute(&format!(
        "SELECT COLUMN_NAME FROM INFORMATION_SCHEMA.COLUMNS WHERE TABLE_NAME = '{}' ORDER BY ORDINAL_POSITION",
        relation.replace('\'', "''")
    ))?;
    Ok(BlockContents {
        columns: columns.iter().filter_map(|row| row.get(0)).map(str::to_string).collect(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{MockQueryExecutor, single_value_row};
    use mockall::Sequence;
    use mockall::predicate::eq;

    const JOIN_QUERY: &str = "SELECT customer.c_name, nation.n_name FROM customer, nation WHERE customer.c_nationkey = nation.n_nationkey";

    fn aliases() -> TableAliasMap {
        [("customer", "customer"), ("nation", "nation")].into_iter().collect()
    }

    fn row(values: &[Option<&str>]) -> Row {
        values.iter().copied().collect()
    }

    #[test]
    fn test_detection() {
        assert!(is_aggregation("select count(*) from nation"));
        assert!(is_aggregation("SELECT SUM(ps_supplycost) FROM partsupp"));
        assert!(!is_aggregation(JOIN_QUERY));
        assert!(has_nested_select("SELECT * FROM (SELECT 1) t"));
        assert!(!has_nested_select(JOIN_QUERY));
    }

    #[test]
    fn test_instrument_projection() {
        let refs = aliases().references();
        let instrumented = instrument(JOIN_QUERY, &refs).unwrap();
        assert_eq!(
            instrumented.sql,
            "SELECT customer.ctid, nation.ctid, customer.c_name, nation.n_name FROM customer, nation WHERE customer.c_nationkey = nation.n_nationkey"
        );
        assert_eq!(instrumented.columns, vec!["ctid_of_customer", "ctid_of_nation", "record_data"]);
        assert!(!instrumented.is_aggregation);
    }

    #[test]
    fn test_instrument_keeps_hint_block() {
        let refs = vec![TableReference {
            token: "n".into(),
            relation: "nation".into(),
        }];
        let instrumented = instrument("/*+ SeqScan(nation) */ SELECT n.n_name FROM nation n", &refs).unwrap();
        assert_eq!(instrumented.sql, "/*+ SeqScan(nation) */ SELECT n.ctid, n.n_name FROM nation n");
    }

    #[test]
    fn test_instrument_aggregation_stops_before_group_by() {
        let refs = aliases().references();
        let query = "SELECT n_name, COUNT(*) FROM customer, nation WHERE c_nationkey = n_nationkey GROUP BY n_name ORDER BY n_name";
        let instrumented = instrument(query, &refs).unwrap();
        assert_eq!(
            instrumented.sql,
            "SELECT customer.ctid, nation.ctid FROM customer, nation WHERE c_nationkey = n_nationkey"
        );
        assert!(instrumented.is_aggregation);
        assert_eq!(instrumented.columns, vec!["ctid_of_customer", "ctid_of_nation"]);
    }

    #[test]
    fn test_instrument_aggregation_skips_nested_from() {
        let refs = vec![TableReference {
            token: "orders".into(),
            relation: "orders".into(),
        }];
        let query = "SELECT EXTRACT(YEAR FROM o_orderdate), COUNT(*) FROM orders GROUP BY EXTRACT(YEAR FROM o_orderdate)";
        let instrumented = instrument(query, &refs).unwrap();
        assert_eq!(instrumented.sql, "SELECT orders.ctid FROM orders");
    }

    #[test]
    fn test_block_of() {
        assert_eq!(block_of("(0,1)").unwrap(), 0);
        assert_eq!(block_of("(127,14)").unwrap(), 127);
        assert!(matches!(block_of("garbage"), Err(BlockAnalysisError::MalformedRowId(_))));
    }

    #[test]
    fn test_two_table_join() {
        let mut executor = MockQueryExecutor::new();
        let mut seq = Sequence::new();
        executor
            .expect_execute()
            .withf(|sql| sql.starts_with("SELECT customer.ctid, nation.ctid,"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(vec![
                    row(&[Some("(0,1)"), Some("(0,3)"), Some("Customer#1"), Some("ALGERIA")]),
                    row(&[Some("(2,7)"), Some("(0,3)"), Some("Customer#9"), Some("ALGERIA")]),
                    row(&[Some("(0,4)"), Some("(0,1)"), Some("Customer#3"), Some("BRAZIL")]),
                ])
            });
        executor
            .expect_execute()
            .with(eq(JOIN_QUERY))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![row(&[Some("Customer#1"), Some("ALGERIA")])]));
        executor
            .expect_execute()
            .with(eq("SELECT MAX(ctid) FROM customer;"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![single_value_row("(3,2)")]));
        executor
            .expect_execute()
            .with(eq("SELECT MAX(ctid) FROM nation;"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![single_value_row("(0,25)")]));

        let analysis = analyze_blocks(&executor, JOIN_QUERY, &aliases()).unwrap();
        assert!(analysis.have_ctids);
        assert!(!analysis.is_aggregation);
        assert_eq!(analysis.blocks_by_relation.len(), 2);

        let customer = &analysis.blocks_by_relation[0];
        assert_eq!(customer.relation_name, "customer");
        assert_eq!(customer.used_blocks.number, 2);
        assert_eq!(customer.used_blocks.indexes, BTreeSet::from([0, 2]));
        assert_eq!(customer.total_blocks, 4);

        let nation = &analysis.blocks_by_relation[1];
        assert_eq!(nation.used_blocks.number, 1);
        assert_eq!(nation.total_blocks, 1);

        for summary in &analysis.blocks_by_relation {
            assert!(summary.used_blocks.number as u64 <= summary.total_blocks);
        }
        assert_eq!(analysis.sql_response.result.len(), 1);
        assert_eq!(analysis.sql_response.records.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn test_nested_select_runs_query_as_is() {
        let query = "SELECT * FROM (SELECT n_name FROM nation) t";
        let mut executor = MockQueryExecutor::new();
        executor
            .expect_execute()
            .with(eq(query))
            .times(1)
            .returning(|_| Ok(vec![single_value_row("ALGERIA")]));

        let analysis = analyze_blocks(&executor, query, &aliases()).unwrap();
        assert!(!analysis.have_ctids);
        assert!(analysis.blocks_by_relation.is_empty());
        assert_eq!(analysis.sql_response.columns, None);
        assert_eq!(analysis.sql_response.result, vec![single_value_row("ALGERIA")]);
    }

    #[test]
    fn test_execution_error_aborts_analysis() {
        let mut executor = MockQueryExecutor::new();
        executor
            .expect_execute()
            .times(1)
            .returning(|_| Err(ExecutionError::invalid_query("column \"x\" does not exist")));

        let err = analyze_blocks(&executor, JOIN_QUERY, &aliases()).unwrap_err();
        assert!(matches!(err, BlockAnalysisError::Failed(ExecutionError::InvalidQuery { .. })));
    }

    #[test]
    fn test_empty_relation_has_no_blocks() {
        let mut executor = MockQueryExecutor::new();
        executor.expect_execute().returning(|_| Ok(vec![Row::new(vec![None])]));
        assert_eq!(total_blocks(&executor, "region").unwrap(), 0);
    }

    #[test]
    fn test_inspect_block() {
        let mut executor = MockQueryExecutor::new();
        executor
            .expect_execute()
            .with(eq("SELECT ctid, * FROM nation WHERE (ctid::text::point)[0] = 0;"))
            .returning(|_| Ok(vec![row(&[Some("(0,1)"), Some("0"), Some("ALGERIA")])]));
        executor
            .expect_execute()
            .withf(|sql| sql.contains("TABLE_NAME = 'nation'"))
            .returning(|_| Ok(vec![single_value_row("n_nationkey"), single_value_row("n_name")]));

        let contents = inspect_block(&executor, "nation", 0).unwrap();
        assert_eq!(contents.columns, vec!["n_nationkey", "n_name"]);
        assert_eq!(contents.rows.len(), 1);
    }
}
