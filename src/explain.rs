//! Decoding of diagnostic (`EXPLAIN`) output.
//!
//! The estimated row count sits at a fixed position whose layout depends on
//! the engine. For `INSERT ... SELECT` the engines report the insert itself
//! first, without a usable estimate; the row source feeding it comes next.
//! Layouts are validated strictly: a result of unexpected shape is an error,
//! never a guess.
//!
//! | Engine     | Data row                | Columns | Rows column   |
//! |------------|-------------------------|---------|---------------|
//! | MySQL      | 2                       | 12      | 9             |
//! | TiDB       | first below `Insert`    | 5       | 1 (`estRows`) |
//! | PostgreSQL | first below `Insert on` | 1       | `rows=N`      |

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::{
    database::{QueryRows, Scalar},
    rule::Dialect
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExplainError {
    #[error("expected at least {expected} rows but got {actual}")]
    TooFewRows { expected: usize, actual: usize },

    #[error("expected {expected} columns but got {actual}")]
    ColumnCount { expected: usize, actual: usize },

    #[error("expected integer but got {0}")]
    NotInteger(String),

    #[error("no row estimate in plan line {0:?}")]
    NoEstimate(String)
}

/// Extracts the estimated affected row count from a diagnostic result.
pub trait ExplainDecoder: Send + Sync {
    fn estimated_rows(&self, result: &QueryRows) -> Result<i64, ExplainError>;
}

/// Estimate at a fixed row and column of a fixed-width result.
#[derive(Debug, Clone, Copy)]
pub struct PositionalLayout {
    pub row:    usize,
    pub width:  usize,
    pub column: usize
}

/// MySQL `EXPLAIN`: row 1 describes the INSERT with `rows` NULL, row 2 the
/// SELECT feeding it.
pub const MYSQL_EXPLAIN: PositionalLayout = PositionalLayout {
    row:    2,
    width:  12,
    column: 9
};

/// Column layout of TiDB `EXPLAIN`: id, estRows, task, access object,
/// operator info.
pub const TIDB_EXPLAIN_WIDTH: usize = 5;

impl ExplainDecoder for PositionalLayout {
    fn estimated_rows(&self, result: &QueryRows) -> Result<i64, ExplainError> {
        let row = data_row(result, self.row)?;
        if row.len() != self.width {
            return Err(ExplainError::ColumnCount {
                expected: self.width,
                actual:   row.len()
            });
        }
        coerce_i64(&row[self.column])
    }
}

/// TiDB operator tree.
///
/// The `Insert` operator reports `N/A`; its direct child carries the
/// estimate. Plans without an `Insert` root are read from their first line.
#[derive(Debug, Clone, Copy)]
pub struct TidbPlan;

impl ExplainDecoder for TidbPlan {
    fn estimated_rows(&self, result: &QueryRows) -> Result<i64, ExplainError> {
        let first = data_row(result, 1)?;
        for row in &result.rows[1..] {
            if row.len() != TIDB_EXPLAIN_WIDTH {
                return Err(ExplainError::ColumnCount {
                    expected: TIDB_EXPLAIN_WIDTH,
                    actual:   row.len()
                });
            }
        }
        let index = if operator_name(&first[0]).starts_with("Insert") {
            2
        } else {
            1
        };
        coerce_i64(&data_row(result, index)?[1])
    }
}

/// Operator id without the tree drawing prefix, e.g. `└─TableReader_7`.
fn operator_name(cell: &Scalar) -> &str {
    match cell {
        Scalar::Text(text) => {
            text.trim_start_matches(|c: char| c.is_whitespace() || "└├│─".contains(c))
        }
        _ => ""
    }
}

/// PostgreSQL text plan.
///
/// The top `Insert on t` node reports `rows=0`; the estimate is that of the
/// first node below it. Detail lines such as `Filter:` or `Hash Cond:` carry
/// no estimate and are passed over.
#[derive(Debug, Clone, Copy)]
pub struct PostgresPlan;

static PLAN_ROWS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\brows=(\d+)").ok());

impl ExplainDecoder for PostgresPlan {
    fn estimated_rows(&self, result: &QueryRows) -> Result<i64, ExplainError> {
        data_row(result, 1)?;
        let mut lines = Vec::with_capacity(result.rows.len() - 1);
        for row in &result.rows[1..] {
            match row.as_slice() {
                [Scalar::Text(text)] => lines.push(text.as_str()),
                [other] => return Err(ExplainError::NotInteger(other.to_string())),
                cells => {
                    return Err(ExplainError::ColumnCount {
                        expected: 1,
                        actual:   cells.len()
                    });
                }
            }
        }
        let skip = usize::from(lines[0].trim_start().starts_with("Insert on"));
        lines
            .iter()
            .skip(skip)
            .find_map(|line| {
                PLAN_ROWS
                    .as_ref()
                    .and_then(|re| re.captures(line))
                    .and_then(|caps| caps[1].parse::<i64>().ok())
            })
            .ok_or_else(|| ExplainError::NoEstimate(lines[skip.min(lines.len() - 1)].to_string()))
    }
}

/// Decoder for the engine's diagnostic layout.
pub fn decoder_for(dialect: Dialect) -> &'static dyn ExplainDecoder {
    match dialect {
        Dialect::MySQL => &MYSQL_EXPLAIN,
        Dialect::TiDB => &TidbPlan,
        Dialect::PostgreSQL => &PostgresPlan
    }
}

fn data_row(result: &QueryRows, index: usize) -> Result<&[Scalar], ExplainError> {
    result
        .rows
        .get(index)
        .map(Vec::as_slice)
        .ok_or(ExplainError::TooFewRows {
            expected: index + 1,
            actual:   result.rows.len()
        })
}

/// Integer value of a cell; numeric text is accepted.
pub fn coerce_i64(value: &Scalar) -> Result<i64, ExplainError> {
    match value {
        Scalar::Int(v) => Ok(i64::from(*v)),
        Scalar::BigInt(v) => Ok(*v),
        Scalar::Text(text) => {
            let trimmed = text.trim();
            if let Ok(v) = trimmed.parse::<i64>() {
                return Ok(v);
            }
            // TiDB renders estRows as a decimal, e.g. "10000.00"
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
                Ok(v) if v.is_finite() => Ok(v.round() as i64),
                _ => Err(ExplainError::NotInteger(value.to_string()))
            }
        }
        Scalar::Null | Scalar::Float(_) => Err(ExplainError::NotInteger(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mysql_header() -> Vec<String> {
        [
            "id",
            "select_type",
            "table",
            "partitions",
            "type",
            "possible_keys",
            "key",
            "key_len",
            "ref",
            "rows",
            "filtered",
            "Extra"
        ]
        .map(String::from)
        .to_vec()
    }

    fn mysql_row(select_type: &str, rows: Scalar) -> Vec<Scalar> {
        let mut row = vec![Scalar::Null; 12];
        row[0] = Scalar::BigInt(1);
        row[1] = Scalar::Text(select_type.to_string());
        row[2] = Scalar::Text("td".to_string());
        row[4] = Scalar::Text("ALL".to_string());
        row[9] = rows;
        row
    }

    /// `EXPLAIN INSERT INTO td SELECT * FROM td` on MySQL 8.
    fn mysql_insert_select(rows: Scalar) -> QueryRows {
        QueryRows::new(
            mysql_header(),
            vec![mysql_row("INSERT", Scalar::Null), mysql_row("SIMPLE", rows)]
        )
    }

    #[test]
    fn test_mysql_reads_row_below_insert() {
        assert_eq!(
            MYSQL_EXPLAIN.estimated_rows(&mysql_insert_select(Scalar::BigInt(5))),
            Ok(5)
        );
    }

    #[test]
    fn test_mysql_layout_accepts_integer_kinds() {
        for cell in [
            Scalar::Int(7),
            Scalar::BigInt(7),
            Scalar::Text("7".to_string())
        ] {
            assert_eq!(MYSQL_EXPLAIN.estimated_rows(&mysql_insert_select(cell)), Ok(7));
        }
    }

    #[test]
    fn test_mysql_layout_rejects_single_data_row() {
        let result = QueryRows::new(mysql_header(), vec![mysql_row("INSERT", Scalar::Null)]);
        assert_eq!(
            MYSQL_EXPLAIN.estimated_rows(&result),
            Err(ExplainError::TooFewRows {
                expected: 3,
                actual:   2
            })
        );
    }

    #[test]
    fn test_mysql_layout_rejects_wrong_width() {
        let result = QueryRows::new(
            vec!["a".to_string()],
            vec![vec![Scalar::Int(1)], vec![Scalar::Int(1)]]
        );
        let err = MYSQL_EXPLAIN.estimated_rows(&result).unwrap_err();
        assert_eq!(err.to_string(), "expected 12 columns but got 1");
    }

    #[test]
    fn test_mysql_layout_rejects_null() {
        let err = MYSQL_EXPLAIN
            .estimated_rows(&mysql_insert_select(Scalar::Null))
            .unwrap_err();
        assert!(matches!(err, ExplainError::NotInteger(_)));
    }

    fn tidb_plan(rows: &[(&str, &str)]) -> QueryRows {
        QueryRows::new(
            ["id", "estRows", "task", "access object", "operator info"]
                .map(String::from)
                .to_vec(),
            rows.iter()
                .map(|(id, est_rows)| {
                    vec![
                        Scalar::Text(id.to_string()),
                        Scalar::Text(est_rows.to_string()),
                        Scalar::Text("root".to_string()),
                        Scalar::Text(String::new()),
                        Scalar::Text(String::new())
                    ]
                })
                .collect()
        )
    }

    #[test]
    fn test_tidb_estimate_below_insert() {
        let result = tidb_plan(&[
            ("Insert_1", "N/A"),
            ("└─TableReader_7", "10000.00"),
            ("  └─TableFullScan_6", "10000.00")
        ]);
        assert_eq!(TidbPlan.estimated_rows(&result), Ok(10000));
    }

    #[test]
    fn test_tidb_join_uses_join_estimate() {
        let result = tidb_plan(&[
            ("Insert_1", "N/A"),
            ("└─HashJoin_8", "12.50"),
            ("  ├─TableReader_11(Build)", "9990.00"),
            ("  │ └─Selection_10", "9990.00"),
            ("  │   └─TableFullScan_9", "10000.00"),
            ("  └─TableReader_14(Probe)", "9990.00"),
            ("    └─Selection_13", "9990.00"),
            ("      └─TableFullScan_12", "10000.00")
        ]);
        assert_eq!(TidbPlan.estimated_rows(&result), Ok(13));
    }

    #[test]
    fn test_tidb_without_numeric_estimate() {
        let result = tidb_plan(&[("Insert_1", "N/A")]);
        assert!(matches!(
            TidbPlan.estimated_rows(&result),
            Err(ExplainError::TooFewRows { .. })
        ));
    }

    #[test]
    fn test_tidb_select_plan_reads_first_line() {
        let result = tidb_plan(&[("TableReader_5", "42.00"), ("└─TableFullScan_4", "10000.00")]);
        assert_eq!(TidbPlan.estimated_rows(&result), Ok(42));
    }

    fn postgres_plan(lines: &[&str]) -> QueryRows {
        QueryRows::new(
            vec!["QUERY PLAN".to_string()],
            lines
                .iter()
                .map(|line| vec![Scalar::Text(line.to_string())])
                .collect()
        )
    }

    #[test]
    fn test_postgres_plan_estimate() {
        let result = postgres_plan(&["Seq Scan on u  (cost=0.00..35.50 rows=2550 width=4)"]);
        assert_eq!(PostgresPlan.estimated_rows(&result), Ok(2550));
    }

    #[test]
    fn test_postgres_plan_uses_row_source() {
        let result = postgres_plan(&[
            "Insert on t  (cost=0.00..22.70 rows=0 width=0)",
            "  ->  Seq Scan on u  (cost=0.00..22.70 rows=1270 width=4)"
        ]);
        assert_eq!(PostgresPlan.estimated_rows(&result), Ok(1270));
    }

    #[test]
    fn test_postgres_join_uses_join_estimate() {
        let result = postgres_plan(&[
            "Insert on t  (cost=135.00..260.13 rows=0 width=0)",
            "  ->  Hash Join  (cost=135.00..260.13 rows=10 width=4)",
            "        Hash Cond: (o.user_id = u.id)",
            "        ->  Seq Scan on orders o  (cost=0.00..98.00 rows=5000 width=8)",
            "        ->  Hash  (cost=122.50..122.50 rows=1000 width=4)",
            "              ->  Seq Scan on users u  (cost=0.00..122.50 rows=1000 width=4)",
            "                    Filter: active"
        ]);
        assert_eq!(PostgresPlan.estimated_rows(&result), Ok(10));
    }

    #[test]
    fn test_postgres_plan_without_estimate() {
        let result = postgres_plan(&["Result"]);
        assert!(matches!(
            PostgresPlan.estimated_rows(&result),
            Err(ExplainError::NoEstimate(_))
        ));
    }
}
