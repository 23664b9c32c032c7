use std::collections::HashMap;

use chrono::NaiveDate;
use rusqlite::params;
use serde::Serialize;

use crate::db::DbPool;

/// Metric name under which daily visitor counts are stored.
pub const VISITORS: &str = "visitors";

/// One `(date, value)` point of a daily series.
#[derive(Debug, Serialize, PartialEq)]
pub struct DailyValue {
    pub date: String,
    pub value: i64,
}

/// Daily counters keyed by `(metric_name, metric_date)`. One row per day;
/// values only move up through `increment` and down only through an explicit
/// operator `reset`. Rows are never auto-deleted.
pub struct SystemMetric;

impl SystemMetric {
    /// Create-or-increment the counter row for `date` and return the new
    /// value. The arithmetic runs inside a single SQLite upsert, so
    /// concurrent callers serialize on the row and no increment is lost.
    pub fn increment(pool: &DbPool, name: &str, date: NaiveDate) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO system_metrics (metric_name, metric_date, metric_value)
             VALUES (?1, ?2, 1)
             ON CONFLICT(metric_name, metric_date)
             DO UPDATE SET metric_value = metric_value + 1,
                           updated_at = CURRENT_TIMESTAMP",
            params![name, date],
        )
        .map_err(|e| e.to_string())?;

        conn.query_row(
            "SELECT metric_value FROM system_metrics
             WHERE metric_name = ?1 AND metric_date = ?2",
            params![name, date],
            |row| row.get(0),
        )
        .map_err(|e| e.to_string())
    }

    /// Value for a single day; days without a row read as 0.
    pub fn get(pool: &DbPool, name: &str, date: NaiveDate) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row(
            "SELECT metric_value FROM system_metrics
             WHERE metric_name = ?1 AND metric_date = ?2",
            params![name, date],
            |row| row.get(0),
        )
        .unwrap_or(0)
    }

    /// Administrative reset of one day's counter to zero.
    pub fn reset(pool: &DbPool, name: &str, date: NaiveDate) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO system_metrics (metric_name, metric_date, metric_value)
             VALUES (?1, ?2, 0)
             ON CONFLICT(metric_name, metric_date)
             DO UPDATE SET metric_value = 0,
                           updated_at = CURRENT_TIMESTAMP",
            params![name, date],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Sum over the inclusive date range `[from, to]`.
    pub fn sum_range(pool: &DbPool, name: &str, from: NaiveDate, to: NaiveDate) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row(
            "SELECT COALESCE(SUM(metric_value), 0) FROM system_metrics
             WHERE metric_name = ?1 AND metric_date BETWEEN ?2 AND ?3",
            params![name, from, to],
            |row| row.get(0),
        )
        .unwrap_or(0)
    }

    /// Daily series over `[from, to]`, one entry per calendar day, days
    /// without a stored row reported as 0.
    pub fn series(pool: &DbPool, name: &str, from: NaiveDate, to: NaiveDate) -> Vec<DailyValue> {
        let mut stored: HashMap<NaiveDate, i64> = HashMap::new();

        if let Ok(conn) = pool.get() {
            if let Ok(mut stmt) = conn.prepare(
                "SELECT metric_date, metric_value FROM system_metrics
                 WHERE metric_name = ?1 AND metric_date BETWEEN ?2 AND ?3
                 ORDER BY metric_date",
            ) {
                let rows = stmt.query_map(params![name, from, to], |row| {
                    Ok((row.get::<_, NaiveDate>(0)?, row.get::<_, i64>(1)?))
                });
                if let Ok(rows) = rows {
                    for row in rows.flatten() {
                        stored.insert(row.0, row.1);
                    }
                }
            }
        }

        let mut series = Vec::new();
        let mut day = from;
        while day <= to {
            series.push(DailyValue {
                date: day.format("%Y-%m-%d").to_string(),
                value: stored.get(&day).copied().unwrap_or(0),
            });
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        series
    }
}
