use std::io::{Cursor, Read, Write};

use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::{json, Map, Value};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::db::DbPool;

/// Tables included in a backup, in dependency order: parents before
/// children so restore can insert in the same order with foreign keys on.
const BACKUP_TABLES: &[&str] = &[
    "settings",
    "categories",
    "projects",
    "project_images",
    "services",
    "posts",
    "departments",
    "job_positions",
    "job_applications",
    "testimonials",
    "team_members",
    "inquiries",
    "system_metrics",
];

#[derive(Debug, serde::Serialize)]
pub struct RestoreSummary {
    pub tables: usize,
    pub rows: usize,
}

fn sql_to_json(value: ValueRef) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => json!(i),
        ValueRef::Real(f) => json!(f),
        ValueRef::Text(t) => json!(String::from_utf8_lossy(t)),
        ValueRef::Blob(_) => Value::Null,
    }
}

fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else {
                SqlValue::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn dump_table(pool: &DbPool, table: &str) -> Result<Vec<Value>, String> {
    let conn = pool.get().map_err(|e| e.to_string())?;
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM {}", table))
        .map_err(|e| e.to_string())?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let rows = stmt
        .query_map([], |row| {
            let mut obj = Map::new();
            for (i, col) in columns.iter().enumerate() {
                obj.insert(col.clone(), sql_to_json(row.get_ref(i)?));
            }
            Ok(Value::Object(obj))
        })
        .map_err(|e| e.to_string())?;

    Ok(rows.filter_map(|r| r.ok()).collect())
}

/// Package every content table into a zip archive of per-table JSON dumps
/// plus a metadata entry. Returns the archive bytes, ready to stream to the
/// operator or write under `backups/`.
pub fn create_backup(pool: &DbPool) -> Result<Vec<u8>, String> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    let mut table_counts = Map::new();
    for table in BACKUP_TABLES {
        let rows = dump_table(pool, table)?;
        table_counts.insert((*table).to_string(), json!(rows.len()));
        zip.start_file(format!("{}.json", table), options)
            .map_err(|e| e.to_string())?;
        let body = serde_json::to_vec_pretty(&rows).map_err(|e| e.to_string())?;
        zip.write_all(&body).map_err(|e| e.to_string())?;
    }

    let metadata = json!({
        "created_at": chrono::Utc::now().to_rfc3339(),
        "format_version": 1,
        "tables": table_counts,
    });
    zip.start_file("metadata.json", options)
        .map_err(|e| e.to_string())?;
    zip.write_all(&serde_json::to_vec_pretty(&metadata).map_err(|e| e.to_string())?)
        .map_err(|e| e.to_string())?;

    let cursor = zip.finish().map_err(|e| e.to_string())?;
    Ok(cursor.into_inner())
}

fn restore_table(pool: &DbPool, table: &str, rows: &[Value]) -> Result<usize, String> {
    let conn = pool.get().map_err(|e| e.to_string())?;
    conn.execute(&format!("DELETE FROM {}", table), [])
        .map_err(|e| e.to_string())?;

    let mut inserted = 0usize;
    for row in rows {
        let obj = match row.as_object() {
            Some(o) => o,
            None => continue,
        };

        // Column names come from our own dumps, but validate anyway so a
        // hand-edited archive cannot smuggle SQL in.
        let columns: Vec<&String> = obj
            .keys()
            .filter(|k| k.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
            .collect();
        if columns.is_empty() {
            continue;
        }

        let placeholders: Vec<String> =
            (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            table,
            columns
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            placeholders.join(", "),
        );

        let values: Vec<SqlValue> = columns.iter().map(|c| json_to_sql(&obj[*c])).collect();
        let params: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(|v| v as &dyn rusqlite::types::ToSql).collect();

        conn.execute(&sql, params.as_slice())
            .map_err(|e| format!("{}: {}", table, e))?;
        inserted += 1;
    }
    Ok(inserted)
}

/// Restore a backup archive produced by `create_backup`. Each known table
/// present in the archive is wiped and repopulated; unknown entries are
/// ignored. Children are cleared before parents so foreign keys hold
/// throughout.
pub fn restore_backup(pool: &DbPool, bytes: &[u8]) -> Result<RestoreSummary, String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;

    let mut dumps: Vec<(usize, Vec<Value>)> = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| e.to_string())?;
        let name = entry.name().to_string();
        let table = name.trim_end_matches(".json");
        let position = match BACKUP_TABLES.iter().position(|t| *t == table) {
            Some(p) => p,
            None => continue,
        };

        let mut body = String::new();
        entry
            .read_to_string(&mut body)
            .map_err(|e| e.to_string())?;
        let rows: Vec<Value> = serde_json::from_str(&body).map_err(|e| format!("{}: {}", name, e))?;
        dumps.push((position, rows));
    }

    if dumps.is_empty() {
        return Err("archive contains no recognized tables".to_string());
    }

    // Clear in reverse dependency order
    dumps.sort_by_key(|(pos, _)| *pos);
    {
        let conn = pool.get().map_err(|e| e.to_string())?;
        for (pos, _) in dumps.iter().rev() {
            conn.execute(&format!("DELETE FROM {}", BACKUP_TABLES[*pos]), [])
                .map_err(|e| e.to_string())?;
        }
    }

    let mut total_rows = 0usize;
    for (pos, rows) in &dumps {
        total_rows += restore_table(pool, BACKUP_TABLES[*pos], rows)?;
    }

    Ok(RestoreSummary {
        tables: dumps.len(),
        rows: total_rows,
    })
}
