use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Inquiry {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub inquiry_type: String,
    pub status: String,
    pub ip_hash: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct InquiryForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub inquiry_type: Option<String>,
}

impl Inquiry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Inquiry {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            subject: row.get("subject")?,
            message: row.get("message")?,
            inquiry_type: row.get("inquiry_type")?,
            status: row.get("status")?,
            ip_hash: row.get("ip_hash")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM inquiries WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool, status: Option<&str>, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let result = match status {
            Some(s) => {
                let mut stmt = match conn.prepare(
                    "SELECT * FROM inquiries WHERE status = ?1
                     ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
                ) {
                    Ok(st) => st,
                    Err(_) => return vec![],
                };
                stmt.query_map(params![s, limit, offset], Self::from_row)
                    .map(|rows| rows.filter_map(|r| r.ok()).collect())
            }
            None => {
                let mut stmt = match conn.prepare(
                    "SELECT * FROM inquiries ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                ) {
                    Ok(st) => st,
                    Err(_) => return vec![],
                };
                stmt.query_map(params![limit, offset], Self::from_row)
                    .map(|rows| rows.filter_map(|r| r.ok()).collect())
            }
        };
        result.unwrap_or_default()
    }

    pub fn count(pool: &DbPool, status: Option<&str>) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        match status {
            Some(s) => conn
                .query_row(
                    "SELECT COUNT(*) FROM inquiries WHERE status = ?1",
                    params![s],
                    |row| row.get(0),
                )
                .unwrap_or(0),
            None => conn
                .query_row("SELECT COUNT(*) FROM inquiries", [], |row| row.get(0))
                .unwrap_or(0),
        }
    }

    pub fn create(pool: &DbPool, form: &InquiryForm, ip_hash: Option<&str>) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO inquiries (name, email, phone, subject, message, inquiry_type, ip_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                form.name,
                form.email,
                form.phone,
                form.subject,
                form.message,
                form.inquiry_type.as_deref().unwrap_or("general"),
                ip_hash,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_status(pool: &DbPool, id: i64, status: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE inquiries SET status = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![status, id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM inquiries WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
