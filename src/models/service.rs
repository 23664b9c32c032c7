use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Service {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub category_id: Option<i64>,
    pub icon: Option<String>,
    pub summary: String,
    pub description: String,
    pub featured_image: Option<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub ord: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct ServiceForm {
    pub title: String,
    pub slug: String,
    pub category_id: Option<i64>,
    pub icon: Option<String>,
    pub summary: String,
    pub description: String,
    pub featured_image: Option<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub ord: Option<i64>,
}

impl Service {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Service {
            id: row.get("id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            category_id: row.get("category_id")?,
            icon: row.get("icon")?,
            summary: row.get("summary")?,
            description: row.get("description")?,
            featured_image: row.get("featured_image")?,
            is_featured: row.get("is_featured")?,
            is_active: row.get("is_active")?,
            ord: row.get("ord")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM services WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM services WHERE slug = ?1",
            params![slug],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool, active_only: bool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let sql = if active_only {
            "SELECT * FROM services WHERE is_active = 1 ORDER BY ord, title"
        } else {
            "SELECT * FROM services ORDER BY ord, title"
        };
        let mut stmt = match conn.prepare(sql) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn featured(pool: &DbPool, limit: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM services WHERE is_active = 1 AND is_featured = 1
             ORDER BY ord, title LIMIT ?1",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![limit], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool, active_only: bool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        let sql = if active_only {
            "SELECT COUNT(*) FROM services WHERE is_active = 1"
        } else {
            "SELECT COUNT(*) FROM services"
        };
        conn.query_row(sql, [], |row| row.get(0)).unwrap_or(0)
    }

    pub fn create(pool: &DbPool, form: &ServiceForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let slug = super::slug_or(&form.slug, &form.title);
        conn.execute(
            "INSERT INTO services (title, slug, category_id, icon, summary, description,
                                   featured_image, is_featured, is_active, ord)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                form.title,
                slug,
                form.category_id,
                form.icon,
                form.summary,
                form.description,
                form.featured_image,
                form.is_featured,
                form.is_active,
                form.ord.unwrap_or(0),
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, form: &ServiceForm) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let slug = super::slug_or(&form.slug, &form.title);
        conn.execute(
            "UPDATE services
             SET title = ?1, slug = ?2, category_id = ?3, icon = ?4, summary = ?5,
                 description = ?6, featured_image = COALESCE(?7, featured_image),
                 is_featured = ?8, is_active = ?9, ord = ?10, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?11",
            params![
                form.title,
                slug,
                form.category_id,
                form.icon,
                form.summary,
                form.description,
                form.featured_image,
                form.is_featured,
                form.is_active,
                form.ord.unwrap_or(0),
                id,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM services WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
