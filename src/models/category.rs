use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub r#type: String,
    pub description: Option<String>,
    pub color: String,
    pub ord: i64,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    pub slug: String,
    pub r#type: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub ord: Option<i64>,
}

impl Category {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Category {
            id: row.get("id")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
            r#type: row.get("type")?,
            description: row.get("description")?,
            color: row.get("color")?,
            ord: row.get("ord")?,
            is_active: row.get("is_active")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM categories WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM categories WHERE slug = ?1",
            params![slug],
            Self::from_row,
        )
        .ok()
    }

    /// Active categories of one type, in display order.
    pub fn list(pool: &DbPool, type_filter: &str) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM categories WHERE type = ?1 AND is_active = 1 ORDER BY ord, name",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![type_filter], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn list_all(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM categories ORDER BY type, ord, name") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, form: &CategoryForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let slug = super::slug_or(&form.slug, &form.name);
        conn.execute(
            "INSERT INTO categories (name, slug, type, description, color, ord)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                form.name,
                slug,
                form.r#type,
                form.description,
                form.color.as_deref().unwrap_or("#0ea5e9"),
                form.ord.unwrap_or(0),
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, form: &CategoryForm) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let slug = super::slug_or(&form.slug, &form.name);
        conn.execute(
            "UPDATE categories
             SET name = ?1, slug = ?2, type = ?3, description = ?4, color = ?5, ord = ?6,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?7",
            params![
                form.name,
                slug,
                form.r#type,
                form.description,
                form.color.as_deref().unwrap_or("#0ea5e9"),
                form.ord.unwrap_or(0),
                id,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM categories WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
