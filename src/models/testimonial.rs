use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Testimonial {
    pub id: i64,
    pub client_name: String,
    pub company: Option<String>,
    pub role: Option<String>,
    pub quote: String,
    pub rating: i64,
    pub photo: Option<String>,
    pub is_approved: bool,
    pub ord: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct TestimonialForm {
    pub client_name: String,
    pub company: Option<String>,
    pub role: Option<String>,
    pub quote: String,
    pub rating: i64,
    pub photo: Option<String>,
    pub is_approved: bool,
    pub ord: Option<i64>,
}

impl Testimonial {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Testimonial {
            id: row.get("id")?,
            client_name: row.get("client_name")?,
            company: row.get("company")?,
            role: row.get("role")?,
            quote: row.get("quote")?,
            rating: row.get("rating")?,
            photo: row.get("photo")?,
            is_approved: row.get("is_approved")?,
            ord: row.get("ord")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM testimonials WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn approved(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn
            .prepare("SELECT * FROM testimonials WHERE is_approved = 1 ORDER BY ord, id")
        {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM testimonials ORDER BY ord, id") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, form: &TestimonialForm) -> Result<i64, String> {
        // Ratings live on a 1..=5 scale
        let rating = form.rating.clamp(1, 5);
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO testimonials (client_name, company, role, quote, rating, photo,
                                       is_approved, ord)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                form.client_name,
                form.company,
                form.role,
                form.quote,
                rating,
                form.photo,
                form.is_approved,
                form.ord.unwrap_or(0),
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, form: &TestimonialForm) -> Result<(), String> {
        let rating = form.rating.clamp(1, 5);
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE testimonials
             SET client_name = ?1, company = ?2, role = ?3, quote = ?4, rating = ?5,
                 photo = COALESCE(?6, photo), is_approved = ?7, ord = ?8,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?9",
            params![
                form.client_name,
                form.company,
                form.role,
                form.quote,
                rating,
                form.photo,
                form.is_approved,
                form.ord.unwrap_or(0),
                id,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM testimonials WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
