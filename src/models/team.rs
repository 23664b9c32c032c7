use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TeamMember {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub bio: Option<String>,
    pub photo: Option<String>,
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    pub ord: i64,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct TeamMemberForm {
    pub name: String,
    pub role: String,
    pub bio: Option<String>,
    pub photo: Option<String>,
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    pub ord: Option<i64>,
    pub is_active: bool,
}

impl TeamMember {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(TeamMember {
            id: row.get("id")?,
            name: row.get("name")?,
            role: row.get("role")?,
            bio: row.get("bio")?,
            photo: row.get("photo")?,
            email: row.get("email")?,
            linkedin_url: row.get("linkedin_url")?,
            ord: row.get("ord")?,
            is_active: row.get("is_active")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM team_members WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn active(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn
            .prepare("SELECT * FROM team_members WHERE is_active = 1 ORDER BY ord, name")
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
        let mut stmt = match conn.prepare("SELECT * FROM team_members ORDER BY ord, name") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, form: &TeamMemberForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO team_members (name, role, bio, photo, email, linkedin_url, ord, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                form.name,
                form.role,
                form.bio,
                form.photo,
                form.email,
                form.linkedin_url,
                form.ord.unwrap_or(0),
                form.is_active,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, form: &TeamMemberForm) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE team_members
             SET name = ?1, role = ?2, bio = ?3, photo = COALESCE(?4, photo), email = ?5,
                 linkedin_url = ?6, ord = ?7, is_active = ?8, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?9",
            params![
                form.name,
                form.role,
                form.bio,
                form.photo,
                form.email,
                form.linkedin_url,
                form.ord.unwrap_or(0),
                form.is_active,
                id,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM team_members WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
