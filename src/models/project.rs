use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub description: String,
    pub client_name: Option<String>,
    pub location: String,
    pub category_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub area_sqft: Option<i64>,
    pub budget_range: Option<String>,
    pub featured_image: String,
    pub before_image: Option<String>,
    pub after_image: Option<String>,
    pub is_featured: bool,
    pub is_published: bool,
    pub ord: i64,
    pub views_count: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct ProjectForm {
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub description: String,
    pub client_name: Option<String>,
    pub location: String,
    pub category_id: Option<i64>,
    pub start_date: Option<String>,
    pub completion_date: Option<String>,
    pub area_sqft: Option<i64>,
    pub budget_range: Option<String>,
    pub featured_image: Option<String>,
    pub before_image: Option<String>,
    pub after_image: Option<String>,
    pub is_featured: bool,
    pub is_published: bool,
    pub ord: Option<i64>,
}

#[derive(Debug, Serialize, Clone)]
pub struct ProjectImage {
    pub id: i64,
    pub project_id: i64,
    pub image: String,
    pub caption: Option<String>,
    pub alt_text: Option<String>,
    pub ord: i64,
}

fn parse_date(s: &Option<String>) -> Option<NaiveDate> {
    s.as_ref()
        .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
}

impl Project {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Project {
            id: row.get("id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            short_description: row.get("short_description")?,
            description: row.get("description")?,
            client_name: row.get("client_name")?,
            location: row.get("location")?,
            category_id: row.get("category_id")?,
            start_date: row.get("start_date")?,
            completion_date: row.get("completion_date")?,
            area_sqft: row.get("area_sqft")?,
            budget_range: row.get("budget_range")?,
            featured_image: row.get("featured_image")?,
            before_image: row.get("before_image")?,
            after_image: row.get("after_image")?,
            is_featured: row.get("is_featured")?,
            is_published: row.get("is_published")?,
            ord: row.get("ord")?,
            views_count: row.get("views_count")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Lifecycle status derived from the two dates.
    pub fn status(&self) -> &'static str {
        if self.start_date.is_none() {
            "Planning"
        } else if self.completion_date.is_none() {
            "In Progress"
        } else {
            "Completed"
        }
    }

    pub fn has_before_after(&self) -> bool {
        self.before_image.is_some() && self.after_image.is_some()
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM projects WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM projects WHERE slug = ?1",
            params![slug],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool, published_only: bool, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let sql = if published_only {
            "SELECT * FROM projects WHERE is_published = 1
             ORDER BY is_featured DESC, ord, completion_date DESC, created_at DESC
             LIMIT ?1 OFFSET ?2"
        } else {
            "SELECT * FROM projects
             ORDER BY is_featured DESC, ord, completion_date DESC, created_at DESC
             LIMIT ?1 OFFSET ?2"
        };
        let mut stmt = match conn.prepare(sql) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![limit, offset], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn list_by_category(pool: &DbPool, category_id: i64, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM projects WHERE is_published = 1 AND category_id = ?1
             ORDER BY is_featured DESC, ord, created_at DESC LIMIT ?2 OFFSET ?3",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![category_id, limit, offset], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn featured(pool: &DbPool, limit: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM projects WHERE is_published = 1 AND is_featured = 1
             ORDER BY ord, created_at DESC LIMIT ?1",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![limit], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool, published_only: bool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        let sql = if published_only {
            "SELECT COUNT(*) FROM projects WHERE is_published = 1"
        } else {
            "SELECT COUNT(*) FROM projects"
        };
        conn.query_row(sql, [], |row| row.get(0)).unwrap_or(0)
    }

    pub fn create(pool: &DbPool, form: &ProjectForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let slug = super::slug_or(&form.slug, &form.title);
        conn.execute(
            "INSERT INTO projects (title, slug, short_description, description, client_name,
                                   location, category_id, start_date, completion_date, area_sqft,
                                   budget_range, featured_image, before_image, after_image,
                                   is_featured, is_published, ord)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                form.title,
                slug,
                form.short_description,
                form.description,
                form.client_name,
                form.location,
                form.category_id,
                parse_date(&form.start_date),
                parse_date(&form.completion_date),
                form.area_sqft,
                form.budget_range,
                form.featured_image.as_deref().unwrap_or(""),
                form.before_image,
                form.after_image,
                form.is_featured,
                form.is_published,
                form.ord.unwrap_or(0),
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, form: &ProjectForm) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let slug = super::slug_or(&form.slug, &form.title);
        conn.execute(
            "UPDATE projects
             SET title = ?1, slug = ?2, short_description = ?3, description = ?4,
                 client_name = ?5, location = ?6, category_id = ?7, start_date = ?8,
                 completion_date = ?9, area_sqft = ?10, budget_range = ?11,
                 featured_image = COALESCE(?12, featured_image),
                 before_image = COALESCE(?13, before_image),
                 after_image = COALESCE(?14, after_image),
                 is_featured = ?15, is_published = ?16, ord = ?17,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?18",
            params![
                form.title,
                slug,
                form.short_description,
                form.description,
                form.client_name,
                form.location,
                form.category_id,
                parse_date(&form.start_date),
                parse_date(&form.completion_date),
                form.area_sqft,
                form.budget_range,
                form.featured_image,
                form.before_image,
                form.after_image,
                form.is_featured,
                form.is_published,
                form.ord.unwrap_or(0),
                id,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM project_images WHERE project_id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM projects WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Atomic page-view bump; the arithmetic stays in SQL like the daily
    /// visitor counter's.
    pub fn increment_views(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE projects SET views_count = views_count + 1 WHERE id = ?1",
            params![id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }
}

impl ProjectImage {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ProjectImage {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            image: row.get("image")?,
            caption: row.get("caption")?,
            alt_text: row.get("alt_text")?,
            ord: row.get("ord")?,
        })
    }

    pub fn for_project(pool: &DbPool, project_id: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn
            .prepare("SELECT * FROM project_images WHERE project_id = ?1 ORDER BY ord, id")
        {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![project_id], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn add(
        pool: &DbPool,
        project_id: i64,
        image: &str,
        caption: Option<&str>,
        alt_text: Option<&str>,
    ) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO project_images (project_id, image, caption, alt_text)
             VALUES (?1, ?2, ?3, ?4)",
            params![project_id, image, caption, alt_text],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM project_images WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM project_images WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
