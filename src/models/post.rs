use chrono::NaiveDateTime;
use pulldown_cmark::{html, Options, Parser};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content_md: String,
    pub content_html: String,
    pub featured_image: Option<String>,
    pub author: Option<String>,
    pub category_id: Option<i64>,
    pub status: String,
    pub published_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content_md: String,
    pub featured_image: Option<String>,
    pub author: Option<String>,
    pub category_id: Option<i64>,
    pub status: String,
    pub published_at: Option<String>,
}

/// Markdown body to HTML, rendered once at save time.
pub fn render_markdown(md: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(md, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

impl Post {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Post {
            id: row.get("id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            excerpt: row.get("excerpt")?,
            content_md: row.get("content_md")?,
            content_html: row.get("content_html")?,
            featured_image: row.get("featured_image")?,
            author: row.get("author")?,
            category_id: row.get("category_id")?,
            status: row.get("status")?,
            published_at: row.get("published_at")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM posts WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM posts WHERE slug = ?1",
            params![slug],
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
                    "SELECT * FROM posts WHERE status = ?1
                     ORDER BY published_at DESC, created_at DESC LIMIT ?2 OFFSET ?3",
                ) {
                    Ok(st) => st,
                    Err(_) => return vec![],
                };
                stmt.query_map(params![s, limit, offset], Self::from_row)
                    .map(|rows| rows.filter_map(|r| r.ok()).collect())
            }
            None => {
                let mut stmt = match conn.prepare(
                    "SELECT * FROM posts ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
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

    pub fn published(pool: &DbPool, limit: i64, offset: i64) -> Vec<Self> {
        Self::list(pool, Some("published"), limit, offset)
    }

    pub fn count(pool: &DbPool, status: Option<&str>) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        match status {
            Some(s) => conn
                .query_row(
                    "SELECT COUNT(*) FROM posts WHERE status = ?1",
                    params![s],
                    |row| row.get(0),
                )
                .unwrap_or(0),
            None => conn
                .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
                .unwrap_or(0),
        }
    }

    pub fn create(pool: &DbPool, form: &PostForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let slug = super::slug_or(&form.slug, &form.title);
        let content_html = render_markdown(&form.content_md);
        let published_at: Option<NaiveDateTime> = form
            .published_at
            .as_ref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").ok());

        conn.execute(
            "INSERT INTO posts (title, slug, excerpt, content_md, content_html, featured_image,
                                author, category_id, status, published_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                form.title,
                slug,
                form.excerpt,
                form.content_md,
                content_html,
                form.featured_image,
                form.author,
                form.category_id,
                form.status,
                published_at,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, form: &PostForm) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let slug = super::slug_or(&form.slug, &form.title);
        let content_html = render_markdown(&form.content_md);
        let published_at: Option<NaiveDateTime> = form
            .published_at
            .as_ref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").ok());

        conn.execute(
            "UPDATE posts
             SET title = ?1, slug = ?2, excerpt = ?3, content_md = ?4, content_html = ?5,
                 featured_image = COALESCE(?6, featured_image), author = ?7, category_id = ?8,
                 status = ?9, published_at = ?10, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?11",
            params![
                form.title,
                slug,
                form.excerpt,
                form.content_md,
                content_html,
                form.featured_image,
                form.author,
                form.category_id,
                form.status,
                published_at,
                id,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM posts WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
