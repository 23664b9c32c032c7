use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub ord: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobPosition {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub department_id: i64,
    pub job_type: String,
    pub experience_level: String,
    pub location: String,
    pub remote_allowed: bool,
    pub summary: String,
    pub description: String,
    pub responsibilities: String,
    pub requirements: String,
    pub benefits: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: String,
    pub application_deadline: Option<NaiveDateTime>,
    pub status: String,
    pub is_featured: bool,
    pub is_urgent: bool,
    pub views_count: i64,
    pub applications_count: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct JobPositionForm {
    pub title: String,
    pub slug: String,
    pub department_id: i64,
    pub job_type: String,
    pub experience_level: String,
    pub location: String,
    pub remote_allowed: bool,
    pub summary: String,
    pub description: String,
    pub responsibilities: String,
    pub requirements: String,
    pub benefits: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    pub application_deadline: Option<String>,
    pub status: String,
    pub is_featured: bool,
    pub is_urgent: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobApplication {
    pub id: i64,
    pub position_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cover_letter: String,
    pub resume: Option<String>,
    pub portfolio_url: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct JobApplicationForm {
    pub position_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cover_letter: String,
    /// Storage name of the uploaded resume, already persisted by the caller.
    pub resume: Option<String>,
    pub portfolio_url: Option<String>,
}

impl Department {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Department {
            id: row.get("id")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
            description: row.get("description")?,
            is_active: row.get("is_active")?,
            ord: row.get("ord")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM departments WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn
            .prepare("SELECT * FROM departments WHERE is_active = 1 ORDER BY ord, name")
        {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, name: &str, description: Option<&str>) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let slug = slug::slugify(name);
        conn.execute(
            "INSERT INTO departments (name, slug, description) VALUES (?1, ?2, ?3)",
            params![name, slug, description],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM departments WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

impl JobPosition {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(JobPosition {
            id: row.get("id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            department_id: row.get("department_id")?,
            job_type: row.get("job_type")?,
            experience_level: row.get("experience_level")?,
            location: row.get("location")?,
            remote_allowed: row.get("remote_allowed")?,
            summary: row.get("summary")?,
            description: row.get("description")?,
            responsibilities: row.get("responsibilities")?,
            requirements: row.get("requirements")?,
            benefits: row.get("benefits")?,
            salary_min: row.get("salary_min")?,
            salary_max: row.get("salary_max")?,
            salary_currency: row.get("salary_currency")?,
            application_deadline: row.get("application_deadline")?,
            status: row.get("status")?,
            is_featured: row.get("is_featured")?,
            is_urgent: row.get("is_urgent")?,
            views_count: row.get("views_count")?,
            applications_count: row.get("applications_count")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM job_positions WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM job_positions WHERE slug = ?1",
            params![slug],
            Self::from_row,
        )
        .ok()
    }

    /// Open positions, featured and urgent first.
    pub fn active(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM job_positions WHERE status = 'active'
             ORDER BY is_featured DESC, is_urgent DESC, created_at DESC",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn list(pool: &DbPool, status: Option<&str>, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let result = match status {
            Some(s) => {
                let mut stmt = match conn.prepare(
                    "SELECT * FROM job_positions WHERE status = ?1
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
                    "SELECT * FROM job_positions ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
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
                    "SELECT COUNT(*) FROM job_positions WHERE status = ?1",
                    params![s],
                    |row| row.get(0),
                )
                .unwrap_or(0),
            None => conn
                .query_row("SELECT COUNT(*) FROM job_positions", [], |row| row.get(0))
                .unwrap_or(0),
        }
    }

    pub fn create(pool: &DbPool, form: &JobPositionForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let slug = super::slug_or(&form.slug, &form.title);
        let deadline: Option<NaiveDateTime> = form
            .application_deadline
            .as_ref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").ok());
        conn.execute(
            "INSERT INTO job_positions (title, slug, department_id, job_type, experience_level,
                                        location, remote_allowed, summary, description,
                                        responsibilities, requirements, benefits, salary_min,
                                        salary_max, salary_currency, application_deadline,
                                        status, is_featured, is_urgent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
            params![
                form.title,
                slug,
                form.department_id,
                form.job_type,
                form.experience_level,
                form.location,
                form.remote_allowed,
                form.summary,
                form.description,
                form.responsibilities,
                form.requirements,
                form.benefits,
                form.salary_min,
                form.salary_max,
                form.salary_currency.as_deref().unwrap_or("GHS"),
                deadline,
                form.status,
                form.is_featured,
                form.is_urgent,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, form: &JobPositionForm) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let slug = super::slug_or(&form.slug, &form.title);
        let deadline: Option<NaiveDateTime> = form
            .application_deadline
            .as_ref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").ok());
        conn.execute(
            "UPDATE job_positions
             SET title = ?1, slug = ?2, department_id = ?3, job_type = ?4,
                 experience_level = ?5, location = ?6, remote_allowed = ?7, summary = ?8,
                 description = ?9, responsibilities = ?10, requirements = ?11, benefits = ?12,
                 salary_min = ?13, salary_max = ?14, salary_currency = ?15,
                 application_deadline = ?16, status = ?17, is_featured = ?18, is_urgent = ?19,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?20",
            params![
                form.title,
                slug,
                form.department_id,
                form.job_type,
                form.experience_level,
                form.location,
                form.remote_allowed,
                form.summary,
                form.description,
                form.responsibilities,
                form.requirements,
                form.benefits,
                form.salary_min,
                form.salary_max,
                form.salary_currency.as_deref().unwrap_or("GHS"),
                deadline,
                form.status,
                form.is_featured,
                form.is_urgent,
                id,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn update_status(pool: &DbPool, id: i64, status: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE job_positions SET status = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![status, id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "DELETE FROM job_applications WHERE position_id = ?1",
            params![id],
        )
        .map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM job_positions WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn increment_views(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE job_positions SET views_count = views_count + 1 WHERE id = ?1",
            params![id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }
}

impl JobApplication {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(JobApplication {
            id: row.get("id")?,
            position_id: row.get("position_id")?,
            full_name: row.get("full_name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            cover_letter: row.get("cover_letter")?,
            resume: row.get("resume")?,
            portfolio_url: row.get("portfolio_url")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM job_applications WHERE id = ?1",
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
                    "SELECT * FROM job_applications WHERE status = ?1
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
                    "SELECT * FROM job_applications ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
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

    pub fn for_position(pool: &DbPool, position_id: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM job_applications WHERE position_id = ?1 ORDER BY created_at DESC",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![position_id], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool, status: Option<&str>) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        match status {
            Some(s) => conn
                .query_row(
                    "SELECT COUNT(*) FROM job_applications WHERE status = ?1",
                    params![s],
                    |row| row.get(0),
                )
                .unwrap_or(0),
            None => conn
                .query_row("SELECT COUNT(*) FROM job_applications", [], |row| row.get(0))
                .unwrap_or(0),
        }
    }

    /// Store an application and bump the position's applications counter in
    /// the same connection.
    pub fn create(pool: &DbPool, form: &JobApplicationForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO job_applications (position_id, full_name, email, phone, cover_letter,
                                           resume, portfolio_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                form.position_id,
                form.full_name,
                form.email,
                form.phone,
                form.cover_letter,
                form.resume,
                form.portfolio_url,
            ],
        )
        .map_err(|e| e.to_string())?;
        let id = conn.last_insert_rowid();
        conn.execute(
            "UPDATE job_positions SET applications_count = applications_count + 1 WHERE id = ?1",
            params![form.position_id],
        )
        .map_err(|e| e.to_string())?;
        Ok(id)
    }

    pub fn update_status(pool: &DbPool, id: i64, status: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE job_applications SET status = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![status, id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM job_applications WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
