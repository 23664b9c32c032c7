use rocket::form::Form;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::models::career::{Department, JobApplication, JobPosition, JobPositionForm};
use crate::models::settings::Setting;

use super::Storage;

const APPLICATION_STATUSES: &[&str] = &["new", "reviewing", "shortlisted", "rejected", "hired"];
const POSITION_STATUSES: &[&str] = &["draft", "active", "paused", "closed", "filled"];

// ── Positions ──────────────────────────────────────────

#[get("/careers?<status>&<page>")]
pub fn positions_list(
    _admin: AdminUser,
    pool: &State<DbPool>,
    status: Option<String>,
    page: Option<i64>,
) -> Template {
    let per_page = 20i64;
    let current_page = page.unwrap_or(1).max(1);
    let offset = (current_page - 1) * per_page;

    let positions = JobPosition::list(pool, status.as_deref(), per_page, offset);
    let total = JobPosition::count(pool, status.as_deref());
    let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

    let rows: Vec<serde_json::Value> = positions
        .iter()
        .map(|p| {
            json!({
                "position": p,
                "department": Department::find_by_id(pool, p.department_id),
            })
        })
        .collect();

    let context = json!({
        "page_title": "Job Positions",
        "positions": rows,
        "status_filter": status,
        "statuses": POSITION_STATUSES,
        "total": total,
        "current_page": current_page,
        "total_pages": total_pages,
        "settings": Setting::all(pool),
    });
    Template::render("admin/careers/list", &context)
}

#[get("/careers/new")]
pub fn position_new_page(_admin: AdminUser, pool: &State<DbPool>) -> Template {
    let context = json!({
        "page_title": "New Position",
        "departments": Department::list(pool),
        "statuses": POSITION_STATUSES,
        "settings": Setting::all(pool),
    });
    Template::render("admin/careers/form", &context)
}

#[derive(FromForm)]
pub struct PositionFormData {
    pub title: String,
    pub slug: Option<String>,
    pub department_id: i64,
    pub job_type: String,
    pub experience_level: String,
    pub location: String,
    pub remote_allowed: Option<bool>,
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
    pub is_featured: Option<bool>,
    pub is_urgent: Option<bool>,
}

fn build_form(form: &PositionFormData) -> JobPositionForm {
    JobPositionForm {
        title: form.title.clone(),
        slug: form.slug.clone().unwrap_or_default(),
        department_id: form.department_id,
        job_type: form.job_type.clone(),
        experience_level: form.experience_level.clone(),
        location: form.location.clone(),
        remote_allowed: form.remote_allowed.unwrap_or(false),
        summary: form.summary.clone(),
        description: form.description.clone(),
        responsibilities: form.responsibilities.clone(),
        requirements: form.requirements.clone(),
        benefits: form.benefits.clone(),
        salary_min: form.salary_min,
        salary_max: form.salary_max,
        salary_currency: form.salary_currency.clone(),
        application_deadline: form.application_deadline.clone().filter(|s| !s.is_empty()),
        status: form.status.clone(),
        is_featured: form.is_featured.unwrap_or(false),
        is_urgent: form.is_urgent.unwrap_or(false),
    }
}

#[post("/careers/new", data = "<form>")]
pub fn position_create(
    _admin: AdminUser,
    pool: &State<DbPool>,
    form: Form<PositionFormData>,
) -> Redirect {
    match JobPosition::create(pool, &build_form(&form)) {
        Ok(id) => Redirect::to(format!("/my-admin/careers/{}/edit", id)),
        Err(e) => {
            log::error!("Failed to create position: {}", e);
            Redirect::to("/my-admin/careers/new?error=save-failed")
        }
    }
}

#[get("/careers/<id>/edit")]
pub fn position_edit_page(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> Option<Template> {
    let position = JobPosition::find_by_id(pool, id)?;
    let context = json!({
        "page_title": "Edit Position",
        "departments": Department::list(pool),
        "statuses": POSITION_STATUSES,
        "applications": JobApplication::for_position(pool, id),
        "position": position,
        "settings": Setting::all(pool),
    });
    Some(Template::render("admin/careers/form", &context))
}

#[post("/careers/<id>/edit", data = "<form>")]
pub fn position_update(
    _admin: AdminUser,
    pool: &State<DbPool>,
    id: i64,
    form: Form<PositionFormData>,
) -> Redirect {
    match JobPosition::update(pool, id, &build_form(&form)) {
        Ok(_) => Redirect::to(format!("/my-admin/careers/{}/edit?saved=true", id)),
        Err(e) => {
            log::error!("Failed to update position {}: {}", id, e);
            Redirect::to(format!("/my-admin/careers/{}/edit?error=save-failed", id))
        }
    }
}

#[post("/careers/<id>/status", data = "<form>")]
pub fn position_set_status(
    _admin: AdminUser,
    pool: &State<DbPool>,
    id: i64,
    form: Form<StatusForm>,
) -> Redirect {
    if POSITION_STATUSES.contains(&form.status.as_str()) {
        if let Err(e) = JobPosition::update_status(pool, id, &form.status) {
            log::error!("Failed to set position {} status: {}", id, e);
        }
    }
    Redirect::to("/my-admin/careers")
}

#[post("/careers/<id>/delete")]
pub fn position_delete(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    id: i64,
) -> Redirect {
    // Applications (and their resumes) go with the position.
    for app in JobApplication::for_position(pool, id) {
        if let Some(resume) = &app.resume {
            if !storage.delete(resume) {
                log::warn!("Orphaned resume left on remote: {}", resume);
            }
        }
    }
    if let Err(e) = JobPosition::delete(pool, id) {
        log::error!("Failed to delete position {}: {}", id, e);
    }
    Redirect::to("/my-admin/careers")
}

// ── Departments ────────────────────────────────────────

#[derive(FromForm)]
pub struct DepartmentForm {
    pub name: String,
    pub description: Option<String>,
}

#[post("/careers/departments", data = "<form>")]
pub fn department_create(
    _admin: AdminUser,
    pool: &State<DbPool>,
    form: Form<DepartmentForm>,
) -> Redirect {
    if !form.name.trim().is_empty() {
        if let Err(e) = Department::create(pool, form.name.trim(), form.description.as_deref()) {
            log::error!("Failed to create department: {}", e);
        }
    }
    Redirect::to("/my-admin/careers")
}

// ── Applications ───────────────────────────────────────

#[derive(FromForm)]
pub struct StatusForm {
    pub status: String,
}

#[get("/applications?<status>&<page>")]
pub fn applications_list(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    status: Option<String>,
    page: Option<i64>,
) -> Template {
    let per_page = 25i64;
    let current_page = page.unwrap_or(1).max(1);
    let offset = (current_page - 1) * per_page;

    let applications = JobApplication::list(pool, status.as_deref(), per_page, offset);
    let total = JobApplication::count(pool, status.as_deref());
    let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

    let rows: Vec<serde_json::Value> = applications
        .iter()
        .map(|a| {
            json!({
                "application": a,
                "position": JobPosition::find_by_id(pool, a.position_id),
                "resume_url": a.resume.as_deref().and_then(|r| storage.url(r)),
            })
        })
        .collect();

    let context = json!({
        "page_title": "Applications",
        "applications": rows,
        "status_filter": status,
        "statuses": APPLICATION_STATUSES,
        "total": total,
        "current_page": current_page,
        "total_pages": total_pages,
        "settings": Setting::all(pool),
    });
    Template::render("admin/careers/applications", &context)
}

#[post("/applications/<id>/status", data = "<form>")]
pub fn application_set_status(
    _admin: AdminUser,
    pool: &State<DbPool>,
    id: i64,
    form: Form<StatusForm>,
) -> Redirect {
    if APPLICATION_STATUSES.contains(&form.status.as_str()) {
        if let Err(e) = JobApplication::update_status(pool, id, &form.status) {
            log::error!("Failed to set application {} status: {}", id, e);
        }
    }
    Redirect::to("/my-admin/applications")
}

#[post("/applications/<id>/delete")]
pub fn application_delete(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    id: i64,
) -> Redirect {
    if let Some(app) = JobApplication::find_by_id(pool, id) {
        if let Some(resume) = &app.resume {
            if !storage.delete(resume) {
                log::warn!("Orphaned resume left on remote: {}", resume);
            }
        }
        if let Err(e) = JobApplication::delete(pool, id) {
            log::error!("Failed to delete application {}: {}", id, e);
        }
    }
    Redirect::to("/my-admin/applications")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        positions_list,
        position_new_page,
        position_create,
        position_edit_page,
        position_update,
        position_set_status,
        position_delete,
        department_create,
        applications_list,
        application_set_status,
        application_delete,
    ]
}
