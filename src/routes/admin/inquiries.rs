use rocket::form::Form;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::models::inquiry::Inquiry;
use crate::models::settings::Setting;

const INQUIRY_STATUSES: &[&str] = &["new", "in_progress", "resolved"];

#[get("/inquiries?<status>&<page>")]
pub fn list(
    _admin: AdminUser,
    pool: &State<DbPool>,
    status: Option<String>,
    page: Option<i64>,
) -> Template {
    let per_page = 25i64;
    let current_page = page.unwrap_or(1).max(1);
    let offset = (current_page - 1) * per_page;

    let inquiries = Inquiry::list(pool, status.as_deref(), per_page, offset);
    let total = Inquiry::count(pool, status.as_deref());
    let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

    let context = json!({
        "page_title": "Inquiries",
        "inquiries": inquiries,
        "status_filter": status,
        "statuses": INQUIRY_STATUSES,
        "total": total,
        "current_page": current_page,
        "total_pages": total_pages,
        "settings": Setting::all(pool),
    });
    Template::render("admin/inquiries/list", &context)
}

#[derive(FromForm)]
pub struct StatusForm {
    pub status: String,
}

#[post("/inquiries/<id>/status", data = "<form>")]
pub fn set_status(
    _admin: AdminUser,
    pool: &State<DbPool>,
    id: i64,
    form: Form<StatusForm>,
) -> Redirect {
    if INQUIRY_STATUSES.contains(&form.status.as_str()) {
        if let Err(e) = Inquiry::update_status(pool, id, &form.status) {
            log::error!("Failed to set inquiry {} status: {}", id, e);
        }
    }
    Redirect::to("/my-admin/inquiries")
}

#[post("/inquiries/<id>/delete")]
pub fn delete(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> Redirect {
    if let Err(e) = Inquiry::delete(pool, id) {
        log::error!("Failed to delete inquiry {}: {}", id, e);
    }
    Redirect::to("/my-admin/inquiries")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, set_status, delete]
}
