use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::response::Redirect;
use rocket::serde::json::Json;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::{json, Value};

use crate::auth::AdminUser;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::images;
use crate::models::career::{JobApplication, JobPosition};
use crate::models::inquiry::Inquiry;
use crate::models::metrics::{SystemMetric, VISITORS};
use crate::models::post::Post;
use crate::models::project::Project;
use crate::models::service::Service;
use crate::models::settings::Setting;
use crate::storage::AssetStorage;

use super::{read_upload, upload_basename};

pub mod careers;
pub mod categories;
pub mod inquiries;
pub mod posts;
pub mod projects;
pub mod services;
pub mod team;
pub mod testimonials;
pub mod tools;

pub(crate) type Storage = Arc<dyn AssetStorage>;

/// Read a multipart upload and persist it through the storage backend.
/// `prefix` is folded into the filename so folder classification routes the
/// asset correctly (e.g. "profile", "service").
pub(crate) async fn store_upload(
    file: &mut TempFile<'_>,
    prefix: &str,
    storage: &dyn AssetStorage,
) -> Result<String, String> {
    let (original, bytes) = read_upload(file).await?;
    let name = if prefix.is_empty() {
        upload_basename(&original)
    } else {
        format!("{}_{}", prefix, upload_basename(&original))
    };
    storage.save(&name, &bytes).map_err(|e| e.to_string())
}

/// Same as `store_upload`, but bounds image dimensions first.
pub(crate) async fn store_image_upload(
    file: &mut TempFile<'_>,
    prefix: &str,
    max: (u32, u32),
    storage: &dyn AssetStorage,
) -> Result<String, String> {
    let (original, bytes) = read_upload(file).await?;
    let bytes = images::resize_to_fit(&bytes, max);
    let name = if prefix.is_empty() {
        upload_basename(&original)
    } else {
        format!("{}_{}", prefix, upload_basename(&original))
    };
    storage.save(&name, &bytes).map_err(|e| e.to_string())
}

// ── Dashboard ──────────────────────────────────────────

#[get("/")]
pub fn dashboard(
    _admin: AdminUser,
    pool: &State<DbPool>,
    config: &State<AppConfig>,
) -> Template {
    let today = crate::analytics::today_in(config.timezone());

    let visitors_today = SystemMetric::get(pool, VISITORS, today);
    let visitors_7d = SystemMetric::sum_range(pool, VISITORS, today - Duration::days(6), today);
    let visitors_30d = SystemMetric::sum_range(pool, VISITORS, today - Duration::days(29), today);
    let visitors_365d =
        SystemMetric::sum_range(pool, VISITORS, today - Duration::days(364), today);
    let visitors_series =
        SystemMetric::series(pool, VISITORS, today - Duration::days(13), today);

    let context = json!({
        "page_title": "Dashboard",
        "visitors_today": visitors_today,
        "visitors_7d": visitors_7d,
        "visitors_30d": visitors_30d,
        "visitors_365d": visitors_365d,
        "visitors_series": visitors_series,
        "projects_count": Project::count(pool, false),
        "services_count": Service::count(pool, false),
        "posts_count": Post::count(pool, None),
        "open_positions": JobPosition::count(pool, Some("active")),
        "new_applications": JobApplication::count(pool, Some("new")),
        "new_inquiries": Inquiry::count(pool, Some("new")),
        "recent_projects": Project::list(pool, false, 5, 0),
        "recent_inquiries": Inquiry::list(pool, None, 5, 0),
        "recent_applications": JobApplication::list(pool, None, 5, 0),
        "settings": Setting::all(pool),
    });

    Template::render("admin/dashboard", &context)
}

/// 180-day series for the dashboard's interactive range picker.
#[get("/api/visitors?<days>")]
pub fn api_visitors(
    _admin: AdminUser,
    pool: &State<DbPool>,
    config: &State<AppConfig>,
    days: Option<i64>,
) -> Json<Value> {
    let days = days.unwrap_or(180).clamp(1, 365);
    let today = crate::analytics::today_in(config.timezone());
    let series = SystemMetric::series(pool, VISITORS, today - Duration::days(days - 1), today);
    Json(json!({ "series": series }))
}

// ── Site settings ──────────────────────────────────────

/// Settings keys the admin form may write. Everything else (password hash,
/// internal flags) is managed elsewhere.
const EDITABLE_SETTINGS: &[&str] = &[
    "site_name",
    "site_tagline",
    "site_description",
    "phone_primary",
    "phone_secondary",
    "email_primary",
    "email_secondary",
    "address_line_1",
    "address_line_2",
    "city",
    "region",
    "business_hours",
    "latitude",
    "longitude",
    "facebook_url",
    "twitter_url",
    "instagram_url",
    "linkedin_url",
    "youtube_url",
    "hero_title",
    "hero_subtitle",
    "get_in_touch_text",
    "blog_posts_per_page",
    "projects_per_page",
    "show_blog_in_top_nav",
    "images_max_upload_mb",
    "session_expiry_hours",
];

#[get("/settings?<saved>&<error>")]
pub fn settings_page(
    _admin: AdminUser,
    pool: &State<DbPool>,
    saved: Option<bool>,
    error: Option<String>,
) -> Template {
    let context = json!({
        "page_title": "Site Settings",
        "settings": Setting::all(pool),
        "saved": saved.unwrap_or(false),
        "error": error,
    });
    Template::render("admin/settings", &context)
}

#[post("/settings", data = "<form>")]
pub fn settings_save(
    _admin: AdminUser,
    pool: &State<DbPool>,
    form: Form<HashMap<String, String>>,
) -> Redirect {
    let updates: HashMap<String, String> = form
        .iter()
        .filter(|(k, _)| EDITABLE_SETTINGS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if let Err(e) = Setting::set_many(pool, &updates) {
        log::error!("Failed to save settings: {}", e);
        return Redirect::to("/my-admin/settings?error=save-failed");
    }
    Redirect::to("/my-admin/settings?saved=true")
}

#[derive(FromForm)]
pub struct BrandingUploadForm<'f> {
    pub kind: String,
    pub file: TempFile<'f>,
}

/// Logo / favicon / hero background upload. Images are bounded before they
/// go to the storage backend; the stored name lands in settings.
#[post("/settings/branding", data = "<form>")]
pub async fn settings_branding_upload(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    mut form: Form<BrandingUploadForm<'_>>,
) -> Redirect {
    let kind = form.kind.clone();
    let (key, max) = match kind.as_str() {
        "logo" => ("site_logo", images::LOGO_MAX),
        "favicon" => ("site_favicon", images::FAVICON_MAX),
        "hero" => ("hero_background", images::HERO_MAX),
        _ => return Redirect::to("/my-admin/settings?error=unknown-kind"),
    };

    match store_image_upload(&mut form.file, &kind, max, &***storage).await {
        Ok(stored) => {
            let previous = Setting::get(pool, key).unwrap_or_default();
            if let Err(e) = Setting::set(pool, key, &stored) {
                log::error!("Failed to record {}: {}", key, e);
                return Redirect::to("/my-admin/settings?error=save-failed");
            }
            if !previous.is_empty() && !storage.delete(&previous) {
                log::warn!("Orphaned {} asset left on remote: {}", key, previous);
            }
            Redirect::to("/my-admin/settings?saved=true")
        }
        Err(e) => {
            log::error!("Branding upload failed: {}", e);
            Redirect::to("/my-admin/settings?error=upload-failed")
        }
    }
}

// ── Editor image upload (JSON API) ─────────────────────

#[derive(FromForm)]
pub struct ImageUploadForm<'f> {
    pub file: TempFile<'f>,
}

#[post("/upload/image", data = "<form>")]
pub async fn upload_image(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    mut form: Form<ImageUploadForm<'_>>,
) -> Json<Value> {
    let max_mb = Setting::get_i64(pool, "images_max_upload_mb").max(1) as u64;
    if form.file.len() > max_mb * 1024 * 1024 {
        return Json(json!({ "error": "File too large" }));
    }

    match store_upload(&mut form.file, "", &***storage).await {
        Ok(stored) => Json(json!({
            "name": stored,
            "location": storage.url(&stored),
        })),
        Err(e) => {
            log::error!("Editor upload failed: {}", e);
            Json(json!({ "error": "Upload failed" }))
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    let mut all = routes![
        dashboard,
        api_visitors,
        settings_page,
        settings_save,
        settings_branding_upload,
        upload_image,
    ];
    all.extend(categories::routes());
    all.extend(projects::routes());
    all.extend(services::routes());
    all.extend(posts::routes());
    all.extend(careers::routes());
    all.extend(testimonials::routes());
    all.extend(team::routes());
    all.extend(inquiries::routes());
    all.extend(tools::routes());
    all
}
