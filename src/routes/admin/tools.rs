use chrono::NaiveDate;
use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::http::ContentType;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth::AdminUser;
use crate::backup;
use crate::config::AppConfig;
use crate::db::{self, DbPool};
use crate::models::metrics::{SystemMetric, VISITORS};
use crate::models::settings::Setting;

use super::read_upload;

#[get("/tools?<message>&<error>")]
pub fn tools_page(
    _admin: AdminUser,
    pool: &State<DbPool>,
    message: Option<String>,
    error: Option<String>,
) -> Template {
    let context = json!({
        "page_title": "Tools",
        "message": message,
        "error": error,
        "settings": Setting::all(pool),
    });
    Template::render("admin/tools", &context)
}

/// Download a full content backup. The archive is also kept under
/// `backups/` so operators have a server-side copy trail.
#[get("/tools/backup")]
pub fn backup_download(
    _admin: AdminUser,
    pool: &State<DbPool>,
) -> Result<(ContentType, Vec<u8>), Redirect> {
    match backup::create_backup(pool) {
        Ok(bytes) => {
            let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
            let path = format!("backups/skyline_backup_{}.zip", stamp);
            if let Err(e) = std::fs::write(&path, &bytes) {
                log::warn!("Could not keep server-side backup copy {}: {}", path, e);
            }
            Ok((ContentType::ZIP, bytes))
        }
        Err(e) => {
            log::error!("Backup failed: {}", e);
            Err(Redirect::to("/my-admin/tools?error=backup-failed"))
        }
    }
}

#[derive(FromForm)]
pub struct RestoreForm<'f> {
    pub archive: TempFile<'f>,
}

#[post("/tools/restore", data = "<form>")]
pub async fn restore_upload(
    _admin: AdminUser,
    pool: &State<DbPool>,
    mut form: Form<RestoreForm<'_>>,
) -> Redirect {
    let (_, bytes) = match read_upload(&mut form.archive).await {
        Ok(r) => r,
        Err(e) => {
            log::error!("Restore read failed: {}", e);
            return Redirect::to("/my-admin/tools?error=restore-failed");
        }
    };

    match backup::restore_backup(pool, &bytes) {
        Ok(summary) => {
            log::info!(
                "Restore complete: {} tables, {} rows",
                summary.tables,
                summary.rows
            );
            Redirect::to(format!(
                "/my-admin/tools?message=restored-{}-rows",
                summary.rows
            ))
        }
        Err(e) => {
            log::error!("Restore failed: {}", e);
            Redirect::to("/my-admin/tools?error=restore-failed")
        }
    }
}

#[post("/tools/seed")]
pub fn seed_sample(_admin: AdminUser, pool: &State<DbPool>) -> Redirect {
    match db::seed_sample_content(pool) {
        Ok(_) => Redirect::to("/my-admin/tools?message=sample-content-seeded"),
        Err(e) => {
            log::error!("Sample seed failed: {}", e);
            Redirect::to("/my-admin/tools?error=seed-failed")
        }
    }
}

#[derive(FromForm)]
pub struct ResetVisitorsForm {
    /// ISO date; empty means today (in the configured time zone).
    pub date: Option<String>,
}

/// Zero one day's visitor counter. The only sanctioned downward mutation
/// of the metric.
#[post("/tools/visitors/reset", data = "<form>")]
pub fn reset_visitors(
    _admin: AdminUser,
    pool: &State<DbPool>,
    config: &State<AppConfig>,
    form: Form<ResetVisitorsForm>,
) -> Redirect {
    let date = form
        .date
        .as_deref()
        .filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .unwrap_or_else(|| crate::analytics::today_in(config.timezone()));

    match SystemMetric::reset(pool, VISITORS, date) {
        Ok(_) => Redirect::to("/my-admin/tools?message=visitors-reset"),
        Err(e) => {
            log::error!("Visitor reset failed: {}", e);
            Redirect::to("/my-admin/tools?error=reset-failed")
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        tools_page,
        backup_download,
        restore_upload,
        seed_sample,
        reset_visitors,
    ]
}
