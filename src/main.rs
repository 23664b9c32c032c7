#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::Header;
use rocket::response::content::RawHtml;
use rocket_dyn_templates::Template;

mod analytics;
mod auth;
mod backup;
mod boot;
mod config;
mod db;
mod images;
mod models;
mod routes;
mod session;
mod storage;

#[cfg(test)]
mod tests;

use config::AppConfig;
use storage::{AssetStorage, MediaStorage};

/// Admin dashboard mount point. Also one of the visitor counter's excluded
/// prefixes.
const ADMIN_MOUNT: &str = "/my-admin";

pub struct NoCacheAdmin;

#[rocket::async_trait]
impl Fairing for NoCacheAdmin {
    fn info(&self) -> Info {
        Info {
            name: "No-Cache Admin Pages",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        if req.uri().path().starts_with(ADMIN_MOUNT) {
            res.set_header(Header::new(
                "Cache-Control",
                "no-store, no-cache, must-revalidate, max-age=0",
            ));
            res.set_header(Header::new("Pragma", "no-cache"));
        }
    }
}

#[catch(404)]
fn not_found() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>404</h1><p>Page not found.</p><a href='/'>← Home</a></body></html>".to_string())
}

#[catch(500)]
fn server_error() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>500</h1><p>Internal server error.</p><a href='/'>← Home</a></body></html>".to_string())
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    // Boot check — verify/create directories, validate critical files
    boot::run();

    let app_config = AppConfig::load("skyline.toml").expect("Failed to load skyline.toml");
    let timezone = app_config.timezone();

    let pool = db::init_pool(&app_config.database.path)
        .expect("Failed to initialize database pool");
    db::run_migrations(&pool).expect("Failed to run database migrations");
    db::seed_defaults(&pool).expect("Failed to seed default settings");

    let media_root = app_config.storage.local_root.clone();
    let media_storage: Arc<dyn AssetStorage> =
        Arc::new(MediaStorage::from_config(&app_config.storage));

    rocket::build()
        .manage(pool)
        .manage(app_config)
        .manage(media_storage)
        .attach(Template::fairing())
        .attach(analytics::VisitorTracker { timezone })
        .attach(NoCacheAdmin)
        .mount("/static", FileServer::from("website/static"))
        .mount("/media", FileServer::from(media_root))
        .mount("/", routes::public::routes())
        .mount(ADMIN_MOUNT, routes::admin::routes())
        .mount(ADMIN_MOUNT, routes::auth::routes())
        .register("/", catchers![not_found, server_error])
}
