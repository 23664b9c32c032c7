use rocket::form::Form;
use rocket::http::CookieJar;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth;
use crate::auth::{AdminUser, ClientIp};
use crate::db::DbPool;
use crate::models::settings::Setting;

#[derive(Debug, FromForm)]
pub struct LoginForm {
    pub password: String,
}

#[derive(Debug, FromForm)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[get("/login")]
pub fn login_page(pool: &State<DbPool>) -> Template {
    let context = json!({
        "site_name": Setting::get_or(pool, "site_name", "Skyline"),
        "error": Option::<String>::None,
    });
    Template::render("admin/login", &context)
}

#[post("/login", data = "<form>")]
pub fn login_submit(
    form: Form<LoginForm>,
    pool: &State<DbPool>,
    client_ip: ClientIp,
    cookies: &CookieJar<'_>,
) -> Result<Redirect, Template> {
    let stored_hash = Setting::get(pool, "admin_password_hash").unwrap_or_default();

    if !auth::verify_password(&form.password, &stored_hash) {
        let context = json!({
            "site_name": Setting::get_or(pool, "site_name", "Skyline"),
            "error": "Invalid credentials",
        });
        return Err(Template::render("admin/login", &context));
    }

    match auth::create_session(pool, Some(&client_ip.0), None) {
        Ok(session_id) => {
            auth::set_session_cookie(cookies, &session_id);
            Ok(Redirect::to("/my-admin"))
        }
        Err(e) => {
            log::error!("Session creation failed: {}", e);
            let context = json!({
                "site_name": Setting::get_or(pool, "site_name", "Skyline"),
                "error": "Session creation failed",
            });
            Err(Template::render("admin/login", &context))
        }
    }
}

#[get("/logout")]
pub fn logout(pool: &State<DbPool>, cookies: &CookieJar<'_>) -> Redirect {
    if let Some(session_id) = auth::session_cookie(cookies) {
        let _ = auth::destroy_session(pool, &session_id);
    }
    auth::clear_session_cookie(cookies);
    Redirect::to("/my-admin/login")
}

#[post("/change-password", data = "<form>")]
pub fn change_password(
    _admin: AdminUser,
    pool: &State<DbPool>,
    form: Form<ChangePasswordForm>,
) -> Redirect {
    let stored_hash = Setting::get(pool, "admin_password_hash").unwrap_or_default();

    if !auth::verify_password(&form.current_password, &stored_hash) {
        return Redirect::to("/my-admin/settings?error=wrong-password");
    }
    if form.new_password.len() < 8 || form.new_password != form.confirm_password {
        return Redirect::to("/my-admin/settings?error=weak-password");
    }

    match auth::hash_password(&form.new_password) {
        Ok(hash) => {
            let _ = Setting::set(pool, "admin_password_hash", &hash);
            let _ = Setting::set(pool, "admin_setup_complete", "true");
            Redirect::to("/my-admin/settings?saved=true")
        }
        Err(e) => {
            log::error!("Password hash failed: {}", e);
            Redirect::to("/my-admin/settings?error=hash-failed")
        }
    }
}

/// Catch-all for any /my-admin/* request that failed the AdminUser guard.
/// Fires when the guard returns Forward(Unauthorized).
#[get("/<_path..>", rank = 99)]
pub fn admin_redirect_to_login(_path: std::path::PathBuf) -> Redirect {
    Redirect::to("/my-admin/login")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        login_page,
        login_submit,
        logout,
        change_password,
        admin_redirect_to_login,
    ]
}
