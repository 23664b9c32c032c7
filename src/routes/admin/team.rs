use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::models::settings::Setting;
use crate::models::team::{TeamMember, TeamMemberForm};

use super::{store_upload, Storage};

#[get("/team")]
pub fn list(_admin: AdminUser, pool: &State<DbPool>, storage: &State<Storage>) -> Template {
    let rows: Vec<serde_json::Value> = TeamMember::list(pool)
        .iter()
        .map(|m| {
            json!({
                "member": m,
                "photo_url": m.photo.as_deref().and_then(|p| storage.url(p)),
            })
        })
        .collect();

    let context = json!({
        "page_title": "Team",
        "team": rows,
        "settings": Setting::all(pool),
    });
    Template::render("admin/team/list", &context)
}

#[derive(FromForm)]
pub struct TeamMemberFormData<'f> {
    pub name: String,
    pub role: String,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    pub ord: Option<i64>,
    pub is_active: Option<bool>,
    pub photo: Option<TempFile<'f>>,
}

async fn build_form(
    form: &mut TeamMemberFormData<'_>,
    storage: &Storage,
) -> Result<TeamMemberForm, String> {
    let photo = match form.photo.as_mut() {
        Some(f) if f.len() > 0 => Some(store_upload(f, "profile", &**storage).await?),
        _ => None,
    };

    Ok(TeamMemberForm {
        name: form.name.clone(),
        role: form.role.clone(),
        bio: form.bio.clone(),
        photo,
        email: form.email.clone(),
        linkedin_url: form.linkedin_url.clone(),
        ord: form.ord,
        is_active: form.is_active.unwrap_or(true),
    })
}

#[post("/team/new", data = "<form>")]
pub async fn create(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    mut form: Form<TeamMemberFormData<'_>>,
) -> Redirect {
    match build_form(&mut form, storage).await {
        Ok(f) => {
            if let Err(e) = TeamMember::create(pool, &f) {
                log::error!("Failed to create team member: {}", e);
            }
        }
        Err(e) => log::error!("Team photo upload failed: {}", e),
    }
    Redirect::to("/my-admin/team")
}

#[post("/team/<id>/edit", data = "<form>")]
pub async fn update(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    id: i64,
    mut form: Form<TeamMemberFormData<'_>>,
) -> Redirect {
    match build_form(&mut form, storage).await {
        Ok(f) => {
            if let Err(e) = TeamMember::update(pool, id, &f) {
                log::error!("Failed to update team member {}: {}", id, e);
            }
        }
        Err(e) => log::error!("Team photo upload failed: {}", e),
    }
    Redirect::to("/my-admin/team")
}

#[post("/team/<id>/delete")]
pub fn delete(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    id: i64,
) -> Redirect {
    if let Some(member) = TeamMember::find_by_id(pool, id) {
        if let Some(photo) = &member.photo {
            if !storage.delete(photo) {
                log::warn!("Orphaned team photo left on remote: {}", photo);
            }
        }
        if let Err(e) = TeamMember::delete(pool, id) {
            log::error!("Failed to delete team member {}: {}", id, e);
        }
    }
    Redirect::to("/my-admin/team")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, create, update, delete]
}
