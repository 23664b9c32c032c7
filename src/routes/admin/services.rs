use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::models::category::Category;
use crate::models::service::{Service, ServiceForm};
use crate::models::settings::Setting;

use super::{store_upload, Storage};

#[get("/services")]
pub fn list(_admin: AdminUser, pool: &State<DbPool>) -> Template {
    let context = json!({
        "page_title": "Services",
        "services": Service::list(pool, false),
        "settings": Setting::all(pool),
    });
    Template::render("admin/services/list", &context)
}

#[get("/services/new")]
pub fn new_page(_admin: AdminUser, pool: &State<DbPool>) -> Template {
    let context = json!({
        "page_title": "New Service",
        "categories": Category::list(pool, "service"),
        "settings": Setting::all(pool),
    });
    Template::render("admin/services/form", &context)
}

#[derive(FromForm)]
pub struct ServiceFormData<'f> {
    pub title: String,
    pub slug: Option<String>,
    pub category_id: Option<i64>,
    pub icon: Option<String>,
    pub summary: String,
    pub description: String,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
    pub ord: Option<i64>,
    pub featured_image: Option<TempFile<'f>>,
}

async fn build_form(
    form: &mut ServiceFormData<'_>,
    storage: &Storage,
) -> Result<ServiceForm, String> {
    // "service" in the name routes the asset to the services folder
    let featured_image = match form.featured_image.as_mut() {
        Some(f) if f.len() > 0 => Some(store_upload(f, "service", &**storage).await?),
        _ => None,
    };

    Ok(ServiceForm {
        title: form.title.clone(),
        slug: form.slug.clone().unwrap_or_default(),
        category_id: form.category_id,
        icon: form.icon.clone(),
        summary: form.summary.clone(),
        description: form.description.clone(),
        featured_image,
        is_featured: form.is_featured.unwrap_or(false),
        is_active: form.is_active.unwrap_or(true),
        ord: form.ord,
    })
}

#[post("/services/new", data = "<form>")]
pub async fn create(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    mut form: Form<ServiceFormData<'_>>,
) -> Redirect {
    let service_form = match build_form(&mut form, storage).await {
        Ok(f) => f,
        Err(e) => {
            log::error!("Service image upload failed: {}", e);
            return Redirect::to("/my-admin/services/new?error=upload-failed");
        }
    };

    match Service::create(pool, &service_form) {
        Ok(id) => Redirect::to(format!("/my-admin/services/{}/edit", id)),
        Err(e) => {
            log::error!("Failed to create service: {}", e);
            Redirect::to("/my-admin/services/new?error=save-failed")
        }
    }
}

#[get("/services/<id>/edit")]
pub fn edit_page(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> Option<Template> {
    let service = Service::find_by_id(pool, id)?;
    let context = json!({
        "page_title": "Edit Service",
        "categories": Category::list(pool, "service"),
        "service": service,
        "settings": Setting::all(pool),
    });
    Some(Template::render("admin/services/form", &context))
}

#[post("/services/<id>/edit", data = "<form>")]
pub async fn update(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    id: i64,
    mut form: Form<ServiceFormData<'_>>,
) -> Redirect {
    let service_form = match build_form(&mut form, storage).await {
        Ok(f) => f,
        Err(e) => {
            log::error!("Service image upload failed: {}", e);
            return Redirect::to(format!("/my-admin/services/{}/edit?error=upload-failed", id));
        }
    };

    match Service::update(pool, id, &service_form) {
        Ok(_) => Redirect::to(format!("/my-admin/services/{}/edit?saved=true", id)),
        Err(e) => {
            log::error!("Failed to update service {}: {}", id, e);
            Redirect::to(format!("/my-admin/services/{}/edit?error=save-failed", id))
        }
    }
}

#[post("/services/<id>/delete")]
pub fn delete(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    id: i64,
) -> Redirect {
    if let Some(service) = Service::find_by_id(pool, id) {
        if let Some(image) = &service.featured_image {
            if !storage.delete(image) {
                log::warn!("Orphaned service asset left on remote: {}", image);
            }
        }
        if let Err(e) = Service::delete(pool, id) {
            log::error!("Failed to delete service {}: {}", id, e);
        }
    }
    Redirect::to("/my-admin/services")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, new_page, create, edit_page, update, delete]
}
