use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::models::settings::Setting;
use crate::models::testimonial::{Testimonial, TestimonialForm};

use super::{store_upload, Storage};

#[get("/testimonials")]
pub fn list(_admin: AdminUser, pool: &State<DbPool>, storage: &State<Storage>) -> Template {
    let rows: Vec<serde_json::Value> = Testimonial::list(pool)
        .iter()
        .map(|t| {
            json!({
                "testimonial": t,
                "photo_url": t.photo.as_deref().and_then(|p| storage.url(p)),
            })
        })
        .collect();

    let context = json!({
        "page_title": "Testimonials",
        "testimonials": rows,
        "settings": Setting::all(pool),
    });
    Template::render("admin/testimonials/list", &context)
}

#[derive(FromForm)]
pub struct TestimonialFormData<'f> {
    pub client_name: String,
    pub company: Option<String>,
    pub role: Option<String>,
    pub quote: String,
    pub rating: i64,
    pub is_approved: Option<bool>,
    pub ord: Option<i64>,
    pub photo: Option<TempFile<'f>>,
}

async fn build_form(
    form: &mut TestimonialFormData<'_>,
    storage: &Storage,
) -> Result<TestimonialForm, String> {
    // "profile" in the name routes the photo to the profiles folder
    let photo = match form.photo.as_mut() {
        Some(f) if f.len() > 0 => Some(store_upload(f, "profile", &**storage).await?),
        _ => None,
    };

    Ok(TestimonialForm {
        client_name: form.client_name.clone(),
        company: form.company.clone(),
        role: form.role.clone(),
        quote: form.quote.clone(),
        rating: form.rating,
        photo,
        is_approved: form.is_approved.unwrap_or(false),
        ord: form.ord,
    })
}

#[post("/testimonials/new", data = "<form>")]
pub async fn create(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    mut form: Form<TestimonialFormData<'_>>,
) -> Redirect {
    match build_form(&mut form, storage).await {
        Ok(f) => {
            if let Err(e) = Testimonial::create(pool, &f) {
                log::error!("Failed to create testimonial: {}", e);
            }
        }
        Err(e) => log::error!("Testimonial photo upload failed: {}", e),
    }
    Redirect::to("/my-admin/testimonials")
}

#[post("/testimonials/<id>/edit", data = "<form>")]
pub async fn update(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    id: i64,
    mut form: Form<TestimonialFormData<'_>>,
) -> Redirect {
    match build_form(&mut form, storage).await {
        Ok(f) => {
            if let Err(e) = Testimonial::update(pool, id, &f) {
                log::error!("Failed to update testimonial {}: {}", id, e);
            }
        }
        Err(e) => log::error!("Testimonial photo upload failed: {}", e),
    }
    Redirect::to("/my-admin/testimonials")
}

#[post("/testimonials/<id>/delete")]
pub fn delete(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    id: i64,
) -> Redirect {
    if let Some(t) = Testimonial::find_by_id(pool, id) {
        if let Some(photo) = &t.photo {
            if !storage.delete(photo) {
                log::warn!("Orphaned testimonial photo left on remote: {}", photo);
            }
        }
        if let Err(e) = Testimonial::delete(pool, id) {
            log::error!("Failed to delete testimonial {}: {}", id, e);
        }
    }
    Redirect::to("/my-admin/testimonials")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, create, update, delete]
}
