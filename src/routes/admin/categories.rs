use rocket::form::Form;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::models::category::{Category, CategoryForm};
use crate::models::settings::Setting;

const CATEGORY_TYPES: &[&str] = &["project", "service", "blog"];

#[get("/categories")]
pub fn list(_admin: AdminUser, pool: &State<DbPool>) -> Template {
    let context = json!({
        "page_title": "Categories",
        "categories": Category::list_all(pool),
        "types": CATEGORY_TYPES,
        "settings": Setting::all(pool),
    });
    Template::render("admin/categories/list", &context)
}

#[derive(FromForm)]
pub struct CategoryFormData {
    pub name: String,
    pub slug: Option<String>,
    pub r#type: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub ord: Option<i64>,
}

fn build_form(form: &CategoryFormData) -> CategoryForm {
    CategoryForm {
        name: form.name.clone(),
        slug: form.slug.clone().unwrap_or_default(),
        r#type: form.r#type.clone(),
        description: form.description.clone(),
        color: form.color.clone(),
        ord: form.ord,
    }
}

#[post("/categories/new", data = "<form>")]
pub fn create(_admin: AdminUser, pool: &State<DbPool>, form: Form<CategoryFormData>) -> Redirect {
    if CATEGORY_TYPES.contains(&form.r#type.as_str()) && !form.name.trim().is_empty() {
        if let Err(e) = Category::create(pool, &build_form(&form)) {
            log::error!("Failed to create category: {}", e);
        }
    }
    Redirect::to("/my-admin/categories")
}

#[post("/categories/<id>/edit", data = "<form>")]
pub fn update(
    _admin: AdminUser,
    pool: &State<DbPool>,
    id: i64,
    form: Form<CategoryFormData>,
) -> Redirect {
    if CATEGORY_TYPES.contains(&form.r#type.as_str()) {
        if let Err(e) = Category::update(pool, id, &build_form(&form)) {
            log::error!("Failed to update category {}: {}", id, e);
        }
    }
    Redirect::to("/my-admin/categories")
}

#[post("/categories/<id>/delete")]
pub fn delete(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> Redirect {
    if let Err(e) = Category::delete(pool, id) {
        log::error!("Failed to delete category {}: {}", id, e);
    }
    Redirect::to("/my-admin/categories")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, create, update, delete]
}
