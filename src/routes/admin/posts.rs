use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::models::category::Category;
use crate::models::post::{Post, PostForm};
use crate::models::settings::Setting;

use super::{store_upload, Storage};

#[get("/posts?<status>&<page>")]
pub fn list(
    _admin: AdminUser,
    pool: &State<DbPool>,
    status: Option<String>,
    page: Option<i64>,
) -> Template {
    let per_page = 20i64;
    let current_page = page.unwrap_or(1).max(1);
    let offset = (current_page - 1) * per_page;

    let posts = Post::list(pool, status.as_deref(), per_page, offset);
    let total = Post::count(pool, status.as_deref());
    let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

    let context = json!({
        "page_title": "Blog Posts",
        "posts": posts,
        "status_filter": status,
        "total": total,
        "current_page": current_page,
        "total_pages": total_pages,
        "settings": Setting::all(pool),
    });
    Template::render("admin/posts/list", &context)
}

#[get("/posts/new")]
pub fn new_page(_admin: AdminUser, pool: &State<DbPool>) -> Template {
    let context = json!({
        "page_title": "New Post",
        "categories": Category::list(pool, "blog"),
        "settings": Setting::all(pool),
    });
    Template::render("admin/posts/form", &context)
}

#[derive(FromForm)]
pub struct PostFormData<'f> {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content_md: String,
    pub author: Option<String>,
    pub category_id: Option<i64>,
    pub status: String,
    pub published_at: Option<String>,
    pub featured_image: Option<TempFile<'f>>,
}

async fn build_form(form: &mut PostFormData<'_>, storage: &Storage) -> Result<PostForm, String> {
    let featured_image = match form.featured_image.as_mut() {
        Some(f) if f.len() > 0 => Some(store_upload(f, "blog", &**storage).await?),
        _ => None,
    };

    Ok(PostForm {
        title: form.title.clone(),
        slug: form.slug.clone().unwrap_or_default(),
        excerpt: form.excerpt.clone(),
        content_md: form.content_md.clone(),
        featured_image,
        author: form.author.clone(),
        category_id: form.category_id,
        status: form.status.clone(),
        published_at: form.published_at.clone().filter(|s| !s.is_empty()),
    })
}

#[post("/posts/new", data = "<form>")]
pub async fn create(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    mut form: Form<PostFormData<'_>>,
) -> Redirect {
    let post_form = match build_form(&mut form, storage).await {
        Ok(f) => f,
        Err(e) => {
            log::error!("Post image upload failed: {}", e);
            return Redirect::to("/my-admin/posts/new?error=upload-failed");
        }
    };

    match Post::create(pool, &post_form) {
        Ok(id) => Redirect::to(format!("/my-admin/posts/{}/edit", id)),
        Err(e) => {
            log::error!("Failed to create post: {}", e);
            Redirect::to("/my-admin/posts/new?error=save-failed")
        }
    }
}

#[get("/posts/<id>/edit")]
pub fn edit_page(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> Option<Template> {
    let post = Post::find_by_id(pool, id)?;
    let context = json!({
        "page_title": "Edit Post",
        "categories": Category::list(pool, "blog"),
        "post": post,
        "settings": Setting::all(pool),
    });
    Some(Template::render("admin/posts/form", &context))
}

#[post("/posts/<id>/edit", data = "<form>")]
pub async fn update(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    id: i64,
    mut form: Form<PostFormData<'_>>,
) -> Redirect {
    let post_form = match build_form(&mut form, storage).await {
        Ok(f) => f,
        Err(e) => {
            log::error!("Post image upload failed: {}", e);
            return Redirect::to(format!("/my-admin/posts/{}/edit?error=upload-failed", id));
        }
    };

    match Post::update(pool, id, &post_form) {
        Ok(_) => Redirect::to(format!("/my-admin/posts/{}/edit?saved=true", id)),
        Err(e) => {
            log::error!("Failed to update post {}: {}", id, e);
            Redirect::to(format!("/my-admin/posts/{}/edit?error=save-failed", id))
        }
    }
}

#[post("/posts/<id>/delete")]
pub fn delete(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    id: i64,
) -> Redirect {
    if let Some(post) = Post::find_by_id(pool, id) {
        if let Some(image) = &post.featured_image {
            if !storage.delete(image) {
                log::warn!("Orphaned post asset left on remote: {}", image);
            }
        }
        if let Err(e) = Post::delete(pool, id) {
            log::error!("Failed to delete post {}: {}", id, e);
        }
    }
    Redirect::to("/my-admin/posts")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, new_page, create, edit_page, update, delete]
}
