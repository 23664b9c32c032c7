use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::models::category::Category;
use crate::models::project::{Project, ProjectForm, ProjectImage};
use crate::models::settings::Setting;

use super::{store_upload, Storage};

#[get("/projects?<page>")]
pub fn list(_admin: AdminUser, pool: &State<DbPool>, page: Option<i64>) -> Template {
    let per_page = 20i64;
    let current_page = page.unwrap_or(1).max(1);
    let offset = (current_page - 1) * per_page;

    let projects = Project::list(pool, false, per_page, offset);
    let total = Project::count(pool, false);
    let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

    let rows: Vec<serde_json::Value> = projects
        .iter()
        .map(|p| {
            json!({
                "project": p,
                "status": p.status(),
                "category": p.category_id.and_then(|id| Category::find_by_id(pool, id)),
            })
        })
        .collect();

    let context = json!({
        "page_title": "Projects",
        "projects": rows,
        "total": total,
        "current_page": current_page,
        "total_pages": total_pages,
        "settings": Setting::all(pool),
    });
    Template::render("admin/projects/list", &context)
}

#[get("/projects/new")]
pub fn new_page(_admin: AdminUser, pool: &State<DbPool>) -> Template {
    let context = json!({
        "page_title": "New Project",
        "categories": Category::list(pool, "project"),
        "settings": Setting::all(pool),
    });
    Template::render("admin/projects/form", &context)
}

#[derive(FromForm)]
pub struct ProjectFormData<'f> {
    pub title: String,
    pub slug: Option<String>,
    pub short_description: String,
    pub description: String,
    pub client_name: Option<String>,
    pub location: String,
    pub category_id: Option<i64>,
    pub start_date: Option<String>,
    pub completion_date: Option<String>,
    pub area_sqft: Option<i64>,
    pub budget_range: Option<String>,
    pub is_featured: Option<bool>,
    pub is_published: Option<bool>,
    pub ord: Option<i64>,
    pub featured_image: Option<TempFile<'f>>,
    pub before_image: Option<TempFile<'f>>,
    pub after_image: Option<TempFile<'f>>,
}

async fn uploaded_image(
    file: &mut Option<TempFile<'_>>,
    storage: &Storage,
) -> Result<Option<String>, String> {
    match file.as_mut() {
        Some(f) if f.len() > 0 => store_upload(f, "project", &**storage).await.map(Some),
        _ => Ok(None),
    }
}

async fn build_form(
    form: &mut ProjectFormData<'_>,
    storage: &Storage,
) -> Result<ProjectForm, String> {
    let featured_image = uploaded_image(&mut form.featured_image, storage).await?;
    let before_image = uploaded_image(&mut form.before_image, storage).await?;
    let after_image = uploaded_image(&mut form.after_image, storage).await?;

    Ok(ProjectForm {
        title: form.title.clone(),
        slug: form.slug.clone().unwrap_or_default(),
        short_description: form.short_description.clone(),
        description: form.description.clone(),
        client_name: form.client_name.clone(),
        location: form.location.clone(),
        category_id: form.category_id,
        start_date: form.start_date.clone().filter(|s| !s.is_empty()),
        completion_date: form.completion_date.clone().filter(|s| !s.is_empty()),
        area_sqft: form.area_sqft,
        budget_range: form.budget_range.clone(),
        featured_image,
        before_image,
        after_image,
        is_featured: form.is_featured.unwrap_or(false),
        is_published: form.is_published.unwrap_or(false),
        ord: form.ord,
    })
}

#[post("/projects/new", data = "<form>")]
pub async fn create(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    mut form: Form<ProjectFormData<'_>>,
) -> Redirect {
    let project_form = match build_form(&mut form, storage).await {
        Ok(f) => f,
        Err(e) => {
            log::error!("Project image upload failed: {}", e);
            return Redirect::to("/my-admin/projects/new?error=upload-failed");
        }
    };

    match Project::create(pool, &project_form) {
        Ok(id) => Redirect::to(format!("/my-admin/projects/{}/edit", id)),
        Err(e) => {
            log::error!("Failed to create project: {}", e);
            Redirect::to("/my-admin/projects/new?error=save-failed")
        }
    }
}

#[get("/projects/<id>/edit")]
pub fn edit_page(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> Option<Template> {
    let project = Project::find_by_id(pool, id)?;
    let context = json!({
        "page_title": "Edit Project",
        "gallery": ProjectImage::for_project(pool, id),
        "categories": Category::list(pool, "project"),
        "project": project,
        "settings": Setting::all(pool),
    });
    Some(Template::render("admin/projects/form", &context))
}

#[post("/projects/<id>/edit", data = "<form>")]
pub async fn update(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    id: i64,
    mut form: Form<ProjectFormData<'_>>,
) -> Redirect {
    let project_form = match build_form(&mut form, storage).await {
        Ok(f) => f,
        Err(e) => {
            log::error!("Project image upload failed: {}", e);
            return Redirect::to(format!("/my-admin/projects/{}/edit?error=upload-failed", id));
        }
    };

    match Project::update(pool, id, &project_form) {
        Ok(_) => Redirect::to(format!("/my-admin/projects/{}/edit?saved=true", id)),
        Err(e) => {
            log::error!("Failed to update project {}: {}", id, e);
            Redirect::to(format!("/my-admin/projects/{}/edit?error=save-failed", id))
        }
    }
}

#[post("/projects/<id>/delete")]
pub fn delete(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    id: i64,
) -> Redirect {
    if let Some(project) = Project::find_by_id(pool, id) {
        // Remote deletes that fail are logged and left as orphans; the
        // record deletion must not be blocked by them.
        for name in [
            Some(project.featured_image.clone()).filter(|n| !n.is_empty()),
            project.before_image.clone(),
            project.after_image.clone(),
        ]
        .into_iter()
        .flatten()
        {
            if !storage.delete(&name) {
                log::warn!("Orphaned project asset left on remote: {}", name);
            }
        }
        for img in ProjectImage::for_project(pool, id) {
            if !storage.delete(&img.image) {
                log::warn!("Orphaned gallery asset left on remote: {}", img.image);
            }
        }
        if let Err(e) = Project::delete(pool, id) {
            log::error!("Failed to delete project {}: {}", id, e);
        }
    }
    Redirect::to("/my-admin/projects")
}

// ── Gallery ────────────────────────────────────────────

#[derive(FromForm)]
pub struct GalleryUploadForm<'f> {
    pub caption: Option<String>,
    pub alt_text: Option<String>,
    pub image: TempFile<'f>,
}

#[post("/projects/<id>/gallery", data = "<form>")]
pub async fn gallery_add(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    id: i64,
    mut form: Form<GalleryUploadForm<'_>>,
) -> Redirect {
    if Project::find_by_id(pool, id).is_none() {
        return Redirect::to("/my-admin/projects");
    }

    match store_upload(&mut form.image, "project", &***storage).await {
        Ok(stored) => {
            if let Err(e) = ProjectImage::add(
                pool,
                id,
                &stored,
                form.caption.as_deref(),
                form.alt_text.as_deref(),
            ) {
                log::error!("Failed to record gallery image: {}", e);
            }
        }
        Err(e) => log::error!("Gallery upload failed: {}", e),
    }
    Redirect::to(format!("/my-admin/projects/{}/edit", id))
}

#[post("/projects/<id>/gallery/<image_id>/delete")]
pub fn gallery_delete(
    _admin: AdminUser,
    pool: &State<DbPool>,
    storage: &State<Storage>,
    id: i64,
    image_id: i64,
) -> Redirect {
    if let Some(img) = ProjectImage::find_by_id(pool, image_id) {
        if img.project_id == id {
            if !storage.delete(&img.image) {
                log::warn!("Orphaned gallery asset left on remote: {}", img.image);
            }
            let _ = ProjectImage::delete(pool, image_id);
        }
    }
    Redirect::to(format!("/my-admin/projects/{}/edit", id))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        list,
        new_page,
        create,
        edit_page,
        update,
        delete,
        gallery_add,
        gallery_delete,
    ]
}
