use std::sync::Arc;

use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth::{hash_ip, ClientIp};
use crate::db::DbPool;
use crate::models::career::{Department, JobApplication, JobApplicationForm, JobPosition};
use crate::models::category::Category;
use crate::models::inquiry::{Inquiry, InquiryForm};
use crate::models::post::Post;
use crate::models::project::{Project, ProjectImage};
use crate::models::service::Service;
use crate::models::settings::Setting;
use crate::models::team::TeamMember;
use crate::models::testimonial::Testimonial;
use crate::storage::AssetStorage;

use super::{read_upload, upload_basename};

type Storage = Arc<dyn AssetStorage>;

fn image_url(storage: &Storage, name: &Option<String>) -> Option<String> {
    name.as_deref().and_then(|n| storage.url(n))
}

// ── Homepage ───────────────────────────────────────────

#[get("/")]
pub fn home(pool: &State<DbPool>, storage: &State<Storage>) -> Template {
    let services = Service::featured(pool, 3);
    let projects = Project::featured(pool, 6);
    let testimonials = Testimonial::approved(pool);

    let projects_ctx: Vec<serde_json::Value> = projects
        .iter()
        .map(|p| {
            json!({
                "project": p,
                "status": p.status(),
                "image_url": storage.url(&p.featured_image),
            })
        })
        .collect();

    let context = json!({
        "settings": Setting::all(pool),
        "services": services,
        "projects": projects_ctx,
        "testimonials": testimonials,
        "page_type": "home",
    });

    Template::render("public/home", &context)
}

// ── About ──────────────────────────────────────────────

#[get("/about")]
pub fn about(pool: &State<DbPool>, storage: &State<Storage>) -> Template {
    let team: Vec<serde_json::Value> = TeamMember::active(pool)
        .iter()
        .map(|m| {
            json!({
                "member": m,
                "photo_url": image_url(storage, &m.photo),
            })
        })
        .collect();

    let context = json!({
        "settings": Setting::all(pool),
        "team": team,
        "testimonials": Testimonial::approved(pool),
        "page_type": "about",
    });

    Template::render("public/about", &context)
}

// ── Services ───────────────────────────────────────────

#[get("/services")]
pub fn services_list(pool: &State<DbPool>, storage: &State<Storage>) -> Template {
    let services: Vec<serde_json::Value> = Service::list(pool, true)
        .iter()
        .map(|s| {
            json!({
                "service": s,
                "image_url": image_url(storage, &s.featured_image),
            })
        })
        .collect();

    let context = json!({
        "settings": Setting::all(pool),
        "services": services,
        "page_type": "services",
    });

    Template::render("public/services_list", &context)
}

#[get("/services/<slug>")]
pub fn service_detail(
    pool: &State<DbPool>,
    storage: &State<Storage>,
    slug: &str,
) -> Option<Template> {
    let service = Service::find_by_slug(pool, slug)?;
    if !service.is_active {
        return None;
    }

    let context = json!({
        "settings": Setting::all(pool),
        "service": service,
        "image_url": image_url(storage, &service.featured_image),
        "other_services": Service::list(pool, true),
        "page_type": "service_detail",
    });

    Some(Template::render("public/service_detail", &context))
}

// ── Projects ───────────────────────────────────────────

#[get("/projects?<category>&<page>")]
pub fn projects_list(
    pool: &State<DbPool>,
    storage: &State<Storage>,
    category: Option<String>,
    page: Option<i64>,
) -> Template {
    let per_page = Setting::get_i64(pool, "projects_per_page").max(1);
    let current_page = page.unwrap_or(1).max(1);
    let offset = (current_page - 1) * per_page;

    let selected = category
        .as_deref()
        .and_then(|slug| Category::find_by_slug(pool, slug));

    let projects = match &selected {
        Some(cat) => Project::list_by_category(pool, cat.id, per_page, offset),
        None => Project::list(pool, true, per_page, offset),
    };
    let total = Project::count(pool, true);
    let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

    let projects_ctx: Vec<serde_json::Value> = projects
        .iter()
        .map(|p| {
            json!({
                "project": p,
                "status": p.status(),
                "image_url": storage.url(&p.featured_image),
            })
        })
        .collect();

    let context = json!({
        "settings": Setting::all(pool),
        "projects": projects_ctx,
        "categories": Category::list(pool, "project"),
        "selected_category": selected,
        "current_page": current_page,
        "total_pages": total_pages,
        "page_type": "projects",
    });

    Template::render("public/projects_list", &context)
}

#[get("/projects/<slug>")]
pub fn project_detail(
    pool: &State<DbPool>,
    storage: &State<Storage>,
    slug: &str,
) -> Option<Template> {
    let project = Project::find_by_slug(pool, slug)?;
    if !project.is_published {
        return None;
    }

    let _ = Project::increment_views(pool, project.id);

    let gallery: Vec<serde_json::Value> = ProjectImage::for_project(pool, project.id)
        .iter()
        .map(|img| {
            json!({
                "image": img,
                "url": storage.url(&img.image),
            })
        })
        .collect();

    let context = json!({
        "settings": Setting::all(pool),
        "status": project.status(),
        "has_before_after": project.has_before_after(),
        "image_url": storage.url(&project.featured_image),
        "before_url": image_url(storage, &project.before_image),
        "after_url": image_url(storage, &project.after_image),
        "gallery": gallery,
        "category": project.category_id.and_then(|id| Category::find_by_id(pool, id)),
        "project": project,
        "page_type": "project_detail",
    });

    Some(Template::render("public/project_detail", &context))
}

// ── Blog ───────────────────────────────────────────────

#[get("/blog?<page>")]
pub fn blog_list(pool: &State<DbPool>, storage: &State<Storage>, page: Option<i64>) -> Template {
    let per_page = Setting::get_i64(pool, "blog_posts_per_page").max(1);
    let current_page = page.unwrap_or(1).max(1);
    let offset = (current_page - 1) * per_page;

    let posts: Vec<serde_json::Value> = Post::published(pool, per_page, offset)
        .iter()
        .map(|p| {
            json!({
                "post": p,
                "image_url": image_url(storage, &p.featured_image),
            })
        })
        .collect();
    let total = Post::count(pool, Some("published"));
    let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

    let context = json!({
        "settings": Setting::all(pool),
        "posts": posts,
        "current_page": current_page,
        "total_pages": total_pages,
        "page_type": "blog",
    });

    Template::render("public/blog_list", &context)
}

#[get("/blog/<slug>")]
pub fn blog_detail(pool: &State<DbPool>, storage: &State<Storage>, slug: &str) -> Option<Template> {
    let post = Post::find_by_slug(pool, slug)?;
    if post.status != "published" {
        return None;
    }

    let context = json!({
        "settings": Setting::all(pool),
        "image_url": image_url(storage, &post.featured_image),
        "category": post.category_id.and_then(|id| Category::find_by_id(pool, id)),
        "post": post,
        "page_type": "blog_detail",
    });

    Some(Template::render("public/blog_detail", &context))
}

// ── Careers ────────────────────────────────────────────

#[get("/careers")]
pub fn careers_list(pool: &State<DbPool>) -> Template {
    let positions = JobPosition::active(pool);
    let departments = Department::list(pool);

    let context = json!({
        "settings": Setting::all(pool),
        "positions": positions,
        "departments": departments,
        "page_type": "careers",
    });

    Template::render("public/careers_list", &context)
}

#[get("/careers/<slug>?<applied>&<error>")]
pub fn career_detail(
    pool: &State<DbPool>,
    slug: &str,
    applied: Option<bool>,
    error: Option<String>,
) -> Option<Template> {
    let position = JobPosition::find_by_slug(pool, slug)?;
    if position.status != "active" {
        return None;
    }

    let _ = JobPosition::increment_views(pool, position.id);

    let context = json!({
        "settings": Setting::all(pool),
        "department": Department::find_by_id(pool, position.department_id),
        "position": position,
        "applied": applied.unwrap_or(false),
        "error": error,
        "page_type": "career_detail",
    });

    Some(Template::render("public/career_detail", &context))
}

#[derive(FromForm)]
pub struct ApplicationFormData<'f> {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cover_letter: String,
    pub portfolio_url: Option<String>,
    pub resume: Option<TempFile<'f>>,
}

#[post("/careers/<slug>/apply", data = "<form>")]
pub async fn career_apply(
    pool: &State<DbPool>,
    storage: &State<Storage>,
    slug: &str,
    mut form: Form<ApplicationFormData<'_>>,
) -> Redirect {
    let position = match JobPosition::find_by_slug(pool, slug) {
        Some(p) if p.status == "active" => p,
        _ => return Redirect::to("/careers"),
    };

    if form.full_name.trim().is_empty() || form.email.trim().is_empty() {
        return Redirect::to(format!("/careers/{}?error=missing-fields", slug));
    }

    // A failed resume upload blocks the application; the applicant is asked
    // to retry rather than being stored without their document.
    let resume = match form.resume.as_mut() {
        Some(file) if file.len() > 0 => {
            let (name, bytes) = match read_upload(file).await {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("Resume read failed: {}", e);
                    return Redirect::to(format!("/careers/{}?error=upload-failed", slug));
                }
            };
            match storage.save(&upload_basename(&name), &bytes) {
                Ok(stored) => Some(stored),
                Err(e) => {
                    log::error!("Resume upload failed: {}", e);
                    return Redirect::to(format!("/careers/{}?error=upload-failed", slug));
                }
            }
        }
        _ => None,
    };

    let application = JobApplicationForm {
        position_id: position.id,
        full_name: form.full_name.trim().to_string(),
        email: form.email.trim().to_string(),
        phone: form.phone.clone(),
        cover_letter: form.cover_letter.clone(),
        resume,
        portfolio_url: form.portfolio_url.clone(),
    };

    match JobApplication::create(pool, &application) {
        Ok(_) => Redirect::to(format!("/careers/{}?applied=true", slug)),
        Err(e) => {
            log::error!("Failed to store application: {}", e);
            Redirect::to(format!("/careers/{}?error=save-failed", slug))
        }
    }
}

// ── Contact ────────────────────────────────────────────

#[get("/contact?<sent>")]
pub fn contact_page(pool: &State<DbPool>, sent: Option<bool>) -> Template {
    let context = json!({
        "settings": Setting::all(pool),
        "sent": sent.unwrap_or(false),
        "page_type": "contact",
    });

    Template::render("public/contact", &context)
}

#[derive(FromForm)]
pub struct ContactFormData {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub inquiry_type: Option<String>,
}

#[post("/contact", data = "<form>")]
pub fn contact_submit(
    pool: &State<DbPool>,
    client_ip: ClientIp,
    form: Form<ContactFormData>,
) -> Redirect {
    if form.name.trim().is_empty() || form.email.trim().is_empty() || form.message.trim().is_empty()
    {
        return Redirect::to("/contact");
    }

    let inquiry = InquiryForm {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        phone: form.phone.clone(),
        subject: form.subject.clone().unwrap_or_default(),
        message: form.message.clone(),
        inquiry_type: form.inquiry_type.clone(),
    };

    if let Err(e) = Inquiry::create(pool, &inquiry, Some(&hash_ip(&client_ip.0))) {
        log::error!("Failed to store inquiry: {}", e);
    }

    Redirect::to("/contact?sent=true")
}

// ── Well-known files ───────────────────────────────────

#[get("/robots.txt")]
pub fn robots() -> (rocket::http::ContentType, &'static str) {
    (rocket::http::ContentType::Plain, "User-agent: *\nAllow: /\n")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        home,
        about,
        services_list,
        service_detail,
        projects_list,
        project_detail,
        blog_list,
        blog_detail,
        careers_list,
        career_detail,
        career_apply,
        contact_page,
        contact_submit,
        robots,
    ]
}
