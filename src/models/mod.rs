pub mod career;
pub mod category;
pub mod inquiry;
pub mod metrics;
pub mod post;
pub mod project;
pub mod service;
pub mod settings;
pub mod team;
pub mod testimonial;

/// Use the explicit slug when given, otherwise derive one from the title —
/// mirrors the blank-slug-autofill behavior of the content forms.
pub(crate) fn slug_or(slug: &str, title: &str) -> String {
    let trimmed = slug.trim();
    if trimmed.is_empty() {
        slug::slugify(title)
    } else {
        slug::slugify(trimmed)
    }
}
