#![cfg(test)]

use std::collections::HashSet;

use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::analytics::{record_visit, should_count, today_in, visited_key, Visit};
use crate::auth;
use crate::backup;
use crate::config::StorageConfig;
use crate::db::{run_migrations, seed_defaults, seed_sample_content, DbPool};
use crate::models::career::{JobApplication, JobApplicationForm, JobPosition};
use crate::models::category::Category;
use crate::models::inquiry::{Inquiry, InquiryForm};
use crate::models::metrics::{SystemMetric, VISITORS};
use crate::models::post::{render_markdown, Post, PostForm};
use crate::models::project::{Project, ProjectForm};
use crate::models::service::Service;
use crate::models::settings::Setting;
use crate::models::team::TeamMember;
use crate::models::testimonial::{Testimonial, TestimonialForm};
use crate::session::SessionFlags;
use crate::storage::{
    folder_for, imagekit::UploadReply, mime_type_for, unique_file_id, AssetStorage,
    ImageKitStorage, LocalStorage, StorageError,
};

/// Atomic counter for unique shared-cache DB names so parallel tests don't collide.
static TEST_DB_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

/// Create a fresh in-memory SQLite pool with all migrations + seed defaults applied.
/// Uses a named shared-cache in-memory DB so multiple connections see the same data.
/// Pre-seeds admin_password_hash with a fast bcrypt hash to avoid the expensive
/// DEFAULT_COST hash in seed_defaults (which can take 60s+ in debug builds).
fn test_pool() -> DbPool {
    let id = TEST_DB_COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    let uri = format!("file:testdb_{}?mode=memory&cache=shared", id);
    let manager = SqliteConnectionManager::file(uri);
    let pool = Pool::builder()
        .max_size(2)
        .build(manager)
        .expect("Failed to create test pool");
    {
        let conn = pool.get().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
    }
    run_migrations(&pool).expect("Failed to run migrations");
    {
        let conn = pool.get().unwrap();
        let fast = bcrypt::hash("admin", 4).unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES ('admin_password_hash', ?1)",
            rusqlite::params![fast],
        )
        .unwrap();
    }
    seed_defaults(&pool).expect("Failed to seed defaults");
    pool
}

/// File-backed pool for tests that need real cross-connection concurrency.
fn file_test_pool() -> (DbPool, std::path::PathBuf) {
    let path = std::env::temp_dir().join(format!("skyline_test_{}.db", uuid::Uuid::new_v4()));
    let pool = crate::db::init_pool(path.to_str().unwrap()).expect("Failed to create file pool");
    run_migrations(&pool).expect("Failed to run migrations");
    (pool, path)
}

fn temp_storage_root() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("skyline_media_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn remote_config() -> StorageConfig {
    StorageConfig {
        url_endpoint: "https://ik.imagekit.io/skyline".to_string(),
        public_key: "public_test".to_string(),
        private_key: "private_test".to_string(),
        local_fallback: false,
        local_root: "unused".to_string(),
        local_public_base: "/media".to_string(),
        timeout_secs: 2,
    }
}

/// In-memory session fake for the visitor counter.
#[derive(Default)]
struct MemoryFlags(HashSet<String>);

impl SessionFlags for MemoryFlags {
    fn get(&self, key: &str) -> bool {
        self.0.contains(key)
    }
    fn set(&mut self, key: &str) {
        self.0.insert(key.to_string());
    }
}

fn plain_visit(path: &str) -> Visit<'_> {
    Visit {
        path,
        method: "GET",
        requested_with: None,
        user_agent: Some("Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0"),
    }
}

fn march_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

// ═══════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════

#[test]
fn settings_set_and_get() {
    let pool = test_pool();
    Setting::set(&pool, "test_key", "hello").unwrap();
    assert_eq!(Setting::get(&pool, "test_key"), Some("hello".to_string()));
}

#[test]
fn settings_get_or_default() {
    let pool = test_pool();
    assert_eq!(Setting::get_or(&pool, "nonexistent", "fallback"), "fallback");
    Setting::set(&pool, "exists", "val").unwrap();
    assert_eq!(Setting::get_or(&pool, "exists", "fallback"), "val");
}

#[test]
fn settings_get_bool_and_i64() {
    let pool = test_pool();
    Setting::set(&pool, "flag_true", "true").unwrap();
    Setting::set(&pool, "flag_one", "1").unwrap();
    Setting::set(&pool, "flag_false", "false").unwrap();
    Setting::set(&pool, "num", "42").unwrap();
    assert!(Setting::get_bool(&pool, "flag_true"));
    assert!(Setting::get_bool(&pool, "flag_one"));
    assert!(!Setting::get_bool(&pool, "flag_false"));
    assert!(!Setting::get_bool(&pool, "missing_flag"));
    assert_eq!(Setting::get_i64(&pool, "num"), 42);
    assert_eq!(Setting::get_i64(&pool, "missing"), 0);
}

#[test]
fn settings_upsert_overwrites() {
    let pool = test_pool();
    Setting::set(&pool, "key", "first").unwrap();
    Setting::set(&pool, "key", "second").unwrap();
    assert_eq!(Setting::get(&pool, "key"), Some("second".to_string()));
}

// ═══════════════════════════════════════════════════════════
// Storage: folder classification & naming
// ═══════════════════════════════════════════════════════════

#[test]
fn folder_classification_by_extension() {
    assert_eq!(folder_for("photo.jpg"), "skyline/images");
    assert_eq!(folder_for("PHOTO.JPEG"), "skyline/images");
    assert_eq!(folder_for("diagram.svg"), "skyline/images");
    assert_eq!(folder_for("report.pdf"), "skyline/documents");
    assert_eq!(folder_for("cv.docx"), "skyline/documents");
    assert_eq!(folder_for("notes.txt"), "skyline/documents");
}

#[test]
fn folder_classification_by_substring() {
    // Extension rules win: an image named "profile.png" is still an image
    assert_eq!(folder_for("profile.png"), "skyline/images");
    assert_eq!(folder_for("profile_photo.bmp"), "skyline/profiles");
    assert_eq!(folder_for("service-brochure.zip"), "skyline/services");
    assert_eq!(folder_for("data.bin"), "skyline/uploads");
    assert_eq!(folder_for("noextension"), "skyline/uploads");
}

#[test]
fn unique_file_id_keeps_extension() {
    let a = unique_file_id("photo.jpg");
    let b = unique_file_id("photo.jpg");
    assert!(a.ends_with(".jpg"));
    assert!(b.ends_with(".jpg"));
    assert_ne!(a, b);

    let bare = unique_file_id("noext");
    assert!(!bare.contains('.'));
}

#[test]
fn mime_detection() {
    assert_eq!(mime_type_for("a.jpg"), "image/jpeg");
    assert_eq!(mime_type_for("a.png"), "image/png");
    assert_eq!(mime_type_for("a.pdf"), "application/pdf");
    assert_eq!(mime_type_for("a.unknownext"), "application/octet-stream");
}

// ═══════════════════════════════════════════════════════════
// Storage: upload reply decoding
// ═══════════════════════════════════════════════════════════

#[test]
fn upload_reply_prefers_full_path() {
    let body = serde_json::json!({
        "filePath": "/skyline/images/abc.jpg",
        "name": "abc.jpg",
    });
    let reply = UploadReply::parse(&body);
    assert_eq!(
        reply.stored_name("skyline/images", "xyz.jpg"),
        "skyline/images/abc.jpg"
    );
}

#[test]
fn upload_reply_falls_back_to_name() {
    let body = serde_json::json!({ "name": "abc_unique.jpg" });
    let reply = UploadReply::parse(&body);
    assert_eq!(reply, UploadReply::Name("abc_unique.jpg".to_string()));
    assert_eq!(
        reply.stored_name("skyline/images", "xyz.jpg"),
        "skyline/images/abc_unique.jpg"
    );
}

#[test]
fn upload_reply_reads_raw_metadata() {
    let body = serde_json::json!({ "fileId": "123", "filePath": 7, "size": 100 });
    let reply = UploadReply::parse(&body);
    // filePath is not a string here, so this decodes as a raw map and the
    // constructed path wins
    assert_eq!(
        reply.stored_name("skyline/uploads", "xyz.bin"),
        "skyline/uploads/xyz.bin"
    );

    let body = serde_json::json!({ "fileId": "123", "extra": { "filePath": "ignored" } });
    let reply = UploadReply::parse(&body);
    assert_eq!(
        reply.stored_name("skyline/uploads", "xyz.bin"),
        "skyline/uploads/xyz.bin"
    );
}

#[test]
fn upload_reply_raw_with_path_key() {
    let body = serde_json::json!({ "other": 1 });
    if let UploadReply::Raw(mut map) = UploadReply::parse(&body) {
        map.insert(
            "filePath".to_string(),
            serde_json::json!("/skyline/docs/x.pdf"),
        );
        let reply = UploadReply::Raw(map);
        assert_eq!(
            reply.stored_name("skyline/uploads", "xyz.pdf"),
            "skyline/docs/x.pdf"
        );
    } else {
        panic!("expected raw reply");
    }
}

// ═══════════════════════════════════════════════════════════
// Storage: remote adapter invariants (no network required)
// ═══════════════════════════════════════════════════════════

#[test]
fn remote_storage_requires_credentials() {
    let mut config = remote_config();
    config.private_key.clear();
    assert!(ImageKitStorage::new(&config).is_err());

    let mut config = remote_config();
    config.url_endpoint.clear();
    assert!(ImageKitStorage::new(&config).is_err());
}

#[test]
fn remote_exists_is_always_false() {
    let storage = ImageKitStorage::new(&remote_config()).unwrap();
    assert!(!storage.exists("skyline/images/whatever.jpg"));
    assert!(!storage.exists(""));
}

#[test]
fn remote_size_is_always_zero() {
    let storage = ImageKitStorage::new(&remote_config()).unwrap();
    assert_eq!(storage.size("skyline/images/whatever.jpg"), 0);
}

#[test]
fn remote_time_queries_are_unsupported() {
    let storage = ImageKitStorage::new(&remote_config()).unwrap();
    assert!(matches!(
        storage.accessed_time("x"),
        Err(StorageError::Unsupported(_))
    ));
    assert!(matches!(
        storage.created_time("x"),
        Err(StorageError::Unsupported(_))
    ));
    assert!(matches!(
        storage.modified_time("x"),
        Err(StorageError::Unsupported(_))
    ));
}

#[test]
fn remote_url_resolution() {
    let storage = ImageKitStorage::new(&remote_config()).unwrap();

    assert_eq!(storage.url(""), None);
    assert_eq!(
        storage.url("skyline/images/a.jpg").unwrap(),
        "https://ik.imagekit.io/skyline/skyline/images/a.jpg"
    );
    // Leading slashes are normalized away
    assert_eq!(
        storage.url("/skyline/images/a.jpg").unwrap(),
        "https://ik.imagekit.io/skyline/skyline/images/a.jpg"
    );
}

#[test]
fn remote_url_is_idempotent_on_absolute_urls() {
    let storage = ImageKitStorage::new(&remote_config()).unwrap();
    let absolute = storage.url("skyline/images/a.jpg").unwrap();
    assert_eq!(storage.url(&absolute).unwrap(), absolute);
}

// ═══════════════════════════════════════════════════════════
// Storage: local backend
// ═══════════════════════════════════════════════════════════

#[test]
fn local_storage_roundtrip() {
    let root = temp_storage_root();
    let storage = LocalStorage::at(&root, "/media");

    let stored = storage.save("photo.jpg", b"jpeg-bytes").unwrap();
    assert_eq!(stored, "photo.jpg");
    assert!(storage.exists(&stored));
    assert_eq!(storage.size(&stored), 10);
    assert_eq!(storage.url(&stored).unwrap(), "/media/photo.jpg");
    assert!(storage.modified_time(&stored).is_ok());

    assert!(storage.delete(&stored));
    assert!(!storage.exists(&stored));
    assert!(!storage.delete(&stored));

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn local_storage_avoids_collisions() {
    let root = temp_storage_root();
    let storage = LocalStorage::at(&root, "/media");

    let first = storage.save("photo.jpg", b"one").unwrap();
    let second = storage.save("photo.jpg", b"two").unwrap();
    assert_ne!(first, second);
    assert!(second.starts_with("photo_"));
    assert!(second.ends_with(".jpg"));
    assert!(storage.exists(&first));
    assert!(storage.exists(&second));

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn local_storage_strips_traversal() {
    let root = temp_storage_root();
    let storage = LocalStorage::at(&root, "/media");

    let stored = storage.save("../../etc/passwd", b"nope").unwrap();
    assert_eq!(stored, "etc/passwd");
    assert!(root.join("etc/passwd").is_file());

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn local_url_empty_and_absolute() {
    let root = temp_storage_root();
    let storage = LocalStorage::at(&root, "/media");
    assert_eq!(storage.url(""), None);
    assert_eq!(
        storage.url("https://elsewhere.example/x.jpg").unwrap(),
        "https://elsewhere.example/x.jpg"
    );
    let _ = std::fs::remove_dir_all(&root);
}

// ═══════════════════════════════════════════════════════════
// Visitor counter: filters
// ═══════════════════════════════════════════════════════════

#[test]
fn excluded_paths_never_count() {
    for path in [
        "/admin/x",
        "/my-admin/",
        "/static/app.css",
        "/media/photo.jpg",
        "/__debug__/panel",
        "/favicon.ico",
        "/robots.txt",
        "/sitemap.xml",
        "/api/auth/login",
    ] {
        assert!(!should_count(&plain_visit(path)), "{} should not count", path);
    }
}

#[test]
fn content_paths_count() {
    for path in ["/", "/projects/42/", "/blog/hello-world", "/services"] {
        assert!(should_count(&plain_visit(path)), "{} should count", path);
    }
}

#[test]
fn non_get_methods_never_count() {
    for method in ["POST", "PUT", "DELETE", "HEAD"] {
        let visit = Visit {
            method,
            ..plain_visit("/projects")
        };
        assert!(!should_count(&visit));
    }
}

#[test]
fn xhr_requests_never_count() {
    let visit = Visit {
        requested_with: Some("XMLHttpRequest"),
        ..plain_visit("/projects")
    };
    assert!(!should_count(&visit));
}

#[test]
fn bot_user_agents_never_count() {
    for ua in [
        "Mozilla/5.0 (compatible; Bingbot/2.0)",
        "my-crawler/1.0",
        "SpiderThing",
        "data-scraper",
        "curl/8.0.1",
        "Wget/1.21",
    ] {
        let visit = Visit {
            user_agent: Some(ua),
            ..plain_visit("/projects")
        };
        assert!(!should_count(&visit), "{} should be filtered", ua);
    }
}

#[test]
fn missing_user_agent_counts() {
    let visit = Visit {
        user_agent: None,
        ..plain_visit("/projects")
    };
    assert!(should_count(&visit));
}

#[test]
fn visited_key_format() {
    assert_eq!(visited_key(march_first()), "visited:2024-03-01");
}

#[test]
fn today_in_timezone_is_a_valid_date() {
    // Sanity only: the two zones straddle UTC, so their "today" values are
    // at most one day apart.
    let accra = today_in(chrono_tz::Africa::Accra);
    let auckland = today_in(chrono_tz::Pacific::Auckland);
    assert!((auckland - accra).num_days().abs() <= 1);
}

// ═══════════════════════════════════════════════════════════
// Visitor counter: recording & dedup
// ═══════════════════════════════════════════════════════════

#[test]
fn three_sessions_count_three_then_repeat_is_ignored() {
    let pool = test_pool();
    let day = march_first();

    let mut s1 = MemoryFlags::default();
    let mut s2 = MemoryFlags::default();
    let mut s3 = MemoryFlags::default();

    for flags in [&mut s1, &mut s2, &mut s3] {
        let counted = record_visit(&pool, day, &plain_visit("/projects/42/"), Some(flags)).unwrap();
        assert!(counted);
    }
    assert_eq!(SystemMetric::get(&pool, VISITORS, day), 3);

    // 4th request from session #1 again on the same day leaves it at 3
    let counted = record_visit(&pool, day, &plain_visit("/projects/42/"), Some(&mut s1)).unwrap();
    assert!(!counted);
    assert_eq!(SystemMetric::get(&pool, VISITORS, day), 3);
}

#[test]
fn one_session_many_requests_counts_once() {
    let pool = test_pool();
    let day = march_first();
    let mut session = MemoryFlags::default();

    for _ in 0..5 {
        let _ = record_visit(&pool, day, &plain_visit("/blog"), Some(&mut session)).unwrap();
    }
    assert_eq!(SystemMetric::get(&pool, VISITORS, day), 1);
}

#[test]
fn new_day_counts_again_for_same_session() {
    let pool = test_pool();
    let day1 = march_first();
    let day2 = day1.succ_opt().unwrap();
    let mut session = MemoryFlags::default();

    assert!(record_visit(&pool, day1, &plain_visit("/"), Some(&mut session)).unwrap());
    assert!(record_visit(&pool, day2, &plain_visit("/"), Some(&mut session)).unwrap());
    assert_eq!(SystemMetric::get(&pool, VISITORS, day1), 1);
    assert_eq!(SystemMetric::get(&pool, VISITORS, day2), 1);
}

/// Known, accepted limitation: with no session mechanism every qualifying
/// request counts, overcounting rather than failing closed.
#[test]
fn missing_session_overcounts_by_design() {
    let pool = test_pool();
    let day = march_first();

    for _ in 0..3 {
        assert!(record_visit(&pool, day, &plain_visit("/projects"), None).unwrap());
    }
    assert_eq!(SystemMetric::get(&pool, VISITORS, day), 3);
}

#[test]
fn excluded_request_leaves_counter_and_session_untouched() {
    let pool = test_pool();
    let day = march_first();
    let mut session = MemoryFlags::default();

    let counted =
        record_visit(&pool, day, &plain_visit("/admin/pages"), Some(&mut session)).unwrap();
    assert!(!counted);
    assert!(!session.get(&visited_key(day)));
    assert_eq!(SystemMetric::get(&pool, VISITORS, day), 0);
}

#[test]
fn bot_request_leaves_counter_untouched() {
    let pool = test_pool();
    let day = march_first();
    let visit = Visit {
        user_agent: Some("Mozilla/5.0 (compatible; Bingbot/2.0)"),
        ..plain_visit("/projects")
    };
    assert!(!record_visit(&pool, day, &visit, None).unwrap());
    assert_eq!(SystemMetric::get(&pool, VISITORS, day), 0);
}

// ═══════════════════════════════════════════════════════════
// Metrics: atomicity & reads
// ═══════════════════════════════════════════════════════════

#[test]
fn metric_defaults_to_zero() {
    let pool = test_pool();
    assert_eq!(SystemMetric::get(&pool, VISITORS, march_first()), 0);
}

#[test]
fn metric_increment_returns_new_value() {
    let pool = test_pool();
    let day = march_first();
    assert_eq!(SystemMetric::increment(&pool, VISITORS, day).unwrap(), 1);
    assert_eq!(SystemMetric::increment(&pool, VISITORS, day).unwrap(), 2);
    assert_eq!(SystemMetric::increment(&pool, VISITORS, day).unwrap(), 3);
}

#[test]
fn metric_reset_zeroes_one_day() {
    let pool = test_pool();
    let day = march_first();
    let other = day.succ_opt().unwrap();

    for _ in 0..4 {
        SystemMetric::increment(&pool, VISITORS, day).unwrap();
    }
    SystemMetric::increment(&pool, VISITORS, other).unwrap();

    SystemMetric::reset(&pool, VISITORS, day).unwrap();
    assert_eq!(SystemMetric::get(&pool, VISITORS, day), 0);
    assert_eq!(SystemMetric::get(&pool, VISITORS, other), 1);
}

#[test]
fn metric_sum_range() {
    let pool = test_pool();
    let start = march_first();
    for offset in 0..7 {
        let day = start + chrono::Duration::days(offset);
        for _ in 0..=offset {
            SystemMetric::increment(&pool, VISITORS, day).unwrap();
        }
    }
    // 1+2+3+4+5+6+7
    assert_eq!(
        SystemMetric::sum_range(&pool, VISITORS, start, start + chrono::Duration::days(6)),
        28
    );
    assert_eq!(
        SystemMetric::sum_range(&pool, VISITORS, start, start + chrono::Duration::days(2)),
        6
    );
}

#[test]
fn metric_series_fills_missing_days_with_zero() {
    let pool = test_pool();
    let start = march_first();
    SystemMetric::increment(&pool, VISITORS, start).unwrap();
    SystemMetric::increment(&pool, VISITORS, start + chrono::Duration::days(2)).unwrap();
    SystemMetric::increment(&pool, VISITORS, start + chrono::Duration::days(2)).unwrap();

    let series = SystemMetric::series(
        &pool,
        VISITORS,
        start,
        start + chrono::Duration::days(3),
    );
    assert_eq!(series.len(), 4);
    assert_eq!(series[0].date, "2024-03-01");
    assert_eq!(series[0].value, 1);
    assert_eq!(series[1].value, 0);
    assert_eq!(series[2].value, 2);
    assert_eq!(series[3].value, 0);
}

/// N simultaneous first-visits from N distinct sessions produce exactly N —
/// the increment arithmetic lives in SQL, so no update is lost.
#[test]
fn concurrent_increments_lose_nothing() {
    let (pool, path) = file_test_pool();
    let day = march_first();
    let threads: i64 = 8;
    let per_thread: i64 = 5;

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let pool = pool.clone();
            std::thread::spawn(move || {
                for _ in 0..per_thread {
                    SystemMetric::increment(&pool, VISITORS, day).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        SystemMetric::get(&pool, VISITORS, day),
        threads * per_thread
    );

    drop(pool);
    let _ = std::fs::remove_file(&path);
}

// ═══════════════════════════════════════════════════════════
// Content models
// ═══════════════════════════════════════════════════════════

fn sample_project_form() -> ProjectForm {
    ProjectForm {
        title: "Airport City Tower".to_string(),
        slug: String::new(),
        short_description: "High-rise office tower".to_string(),
        description: "Twelve floors of offices".to_string(),
        client_name: None,
        location: "Airport City, Accra".to_string(),
        category_id: None,
        start_date: Some("2023-04-01".to_string()),
        completion_date: None,
        area_sqft: Some(54_000),
        budget_range: None,
        featured_image: Some("skyline/images/tower.jpg".to_string()),
        before_image: None,
        after_image: None,
        is_featured: true,
        is_published: true,
        ord: None,
    }
}

#[test]
fn project_slug_is_generated_from_title() {
    let pool = test_pool();
    let id = Project::create(&pool, &sample_project_form()).unwrap();
    let project = Project::find_by_id(&pool, id).unwrap();
    assert_eq!(project.slug, "airport-city-tower");
    assert!(Project::find_by_slug(&pool, "airport-city-tower").is_some());
}

#[test]
fn project_explicit_slug_is_kept() {
    let pool = test_pool();
    let mut form = sample_project_form();
    form.slug = "Custom Slug Here".to_string();
    let id = Project::create(&pool, &form).unwrap();
    assert_eq!(Project::find_by_id(&pool, id).unwrap().slug, "custom-slug-here");
}

#[test]
fn project_status_derivation() {
    let pool = test_pool();
    let mut form = sample_project_form();

    form.start_date = None;
    let id = Project::create(&pool, &form).unwrap();
    assert_eq!(Project::find_by_id(&pool, id).unwrap().status(), "Planning");

    form.title = "Second".to_string();
    form.start_date = Some("2023-04-01".to_string());
    let id = Project::create(&pool, &form).unwrap();
    assert_eq!(Project::find_by_id(&pool, id).unwrap().status(), "In Progress");

    form.title = "Third".to_string();
    form.completion_date = Some("2024-02-01".to_string());
    let id = Project::create(&pool, &form).unwrap();
    assert_eq!(Project::find_by_id(&pool, id).unwrap().status(), "Completed");
}

#[test]
fn project_view_counter_increments() {
    let pool = test_pool();
    let id = Project::create(&pool, &sample_project_form()).unwrap();
    Project::increment_views(&pool, id).unwrap();
    Project::increment_views(&pool, id).unwrap();
    assert_eq!(Project::find_by_id(&pool, id).unwrap().views_count, 2);
}

#[test]
fn unpublished_projects_hidden_from_public_list() {
    let pool = test_pool();
    let mut form = sample_project_form();
    Project::create(&pool, &form).unwrap();
    form.title = "Hidden".to_string();
    form.is_published = false;
    Project::create(&pool, &form).unwrap();

    assert_eq!(Project::list(&pool, true, 50, 0).len(), 1);
    assert_eq!(Project::list(&pool, false, 50, 0).len(), 2);
    assert_eq!(Project::count(&pool, true), 1);
}

#[test]
fn post_markdown_renders_at_save_time() {
    let pool = test_pool();
    let form = PostForm {
        title: "Groundbreaking at Tema".to_string(),
        slug: String::new(),
        excerpt: None,
        content_md: "# Big news\n\nWe broke ground **today**.".to_string(),
        featured_image: None,
        author: Some("Ama".to_string()),
        category_id: None,
        status: "published".to_string(),
        published_at: Some("2024-03-01T09:00".to_string()),
    };
    let id = Post::create(&pool, &form).unwrap();
    let post = Post::find_by_id(&pool, id).unwrap();
    assert!(post.content_html.contains("<h1>"));
    assert!(post.content_html.contains("<strong>today</strong>"));
    assert_eq!(post.slug, "groundbreaking-at-tema");
    assert_eq!(Post::published(&pool, 10, 0).len(), 1);
}

#[test]
fn draft_posts_hidden_from_published_list() {
    let pool = test_pool();
    let form = PostForm {
        title: "Draft".to_string(),
        slug: String::new(),
        excerpt: None,
        content_md: "wip".to_string(),
        featured_image: None,
        author: None,
        category_id: None,
        status: "draft".to_string(),
        published_at: None,
    };
    Post::create(&pool, &form).unwrap();
    assert!(Post::published(&pool, 10, 0).is_empty());
    assert_eq!(Post::count(&pool, None), 1);
}

#[test]
fn markdown_helper_renders_tables() {
    let html = render_markdown("|a|b|\n|-|-|\n|1|2|");
    assert!(html.contains("<table>"));
}

#[test]
fn application_bumps_position_counter() {
    let pool = test_pool();
    seed_sample_content(&pool).unwrap();
    let position = JobPosition::find_by_slug(&pool, "site-engineer-engineering").unwrap();
    assert_eq!(position.applications_count, 0);

    let form = JobApplicationForm {
        position_id: position.id,
        full_name: "Efua Sarpong".to_string(),
        email: "efua@example.com".to_string(),
        phone: None,
        cover_letter: "I have five years of site experience.".to_string(),
        resume: Some("skyline/documents/resume.pdf".to_string()),
        portfolio_url: None,
    };
    let app_id = JobApplication::create(&pool, &form).unwrap();

    let position = JobPosition::find_by_id(&pool, position.id).unwrap();
    assert_eq!(position.applications_count, 1);

    let app = JobApplication::find_by_id(&pool, app_id).unwrap();
    assert_eq!(app.status, "new");

    JobApplication::update_status(&pool, app_id, "shortlisted").unwrap();
    assert_eq!(
        JobApplication::find_by_id(&pool, app_id).unwrap().status,
        "shortlisted"
    );
}

#[test]
fn testimonial_rating_is_clamped() {
    let pool = test_pool();
    let mut form = TestimonialForm {
        client_name: "Client".to_string(),
        company: None,
        role: None,
        quote: "Great work".to_string(),
        rating: 11,
        photo: None,
        is_approved: true,
        ord: None,
    };
    let id = Testimonial::create(&pool, &form).unwrap();
    assert_eq!(Testimonial::find_by_id(&pool, id).unwrap().rating, 5);

    form.rating = 0;
    form.is_approved = false;
    let id = Testimonial::create(&pool, &form).unwrap();
    assert_eq!(Testimonial::find_by_id(&pool, id).unwrap().rating, 1);

    // Only approved testimonials surface publicly
    assert_eq!(Testimonial::approved(&pool).len(), 1);
    assert_eq!(Testimonial::list(&pool).len(), 2);
}

#[test]
fn inquiry_lifecycle() {
    let pool = test_pool();
    let form = InquiryForm {
        name: "Yaw".to_string(),
        email: "yaw@example.com".to_string(),
        phone: None,
        subject: "Quote request".to_string(),
        message: "Need a quote for a duplex.".to_string(),
        inquiry_type: None,
    };
    let id = Inquiry::create(&pool, &form, Some("abc123")).unwrap();

    let inquiry = Inquiry::find_by_id(&pool, id).unwrap();
    assert_eq!(inquiry.status, "new");
    assert_eq!(inquiry.inquiry_type, "general");
    assert_eq!(Inquiry::count(&pool, Some("new")), 1);

    Inquiry::update_status(&pool, id, "resolved").unwrap();
    assert_eq!(Inquiry::count(&pool, Some("new")), 0);
    assert_eq!(Inquiry::count(&pool, Some("resolved")), 1);
}

#[test]
fn categories_are_scoped_by_type() {
    let pool = test_pool();
    seed_sample_content(&pool).unwrap();
    assert_eq!(Category::list(&pool, "project").len(), 3);
    assert_eq!(Category::list(&pool, "service").len(), 2);
    assert_eq!(Category::list(&pool, "blog").len(), 1);
}

#[test]
fn sample_content_seeds_once() {
    let pool = test_pool();
    seed_sample_content(&pool).unwrap();
    seed_sample_content(&pool).unwrap();
    assert_eq!(Service::count(&pool, false), 3);
    assert_eq!(TeamMember::active(&pool).len(), 3);
    assert_eq!(Project::count(&pool, true), 2);
}

// ═══════════════════════════════════════════════════════════
// Auth
// ═══════════════════════════════════════════════════════════

#[test]
fn password_hash_and_verify() {
    let hash = bcrypt::hash("secret", 4).unwrap();
    assert!(auth::verify_password("secret", &hash));
    assert!(!auth::verify_password("wrong", &hash));
    assert!(!auth::verify_password("secret", "not-a-hash"));
}

#[test]
fn session_lifecycle() {
    let pool = test_pool();
    let session_id = auth::create_session(&pool, Some("10.0.0.1"), None).unwrap();
    assert!(auth::validate_session(&pool, &session_id));
    assert!(!auth::validate_session(&pool, "bogus"));

    auth::destroy_session(&pool, &session_id).unwrap();
    assert!(!auth::validate_session(&pool, &session_id));
}

#[test]
fn expired_sessions_are_cleaned_up() {
    let pool = test_pool();
    let session_id = auth::create_session(&pool, None, None).unwrap();
    {
        let conn = pool.get().unwrap();
        conn.execute(
            "UPDATE sessions SET expires_at = datetime('now', '-1 hour') WHERE id = ?1",
            rusqlite::params![session_id],
        )
        .unwrap();
    }
    assert!(!auth::validate_session(&pool, &session_id));

    auth::cleanup_expired_sessions(&pool).unwrap();
    let count: i64 = pool
        .get()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM sessions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn ip_hashing_is_stable_and_hex() {
    let a = auth::hash_ip("192.0.2.1");
    let b = auth::hash_ip("192.0.2.1");
    assert_eq!(a, b);
    assert_eq!(a.len(), 64);
    assert_ne!(a, auth::hash_ip("192.0.2.2"));
}

// ═══════════════════════════════════════════════════════════
// Backup / restore
// ═══════════════════════════════════════════════════════════

#[test]
fn backup_roundtrip_restores_content() {
    let pool = test_pool();
    seed_sample_content(&pool).unwrap();
    SystemMetric::increment(&pool, VISITORS, march_first()).unwrap();

    let archive = backup::create_backup(&pool).unwrap();
    assert!(!archive.is_empty());

    // Mutate: drop all services, add an inquiry that postdates the backup
    for service in Service::list(&pool, false) {
        Service::delete(&pool, service.id).unwrap();
    }
    let form = InquiryForm {
        name: "Post-backup".to_string(),
        email: "x@example.com".to_string(),
        phone: None,
        subject: String::new(),
        message: "should disappear".to_string(),
        inquiry_type: None,
    };
    Inquiry::create(&pool, &form, None).unwrap();
    assert_eq!(Service::count(&pool, false), 0);

    let summary = backup::restore_backup(&pool, &archive).unwrap();
    assert!(summary.tables >= 10);
    assert_eq!(Service::count(&pool, false), 3);
    assert_eq!(Inquiry::count(&pool, None), 0);
    assert_eq!(SystemMetric::get(&pool, VISITORS, march_first()), 1);
}

#[test]
fn restore_rejects_garbage() {
    let pool = test_pool();
    assert!(backup::restore_backup(&pool, b"not a zip").is_err());
}

// ═══════════════════════════════════════════════════════════
// Composed media backend
// ═══════════════════════════════════════════════════════════

#[test]
fn media_storage_dev_mode_uses_local_backend() {
    let root = temp_storage_root();
    let media = crate::storage::MediaStorage::local_only(LocalStorage::at(&root, "/media"));

    let stored = media.save("photo.jpg", b"bytes").unwrap();
    assert_eq!(stored, "photo.jpg");
    assert_eq!(media.url(&stored).unwrap(), "/media/photo.jpg");
    assert!(media.exists(&stored));
    assert!(media.delete(&stored));

    let _ = std::fs::remove_dir_all(&root);
}

/// A remote client that never initialized falls back to local disk even
/// outside dev mode; only a failing call on an initialized remote is
/// surfaced in production.
#[test]
fn media_storage_uninitialized_remote_falls_back() {
    let root = temp_storage_root();
    let mut config = remote_config();
    config.private_key.clear();
    config.local_fallback = false;
    config.local_root = root.to_str().unwrap().to_string();

    let media = crate::storage::MediaStorage::from_config(&config);
    let stored = media.save("photo.jpg", b"x").unwrap();
    assert!(root.join(&stored).is_file());

    let _ = std::fs::remove_dir_all(&root);
}
