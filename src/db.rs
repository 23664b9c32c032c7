use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

pub fn init_pool(path: &str) -> Result<DbPool, Box<dyn std::error::Error>> {
    // WAL for concurrent reads; busy_timeout so simultaneous counter
    // increments queue instead of failing with SQLITE_BUSY. Applied per
    // connection — foreign_keys and busy_timeout do not persist.
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;",
        )
    });
    let pool = Pool::builder().max_size(10).build(manager)?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        -- Settings (key-value)
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        );

        -- Admin sessions
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            created_at DATETIME NOT NULL,
            expires_at DATETIME NOT NULL,
            ip_address TEXT,
            user_agent TEXT
        );

        -- Categories (shared between projects, services, and blog posts)
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            type TEXT NOT NULL,
            description TEXT,
            color TEXT NOT NULL DEFAULT '#0ea5e9',
            ord INTEGER DEFAULT 0,
            is_active INTEGER DEFAULT 1,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Portfolio projects
        CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            short_description TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            client_name TEXT,
            location TEXT NOT NULL DEFAULT '',
            category_id INTEGER,
            start_date DATE,
            completion_date DATE,
            area_sqft INTEGER,
            budget_range TEXT,
            featured_image TEXT NOT NULL DEFAULT '',
            before_image TEXT,
            after_image TEXT,
            is_featured INTEGER DEFAULT 0,
            is_published INTEGER DEFAULT 1,
            ord INTEGER DEFAULT 0,
            views_count INTEGER DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (category_id) REFERENCES categories(id)
        );

        -- Project gallery images
        CREATE TABLE IF NOT EXISTS project_images (
            id INTEGER PRIMARY KEY,
            project_id INTEGER NOT NULL,
            image TEXT NOT NULL,
            caption TEXT,
            alt_text TEXT,
            ord INTEGER DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
        );

        -- Services
        CREATE TABLE IF NOT EXISTS services (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            category_id INTEGER,
            icon TEXT,
            summary TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            featured_image TEXT,
            is_featured INTEGER DEFAULT 0,
            is_active INTEGER DEFAULT 1,
            ord INTEGER DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (category_id) REFERENCES categories(id)
        );

        -- Blog posts
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            excerpt TEXT,
            content_md TEXT NOT NULL DEFAULT '',
            content_html TEXT NOT NULL DEFAULT '',
            featured_image TEXT,
            author TEXT,
            category_id INTEGER,
            status TEXT NOT NULL DEFAULT 'draft',
            published_at DATETIME,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (category_id) REFERENCES categories(id)
        );

        -- Departments (careers)
        CREATE TABLE IF NOT EXISTS departments (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            description TEXT,
            is_active INTEGER DEFAULT 1,
            ord INTEGER DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Job openings
        CREATE TABLE IF NOT EXISTS job_positions (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            department_id INTEGER NOT NULL,
            job_type TEXT NOT NULL DEFAULT 'full_time',
            experience_level TEXT NOT NULL DEFAULT 'mid',
            location TEXT NOT NULL DEFAULT 'Accra, Ghana',
            remote_allowed INTEGER DEFAULT 0,
            summary TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            responsibilities TEXT NOT NULL DEFAULT '',
            requirements TEXT NOT NULL DEFAULT '',
            benefits TEXT,
            salary_min REAL,
            salary_max REAL,
            salary_currency TEXT NOT NULL DEFAULT 'GHS',
            application_deadline DATETIME,
            status TEXT NOT NULL DEFAULT 'draft',
            is_featured INTEGER DEFAULT 0,
            is_urgent INTEGER DEFAULT 0,
            views_count INTEGER DEFAULT 0,
            applications_count INTEGER DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (department_id) REFERENCES departments(id)
        );

        -- Job applications
        CREATE TABLE IF NOT EXISTS job_applications (
            id INTEGER PRIMARY KEY,
            position_id INTEGER NOT NULL,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            cover_letter TEXT NOT NULL DEFAULT '',
            resume TEXT,
            portfolio_url TEXT,
            status TEXT NOT NULL DEFAULT 'new',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (position_id) REFERENCES job_positions(id)
        );

        -- Testimonials
        CREATE TABLE IF NOT EXISTS testimonials (
            id INTEGER PRIMARY KEY,
            client_name TEXT NOT NULL,
            company TEXT,
            role TEXT,
            quote TEXT NOT NULL,
            rating INTEGER NOT NULL DEFAULT 5,
            photo TEXT,
            is_approved INTEGER DEFAULT 0,
            ord INTEGER DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Team members
        CREATE TABLE IF NOT EXISTS team_members (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT '',
            bio TEXT,
            photo TEXT,
            email TEXT,
            linkedin_url TEXT,
            ord INTEGER DEFAULT 0,
            is_active INTEGER DEFAULT 1,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Contact inquiries
        CREATE TABLE IF NOT EXISTS inquiries (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            subject TEXT NOT NULL DEFAULT '',
            message TEXT NOT NULL,
            inquiry_type TEXT NOT NULL DEFAULT 'general',
            status TEXT NOT NULL DEFAULT 'new',
            ip_hash TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Daily site metrics (visitor counter et al.)
        CREATE TABLE IF NOT EXISTS system_metrics (
            id INTEGER PRIMARY KEY,
            metric_name TEXT NOT NULL,
            metric_date DATE NOT NULL,
            metric_value INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(metric_name, metric_date)
        );

        CREATE INDEX IF NOT EXISTS idx_projects_published ON projects(is_published, ord);
        CREATE INDEX IF NOT EXISTS idx_posts_status ON posts(status, published_at);
        CREATE INDEX IF NOT EXISTS idx_positions_status ON job_positions(status);
        CREATE INDEX IF NOT EXISTS idx_applications_position ON job_applications(position_id);
        CREATE INDEX IF NOT EXISTS idx_metrics_date ON system_metrics(metric_name, metric_date);
        ",
    )?;

    Ok(())
}

pub fn seed_defaults(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    let defaults = vec![
        // General
        ("site_name", "Skyline Ghana Constructions"),
        ("site_tagline", "Building Dreams, Creating Futures"),
        (
            "site_description",
            "Professional construction services in Ghana",
        ),
        ("site_logo", ""),
        ("site_favicon", ""),
        // Contact
        ("phone_primary", "+233 24 123 4567"),
        ("phone_secondary", ""),
        ("email_primary", "info@skylineghana.com"),
        ("email_secondary", ""),
        ("address_line_1", ""),
        ("address_line_2", ""),
        ("city", "Accra"),
        ("region", "Greater Accra"),
        ("business_hours", "Mon-Fri: 8:00 AM - 5:00 PM"),
        // Map
        ("latitude", ""),
        ("longitude", ""),
        // Social
        ("facebook_url", ""),
        ("twitter_url", ""),
        ("instagram_url", ""),
        ("linkedin_url", ""),
        ("youtube_url", ""),
        // Hero content
        ("hero_title", "Building the Future, Block by Block."),
        (
            "hero_subtitle",
            "Skyline Ghana Constructions is a leading name in construction and design, \
             transforming visions into reality with precision, innovation, and a \
             commitment to quality.",
        ),
        ("hero_background", ""),
        ("get_in_touch_text", "Get in Touch"),
        // Blog
        ("blog_posts_per_page", "9"),
        ("show_blog_in_top_nav", "true"),
        // Projects
        ("projects_per_page", "12"),
        // Uploads
        ("images_max_upload_mb", "10"),
        (
            "images_allowed_types",
            "jpg,jpeg,png,gif,webp,svg",
        ),
        ("documents_allowed_types", "pdf,doc,docx,txt,rtf"),
        // Admin
        ("session_expiry_hours", "24"),
    ];

    for (key, value) in defaults {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
    }

    // Seed admin password if not set
    let admin_exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM settings WHERE key = 'admin_password_hash'",
        [],
        |row| row.get(0),
    )?;

    if admin_exists == 0 {
        // Default password: "admin" — user MUST change on first login
        let hash = bcrypt::hash("admin", bcrypt::DEFAULT_COST)
            .expect("Failed to hash default password");
        conn.execute(
            "INSERT INTO settings (key, value) VALUES ('admin_password_hash', ?1)",
            params![hash],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES ('admin_setup_complete', 'false')",
            params![],
        )?;
    }

    Ok(())
}

/// Populate demonstration content: categories, services, a couple of
/// projects, team members, testimonials, and one open position. Safe to run
/// repeatedly — does nothing once any content exists.
pub fn seed_sample_content(pool: &DbPool) -> Result<(), String> {
    let conn = pool.get().map_err(|e| e.to_string())?;

    let existing: i64 = conn
        .query_row("SELECT COUNT(*) FROM services", [], |row| row.get(0))
        .map_err(|e| e.to_string())?;
    if existing > 0 {
        return Ok(());
    }

    conn.execute_batch(
        "
        INSERT INTO categories (name, slug, type, ord) VALUES
            ('Residential', 'residential', 'project', 1),
            ('Commercial', 'commercial', 'project', 2),
            ('Renovation', 'renovation', 'project', 3),
            ('Construction', 'construction', 'service', 1),
            ('Design', 'design', 'service', 2),
            ('Company News', 'company-news', 'blog', 1);

        INSERT INTO services (title, slug, summary, description, icon, is_featured, ord) VALUES
            ('Building Construction', 'building-construction',
             'Complete residential and commercial construction from foundation to finish.',
             'We handle every phase of construction with certified engineers and modern equipment.',
             'fa-building', 1, 1),
            ('Architectural Design', 'architectural-design',
             'Modern architectural design and planning services.',
             'Our design team produces detailed architectural plans, 3D renders, and permit drawings.',
             'fa-compass', 1, 2),
            ('Building Materials', 'building-materials',
             'Quality building materials supplied at competitive prices.',
             'We source and deliver cement, steel, roofing, and finishing materials across Ghana.',
             'fa-truck', 1, 3);

        INSERT INTO projects (title, slug, short_description, description, location,
                              category_id, is_featured, is_published, ord) VALUES
            ('East Legon Residence', 'east-legon-residence',
             'A four-bedroom private residence in East Legon, Accra.',
             'Complete design and build of a modern family home with landscaped compound.',
             'East Legon, Accra', 1, 1, 1, 1),
            ('Tema Warehouse Complex', 'tema-warehouse-complex',
             'A 2,400 sqm logistics warehouse near Tema port.',
             'Steel-frame warehouse with office block, completed on a nine-month schedule.',
             'Tema', 2, 1, 1, 2);

        INSERT INTO team_members (name, role, bio, ord) VALUES
            ('Kwame Mensah', 'Managing Director', 'Over 20 years of construction management experience.', 1),
            ('Ama Owusu', 'Lead Architect', 'Award-winning architect specializing in sustainable design.', 2),
            ('Kofi Boateng', 'Site Operations Manager', 'Ensures every site runs safely and on schedule.', 3);

        INSERT INTO testimonials (client_name, company, quote, rating, is_approved, ord) VALUES
            ('Akosua Asante', 'Asante Holdings',
             'Skyline delivered our office complex ahead of schedule and within budget.', 5, 1, 1),
            ('Yaw Darko', '',
             'Professional team from design to handover. Highly recommended.', 5, 1, 2);

        INSERT INTO departments (name, slug, ord) VALUES
            ('Engineering', 'engineering', 1),
            ('Operations', 'operations', 2);

        INSERT INTO job_positions (title, slug, department_id, job_type, experience_level,
                                   summary, description, responsibilities, requirements, status)
        VALUES
            ('Site Engineer', 'site-engineer-engineering', 1, 'full_time', 'mid',
             'Supervise construction sites across Greater Accra.',
             'Responsible for daily site supervision, quality control, and subcontractor coordination.',
             'Daily site supervision\nQuality control\nProgress reporting',
             'BSc Civil Engineering\n3+ years site experience',
             'active');
        ",
    )
    .map_err(|e| e.to_string())?;

    Ok(())
}
