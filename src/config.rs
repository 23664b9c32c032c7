use serde::Deserialize;

/// Application configuration, loaded once at boot from `skyline.toml` and
/// shared immutably through Rocket managed state. Credentials can be
/// overridden (or supplied entirely) via environment variables so the TOML
/// file never needs to hold secrets.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub tracking: TrackingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Public CDN base used to resolve stored names to fetchable URLs.
    pub url_endpoint: String,
    pub public_key: String,
    pub private_key: String,
    /// Permissive mode: upload failures fall back to local disk instead of
    /// surfacing to the caller. Production deployments leave this off.
    pub local_fallback: bool,
    /// Root directory for the local (fallback) backend.
    pub local_root: String,
    /// Public path prefix under which `local_root` is served.
    pub local_public_base: String,
    /// Remote call timeout in seconds.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// IANA time zone used to compute "today" for the daily visitor counter.
    pub timezone: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            site: SiteConfig::default(),
            database: DatabaseConfig::default(),
            storage: StorageConfig::default(),
            tracking: TrackingConfig::default(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            name: "Skyline Ghana Constructions".to_string(),
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: "website/db/skyline.db".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            url_endpoint: String::new(),
            public_key: String::new(),
            private_key: String::new(),
            local_fallback: true,
            local_root: "website/media".to_string(),
            local_public_base: "/media".to_string(),
            timeout_secs: 8,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        TrackingConfig {
            timezone: "Africa/Accra".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, falling back to defaults when the
    /// file is absent. A malformed file is a hard error: silently running
    /// with defaults after a typo hides misconfiguration.
    pub fn load(path: &str) -> Result<AppConfig, String> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str::<AppConfig>(&text)
                .map_err(|e| format!("{}: {}", path, e))?,
            Err(_) => AppConfig::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("SKYLINE_IMAGEKIT_URL_ENDPOINT") {
            self.storage.url_endpoint = v;
        }
        if let Ok(v) = std::env::var("SKYLINE_IMAGEKIT_PUBLIC_KEY") {
            self.storage.public_key = v;
        }
        if let Ok(v) = std::env::var("SKYLINE_IMAGEKIT_PRIVATE_KEY") {
            self.storage.private_key = v;
        }
        if let Ok(v) = std::env::var("SKYLINE_LOCAL_FALLBACK") {
            self.storage.local_fallback = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("SKYLINE_TIMEZONE") {
            self.tracking.timezone = v;
        }
    }

    /// Parsed deployment time zone; falls back to UTC on an unknown name.
    pub fn timezone(&self) -> chrono_tz::Tz {
        self.tracking
            .timezone
            .parse()
            .unwrap_or(chrono_tz::Tz::UTC)
    }
}
