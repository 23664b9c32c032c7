use rocket::http::{Cookie, CookieJar, SameSite};

/// Minimal per-session key/value flags, handed to request-scoped logic as
/// an explicit capability so it stays testable with an in-memory fake.
pub trait SessionFlags {
    fn get(&self, key: &str) -> bool;
    fn set(&mut self, key: &str);
}

/// Session-flag store backed by the request's cookie jar. Flags are written
/// as session cookies (no max-age), so they live exactly as long as the
/// browsing session.
pub struct CookieFlags<'a, 'r> {
    jar: &'a CookieJar<'r>,
}

impl<'a, 'r> CookieFlags<'a, 'r> {
    pub fn new(jar: &'a CookieJar<'r>) -> CookieFlags<'a, 'r> {
        CookieFlags { jar }
    }

    /// ':' is not a valid cookie-name character; flag keys are transported
    /// with it mapped to '_'.
    fn cookie_name(key: &str) -> String {
        key.replace(':', "_")
    }
}

impl SessionFlags for CookieFlags<'_, '_> {
    fn get(&self, key: &str) -> bool {
        self.jar.get(&Self::cookie_name(key)).is_some()
    }

    fn set(&mut self, key: &str) {
        let cookie = Cookie::build((Self::cookie_name(key), "1"))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .build();
        self.jar.add(cookie);
    }
}
