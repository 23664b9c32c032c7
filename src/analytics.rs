use chrono::NaiveDate;
use chrono_tz::Tz;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Data, Request};

use crate::db::DbPool;
use crate::models::metrics::{SystemMetric, VISITORS};
use crate::session::{CookieFlags, SessionFlags};

/// Paths that never count as visits: admin and dashboard UIs, static and
/// media assets, debug tooling, well-known files, and the auth API.
pub const EXCLUDED_PREFIXES: &[&str] = &[
    "/admin/",
    "/my-admin/",
    "/static/",
    "/media/",
    "/__debug__",
    "/favicon.ico",
    "/robots.txt",
    "/sitemap.xml",
    "/api/auth/",
];

/// Automation markers matched case-insensitively against the user agent.
const BOT_MARKERS: &[&str] = &["bot", "crawler", "spider", "scraper", "curl", "wget"];

/// The request fields the visit filter looks at, decoupled from Rocket's
/// request type so the filter and recorder are testable directly.
pub struct Visit<'a> {
    pub path: &'a str,
    pub method: &'a str,
    pub requested_with: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

/// Filters a visit qualifies for counting: content path, plain GET, not a
/// background fetch, not an automation client.
pub fn should_count(visit: &Visit) -> bool {
    if EXCLUDED_PREFIXES
        .iter()
        .any(|prefix| visit.path.starts_with(prefix))
    {
        return false;
    }

    if visit.method != "GET" {
        return false;
    }

    if visit.requested_with == Some("XMLHttpRequest") {
        return false;
    }

    if let Some(ua) = visit.user_agent {
        let ua = ua.to_lowercase();
        if BOT_MARKERS.iter().any(|marker| ua.contains(marker)) {
            return false;
        }
    }

    true
}

/// Session flag key for one calendar day.
pub fn visited_key(date: NaiveDate) -> String {
    format!("visited:{}", date.format("%Y-%m-%d"))
}

/// Today in the deployment's time zone, so the day boundary matches
/// operator expectations rather than UTC.
pub fn today_in(tz: Tz) -> NaiveDate {
    chrono::Utc::now().with_timezone(&tz).date_naive()
}

/// Evaluate one request against the daily visitor counter. Returns whether
/// the request was counted.
///
/// Without a session mechanism every qualifying request counts — an
/// accepted overcount, since no other deduplication exists for such
/// callers.
pub fn record_visit(
    pool: &DbPool,
    date: NaiveDate,
    visit: &Visit,
    session: Option<&mut dyn SessionFlags>,
) -> Result<bool, String> {
    if !should_count(visit) {
        return Ok(false);
    }

    let key = visited_key(date);
    if let Some(flags) = session {
        if flags.get(&key) {
            return Ok(false);
        }
        flags.set(&key);
    }

    SystemMetric::increment(pool, VISITORS, date)?;
    Ok(true)
}

/// Middleware that counts one visit per session per day on public pages.
/// Strictly an auxiliary side channel: every failure is swallowed and the
/// request proceeds untouched.
pub struct VisitorTracker {
    pub timezone: Tz,
}

#[rocket::async_trait]
impl Fairing for VisitorTracker {
    fn info(&self) -> Info {
        Info {
            name: "Daily Visitor Counter",
            kind: Kind::Request,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _data: &mut Data<'_>) {
        let pool = match request.rocket().state::<DbPool>() {
            Some(p) => p,
            None => return,
        };

        let path = request.uri().path().to_string();
        let method = request.method().as_str();
        let visit = Visit {
            path: &path,
            method,
            requested_with: request.headers().get_one("X-Requested-With"),
            user_agent: request.headers().get_one("User-Agent"),
        };

        let mut flags = CookieFlags::new(request.cookies());
        let today = today_in(self.timezone);

        if let Err(e) = record_visit(pool, today, &visit, Some(&mut flags)) {
            log::debug!("Visitor tracking failed: {}", e);
        }
    }
}
