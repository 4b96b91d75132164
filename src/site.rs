//! Request-scoped tenant resolution.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::HOST, request::Parts},
};
use chrono::Duration;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::error::AppError;
use crate::models::{NewSite, NewSiteConfig, Site, SiteConfig};
use crate::schema::{site_configs, sites};
use crate::state::AppState;

pub const DEFAULT_EXPIRE_AFTER_DAYS: i32 = 30;

/// The site a request is served for.
#[derive(Debug, Clone)]
pub struct CurrentSite(pub Site);

impl CurrentSite {
    pub fn id(&self) -> i32 {
        self.0.id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSite {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let host = parts
            .headers
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .and_then(domain_from_host);

        let mut conn = state.db()?;
        let site = resolve_site(&mut conn, host.as_deref(), state.config.default_site_id)?;

        match site {
            Some(site) => Ok(CurrentSite(site)),
            None => {
                tracing::warn!(host = ?host, "no site configured for host");
                Err(AppError::not_found())
            }
        }
    }
}

/// Lowercased host without port, or `None` when empty.
pub fn domain_from_host(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let domain = if raw.starts_with('[') {
        // IPv6 literal, keep the brackets
        raw.split_inclusive(']').next().unwrap_or(raw)
    } else {
        raw.split(':').next().unwrap_or(raw)
    };
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    (!domain.is_empty()).then_some(domain)
}

pub fn resolve_site(
    conn: &mut PgConnection,
    domain: Option<&str>,
    default_site_id: Option<i32>,
) -> QueryResult<Option<Site>> {
    if let Some(domain) = domain {
        let matched = sites::table
            .filter(sites::domain.eq(domain))
            .first::<Site>(conn)
            .optional()?;
        if matched.is_some() {
            return Ok(matched);
        }
    }

    match default_site_id {
        Some(site_id) => sites::table.find(site_id).first(conn).optional(),
        None => Ok(None),
    }
}

pub fn create_site(
    conn: &mut PgConnection,
    domain: &str,
    name: &str,
    admin_email: Option<&str>,
) -> QueryResult<Site> {
    conn.transaction(|conn| {
        let site: Site = diesel::insert_into(sites::table)
            .values(&NewSite {
                domain: domain.trim().to_ascii_lowercase(),
                name: name.trim().to_string(),
            })
            .get_result(conn)?;

        diesel::insert_into(site_configs::table)
            .values(&NewSiteConfig {
                site_id: site.id,
                expire_after_days: DEFAULT_EXPIRE_AFTER_DAYS,
                admin_email: admin_email
                    .map(str::trim)
                    .filter(|email| !email.is_empty())
                    .map(str::to_string),
            })
            .execute(conn)?;

        Ok(site)
    })
}

pub fn site_config(conn: &mut PgConnection, site_id: i32) -> QueryResult<Option<SiteConfig>> {
    site_configs::table
        .find(site_id)
        .first::<SiteConfig>(conn)
        .optional()
}

/// How long a paid job stays listed on a site.
pub fn expire_after(conn: &mut PgConnection, site_id: i32) -> QueryResult<Duration> {
    let days = site_config(conn, site_id)?
        .map(|config| config.expire_after_days)
        .unwrap_or(DEFAULT_EXPIRE_AFTER_DAYS);
    Ok(Duration::days(i64::from(days.max(1))))
}

#[cfg(test)]
mod tests {
    use super::domain_from_host;

    #[test]
    fn strips_port_and_case() {
        assert_eq!(
            domain_from_host("Jobs.Example.org:8080").as_deref(),
            Some("jobs.example.org")
        );
    }

    #[test]
    fn keeps_ipv6_literal() {
        assert_eq!(domain_from_host("[::1]:3000").as_deref(), Some("[::1]"));
    }

    #[test]
    fn trailing_dot_is_ignored() {
        assert_eq!(
            domain_from_host("example.com.").as_deref(),
            Some("example.com")
        );
    }

    #[test]
    fn empty_host_is_none() {
        assert_eq!(domain_from_host("  "), None);
        assert_eq!(domain_from_host(":80"), None);
    }
}
