//! Revalidation decision for cached lines
//!
//! Rules are applied in order, first match wins:
//!
//! 1. forced update mode revalidates
//! 2. `Cache-Control: must-revalidate` revalidates
//! 3. lines younger than the minimum cache period are served as is
//! 4. `Cache-Control: max-age=N` revalidates once `last_updated + N` is past
//!    (immediately for `N <= 0`)
//! 5. a parsable `Expires` revalidates when the date is in the future;
//!    with `strict_expires` it revalidates when the date is in the past
//! 6. no directives revalidates

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::config::CacheConfig;
use super::headers::{parse_http_date, CachedHeaders};

/// `Cache-Control` directives the policy looks at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheControl {
    pub must_revalidate: bool,
    /// Seconds; an unparsable value counts as 0
    pub max_age: Option<i64>,
}

impl CacheControl {
    pub fn parse(header: &str) -> Self {
        let mut cc = CacheControl::default();

        for directive in header.split(',').map(|s| s.trim().to_ascii_lowercase()) {
            if directive == "must-revalidate" {
                cc.must_revalidate = true;
            } else if let Some(value) = directive.strip_prefix("max-age=") {
                cc.max_age = Some(value.trim_matches('"').parse().unwrap_or(0));
            }
        }

        cc
    }
}

/// Outcome of the freshness check, with the rule that decided it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Serve the cached content without a network round-trip
    Fresh(&'static str),
    /// Issue a conditional request
    Revalidate(&'static str),
}

impl Freshness {
    pub fn must_revalidate(&self) -> bool {
        matches!(self, Freshness::Revalidate(_))
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Freshness::Fresh(reason) | Freshness::Revalidate(reason) => reason,
        }
    }
}

/// Freshness rules for one cache configuration
#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    min_cache_period: Duration,
    strict_expires: bool,
}

impl FreshnessPolicy {
    pub fn new(min_cache_period: Duration, strict_expires: bool) -> Self {
        Self {
            min_cache_period,
            strict_expires,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.min_cache_period, config.strict_expires)
    }

    /// Decide whether a line with existing content needs revalidation
    pub fn evaluate(
        &self,
        headers: &CachedHeaders,
        force_update: bool,
        now: DateTime<Utc>,
    ) -> Freshness {
        if force_update {
            return Freshness::Revalidate("update mode");
        }

        let cache_control = headers
            .get("cache-control")
            .map(CacheControl::parse)
            .unwrap_or_default();

        if cache_control.must_revalidate {
            return Freshness::Revalidate("must-revalidate");
        }

        let now_millis = now.timestamp_millis();
        if let Some(last_updated) = headers.last_updated {
            let age = now_millis.saturating_sub(last_updated);
            if age >= 0 && (age as u128) < self.min_cache_period.as_millis() {
                return Freshness::Fresh("within minimum cache period");
            }
        }

        if let Some(max_age) = cache_control.max_age {
            if max_age <= 0 {
                return Freshness::Revalidate("max-age=0");
            }
            return match headers.last_updated {
                Some(last_updated)
                    if last_updated.saturating_add(max_age.saturating_mul(1000)) >= now_millis =>
                {
                    Freshness::Fresh("max-age not elapsed")
                }
                _ => Freshness::Revalidate("max-age elapsed"),
            };
        }

        if let Some(expires) = headers.get("expires").and_then(parse_http_date) {
            let in_future = expires > now;
            let stale = if self.strict_expires {
                !in_future
            } else {
                in_future
            };
            return if stale {
                Freshness::Revalidate("expires")
            } else {
                Freshness::Fresh("expires")
            };
        }

        Freshness::Revalidate("no cache directives")
    }
}
