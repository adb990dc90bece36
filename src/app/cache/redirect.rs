//! Redirect chain bookkeeping for a single lookup
//!
//! Hops are keyed on the cache path a URI maps to, not the URI itself:
//! distinct URIs such as `/a:b.jar` and `/a/b.jar` share one cache line,
//! and revisiting a line within one lookup would wait on its own lock.

use std::path::PathBuf;

use url::Url;

use super::path::PathGenerator;
use crate::constants::MAX_REDIRECTS;
use crate::errors::{CacheError, CacheResult};

/// Cache paths visited while resolving one lookup
#[derive(Debug, Clone)]
pub struct RedirectChain {
    start: String,
    visited: Vec<PathBuf>,
}

impl RedirectChain {
    /// Start a chain at the requested URI
    pub fn new(start: &Url) -> Self {
        Self {
            start: start.to_string(),
            visited: vec![PathGenerator::relative_path(start)],
        }
    }

    /// Record a hop, failing on a revisited cache line or an overlong chain
    pub fn follow(&mut self, from: &Url, to: &Url) -> CacheResult<()> {
        let target = PathGenerator::relative_path(to);

        if self.visited.contains(&target) {
            return Err(CacheError::RedirectLoop {
                url: from.to_string(),
                location: to.to_string(),
            });
        }

        if self.hops() >= MAX_REDIRECTS {
            return Err(CacheError::TooManyRedirects {
                url: self.start.clone(),
                max: MAX_REDIRECTS,
            });
        }

        self.visited.push(target);
        Ok(())
    }

    /// Redirects followed so far
    pub fn hops(&self) -> usize {
        self.visited.len() - 1
    }
}
