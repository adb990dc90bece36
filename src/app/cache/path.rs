//! URI normalization and cache path generation
//!
//! A URI maps onto a relative path below the cache root by replacing the
//! characters `:`, `?`, `&` and `*` with separators and collapsing empty
//! segments. Lookups for the same resource therefore always land on the
//! same file, across processes and runs.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use url::Url;

use crate::constants::{cache, headers};
use crate::errors::{CacheError, CacheResult};

/// Characters replaced by a path separator
const SEPARATOR_CHARS: [char; 5] = ['/', ':', '?', '&', '*'];

/// Path generation utility for cache files
pub struct PathGenerator;

impl PathGenerator {
    /// Parse and normalize an absolute URI
    ///
    /// Dot segments are resolved, scheme and host are lower-cased by the
    /// parser, and the fragment is dropped since it never reaches the server.
    pub fn normalize(raw: &str) -> CacheResult<Url> {
        let mut url = Url::parse(raw.trim()).map_err(|e| CacheError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        if url.cannot_be_a_base() {
            return Err(CacheError::InvalidUrl {
                url: raw.to_string(),
                reason: "URI has no hierarchical path".to_string(),
            });
        }

        url.set_fragment(None);
        Ok(url)
    }

    /// Resolve a `Location` value against the URI that returned it
    pub fn resolve_location(base: &Url, location: &str) -> CacheResult<Url> {
        let mut target = base.join(location.trim()).map_err(|e| CacheError::InvalidUrl {
            url: location.to_string(),
            reason: e.to_string(),
        })?;
        target.set_fragment(None);
        Ok(target)
    }

    /// Canonical string form used as the identity of a URI
    ///
    /// Percent escapes are upper-cased so `%2f` and `%2F` agree.
    pub fn canonical(url: &Url) -> String {
        let raw = url.as_str();
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            out.push(c);
            if c == '%' {
                for _ in 0..2 {
                    match chars.peek() {
                        Some(h) if h.is_ascii_hexdigit() => {
                            out.push(h.to_ascii_uppercase());
                            chars.next();
                        }
                        _ => break,
                    }
                }
            }
        }
        out
    }

    /// Relative cache path for a normalized URI
    ///
    /// A URI ending in a separator gets the synthetic leaf `.idx`. Literal
    /// segments that could clash with synthetic names (a leading dot, or a
    /// `.headers` suffix) have that dot escaped as `%2E`.
    pub fn relative_path(url: &Url) -> PathBuf {
        let canonical = Self::canonical(url);
        let ends_with_separator = canonical.ends_with(SEPARATOR_CHARS);

        let mut path = PathBuf::new();
        for segment in canonical
            .split(SEPARATOR_CHARS)
            .filter(|segment| !segment.is_empty())
        {
            path.push(Self::escape_segment(segment));
        }

        if ends_with_separator || path.as_os_str().is_empty() {
            path.push(cache::INDEX_LEAF_NAME);
        }
        path
    }

    /// Absolute content file path for a normalized URI
    pub fn get_file_path(cache_root: &Path, url: &Url) -> PathBuf {
        cache_root.join(Self::relative_path(url))
    }

    /// Header file belonging to a content file
    pub fn header_path(content_file: &Path) -> PathBuf {
        let mut name = OsString::from(content_file.as_os_str());
        name.push(headers::HEADER_FILE_SUFFIX);
        PathBuf::from(name)
    }

    fn escape_segment(segment: &str) -> String {
        let mut escaped = segment.replace('\\', "%5C");

        if let Some(rest) = escaped.strip_prefix('.') {
            escaped = format!("%2E{}", rest);
        }
        if let Some(stem) = escaped.strip_suffix(headers::HEADER_FILE_SUFFIX) {
            escaped = format!("{}%2E{}", stem, &headers::HEADER_FILE_SUFFIX[1..]);
        }
        escaped
    }
}
