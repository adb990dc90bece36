//! Persisted response headers of a cache line
//!
//! Stored next to the content file as `<content>.headers`, a flat
//! `key=value` property file. Synthetic keys carry the response code,
//! status line and the time of the last completed request; every other
//! key is a lower-cased response header name.
//!
//! Credentials, challenges, `content-encoding` and any `x-` vendor header
//! are dropped before anything is written.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::constants::{files, headers as keys};
use crate::errors::{CacheError, CacheResult};

/// Parsed view of a `.headers` file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedHeaders {
    /// HTTP response code of the last completed request
    pub response_code: Option<u16>,
    /// HTTP status line of the last completed request
    pub status_line: Option<String>,
    /// Epoch millis when the line was last fetched or revalidated
    pub last_updated: Option<i64>,
    headers: BTreeMap<String, String>,
}

impl CachedHeaders {
    /// Build from a live response, filtering sensitive headers
    pub fn from_response(
        status: u16,
        status_line: &str,
        response_headers: &BTreeMap<String, String>,
        now_millis: i64,
    ) -> Self {
        let mut cached = Self {
            response_code: Some(status),
            status_line: Some(status_line.to_string()),
            last_updated: Some(now_millis),
            headers: BTreeMap::new(),
        };
        cached.merge(response_headers);
        cached
    }

    /// Overlay response headers, keeping code and status line
    pub fn merge(&mut self, response_headers: &BTreeMap<String, String>) {
        for (name, value) in response_headers {
            let name = name.to_ascii_lowercase();
            if is_persistable(&name) {
                self.headers.insert(name, value.clone());
            }
        }
    }

    /// Header value by lower-cased name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// All persisted response headers
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn etag(&self) -> Option<&str> {
        self.get("etag")
    }

    pub fn location(&self) -> Option<&str> {
        self.get("location")
    }

    pub fn last_modified(&self) -> Option<&str> {
        self.get("last-modified")
    }

    /// `Last-Modified` as epoch millis, -1 when absent or unparsable
    pub fn last_modified_millis(&self) -> i64 {
        self.last_modified()
            .and_then(parse_http_date)
            .map(|date| date.timestamp_millis())
            .unwrap_or(-1)
    }

    /// Overlay an error response, keeping validators it does not replace
    pub fn record_failure(
        &mut self,
        status: u16,
        status_line: &str,
        response_headers: &BTreeMap<String, String>,
        now_millis: i64,
    ) {
        self.response_code = Some(status);
        self.status_line = Some(status_line.to_string());
        self.last_updated = Some(now_millis);
        self.merge(response_headers);
    }

    /// Whether the last completed request ended in an error status
    pub fn is_failure(&self) -> bool {
        matches!(self.response_code, Some(code) if code >= 400)
    }

    /// Parse property-file text
    pub fn parse(content: &str) -> Self {
        let mut cached = Self::default();

        for line in content.lines() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let (key, value) = split_property(line);
            match key.as_str() {
                keys::RESPONSE_CODE => cached.response_code = value.trim().parse().ok(),
                keys::STATUS_LINE => cached.status_line = Some(value),
                keys::LAST_UPDATED => cached.last_updated = value.trim().parse().ok(),
                _ => {
                    let name = key.to_ascii_lowercase();
                    if is_persistable(&name) {
                        cached.headers.insert(name, value);
                    }
                }
            }
        }

        cached
    }

    /// Serialize to property-file text
    pub fn to_properties(&self) -> String {
        let mut out = String::new();
        out.push('#');
        out.push_str(&Utc::now().to_rfc2822());
        out.push('\n');

        if let Some(code) = self.response_code {
            push_property(&mut out, keys::RESPONSE_CODE, &code.to_string());
        }
        if let Some(ref status_line) = self.status_line {
            push_property(&mut out, keys::STATUS_LINE, status_line);
        }
        if let Some(last_updated) = self.last_updated {
            push_property(&mut out, keys::LAST_UPDATED, &last_updated.to_string());
        }
        for (name, value) in &self.headers {
            push_property(&mut out, name, value);
        }
        out
    }

    /// Load a header file; a missing file yields `None`
    pub async fn load(path: &Path) -> CacheResult<Option<Self>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(Self::parse(&content))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    /// Write the header file atomically
    pub async fn save(&self, path: &Path) -> CacheResult<()> {
        write_atomic(path, self.to_properties().as_bytes()).await?;
        debug!("Persisted headers to {}", path.display());
        Ok(())
    }
}

/// Whether a lower-cased header name may be written to disk
pub fn is_persistable(name: &str) -> bool {
    !name.starts_with(keys::VENDOR_PREFIX) && !keys::NEVER_PERSISTED.contains(&name)
}

/// Parse an HTTP date in RFC 1123, RFC 850 or asctime format
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }

    ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Write `contents` to `target` through a temp file in the same directory
pub async fn write_atomic(target: &Path, contents: &[u8]) -> CacheResult<()> {
    let dir = target
        .parent()
        .ok_or_else(|| CacheError::DirectoryNotAccessible {
            path: target.to_path_buf(),
        })?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| CacheError::io(dir, e))?;

    let temp = tempfile::Builder::new()
        .prefix(files::TEMP_FILE_PREFIX)
        .suffix(files::TEMP_FILE_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| CacheError::io(dir, e))?;
    let (file, temp_path) = temp.into_parts();

    let mut file = tokio::fs::File::from_std(file);
    file.write_all(contents)
        .await
        .map_err(|e| CacheError::io(temp_path.to_path_buf(), e))?;
    file.flush()
        .await
        .map_err(|e| CacheError::io(temp_path.to_path_buf(), e))?;
    drop(file);

    temp_path
        .persist(target)
        .map_err(|e| CacheError::io(target, e.error))?;
    Ok(())
}

fn push_property(out: &mut String, key: &str, value: &str) {
    out.push_str(&escape(key, true));
    out.push('=');
    out.push_str(&escape(value, false));
    out.push('\n');
}

fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '=' | ':' | '#' | '!' if is_key => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            _ => out.push(c),
        }
    }
    out
}

/// Split a logical line at the first unescaped `=` or `:`, unescaping both halves
fn split_property(line: &str) -> (String, String) {
    let mut key = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    key.push(unescape_char(next));
                }
            }
            '=' | ':' => break,
            _ => key.push(c),
        }
    }

    let mut value = String::new();
    let mut rest = chars.as_str().trim_start().chars();
    while let Some(c) = rest.next() {
        if c == '\\' {
            if let Some(next) = rest.next() {
                value.push(unescape_char(next));
            }
        } else {
            value.push(c);
        }
    }

    (key.trim_end().to_string(), value)
}

fn unescape_char(c: char) -> char {
    match c {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        other => other,
    }
}
