//! Line-oriented readers for the three campaign input files.
//!
//! Identity and target files are required: a missing file is an
//! [`InputError`]. The proxy file is optional and a missing one yields an
//! empty list.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::InputError;
use crate::proxy::{ProxyCredential, is_comment_or_blank, parse_proxy_line};
use crate::report::truncate_chars;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid email regex")
});

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("valid scheme regex"));

fn read_lines(kind: &'static str, path: &Path) -> Result<String, InputError> {
    std::fs::read_to_string(path).map_err(|e| InputError::from_io(kind, path.to_path_buf(), e))
}

/// Pull the first email-shaped token out of one line.
///
/// `[label](mailto:addr)` wins over `[addr](url)`, which wins over a bare
/// regex match anywhere in the line.
pub fn extract_email(line: &str) -> Option<String> {
    let line = line.trim();
    if is_comment_or_blank(line) {
        return None;
    }

    if let Some(start) = line.find("](mailto:") {
        let rest = &line[start + "](mailto:".len()..];
        if let Some(end) = rest.find(')') {
            let candidate = &rest[..end];
            if let Some(m) = EMAIL_RE.find(candidate) {
                return Some(m.as_str().to_string());
            }
        }
    }

    if line.contains("](")
        && let (Some(start), Some(end)) = (line.find('['), line.find(']'))
        && end > start
        && let Some(m) = EMAIL_RE.find(&line[start + 1..end])
    {
        return Some(m.as_str().to_string());
    }

    EMAIL_RE.find(line).map(|m| m.as_str().to_string())
}

/// True when a trimmed line looks like a target page reference.
pub fn is_target_line(line: &str) -> bool {
    !line.is_empty() && (SCHEME_RE.is_match(line) || line.contains("event"))
}

pub fn read_identities(path: &Path) -> Result<Vec<String>, InputError> {
    let contents = read_lines("email", path)?;
    let mut identities = Vec::new();
    for line in contents.lines() {
        match extract_email(line) {
            Some(email) => {
                debug!(%email, "loaded identity");
                identities.push(email);
            }
            None if !is_comment_or_blank(line) => {
                warn!(line = %truncate_chars(line.trim(), 120), "skipping line without email");
            }
            None => {}
        }
    }
    info!(count = identities.len(), path = %path.display(), "loaded identities");
    Ok(identities)
}

pub fn read_targets(path: &Path) -> Result<Vec<String>, InputError> {
    let contents = read_lines("event list", path)?;
    let targets: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| is_target_line(line))
        .inspect(|line| debug!(target_url = %line, "loaded target"))
        .map(str::to_string)
        .collect();
    info!(count = targets.len(), path = %path.display(), "loaded targets");
    Ok(targets)
}

/// Read proxies, tolerating a missing file. Unreadable files other than
/// "not found" are still reported.
pub fn read_proxies(path: &Path) -> Result<Vec<ProxyCredential>, InputError> {
    let contents = match read_lines("proxy", path) {
        Ok(c) => c,
        Err(InputError::NotFound { .. }) => {
            warn!(path = %path.display(), "proxy file not found, running without proxies");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    let mut proxies = Vec::new();
    for line in contents.lines() {
        match parse_proxy_line(line) {
            Some(proxy) => {
                debug!(server = %proxy.server, "loaded proxy");
                proxies.push(proxy);
            }
            None if !is_comment_or_blank(line) => {
                warn!(line = %truncate_chars(line.trim(), 120), "skipping invalid proxy line");
            }
            None => {}
        }
    }
    info!(count = proxies.len(), path = %path.display(), "loaded proxies");
    Ok(proxies)
}
