//! Proxy directive parsing.
//!
//! Proxy lists arrive in several loosely specified textual shapes. The
//! [`parse_proxy_line`] function resolves one line into a [`ProxyCredential`]
//! or rejects it. Rejection is silent: callers decide whether a rejected,
//! non-comment line deserves a warning.
//!
//! Accepted shapes, tried in this order:
//! - `[inner](...)` markdown links, unwrapped to `inner`
//! - `scheme://[user:pass@]host:port[/path]`
//! - `user:pass@host:port`
//! - `host:port:user:pass`, then `user:pass:host:port`
//! - `host:port`

use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_SCHEME: &str = "http";

/// A fully resolved proxy endpoint.
///
/// `server` is always `scheme://host:port`. Credentials are either both
/// present or both absent for every shape except URIs, which may carry a
/// username without a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyCredential {
    pub server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ProxyCredential {
    fn anonymous(scheme: &str, host: &str, port: u16) -> Self {
        Self {
            server: format!("{scheme}://{host}:{port}"),
            username: None,
            password: None,
        }
    }

    fn authenticated(scheme: &str, host: &str, port: u16, user: &str, pass: &str) -> Self {
        Self {
            server: format!("{scheme}://{host}:{port}"),
            username: Some(user.to_string()),
            password: Some(pass.to_string()),
        }
    }

    /// True when the proxy carries a username.
    pub fn is_authenticated(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.is_empty())
    }
}

impl std::fmt::Display for ProxyCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.username {
            Some(user) => write!(f, "{} (user: {user})", self.server),
            None => write!(f, "{}", self.server),
        }
    }
}

/// Returns true for lines the parser ignores without complaint.
pub fn is_comment_or_blank(line: &str) -> bool {
    let s = line.trim();
    s.is_empty() || s.starts_with('#')
}

/// Parse one proxy directive. Returns `None` for blank lines, comments and
/// any shape that does not fully resolve.
pub fn parse_proxy_line(line: &str) -> Option<ProxyCredential> {
    let mut s = line.trim();
    if is_comment_or_blank(s) {
        return None;
    }

    if let Some(inner) = unwrap_markdown_link(s) {
        s = inner.trim();
    }

    if s.contains("://") {
        return parse_uri(s);
    }

    if s.contains('@') {
        return parse_user_at_host(s);
    }

    let fields: Vec<&str> = s.split(':').collect();
    match fields.as_slice() {
        [a, b, c, d] => {
            // host:port:user:pass takes precedence when both candidates are numeric.
            if let Some(port) = parse_port(b) {
                let host = non_empty_host(a)?;
                Some(ProxyCredential::authenticated(DEFAULT_SCHEME, host, port, c, d))
            } else {
                let (host, port) = (non_empty_host(c)?, parse_port(d)?);
                Some(ProxyCredential::authenticated(DEFAULT_SCHEME, host, port, a, b))
            }
        }
        [host, port] => {
            let host = non_empty_host(host)?;
            parse_port(port).map(|port| ProxyCredential::anonymous(DEFAULT_SCHEME, host, port))
        }
        _ => None,
    }
}

fn unwrap_markdown_link(s: &str) -> Option<&str> {
    if !s.contains("](") {
        return None;
    }
    let start = s.find('[')?;
    let end = s.find(']')?;
    if end > start { Some(&s[start + 1..end]) } else { None }
}

fn non_empty_host(field: &str) -> Option<&str> {
    Some(field.trim()).filter(|h| !h.is_empty())
}

fn parse_port(field: &str) -> Option<u16> {
    field.trim().parse::<u16>().ok()
}

fn parse_uri(s: &str) -> Option<ProxyCredential> {
    let url = Url::parse(s).ok()?;
    let host = url.host_str().filter(|h| !h.is_empty())?;
    let port = url.port().or_else(|| explicit_default_port(&url, s))?;

    let username = Some(url.username().to_string()).filter(|u| !u.is_empty());
    let password = url.password().map(str::to_string);

    Some(ProxyCredential {
        server: format!("{}://{host}:{port}", url.scheme()),
        username,
        password,
    })
}

/// `Url` drops a port that equals the scheme default (`http://h:80`). Recover
/// it when the source text spelled it out; an omitted port stays omitted.
fn explicit_default_port(url: &Url, raw: &str) -> Option<u16> {
    let default = url.port_or_known_default()?;
    let after_scheme = raw.split_once("://")?.1;
    let authority = after_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(after_scheme);
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    let (_, port) = host_port.rsplit_once(':')?;
    (parse_port(port) == Some(default)).then_some(default)
}

fn parse_user_at_host(s: &str) -> Option<ProxyCredential> {
    let parts: Vec<&str> = s.split('@').collect();
    let [user_pass, host_port] = parts.as_slice() else {
        return None;
    };
    let (user, pass) = split_exactly_two(user_pass)?;
    let (host, port) = split_exactly_two(host_port)?;
    let host = non_empty_host(host)?;
    let port = parse_port(port)?;
    Some(ProxyCredential::authenticated(DEFAULT_SCHEME, host, port, user, pass))
}

fn split_exactly_two(s: &str) -> Option<(&str, &str)> {
    let mut it = s.split(':');
    match (it.next(), it.next(), it.next()) {
        (Some(a), Some(b), None) => Some((a, b)),
        _ => None,
    }
}
