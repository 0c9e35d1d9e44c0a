//! URL parsing, resolution and reflection of state into URLs.
//!
//! Resolution follows what an anchor element does when its `href` is set
//! relative to the document base. Hosts are taken verbatim (lower-cased);
//! IPv6 literals and IDNA are out of scope.

use super::percent::{encode_url_part, encode_url_part_reserving};
use super::query;
use crate::error::{Result, StateError};
use crate::types::{ExclusionList, State, HASH_KEY, PATHNAME_KEY};
use serde::{Deserialize, Serialize};

/// Schemes with an authority and a hierarchical path.
const SPECIAL_SCHEMES: &[&str] = &["http", "https", "ws", "wss", "ftp", "file"];

fn is_special(scheme: &str) -> bool {
    SPECIAL_SCHEMES.contains(&scheme)
}

fn default_port(scheme: &str) -> Option<&'static str> {
    match scheme {
        "http" | "ws" => Some("80"),
        "https" | "wss" => Some("443"),
        "ftp" => Some("21"),
        _ => None,
    }
}

/// A URL decomposed into its component fields.
///
/// `pathname` never carries its leading `/` and `search` never carries its
/// leading `?`. `hash` keeps the `#` (or is empty), as on a browser anchor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedUrl {
    pub href: String,
    pub protocol: String,
    pub host: String,
    pub hostname: String,
    pub port: String,
    pub pathname: String,
    pub search: String,
    pub hash: String,
    pub username: String,
    pub password: String,
    pub origin: String,
}

impl ParsedUrl {
    fn from_parts(parts: &UrlParts) -> Self {
        let pathname = parts.path.strip_prefix('/').unwrap_or(&parts.path);
        let search = parts.search();
        let search = search.strip_prefix('?').unwrap_or(&search);

        Self {
            href: parts.href(),
            protocol: format!("{}:", parts.scheme),
            host: parts.host(),
            hostname: parts.hostname.clone(),
            port: parts.port.clone(),
            pathname: pathname.to_string(),
            search: search.to_string(),
            hash: parts.hash(),
            username: parts.username.clone(),
            password: parts.password.clone(),
            origin: parts.origin(),
        }
    }
}

/// A partial URL. Present fields are laid over the base location by
/// [`join`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlOverlay {
    pub href: Option<String>,
    pub protocol: Option<String>,
    pub host: Option<String>,
    pub hostname: Option<String>,
    pub port: Option<String>,
    pub pathname: Option<String>,
    pub search: Option<String>,
    pub hash: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl From<&ParsedUrl> for UrlOverlay {
    fn from(url: &ParsedUrl) -> Self {
        Self {
            href: Some(url.href.clone()),
            protocol: Some(url.protocol.clone()),
            host: Some(url.host.clone()),
            hostname: Some(url.hostname.clone()),
            port: Some(url.port.clone()),
            pathname: Some(url.pathname.clone()),
            search: Some(url.search.clone()),
            hash: Some(url.hash.clone()),
            username: Some(url.username.clone()),
            password: Some(url.password.clone()),
        }
    }
}

/// Working representation of an absolute URL.
#[derive(Clone, Debug, PartialEq, Eq)]
struct UrlParts {
    /// Lower-case, without the trailing `:`.
    scheme: String,
    username: String,
    password: String,
    hostname: String,
    /// Empty when absent or equal to the scheme's default.
    port: String,
    has_authority: bool,
    /// Starts with `/` whenever `has_authority` is set.
    path: String,
    /// Without the `?`.
    query: Option<String>,
    /// Without the `#`.
    fragment: Option<String>,
}

impl UrlParts {
    fn host(&self) -> String {
        if self.port.is_empty() {
            self.hostname.clone()
        } else {
            format!("{}:{}", self.hostname, self.port)
        }
    }

    fn search(&self) -> String {
        match &self.query {
            Some(q) if !q.is_empty() => format!("?{}", q),
            _ => String::new(),
        }
    }

    fn hash(&self) -> String {
        match &self.fragment {
            Some(f) if !f.is_empty() => format!("#{}", f),
            _ => String::new(),
        }
    }

    fn origin(&self) -> String {
        if is_special(&self.scheme) && self.scheme != "file" {
            format!("{}://{}", self.scheme, self.host())
        } else {
            "null".to_string()
        }
    }

    fn href(&self) -> String {
        let mut out = format!("{}:", self.scheme);
        if self.has_authority {
            out.push_str("//");
            if !self.username.is_empty() || !self.password.is_empty() {
                out.push_str(&self.username);
                if !self.password.is_empty() {
                    out.push(':');
                    out.push_str(&self.password);
                }
                out.push('@');
            }
            out.push_str(&self.host());
        }
        out.push_str(&self.path);
        if let Some(q) = &self.query {
            out.push('?');
            out.push_str(q);
        }
        if let Some(f) = &self.fragment {
            out.push('#');
            out.push_str(f);
        }
        out
    }

    fn set_protocol(&mut self, protocol: &str) -> Result<()> {
        let scheme = protocol.trim_end_matches(':').to_ascii_lowercase();
        if !is_valid_scheme(&scheme) {
            return Err(StateError::InvalidUrl(format!(
                "invalid protocol {:?}",
                protocol
            )));
        }
        if is_special(&scheme) != is_special(&self.scheme) {
            return Err(StateError::InvalidUrl(format!(
                "cannot switch {}: to {}:",
                self.scheme, scheme
            )));
        }
        self.scheme = scheme;
        self.normalize_port();
        Ok(())
    }

    fn set_host(&mut self, host: &str) -> Result<()> {
        let (hostname, port) = split_host_port(host.trim());
        self.hostname = hostname.to_ascii_lowercase();
        if let Some(port) = port {
            self.set_port(port)?;
        }
        Ok(())
    }

    fn set_port(&mut self, port: &str) -> Result<()> {
        self.port = validate_port(port)?;
        self.normalize_port();
        Ok(())
    }

    fn normalize_port(&mut self) {
        if default_port(&self.scheme) == Some(self.port.as_str()) {
            self.port.clear();
        }
    }

    fn set_pathname(&mut self, pathname: &str) {
        if self.has_authority {
            let rooted = if pathname.starts_with('/') {
                pathname.to_string()
            } else {
                format!("/{}", pathname)
            };
            self.path = normalize_path(&encode_url_part_reserving(&rooted, b"?#"));
        } else {
            self.path = encode_url_part_reserving(pathname, b"?#");
        }
    }

    fn set_search(&mut self, search: &str) {
        let body = search.strip_prefix('?').unwrap_or(search);
        self.query = if body.is_empty() {
            None
        } else {
            Some(encode_url_part_reserving(body, b"#"))
        };
    }

    fn set_hash(&mut self, hash: &str) {
        let body = hash.strip_prefix('#').unwrap_or(hash);
        self.fragment = if body.is_empty() {
            None
        } else {
            Some(encode_url_part(body))
        };
    }

    fn apply(&mut self, overlay: &UrlOverlay) -> Result<()> {
        if let Some(protocol) = &overlay.protocol {
            self.set_protocol(protocol)?;
        }
        if let Some(host) = &overlay.host {
            self.set_host(host)?;
        }
        if let Some(hostname) = &overlay.hostname {
            self.hostname = hostname.trim().to_ascii_lowercase();
        }
        if let Some(port) = &overlay.port {
            self.set_port(port)?;
        }
        if let Some(pathname) = &overlay.pathname {
            self.set_pathname(pathname);
        }
        if let Some(search) = &overlay.search {
            self.set_search(search);
        }
        if let Some(hash) = &overlay.hash {
            self.set_hash(hash);
        }
        if let Some(username) = &overlay.username {
            self.username = username.clone();
        }
        if let Some(password) = &overlay.password {
            self.password = password.clone();
        }
        if is_special(&self.scheme) && self.scheme != "file" && self.hostname.is_empty() {
            return Err(StateError::InvalidUrl(format!(
                "{}: URL requires a host",
                self.scheme
            )));
        }
        Ok(())
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

fn split_scheme(input: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = input.split_once(':')?;
    is_valid_scheme(scheme).then_some((scheme, rest))
}

fn validate_port(port: &str) -> Result<String> {
    if port.is_empty() {
        return Ok(String::new());
    }
    if !port.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StateError::InvalidUrl(format!("invalid port {:?}", port)));
    }
    let value: u16 = port
        .parse()
        .map_err(|_| StateError::InvalidUrl(format!("port {} out of range", port)))?;
    Ok(value.to_string())
}

fn split_host_port(host: &str) -> (&str, Option<&str>) {
    match host.rsplit_once(':') {
        Some((hostname, port)) => (hostname, Some(port)),
        None => (host, None),
    }
}

/// Split off `?query` and `#fragment` from the tail of a reference.
fn split_tail(input: &str) -> (&str, Option<&str>, Option<&str>) {
    let (rest, fragment) = match input.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (input, None),
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };
    (path, query, fragment)
}

/// Remove `.` and `..` segments from a rooted path.
fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').skip(1).collect();
    let last = segments.len().saturating_sub(1);
    let mut out: Vec<&str> = Vec::with_capacity(segments.len());

    for (i, segment) in segments.iter().enumerate() {
        match *segment {
            "." => {
                if i == last {
                    out.push("");
                }
            }
            ".." => {
                out.pop();
                if i == last {
                    out.push("");
                }
            }
            other => out.push(other),
        }
    }

    format!("/{}", out.join("/"))
}

fn clean_input(input: &str) -> String {
    input
        .trim_matches(|c: char| c <= ' ')
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

/// Parse an absolute URL. Returns `Ok(None)` when `input` has no scheme.
fn parse_absolute(input: &str) -> Result<Option<UrlParts>> {
    let Some((scheme, rest)) = split_scheme(input) else {
        return Ok(None);
    };
    let scheme = scheme.to_ascii_lowercase();
    let special = is_special(&scheme);

    let authority_input = if special {
        Some(rest.trim_start_matches(&['/', '\\'][..]))
    } else {
        rest.strip_prefix("//")
    };

    let Some(after_slashes) = authority_input else {
        // Opaque path, e.g. `mailto:someone@example.com`.
        let (path, query, fragment) = split_tail(rest);
        return Ok(Some(UrlParts {
            scheme,
            username: String::new(),
            password: String::new(),
            hostname: String::new(),
            port: String::new(),
            has_authority: false,
            path: encode_url_part(path),
            query: query.map(encode_url_part),
            fragment: fragment.map(encode_url_part),
        }));
    };

    let authority_end = after_slashes
        .find(&['/', '?', '#'][..])
        .unwrap_or(after_slashes.len());
    let (authority, tail) = after_slashes.split_at(authority_end);

    let (userinfo, host) = match authority.rsplit_once('@') {
        Some((userinfo, host)) => (Some(userinfo), host),
        None => (None, authority),
    };
    let (username, password) = match userinfo {
        Some(info) => match info.split_once(':') {
            Some((user, pass)) => (user.to_string(), pass.to_string()),
            None => (info.to_string(), String::new()),
        },
        None => (String::new(), String::new()),
    };

    let (hostname, port) = split_host_port(host);
    let hostname = hostname.to_ascii_lowercase();
    if special && scheme != "file" && hostname.is_empty() {
        return Err(StateError::InvalidUrl(format!(
            "{:?} is missing a host",
            input
        )));
    }

    let (path, query, fragment) = split_tail(tail);
    let path = if path.is_empty() { "/" } else { path };

    let mut parts = UrlParts {
        scheme,
        username,
        password,
        hostname,
        port: validate_port(port.unwrap_or(""))?,
        has_authority: true,
        path: normalize_path(&encode_url_part(path)),
        query: query.map(encode_url_part),
        fragment: fragment.map(encode_url_part),
    };
    parts.normalize_port();
    Ok(Some(parts))
}

fn parse_base(base: &str) -> Result<UrlParts> {
    parse_absolute(&clean_input(base))?
        .ok_or_else(|| StateError::InvalidUrl(format!("base {:?} is not an absolute URL", base)))
}

/// Resolve a reference against an absolute base.
fn resolve(input: &str, base: &UrlParts) -> Result<UrlParts> {
    let input = clean_input(input);

    if let Some(parts) = parse_absolute(&input)? {
        return Ok(parts);
    }

    let mut next = base.clone();

    if input.is_empty() {
        next.fragment = None;
        return Ok(next);
    }

    if let Some(fragment) = input.strip_prefix('#') {
        next.fragment = Some(encode_url_part(fragment));
        return Ok(next);
    }

    if !base.has_authority {
        return Err(StateError::InvalidUrl(format!(
            "cannot resolve {:?} against {}",
            input,
            base.href()
        )));
    }

    if input.starts_with("//") {
        return parse_absolute(&format!("{}:{}", base.scheme, input))?.ok_or_else(|| {
            StateError::InvalidUrl(format!("cannot resolve {:?}", input))
        });
    }

    let (path, query, fragment) = split_tail(&input);
    next.query = query.map(encode_url_part);
    next.fragment = fragment.map(encode_url_part);

    if path.is_empty() {
        // Query-only reference keeps the base path.
        if query.is_none() {
            next.query = base.query.clone();
        }
        return Ok(next);
    }

    next.path = if path.starts_with('/') {
        normalize_path(&encode_url_part(path))
    } else {
        let dir = match base.path.rfind('/') {
            Some(idx) => &base.path[..=idx],
            None => "/",
        };
        normalize_path(&encode_url_part(&format!("{}{}", dir, path)))
    };
    Ok(next)
}

/// Parse `input`, resolving it against the absolute URL `base`.
pub fn parse(input: &str, base: &str) -> Result<ParsedUrl> {
    let base = parse_base(base)?;
    let parts = resolve(input, &base)?;
    Ok(ParsedUrl::from_parts(&parts))
}

/// Build the URL reflecting `state`, starting from `base`.
///
/// `pathname` and `hash` come from the matching state keys (a missing key
/// keeps the base's value). Every other key not in `exclude` goes into the
/// query string, stringified.
pub fn serialize(state: &State, exclude: &ExclusionList, base: &str) -> Result<ParsedUrl> {
    let mut parts = parse_base(base)?;

    if let Some(pathname) = state.get(PATHNAME_KEY) {
        parts.set_pathname(&pathname.to_string());
    }
    if let Some(hash) = state.get(HASH_KEY) {
        parts.set_hash(&hash.to_string());
    }
    let search = query::serialize(Some(state), Some(exclude)).unwrap_or_default();
    parts.set_search(&search);

    Ok(ParsedUrl::from_parts(&parts))
}

/// Turn an overlay into an href.
///
/// An overlay carrying `href` is returned as-is. Otherwise every present
/// field is laid over `base`.
pub fn join(overlay: &UrlOverlay, base: &str) -> Result<String> {
    if let Some(href) = overlay.href.as_deref().filter(|h| !h.is_empty()) {
        return Ok(href.to_string());
    }

    let mut parts = parse_base(base)?;
    parts.apply(overlay)?;
    Ok(parts.href())
}
