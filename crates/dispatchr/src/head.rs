// File: src/head.rs
// Purpose: Response metadata descriptors (status, headers, cookies, links)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Link relations mapped to their URLs, emitted as one `Link` header.
pub type Links = BTreeMap<String, String>;

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// Options attached to a `Set-Cookie` entry.
///
/// Nothing here is validated; the sink decides what it accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CookieOptions {
    pub domain: Option<String>,
    /// Defaults to `/` when the sink writes the cookie.
    pub path: Option<String>,
    /// Lifetime in seconds.
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

/// One piece of response metadata.
///
/// Heads are kept as an ordered list rather than a map: `HeaderPart` appends
/// while `Header` overwrites, and the sink sees them in the order they were
/// added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    Status(u16),
    Type(String),
    Location(String),
    Links(Links),
    Cookie {
        key: String,
        value: String,
        options: CookieOptions,
    },
    ClearCookie {
        key: String,
        options: CookieOptions,
    },
    /// Appended next to existing values of the same header.
    HeaderPart { key: String, value: String },
    /// Replaces existing values of the same header.
    Header { key: String, value: String },
}

impl Head {
    /// The HTTP header this entry writes to. `Status` writes none.
    pub fn header_name(&self) -> Option<&str> {
        match self {
            Head::Status(_) => None,
            Head::Type(_) => Some("content-type"),
            Head::Location(_) => Some("location"),
            Head::Links(_) => Some("link"),
            Head::Cookie { .. } | Head::ClearCookie { .. } => Some("set-cookie"),
            Head::HeaderPart { key, .. } | Head::Header { key, .. } => Some(key),
        }
    }

    /// Case-insensitive match against a header name.
    pub fn writes_header(&self, name: &str) -> bool {
        self.header_name()
            .is_some_and(|header| header.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn header(key: &str) -> Head {
        Head::Header {
            key: key.to_string(),
            value: "1".to_string(),
        }
    }

    #[rstest]
    #[case(Head::Type("json".into()), "Content-Type")]
    #[case(Head::Location("/".into()), "LOCATION")]
    #[case(Head::Links(Links::new()), "link")]
    #[case(Head::Cookie { key: "a".into(), value: "b".into(), options: CookieOptions::new() }, "Set-Cookie")]
    #[case(Head::ClearCookie { key: "a".into(), options: CookieOptions::new() }, "set-cookie")]
    #[case(Head::HeaderPart { key: "X-Trace".into(), value: "1".into() }, "x-trace")]
    #[case(header("X-Answer"), "x-answer")]
    fn test_writes_header(#[case] head: Head, #[case] name: &str) {
        assert!(head.writes_header(name));
    }

    #[test]
    fn test_status_has_no_header() {
        let status = Head::Status(200);
        assert_eq!(status.header_name(), None);
        assert!(!status.writes_header("status"));
        assert!(!status.writes_header(""));
    }

    #[test]
    fn test_custom_header_does_not_match_other_keys() {
        assert!(!header("X-Answer").writes_header("X-Other"));
        assert!(!header("X-Answer").writes_header("content-type"));
    }

    #[test]
    fn test_cookie_options_builder() {
        let options = CookieOptions::new()
            .path("/admin")
            .max_age(60)
            .http_only()
            .same_site(SameSite::Strict);

        assert_eq!(options.path.as_deref(), Some("/admin"));
        assert_eq!(options.max_age, Some(60));
        assert!(options.http_only);
        assert!(!options.secure);
        assert_eq!(options.same_site, Some(SameSite::Strict));
    }

    #[test]
    fn test_cookie_options_from_json() {
        let options: CookieOptions =
            serde_json::from_value(serde_json::json!({ "httpOnly": true, "maxAge": 10 }))
                .unwrap();
        assert!(options.http_only);
        assert_eq!(options.max_age, Some(10));
        assert_eq!(options.path, None);
    }
}
