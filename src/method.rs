//! HTTP method as a typed enum, plus method spoofing.
//!
//! Covers RFC 9110 standard methods, WebDAV extensions (RFC 4918 / 4791 / 3253 / 5323),
//! and `PURGE` used by nginx and Varnish for cache invalidation.
//!
//! # Spoofing
//!
//! HTML forms can only `GET` and `POST`. A `POST` whose query string carries
//! `http_method=DELETE` (any method name, any case) is treated as a `DELETE`.
//! See [`Spoof`] for the exact rewrite.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use url::form_urlencoded;

/// Query parameter that overrides the method of a `POST`.
pub const OVERRIDE_PARAM: &str = "http_method";

/// A known HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    // RFC 9110 ─────────────────────────────────────────────────────────────────
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
    // WebDAV RFC 4918 ──────────────────────────────────────────────────────────
    Copy,
    Lock,
    Mkcol,
    Move,
    Propfind,
    Proppatch,
    Unlock,
    // WebDAV extensions ────────────────────────────────────────────────────────
    Mkcalendar, // RFC 4791, CalDAV
    Report,     // RFC 3253
    Search,     // RFC 5323
    // Cache invalidation ───────────────────────────────────────────────────────
    Purge, // nginx / Varnish
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect    => "CONNECT",
            Self::Copy       => "COPY",
            Self::Delete     => "DELETE",
            Self::Get        => "GET",
            Self::Head       => "HEAD",
            Self::Lock       => "LOCK",
            Self::Mkcalendar => "MKCALENDAR",
            Self::Mkcol      => "MKCOL",
            Self::Move       => "MOVE",
            Self::Options    => "OPTIONS",
            Self::Patch      => "PATCH",
            Self::Post       => "POST",
            Self::Propfind   => "PROPFIND",
            Self::Proppatch  => "PROPPATCH",
            Self::Purge      => "PURGE",
            Self::Put        => "PUT",
            Self::Report     => "REPORT",
            Self::Search     => "SEARCH",
            Self::Trace      => "TRACE",
            Self::Unlock     => "UNLOCK",
        }
    }
}

/// A method string that is not one of the known [`Method`]s.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownMethod(pub String);

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown method {:?}", self.0)
    }
}

impl std::error::Error for UnknownMethod {}

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECT"    => Ok(Self::Connect),
            "COPY"       => Ok(Self::Copy),
            "DELETE"     => Ok(Self::Delete),
            "GET"        => Ok(Self::Get),
            "HEAD"       => Ok(Self::Head),
            "LOCK"       => Ok(Self::Lock),
            "MKCALENDAR" => Ok(Self::Mkcalendar),
            "MKCOL"      => Ok(Self::Mkcol),
            "MOVE"       => Ok(Self::Move),
            "OPTIONS"    => Ok(Self::Options),
            "PATCH"      => Ok(Self::Patch),
            "POST"       => Ok(Self::Post),
            "PROPFIND"   => Ok(Self::Propfind),
            "PROPPATCH"  => Ok(Self::Proppatch),
            "PURGE"      => Ok(Self::Purge),
            "PUT"        => Ok(Self::Put),
            "REPORT"     => Ok(Self::Report),
            "SEARCH"     => Ok(Self::Search),
            "TRACE"      => Ok(Self::Trace),
            "UNLOCK"     => Ok(Self::Unlock),
            _            => Err(UnknownMethod(s.to_owned())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Spoofing ──────────────────────────────────────────────────────────────────

/// The request line after a method override has been applied.
#[derive(Debug, PartialEq)]
pub struct Spoof {
    pub method: Method,
    /// Path plus the rebuilt query string, without the override parameter.
    pub uri: String,
    /// `Some(empty)` when a form body was moved into the query string.
    pub body: Option<Vec<u8>>,
}

impl Spoof {
    /// Checks a request for a method override.
    ///
    /// Returns `Ok(None)` unless `method` is `POST` and the query carries
    /// [`OVERRIDE_PARAM`]. Otherwise the override is upper-cased and parsed,
    /// the parameter is dropped from the query, and, for an override to `GET`
    /// with an `application/x-www-form-urlencoded` body, the form fields
    /// replace the query string entirely and the body is emptied.
    pub fn detect(
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<Option<Self>, UnknownMethod> {
        if method != Method::Post {
            return Ok(None);
        }
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, query),
            None => return Ok(None),
        };

        let pairs: Vec<(Cow<'_, str>, Cow<'_, str>)> =
            form_urlencoded::parse(query.as_bytes()).collect();
        let Some(requested) = pairs
            .iter()
            .rev()
            .find(|(k, _)| k == OVERRIDE_PARAM)
            .map(|(_, v)| v.to_uppercase())
        else {
            return Ok(None);
        };
        let method: Method = requested.parse()?;

        let mut body_out = None;
        let query = if method == Method::Get
            && content_type == Some("application/x-www-form-urlencoded")
        {
            body_out = Some(Vec::new());
            encode(form_urlencoded::parse(body))
        } else {
            encode(pairs.into_iter().filter(|(k, _)| k != OVERRIDE_PARAM))
        };

        let uri = if query.is_empty() { path.to_owned() } else { format!("{path}?{query}") };
        Ok(Some(Self { method, uri, body: body_out }))
    }
}

fn encode<'a>(pairs: impl Iterator<Item = (Cow<'a, str>, Cow<'a, str>)>) -> String {
    form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: Option<&str> = Some("application/x-www-form-urlencoded");

    #[test]
    fn parse_is_case_sensitive() {
        assert_eq!("DELETE".parse::<Method>(), Ok(Method::Delete));
        assert_eq!("delete".parse::<Method>(), Err(UnknownMethod("delete".into())));
    }

    #[test]
    fn only_post_is_spoofed() {
        let out = Spoof::detect(Method::Get, "/a?http_method=DELETE", None, b"").unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn post_without_override_is_untouched() {
        assert_eq!(Spoof::detect(Method::Post, "/a?x=1", None, b"").unwrap(), None);
        assert_eq!(Spoof::detect(Method::Post, "/a", None, b"").unwrap(), None);
    }

    #[test]
    fn override_is_uppercased_and_removed_from_query() {
        let out = Spoof::detect(Method::Post, "/items/7?http_method=delete&x=1", None, b"")
            .unwrap()
            .unwrap();
        assert_eq!(out.method, Method::Delete);
        assert_eq!(out.uri, "/items/7?x=1");
        assert_eq!(out.body, None);
    }

    #[test]
    fn empty_query_drops_question_mark() {
        let out = Spoof::detect(Method::Post, "/items/7?http_method=PUT", FORM, b"a=b")
            .unwrap()
            .unwrap();
        assert_eq!(out.method, Method::Put);
        assert_eq!(out.uri, "/items/7");
        assert_eq!(out.body, None);
    }

    #[test]
    fn get_override_moves_form_into_query() {
        let out = Spoof::detect(Method::Post, "/search?http_method=GET&page=2", FORM, b"q=rust+lang&n=5")
            .unwrap()
            .unwrap();
        assert_eq!(out.method, Method::Get);
        assert_eq!(out.uri, "/search?q=rust+lang&n=5");
        assert_eq!(out.body, Some(Vec::new()));
    }

    #[test]
    fn get_override_keeps_non_form_body() {
        let out = Spoof::detect(Method::Post, "/s?http_method=get&page=2", Some("application/json"), b"{}")
            .unwrap()
            .unwrap();
        assert_eq!(out.method, Method::Get);
        assert_eq!(out.uri, "/s?page=2");
        assert_eq!(out.body, None);
    }

    #[test]
    fn unknown_override_is_an_error() {
        let err = Spoof::detect(Method::Post, "/a?http_method=frobnicate", None, b"").unwrap_err();
        assert_eq!(err, UnknownMethod("FROBNICATE".into()));
    }
}
