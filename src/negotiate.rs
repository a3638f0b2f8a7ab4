//! Content negotiation.
//!
//! The client ranks media types in its `Accept` header; the server offers the
//! types it can produce, each with its own weight. [`best_content_type`]
//! scores every (accepted pattern, offered type) pair as `q × weight` and
//! keeps the first strictly-best one.
//!
//! ```rust
//! use restkit::negotiate::{AcceptList, best_content_type};
//!
//! let accept = AcceptList::parse(Some("application/json;q=0.5, text/plain;q=0.5"));
//! let offers = [("text/plain", 0.3), ("application/json", 1.0)];
//! let best = best_content_type(&accept, &offers, Some("text/plain")).unwrap();
//! assert_eq!(best, "application/json");
//! ```
//!
//! # Matching rule
//!
//! A client pattern is compiled once, at parse time. Literal characters match
//! literally and case-sensitively. A `*` matches any run of characters other
//! than `/`. The rule is anchored at both ends, except that the offered type
//! may carry a trailing `;`-prefixed parameter suffix, which is ignored.
//! Offered types are always concrete; a `*` inside an offer is just a
//! character.

use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::warn;

// ── ParamValue ────────────────────────────────────────────────────────────────

/// The value of one `name=value` parameter of an accept entry.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl ParamValue {
    fn parse(raw: &str) -> Self {
        if is_numeric(raw) {
            if let Ok(n) = raw.parse() {
                return Self::Number(n);
            }
        }
        Self::Text(raw.to_owned())
    }

    /// Lenient numeric coercion: text yields its leading numeric prefix, or
    /// `0.0` if there is none. Never fails.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Text(s) => leading_number(s),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Decimal number with optional sign, fraction and exponent. Rejects the
/// `inf`/`nan` spellings that `f64::from_str` would otherwise accept.
fn is_numeric(s: &str) -> bool {
    let s = s.trim();
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    let mut parts = mantissa.splitn(2, '.');
    let int = parts.next().unwrap_or("");
    let frac = parts.next().unwrap_or("");
    let digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if (int.is_empty() && frac.is_empty()) || !digits(int) || !digits(frac) {
        return false;
    }
    match exponent {
        None => true,
        Some(e) => {
            let e = e.strip_prefix(['+', '-']).unwrap_or(e);
            !e.is_empty() && digits(e)
        }
    }
}

fn leading_number(s: &str) -> f64 {
    static LEADING: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^\s*[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid regex")
    });
    LEADING.find(s)
        .and_then(|m| m.as_str().trim_start().parse().ok())
        .unwrap_or(0.0)
}

// ── AcceptEntry ───────────────────────────────────────────────────────────────

/// One client-declared acceptable media type.
#[derive(Clone, Debug)]
pub struct AcceptEntry {
    pattern: String,
    params: IndexMap<String, ParamValue>,
    quality: f64,
    rule: Option<Regex>,
}

impl AcceptEntry {
    fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_owned(),
            params: IndexMap::new(),
            quality: 1.0,
            rule: compile_rule(pattern),
        }
    }

    /// The media type pattern exactly as the client wrote it.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// All parameters, `q` included, in header order.
    pub fn params(&self) -> &IndexMap<String, ParamValue> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    /// The client's weight for this pattern. `1.0` when the header gave none.
    pub fn quality(&self) -> f64 {
        self.quality
    }

    /// Whether the concrete `media_type` satisfies this pattern.
    pub fn matches(&self, media_type: &str) -> bool {
        self.rule.as_ref().is_some_and(|rule| rule.is_match(media_type))
    }
}

fn compile_rule(pattern: &str) -> Option<Regex> {
    let body = regex::escape(pattern).replace(r"\*", "[^/]*");
    match Regex::new(&format!(r"^{body}(?:\s*;.*)?$")) {
        Ok(rule) => Some(rule),
        Err(e) => {
            warn!(pattern, "unusable accept pattern: {e}");
            None
        }
    }
}

// ── AcceptList ────────────────────────────────────────────────────────────────

/// A parsed `Accept` header: media type patterns in header order.
///
/// Parse it once per request (see [`Request::accept`](crate::Request::accept))
/// and run as many negotiations against it as you need.
#[derive(Clone, Debug, Default)]
pub struct AcceptList {
    entries: IndexMap<String, AcceptEntry>,
}

impl AcceptList {
    /// Parses a raw `Accept` header value.
    ///
    /// `None` or an empty string means the client stated no preference, which
    /// yields an empty list. Malformed parameters are skipped; non-numeric
    /// values are kept as text. A pattern repeated later in the header keeps
    /// its first position, and its parameters are overlaid by the later one.
    pub fn parse(header: Option<&str>) -> Self {
        let mut entries: IndexMap<String, AcceptEntry> = IndexMap::new();
        let Some(header) = header.filter(|h| !h.is_empty()) else {
            return Self { entries };
        };

        for segment in header.split(',') {
            let mut tokens = segment.split(';');
            let pattern = tokens.next().unwrap_or("").trim();
            let entry = entries
                .entry(pattern.to_owned())
                .or_insert_with(|| AcceptEntry::new(pattern));
            entry.params.insert("q".to_owned(), ParamValue::Number(1.0));
            for token in tokens {
                if let Some((name, value)) = parse_param(token) {
                    entry.params.insert(name.to_owned(), ParamValue::parse(value));
                }
            }
            entry.quality = entry.params.get("q").map_or(1.0, ParamValue::as_f64);
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, pattern: &str) -> Option<&AcceptEntry> {
        self.entries.get(pattern)
    }

    /// Entries in header order.
    pub fn iter(&self) -> impl Iterator<Item = &AcceptEntry> {
        self.entries.values()
    }
}

/// `name=value` with surrounding whitespace trimmed. The name may not contain
/// whitespace or `=`; the value may not be empty.
fn parse_param(token: &str) -> Option<(&str, &str)> {
    let (name, value) = token.split_once('=')?;
    let name = name.trim();
    let value = value.trim();
    if name.is_empty() || name.contains(char::is_whitespace) || value.is_empty() {
        return None;
    }
    Some((name, value))
}

// ── Negotiation ───────────────────────────────────────────────────────────────

/// Negotiation failure: nothing offered is acceptable and no fallback was
/// given. The caller answers `406 Not Acceptable` and stops.
#[derive(Clone, Debug, PartialEq)]
pub struct NotAcceptable {
    offered: Vec<String>,
}

impl NotAcceptable {
    /// The media types the server could have produced, in offer order.
    pub fn offered(&self) -> &[String] {
        &self.offered
    }
}

impl fmt::Display for NotAcceptable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no acceptable media type, can serve: {}", self.offered.join(", "))
    }
}

impl std::error::Error for NotAcceptable {}

/// Picks the best media type acceptable to both sides.
///
/// `offers` is the server's ordered list of concrete types and weights. Every
/// pair scores `q × weight`; a pair replaces the current best only when its
/// score is strictly greater, so ties go to the earlier accept entry and,
/// within one entry, to the earlier offer.
///
/// With no match at all the result is `fallback`, or [`NotAcceptable`] when
/// there is none.
pub fn best_content_type(
    accept: &AcceptList,
    offers: &[(&str, f64)],
    fallback: Option<&str>,
) -> Result<String, NotAcceptable> {
    let mut best = -1.0_f64;
    let mut result = fallback;

    for entry in accept.iter() {
        let q = entry.quality();
        for &(offered, weight) in offers {
            if !entry.matches(offered) {
                continue;
            }
            let score = q * weight;
            if score > best {
                best = score;
                result = Some(offered);
            }
        }
    }

    result.map(str::to_owned).ok_or_else(|| NotAcceptable {
        offered: offers.iter().map(|&(t, _)| t.to_owned()).collect(),
    })
}

/// `text/html` for Internet Explorer, which cannot render
/// `application/xhtml+xml`; `application/xhtml+xml` for everyone else.
pub fn best_xhtml_type(user_agent: Option<&str>) -> &'static str {
    match user_agent {
        Some(ua) if ua.contains("MSIE") => "text/html",
        _ => "application/xhtml+xml",
    }
}
