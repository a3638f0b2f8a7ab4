//! URL helpers: base URL resolution, relative-to-absolute conversion, and a
//! path-preserving encoder.

use std::fmt;
use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use regex::Regex;

/// Bytes [`urlencode`] leaves alone besides ASCII alphanumerics. `~` stays
/// unencoded so `/~user/` paths survive intact.
const PATH_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+:").expect("valid regex"));

static VALID_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]+:(?:%[a-fA-F0-9]{2}|[-A-Za-z0-9_.~:/?#\[\]@!$&'()*+,;=]+)+$").expect("valid regex")
});

/// `scheme://host[:port]`, with the port left out when it is the scheme's
/// default.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UrlBase(String);

impl UrlBase {
    pub fn new(https: bool, server_name: &str, port: u16) -> Self {
        let (scheme, default_port) = if https { ("https", 443) } else { ("http", 80) };
        if port == default_port {
            Self(format!("{scheme}://{server_name}"))
        } else {
            Self(format!("{scheme}://{server_name}:{port}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Makes `url` absolute. URLs that already start with a scheme are
    /// returned unchanged; anything else is appended to the base.
    pub fn rel2url(&self, url: &str) -> String {
        if SCHEME.is_match(url) { url.to_owned() } else { format!("{}{url}", self.0) }
    }
}

impl fmt::Display for UrlBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Percent-encodes everything except ASCII alphanumerics and `/-_.!~*'()`.
pub fn urlencode(s: &str) -> String {
    utf8_percent_encode(s, PATH_SAFE).to_string()
}

/// Form-style decoding: `+` becomes a space, `%XX` escapes are decoded, and
/// invalid UTF-8 is replaced.
pub fn urldecode(s: &str) -> String {
    let plus_decoded = s.replace('+', " ");
    percent_decode_str(&plus_decoded).decode_utf8_lossy().into_owned()
}

/// Loose syntactic check for an absolute URI: a lowercase scheme followed by
/// URI characters or valid percent escapes.
pub fn is_valid_uri(uri: &str) -> bool {
    VALID_URI.is_match(uri)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(false, "example.org", 80, "http://example.org")]
    #[case(false, "example.org", 8080, "http://example.org:8080")]
    #[case(true, "example.org", 443, "https://example.org")]
    #[case(true, "example.org", 80, "https://example.org:80")]
    fn base_omits_default_port(#[case] https: bool, #[case] name: &str, #[case] port: u16, #[case] expected: &str) {
        assert_eq!(UrlBase::new(https, name, port).as_str(), expected);
    }

    #[test]
    fn rel2url_keeps_absolute_urls() {
        let base = UrlBase::new(false, "example.org", 80);
        assert_eq!(base.rel2url("/items/1"), "http://example.org/items/1");
        assert_eq!(base.rel2url("https://other.net/x"), "https://other.net/x");
        assert_eq!(base.rel2url("mailto:someone@example.org"), "mailto:someone@example.org");
    }

    #[test]
    fn rel2url_scheme_is_ascii_only() {
        let base = UrlBase::new(false, "example.org", 80);
        assert_eq!(base.rel2url("/caf\u{e9}:menu"), "http://example.org/caf\u{e9}:menu");
        assert_eq!(base.rel2url("\u{e9}t\u{e9}:x"), "http://example.org\u{e9}t\u{e9}:x");
    }

    #[test]
    fn urlencode_keeps_path_characters() {
        assert_eq!(urlencode("/~user/a-b_c.d!*'()"), "/~user/a-b_c.d!*'()");
        assert_eq!(urlencode("/my file?.txt"), "/my%20file%3F.txt");
        assert_eq!(urlencode("caf\u{e9}"), "caf%C3%A9");
        assert_eq!(urlencode("a\nb"), "a%0Ab");
    }

    #[test]
    fn urldecode_handles_plus_and_escapes() {
        assert_eq!(urldecode("my+file%20name%2B1"), "my file name+1");
        assert_eq!(urldecode("caf%C3%A9"), "caf\u{e9}");
        assert_eq!(urldecode("bad%FF"), "bad\u{fffd}");
    }

    #[rstest]
    #[case("http://example.org/a?b=c#d", true)]
    #[case("urn:isbn:0451450523", true)]
    #[case("http://example.org/%zz", false)]
    #[case("HTTP://example.org/", false)]
    #[case("/relative/path", false)]
    #[case("http://exa mple.org/", false)]
    #[case("http://ex\u{e4}mple.org/", false)]
    #[case("http://example.org/caf\u{e9}", false)]
    fn uri_validation(#[case] uri: &str, #[case] expected: bool) {
        assert_eq!(is_valid_uri(uri), expected);
    }
}
