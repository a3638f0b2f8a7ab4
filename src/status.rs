//! HTTP status registry.
//!
//! A fixed table mapping each [`Status`] to its numeric code, its reason
//! phrase and its symbolic identifier (`"NOT_ACCEPTABLE"`, `"CREATED"`, ...).
//!
//! ```rust
//! use restkit::Status;
//!
//! assert_eq!(Status::NotAcceptable.status_line(), "406 Not Acceptable");
//! assert_eq!("CREATED".parse::<Status>(), Ok(Status::Created));
//! assert_eq!(Status::from_code(404).unwrap(), Status::NotFound);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

macro_rules! registry {
    ($( $variant:ident => $code:literal, $name:literal, $reason:literal; )+) => {
        /// A status code known to the registry.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum Status {
            $( $variant, )+
        }

        impl Status {
            /// Every registered status, in ascending code order.
            pub const ALL: &'static [Status] = &[ $( Status::$variant, )+ ];

            pub fn code(self) -> u16 {
                match self {
                    $( Self::$variant => $code, )+
                }
            }

            pub fn reason(self) -> &'static str {
                match self {
                    $( Self::$variant => $reason, )+
                }
            }

            /// Symbolic identifier, e.g. `"NOT_ACCEPTABLE"`.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )+
                }
            }

            fn by_name(name: &str) -> Option<Self> {
                match name {
                    $( $name => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Looks a numeric code up in the registry.
            pub fn from_code(code: u16) -> Result<Self, Error> {
                match code {
                    $( $code => Ok(Self::$variant), )+
                    _ => Err(Error::UnknownStatus(code)),
                }
            }
        }

        /// Parses a symbolic identifier. The `HTTP_` prefix is optional, so
        /// both `"NOT_ACCEPTABLE"` and `"HTTP_NOT_ACCEPTABLE"` resolve to 406.
        impl FromStr for Status {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::by_name(s)
                    .or_else(|| s.strip_prefix("HTTP_").and_then(Self::by_name))
                    .ok_or(())
            }
        }
    };
}

registry! {
    // ── 1xx Informational ─────────────────────────────────────────────────────
    Continue                      => 100, "CONTINUE",                        "Continue";
    SwitchingProtocols            => 101, "SWITCHING_PROTOCOLS",             "Switching Protocols";
    Processing                    => 102, "PROCESSING",                      "Processing";

    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok                            => 200, "OK",                              "OK";
    Created                       => 201, "CREATED",                         "Created";
    Accepted                      => 202, "ACCEPTED",                        "Accepted";
    NonAuthoritativeInformation   => 203, "NON_AUTHORITATIVE_INFORMATION",   "Non-Authoritative Information";
    NoContent                     => 204, "NO_CONTENT",                      "No Content";
    ResetContent                  => 205, "RESET_CONTENT",                   "Reset Content";
    PartialContent                => 206, "PARTIAL_CONTENT",                 "Partial Content";
    MultiStatus                   => 207, "MULTI_STATUS",                    "Multi-Status";

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    MultipleChoices               => 300, "MULTIPLE_CHOICES",                "Multiple Choices";
    MovedPermanently              => 301, "MOVED_PERMANENTLY",               "Moved Permanently";
    Found                         => 302, "FOUND",                           "Found";
    SeeOther                      => 303, "SEE_OTHER",                       "See Other";
    NotModified                   => 304, "NOT_MODIFIED",                    "Not Modified";
    UseProxy                      => 305, "USE_PROXY",                       "Use Proxy";
    SwitchProxy                   => 306, "SWITCH_PROXY",                    "Switch Proxy";
    TemporaryRedirect             => 307, "TEMPORARY_REDIRECT",              "Temporary Redirect";

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest                    => 400, "BAD_REQUEST",                     "Bad Request";
    Unauthorized                  => 401, "UNAUTHORIZED",                    "Unauthorized";
    PaymentRequired               => 402, "PAYMENT_REQUIRED",                "Payment Required";
    Forbidden                     => 403, "FORBIDDEN",                       "Forbidden";
    NotFound                      => 404, "NOT_FOUND",                       "Not Found";
    MethodNotAllowed              => 405, "METHOD_NOT_ALLOWED",              "Method Not Allowed";
    NotAcceptable                 => 406, "NOT_ACCEPTABLE",                  "Not Acceptable";
    ProxyAuthenticationRequired   => 407, "PROXY_AUTHENTICATION_REQUIRED",   "Proxy Authentication Required";
    RequestTimeout                => 408, "REQUEST_TIMEOUT",                 "Request Timeout";
    Conflict                      => 409, "CONFLICT",                        "Conflict";
    Gone                          => 410, "GONE",                            "Gone";
    LengthRequired                => 411, "LENGTH_REQUIRED",                 "Length Required";
    PreconditionFailed            => 412, "PRECONDITION_FAILED",             "Precondition Failed";
    RequestEntityTooLarge         => 413, "REQUEST_ENTITY_TOO_LARGE",        "Request Entity Too Large";
    RequestUriTooLong             => 414, "REQUEST_URI_TOO_LONG",            "Request-URI Too Long";
    UnsupportedMediaType          => 415, "UNSUPPORTED_MEDIA_TYPE",          "Unsupported Media Type";
    RequestedRangeNotSatisfiable  => 416, "REQUESTED_RANGE_NOT_SATISFIABLE", "Requested Range Not Satisfiable";
    ExpectationFailed             => 417, "EXPECTATION_FAILED",              "Expectation Failed";
    UnprocessableEntity           => 422, "UNPROCESSABLE_ENTITY",            "Unprocessable Entity";
    Locked                        => 423, "LOCKED",                          "Locked";
    FailedDependency              => 424, "FAILED_DEPENDENCY",               "Failed Dependency";
    UnorderedCollection           => 425, "UNORDERED_COLLECTION",            "Unordered Collection";
    UpgradeRequired               => 426, "UPGRADE_REQUIRED",                "Upgrade Required";
    RetryWith                     => 449, "RETRY_WITH",                      "Retry With";

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError           => 500, "INTERNAL_SERVER_ERROR",           "Internal Server Error";
    NotImplemented                => 501, "NOT_IMPLEMENTED",                 "Not Implemented";
    BadGateway                    => 502, "BAD_GATEWAY",                     "Bad Gateway";
    ServiceUnavailable            => 503, "SERVICE_UNAVAILABLE",             "Service Unavailable";
    GatewayTimeout                => 504, "GATEWAY_TIMEOUT",                 "Gateway Timeout";
    HttpVersionNotSupported       => 505, "HTTP_VERSION_NOT_SUPPORTED",      "HTTP Version Not Supported";
    VariantAlsoNegotiates         => 506, "VARIANT_ALSO_NEGOTIATES",         "Variant Also Negotiates";
    InsufficientStorage           => 507, "INSUFFICIENT_STORAGE",            "Insufficient Storage";
    BandwidthLimitExceeded        => 509, "BANDWIDTH_LIMIT_EXCEEDED",        "Bandwidth Limit Exceeded";
    NotExtended                   => 510, "NOT_EXTENDED",                    "Not Extended";
}

impl Status {
    /// The status line without the protocol prefix, e.g. `"406 Not Acceptable"`.
    pub fn status_line(self) -> String {
        format!("{} {}", self.code(), self.reason())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.code()
    }
}

impl From<Status> for http::StatusCode {
    fn from(s: Status) -> http::StatusCode {
        // every registered code lies in 100..=599
        http::StatusCode::from_u16(s.code()).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("NOT_ACCEPTABLE", Status::NotAcceptable)]
    #[case("HTTP_NOT_ACCEPTABLE", Status::NotAcceptable)]
    #[case("CREATED", Status::Created)]
    #[case("HTTP_VERSION_NOT_SUPPORTED", Status::HttpVersionNotSupported)]
    #[case("HTTP_HTTP_VERSION_NOT_SUPPORTED", Status::HttpVersionNotSupported)]
    fn symbolic_names_resolve(#[case] name: &str, #[case] expected: Status) {
        assert_eq!(name.parse::<Status>(), Ok(expected));
    }

    #[test]
    fn unknown_symbolic_name_is_rejected() {
        assert!("NOT_A_STATUS".parse::<Status>().is_err());
        assert!("not_acceptable".parse::<Status>().is_err());
    }

    #[test]
    fn status_line_matches_registry() {
        assert_eq!(Status::NotAcceptable.status_line(), "406 Not Acceptable");
        assert_eq!(Status::Created.to_string(), "201 Created");
        assert_eq!(Status::RetryWith.status_line(), "449 Retry With");
    }

    #[test]
    fn from_code_round_trips_every_entry() {
        for &status in Status::ALL {
            assert_eq!(Status::from_code(status.code()).unwrap(), status);
            assert_eq!(status.name().parse::<Status>(), Ok(status));
        }
    }

    #[test]
    fn unknown_code_is_an_error() {
        assert!(matches!(Status::from_code(418), Err(Error::UnknownStatus(418))));
        assert!(matches!(Status::from_code(999), Err(Error::UnknownStatus(999))));
    }

    #[test]
    fn converts_to_http_status_code() {
        let code: http::StatusCode = Status::RetryWith.into();
        assert_eq!(code.as_u16(), 449);
        let code: http::StatusCode = Status::NotAcceptable.into();
        assert_eq!(code, http::StatusCode::NOT_ACCEPTABLE);
    }
}
