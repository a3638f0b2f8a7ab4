//! Unified error type.

use std::fmt;

use crate::method::Method;
use crate::negotiate::NotAcceptable;

/// The error type returned by restkit's fallible operations.
///
/// Every variant except [`Error::Io`] maps onto an HTTP error page through
/// [`IntoResponse`](crate::IntoResponse), so a handler returning
/// `Result<Response, Error>` can bail out with `?` and the client still gets
/// the right status. Nothing runs after the early return.
#[derive(Debug)]
pub enum Error {
    /// Binding to a port or accepting a connection failed.
    Io(std::io::Error),
    /// No offered media type is acceptable to the client.
    NotAcceptable(NotAcceptable),
    /// The request method is not one the handler accepts.
    MethodNotAllowed { method: Method, allowed: Vec<Method> },
    /// A status code that is not in the registry.
    UnknownStatus(u16),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::NotAcceptable(e) => write!(f, "{e}"),
            Self::MethodNotAllowed { method, allowed } => {
                write!(f, "method {method} not allowed, expected one of: ")?;
                write_joined(f, allowed)
            }
            Self::UnknownStatus(code) => write!(f, "unknown status code {code}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::NotAcceptable(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<NotAcceptable> for Error {
    fn from(e: NotAcceptable) -> Self {
        Self::NotAcceptable(e)
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Method]) -> fmt::Result {
    for (i, m) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(m.as_str())?;
    }
    Ok(())
}
