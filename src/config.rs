//! Server-wide settings shared read-only by every request.

use std::fmt;
use std::sync::Arc;

use crate::page::{DefaultShell, PageShell};

/// Default cap on a buffered request body: 2 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Settings that shape URLs and generated pages.
///
/// Built once, usually through the [`Server`](crate::Server) builder methods,
/// and shared behind an `Arc`. Anything left unset is derived per request:
/// the server name and port from the `Host` header, the scheme default port
/// when even that is missing.
#[derive(Clone)]
pub struct Config {
    pub(crate) server_name: Option<String>,
    pub(crate) port: Option<u16>,
    pub(crate) https: bool,
    pub(crate) stylesheet: Option<String>,
    pub(crate) shell: Arc<dyn PageShell>,
    pub(crate) body_limit: usize,
}

impl Config {
    pub fn new() -> Self {
        Self {
            server_name: None,
            port: None,
            https: false,
            stylesheet: None,
            shell: Arc::new(DefaultShell),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Public host name used for absolute URLs.
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Public port used for absolute URLs.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Whether clients reach this server over TLS. Behind a TLS-terminating
    /// proxy this is `true` even though the socket itself is plain.
    pub fn https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    /// Stylesheet linked from error pages and HTML listings.
    pub fn stylesheet(mut self, href: impl Into<String>) -> Self {
        self.stylesheet = Some(href.into());
        self
    }

    /// Replaces the document frame of generated HTML.
    pub fn shell(mut self, shell: impl PageShell + 'static) -> Self {
        self.shell = Arc::new(shell);
        self
    }

    /// Largest request body the server buffers. Bigger bodies are answered
    /// with `413 Request Entity Too Large` before the handler runs.
    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    pub fn max_body_len(&self) -> usize {
        self.body_limit
    }

    pub fn is_https(&self) -> bool {
        self.https
    }

    pub fn stylesheet_href(&self) -> Option<&str> {
        self.stylesheet.as_deref()
    }

    pub fn page_shell(&self) -> &dyn PageShell {
        self.shell.as_ref()
    }
}

impl Default for Config {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_name", &self.server_name)
            .field("port", &self.port)
            .field("https", &self.https)
            .field("stylesheet", &self.stylesheet)
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}
