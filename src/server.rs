//! The host adapter: hyper underneath, one application handler on top.
//!
//! For every request the server
//! 1. rejects methods it does not know with `405 Method Not Allowed`,
//! 2. buffers the whole body up to [`Config::body_limit`] (hyper takes care
//!    of `Content-Length` and chunked framing),
//! 3. applies method spoofing (`POST ...?http_method=PUT`),
//! 4. hands the [`Request`] to the handler and writes back its response.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or **Ctrl-C** the server stops accepting, lets every
//! in-flight connection finish, then returns from [`Server::serve`].

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::handler::Handler;
use crate::method::Method;
use crate::page::{PageShell, escape_html};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    config: Config,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use restkit::Server;
    /// let server = Server::bind("0.0.0.0:3000").server_name("example.org");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr, config: Config::new() }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// See [`Config::server_name`].
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.server_name(name);
        self
    }

    /// See [`Config::port`].
    pub fn public_port(mut self, port: u16) -> Self {
        self.config = self.config.port(port);
        self
    }

    /// See [`Config::https`].
    pub fn https(mut self, https: bool) -> Self {
        self.config = self.config.https(https);
        self
    }

    /// See [`Config::stylesheet`].
    pub fn stylesheet(mut self, href: impl Into<String>) -> Self {
        self.config = self.config.stylesheet(href);
        self
    }

    /// See [`Config::body_limit`].
    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.config = self.config.body_limit(bytes);
        self
    }

    /// See [`Config::shell`].
    pub fn shell(mut self, shell: impl PageShell + 'static) -> Self {
        self.config = self.config.shell(shell);
        self
    }

    /// Binds, then serves `handler` until SIGTERM or Ctrl-C.
    ///
    /// Returns only after a full graceful shutdown.
    pub async fn serve(self, handler: impl Handler) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_listener(listener, handler, shutdown_signal()).await
    }

    /// Serves `handler` on an already bound `listener` until `shutdown`
    /// resolves. The address given to [`bind`](Server::bind) is ignored.
    pub async fn serve_listener(
        self,
        listener: TcpListener,
        handler: impl Handler,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let handler = Arc::new(handler);
        let config = Arc::new(self.config);

        info!(addr = %listener.local_addr()?, "restkit listening");

        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // check shutdown first so queued connections are not accepted
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let handler = Arc::clone(&handler);
                    let config = Arc::clone(&config);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let handler = Arc::clone(&handler);
                            let config = Arc::clone(&config);
                            async move { dispatch(handler, config, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("restkit stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Turns one hyper request into one response. Every failure becomes an HTTP
/// status, so hyper never sees an error.
async fn dispatch<H: Handler>(
    handler: Arc<H>,
    config: Arc<Config>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let Ok(method) = parts.method.as_str().parse::<Method>() else {
        debug!(method = %parts.method, "unknown method");
        return Ok(Response::status(Status::MethodNotAllowed).into_inner());
    };

    let body = match Limited::new(body, config.max_body_len()).collect().await {
        Ok(collected) => collected.to_bytes().to_vec(),
        Err(e) if e.is::<LengthLimitError>() => {
            debug!(limit = config.max_body_len(), "request body too large");
            return Ok(Response::status(Status::RequestEntityTooLarge).into_inner());
        }
        Err(e) => {
            warn!("failed to read request body: {e}");
            return Ok(Response::status(Status::BadRequest).into_inner());
        }
    };

    let uri = parts.uri.path_and_query().map_or("/", |pq| pq.as_str()).to_owned();
    let mut headers: Vec<(String, String)> = parts.headers.iter()
        .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
        .collect();
    // HTTP/2 carries the host in the :authority pseudo-header
    if !parts.headers.contains_key(http::header::HOST) {
        if let Some(authority) = parts.uri.authority() {
            headers.push(("host".to_owned(), authority.as_str().to_owned()));
        }
    }

    let mut request = Request::new(method, uri, headers, body, config);
    if let Err(e) = request.apply_spoof() {
        debug!("rejecting spoofed method: {e}");
        let message = format!("Unknown method {}.", escape_html(&e.0));
        return Ok(Response::error(&request, Status::MethodNotAllowed, &message).into_inner());
    }

    Ok(handler.call(request).await.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C only on Windows).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
