//! # restkit
//!
//! Helpers for REST-style HTTP endpoints, on top of hyper.
//!
//! ## What's in the box
//!
//! - **Content negotiation**: parse `Accept`, pick the best of the types you
//!   can produce ([`negotiate`], [`Request::best_content_type`])
//! - **Method spoofing**: `POST /x?http_method=DELETE` reaches your handler
//!   as a `DELETE` ([`Spoof`])
//! - **Status registry**: [`Status`] with codes, reason phrases and
//!   symbolic names
//! - **Header helpers**: content-type shorthand, absolute `Location`
//!   ([`ResponseBuilder`], [`UrlBase`])
//! - **Error pages**: XHTML, framed by a pluggable [`PageShell`]
//! - **Directory listings**: the same listing as HTML, text, CSV or JSON,
//!   whichever the client prefers ([`Listing`])
//!
//! What restkit is not: a router, a protocol implementation, a cache. The
//! server hands every request to one handler; what happens next is yours.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use restkit::{Error, Listing, Method, Request, Response, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     Server::bind("0.0.0.0:3000")
//!         .server_name("files.example.org")
//!         .serve(index)
//!         .await
//!         .unwrap();
//! }
//!
//! async fn index(req: Request) -> Result<Response, Error> {
//!     req.require_method(&[Method::Get, Method::Head])?;
//!     let mut listing = Listing::negotiate(&req, None);
//!     listing.line("readme.txt", &[("Size", "1024")]);
//!     listing.line("photos/", &[("Size", "")]);
//!     Ok(listing.end())
//! }
//! ```

mod config;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod server;
mod status;

pub mod date;
pub mod listing;
pub mod negotiate;
pub mod page;
pub mod uri;

pub use config::Config;
pub use error::Error;
pub use handler::Handler;
pub use listing::{Format, Listing};
pub use method::{Method, OVERRIDE_PARAM, Spoof, UnknownMethod};
pub use negotiate::{AcceptEntry, AcceptList, NotAcceptable, ParamValue};
pub use page::{DefaultShell, PageInfo, PageShell};
pub use request::{Request, RequestBuilder};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use server::Server;
pub use status::Status;
pub use uri::UrlBase;
