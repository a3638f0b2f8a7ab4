//! A negotiated directory index over the current working directory.
//!
//! Run with:
//!   cargo run --example listing
//!
//! Try:
//!   curl http://localhost:3000/
//!   curl -H 'accept: text/csv' http://localhost:3000/
//!   curl -H 'accept: application/json' http://localhost:3000/
//!   curl -H 'accept: image/png' http://localhost:3000/   # falls back to XHTML
//!   curl -X POST 'http://localhost:3000/?http_method=DELETE'

use std::path::Path;

use restkit::date::http_date;
use restkit::uri::urlencode;
use restkit::{Error, Listing, Method, Request, Response, Server, Status};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    Server::bind("0.0.0.0:3000")
        .stylesheet("/style.css")
        .serve(index)
        .await
        .expect("server error");
}

async fn index(req: Request) -> Result<Response, Error> {
    if req.method() == Method::Delete {
        return Ok(Response::error(&req, Status::Forbidden, "This index is read-only."));
    }
    req.require_method(&[Method::Get, Method::Head])?;

    let mut listing = Listing::negotiate(&req, None).columns(["Size", "Modified"]);
    let entries = std::fs::read_dir(Path::new(".")).map_err(Error::Io)?;
    for entry in entries.flatten() {
        let Ok(meta) = entry.metadata() else { continue };
        let mut name = urlencode(&entry.file_name().to_string_lossy());
        if meta.is_dir() {
            name.push('/');
        }
        let size = if meta.is_dir() { String::new() } else { meta.len().to_string() };
        let modified = meta.modified().map(http_date).unwrap_or_default();
        listing.line(&name, &[("Size", size.as_str()), ("Modified", modified.as_str())]);
    }
    Ok(listing.end())
}
