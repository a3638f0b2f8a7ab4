//! The application handler.
//!
//! The server owns exactly one handler and calls it once per request. Any
//! `async fn(Request) -> impl IntoResponse` qualifies; the server keeps it in
//! an `Arc<H>` shared by every connection task, so no boxing or dynamic
//! dispatch is involved.

use std::future::Future;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// Implemented for every valid application handler.
///
/// Sealed: satisfied automatically by any `async fn(Request) -> R` where
/// `R: IntoResponse`, and by nothing else.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn call(&self, req: Request) -> impl Future<Output = Response> + Send + 'static;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, req: Request) -> impl Future<Output = Response> + Send + 'static {
        let fut = self(req);
        async move { fut.await.into_response() }
    }
}
