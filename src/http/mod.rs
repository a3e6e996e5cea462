//! HTTP transport: axum router, request/response framing, CORS, and the
//! SSE progress transport. Built directly on `axum`+`tower-http` since this
//! service's surface — two JSON endpoints plus SSE — doesn't need a shared
//! internal server crate.

mod routes;
mod sse;

pub use routes::{router, AppState};
