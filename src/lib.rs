//! Renders a URL via headless Chrome (JS mode) or a plain HTTP GET
//! (non-JS mode), parses the result into an SEO-oriented structure, and
//! optionally diffs the two modes against each other (compare mode).
//!
//! Module map follows the component boundaries of the design this crate
//! implements: [`browser`] and [`renderer`] own the headless pipeline
//! (C1-C5 equivalents), [`fetcher`] the plain-HTTP path, [`parser`] the
//! shared document analysis, [`orchestrator`] and [`compare`] the two
//! request handlers, [`events`] the progress bus, and [`http`] the axum
//! transport that ties it all to the outside world.

pub mod auth;
pub mod blocklist;
pub mod browser;
pub mod compare;
pub mod config;
pub mod errors;
pub mod events;
pub mod fetcher;
pub mod http;
pub mod orchestrator;
pub mod parser;
pub mod renderer;
pub mod screenshot_store;
pub mod utils;

pub use config::AppConfig;
pub use errors::RenderError;
pub use orchestrator::Orchestrator;
