//! Fallback redirect library: turns origin 404s into redirects to a
//! per-distribution fallback location.

pub mod admin;
pub mod config;
pub mod event;
pub mod http;
pub mod lifecycle;
pub mod metadata;
pub mod observability;
pub mod redirect;

pub use config::ServiceConfig;
pub use event::handle_event;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use redirect::{RedirectPipeline, ResolutionCache};
