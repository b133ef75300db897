//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! POST /invoke (edge event JSON)
//!     → request.rs (request ID)
//!     → server.rs (decode event, resolve function ARN)
//!     → event::handle_event (redirect pipeline)
//!     → response JSON, or a JSON error with 400/502
//! ```

pub mod request;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, HttpServer, FUNCTION_ARN_HEADER};
