//! Invocation boundary.
//!
//! # Data Flow
//! ```text
//! edge event JSON + invocation context
//!     → types.rs (decode records, derive account id and request view)
//!     → handler.rs (span per invocation, call the redirect pipeline)
//!     → response JSON in the same shape
//! ```

pub mod handler;
pub mod types;

pub use handler::handle_event;
pub use types::{EdgeEvent, EdgeRequest, HandlerError, InvocationContext, TriggerConfig};
