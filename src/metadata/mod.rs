//! Distribution metadata subsystem.
//!
//! # Data Flow
//! ```text
//! (account id, distribution id)
//!     → types.rs (build resource identifier)
//!     → client.rs (one tag listing call: HTTP metadata service or static table)
//!     → resolver.rs (pick the FallbackLocation tag, absent if missing)
//! ```
//!
//! # Design Decisions
//! - A missing tag is `Ok(None)`, never an error
//! - Call failures surface as `ResolutionError` and are not retried here
//! - Lookups return `'static` boxed futures so callers can spawn and share them

pub mod client;
pub mod resolver;
pub mod types;

pub use client::{HttpTagSource, StaticTagSource};
pub use resolver::{MetadataResolver, TagResolver, TagSource};
pub use types::{distribution_arn, ResolutionError, ResolutionResult, Tag, FALLBACK_LOCATION_TAG};
