//! Redirect decision subsystem.
//!
//! # Data Flow
//! ```text
//! (request, distribution, origin response)
//!     → pipeline.rs (status check, deadline race)
//!     → cache.rs (one lookup per distribution per process)
//!     → metadata resolver (fallback location template)
//!     → template.rs (@host@ / @path@ / @query@ substitution)
//!     → types.rs (mutate response into 302 Found)
//! ```
//!
//! # Design Decisions
//! - Fail open: anything short of a rendered location returns the origin response
//! - The cache is an explicit object passed to the pipeline, not hidden state
//! - Unknown placeholders render empty rather than erroring

pub mod cache;
pub mod pipeline;
pub mod template;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheEntrySummary, CachePolicy, EntryState, ResolutionCache};
pub use pipeline::{Decision, PipelineError, PipelineOptions, RedirectPipeline, ResolutionErrorPolicy};
pub use template::render;
pub use types::{DistributionIdentity, HeaderEntry, Headers, RequestContext, ResponseEnvelope};
