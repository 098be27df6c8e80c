//! Pipeline services behind the HTTP handlers.
//!
//! Handlers stay thin: request parsing and response shaping. Everything
//! with behavior worth testing lives here, built over the `innboard-core`
//! traits so integration tests can drive the full pipeline with in-memory
//! fakes.

pub mod rehydrate;
pub mod resolver;
pub mod signing;
pub mod tenant_names;

pub use rehydrate::{RehydrationOutcome, RehydrationService};
pub use resolver::{MetadataResolver, SlotResolution};
pub use signing::{GenerateOutcome, GenerateRequest, SigningService};
pub use tenant_names::TenantNameCache;
