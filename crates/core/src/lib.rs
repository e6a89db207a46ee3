//! # Rudder Core
//!
//! Core domain vocabulary for the Rudder orchestration engine.
//! These are the value types shared between the engine proper and the
//! crates that observe it.
//!
//! ## Key Components
//!
//! - **Resource identity**: [`ResourceName`], [`ApiVersion`]
//! - **Check outcomes**: [`ResourceState`]
//! - **Deliverables**: [`ArtifactType`]
//!
//! Every type here has a single canonical string form (its `Display`
//! output). Downstream consumers — the telemetry layer in particular —
//! rely on that form being deterministic.

pub mod artifact;
pub mod resource;

pub use artifact::{ArtifactType, ParseArtifactTypeError};
pub use resource::{
    ApiVersion, ApiVersionError, ResourceName, ResourceNameError, ResourceState,
    ParseResourceStateError,
};

/// Common prelude for Rudder crates.
pub mod prelude {
    pub use super::{ApiVersion, ArtifactType, ResourceName, ResourceState};
}
