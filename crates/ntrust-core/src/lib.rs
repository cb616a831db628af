//! ntrust Core Library
//!
//! Manages npm trusted publisher relationships for every package of a
//! workspace: infers the CI binding from the local git checkout, queries the
//! registry through the `npm` CLI and converges each package onto that
//! binding.

pub mod config;
pub mod confirm;
pub mod error;
pub mod git;
pub mod inference;
pub mod pipeline;
pub mod reconcile;
pub mod registry;
pub mod types;
pub mod workspace;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigScope, ConfigStore, NtrustConfig};

    // Errors
    pub use crate::error::{BatchError, RegistryError, TrustError};

    // Inference
    pub use crate::inference::{InferenceOptions, infer_target};

    // Reconciliation
    pub use crate::confirm::{Prompter, confirm};
    pub use crate::reconcile::{TrustEngine, TrustEvent, TrustObserver, TrustOptions};

    // Registry
    pub use crate::registry::{NpmCli, OutputMode, RegistryClient, RegistryOutput};

    // Types
    pub use crate::types::{
        DesiredBinding, ExistingBinding, OperationRecord, OperationStatus, Provider, TrustAction,
    };

    pub use crate::workspace::find_packages;
}
