//! # confsig-reconcile
//!
//! Garbage collection of stale orchestrator config objects.
//!
//! Call [`remove_stale_configs`] with a [`DescriptorSource`] and a
//! [`ConfigStore`]: every config object carrying one of the manifests'
//! labels is removed unless a running service still uses it.
//!
//! [`DescriptorSource`]: confsig_core::DescriptorSource

pub mod docker;
pub mod error;
pub mod reconcile;
pub mod store;

pub use docker::DockerCli;
pub use error::{ReconcileError, RemoveError, StoreError};
pub use reconcile::{
    reconcile, remove_stale_configs, ConfigAction, ConfigOutcome, ReconcileOptions,
    ReconcileReport,
};
pub use store::{ConfigStore, FilterSet};
