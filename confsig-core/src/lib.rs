//! confsig core library: descriptor types, compose manifest source, errors.
//!
//! - [`types`]: newtypes, [`NameTemplate`], descriptors and remote objects
//! - [`error`]: [`ManifestError`]
//! - [`manifest`]: [`DescriptorSource`] and the compose-backed implementation

pub mod error;
pub mod manifest;
pub mod types;

pub use error::ManifestError;
pub use manifest::{ComposeSource, DescriptorSource};
pub use types::{
    ConfigDescriptor, ConfigId, ConfigKey, NameTemplate, Namespace, RemoteConfig,
    MAX_CONFIG_NAME_LEN, NAME_MARKER,
};
