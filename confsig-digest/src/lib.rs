//! # confsig-digest
//!
//! Content digests for config objects.
//!
//! Call [`compute_digests`] to resolve the manifests, checksum every
//! referenced file and get back the [`DigestBindings`] a deployment step
//! needs to expand the config names. Nothing touches the process environment
//! unless the caller opts in with [`DigestBindings::apply_to_env`].

pub mod bindings;
pub mod digest;
pub mod error;

pub use bindings::{DigestBinding, DigestBindings, ExportFormat};
pub use digest::{bind_digests, checksum, checksum_file, compute_digests, fit_digest};
pub use error::DigestError;
