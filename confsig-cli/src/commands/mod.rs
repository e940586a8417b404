pub mod digest;
pub mod prune;

use std::path::PathBuf;

use clap::Args;
use confsig_core::Namespace;

/// Manifest selection shared by every subcommand.
#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Stack namespace the manifests deploy under.
    #[arg(long, short = 'n', env = "CONFSIG_NAMESPACE")]
    pub namespace: String,

    /// Compose manifest; repeat for overrides (later files win).
    #[arg(
        long = "file",
        short = 'f',
        value_name = "MANIFEST",
        default_value = "docker-compose.yml"
    )]
    pub files: Vec<PathBuf>,
}

impl ManifestArgs {
    pub fn namespace(&self) -> Namespace {
        Namespace::from(self.namespace.as_str())
    }
}
