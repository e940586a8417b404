//! Stale config reconciliation.
//!
//! 1. Resolve descriptors from the manifests.
//! 2. Build one flat [`FilterSet`] from every label of every descriptor.
//! 3. List configs matching any predicate.
//! 4. Remove each in listing order. In-use conflicts are recorded and
//!    skipped; any other failure aborts with the remaining objects untouched.

use std::path::PathBuf;

use confsig_core::{ConfigDescriptor, DescriptorSource, Namespace, RemoteConfig};

use crate::error::{ReconcileError, RemoveError};
use crate::store::{ConfigStore, FilterSet};

/// Knobs for a reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// List matches but issue no removals.
    pub dry_run: bool,
}

/// What happened to one matched config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    Removed,
    /// A running service still references it; left in place.
    InUse { service: String },
    /// Dry run: would have been removed.
    WouldRemove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigOutcome {
    pub config: RemoteConfig,
    pub action: ConfigAction,
}

/// Per-object outcomes of a completed run, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub outcomes: Vec<ConfigOutcome>,
}

impl ReconcileReport {
    pub fn removed(&self) -> usize {
        self.count(|a| matches!(a, ConfigAction::Removed))
    }

    pub fn in_use(&self) -> usize {
        self.count(|a| matches!(a, ConfigAction::InUse { .. }))
    }

    pub fn would_remove(&self) -> usize {
        self.count(|a| matches!(a, ConfigAction::WouldRemove))
    }

    fn count(&self, pred: impl Fn(&ConfigAction) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.action)).count()
    }
}

/// Resolve `manifests` through `source`, then [`reconcile`] against `store`.
pub fn remove_stale_configs<S, C>(
    source: &S,
    store: &C,
    namespace: &Namespace,
    manifests: &[PathBuf],
    options: ReconcileOptions,
) -> Result<ReconcileReport, ReconcileError>
where
    S: DescriptorSource + ?Sized,
    C: ConfigStore + ?Sized,
{
    let descriptors = source.resolve(namespace, manifests)?;
    reconcile(&descriptors, store, options)
}

/// Remove every config carrying one of `descriptors`' labels, except those
/// still in use.
///
/// No labels means no filter; nothing is listed so an empty filter can never
/// select every config on the cluster.
pub fn reconcile<C>(
    descriptors: &[ConfigDescriptor],
    store: &C,
    options: ReconcileOptions,
) -> Result<ReconcileReport, ReconcileError>
where
    C: ConfigStore + ?Sized,
{
    let filters = FilterSet::from_descriptors(descriptors);
    if filters.is_empty() {
        tracing::debug!("no labels on {} descriptor(s), nothing to list", descriptors.len());
        return Ok(ReconcileReport::default());
    }

    let configs = store
        .list_configs(&filters)
        .map_err(|source| ReconcileError::Api {
            context: "list configs".to_string(),
            source,
        })?;
    tracing::debug!(
        "{} config(s) match {} label filter(s)",
        configs.len(),
        filters.len()
    );

    let mut report = ReconcileReport::default();
    for config in configs {
        if options.dry_run {
            tracing::info!("[dry-run] would remove config {} ({})", config.name, config.id);
            report.outcomes.push(ConfigOutcome {
                config,
                action: ConfigAction::WouldRemove,
            });
            continue;
        }

        let action = match store.remove_config(&config.id) {
            Ok(()) => {
                tracing::info!("removed config {} ({})", config.name, config.id);
                ConfigAction::Removed
            }
            Err(RemoveError::InUse { service, .. }) => {
                tracing::info!(
                    "config {} ({}) still in use by service '{service}', keeping",
                    config.name,
                    config.id
                );
                ConfigAction::InUse { service }
            }
            Err(RemoveError::Other(source)) => {
                tracing::warn!(
                    "removing config {} ({}) failed, aborting: {source}",
                    config.name,
                    config.id
                );
                return Err(ReconcileError::Api {
                    context: format!("remove config {}", config.id),
                    source,
                });
            }
        };
        report.outcomes.push(ConfigOutcome { config, action });
    }

    Ok(report)
}
