//! Orchestrator client contract and label filters.

use confsig_core::{ConfigDescriptor, ConfigId, RemoteConfig};

use crate::error::{RemoveError, StoreError};

/// Label key the lookup filters match on.
pub const NAME_LABEL: &str = "name";

/// The two calls the reconciler needs from the orchestrator.
pub trait ConfigStore {
    /// Every config object whose labels satisfy **any** predicate in
    /// `filters`.
    fn list_configs(&self, filters: &FilterSet) -> Result<Vec<RemoteConfig>, StoreError>;

    /// Remove one config object. In-use conflicts must be reported as
    /// [`RemoveError::InUse`].
    fn remove_config(&self, id: &ConfigId) -> Result<(), RemoveError>;
}

/// Flat, union-semantics set of `label=name=<value>` predicates.
///
/// Insertion order is kept and duplicates are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    values: Vec<String>,
}

impl FilterSet {
    /// One predicate per label of every descriptor.
    pub fn from_descriptors(descriptors: &[ConfigDescriptor]) -> Self {
        let mut set = Self::default();
        for descriptor in descriptors {
            for label in &descriptor.labels {
                set.insert(label);
            }
        }
        set
    }

    pub fn insert(&mut self, value: &str) {
        if !self.values.iter().any(|v| v == value) {
            self.values.push(value.to_owned());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Predicates in `docker --filter` syntax: `label=name=<value>`.
    pub fn predicates(&self) -> impl Iterator<Item = String> + '_ {
        self.values
            .iter()
            .map(|v| format!("label={NAME_LABEL}={v}"))
    }

    /// Whether `config` satisfies at least one predicate.
    pub fn matches(&self, config: &RemoteConfig) -> bool {
        config
            .labels
            .get(NAME_LABEL)
            .is_some_and(|name| self.values.iter().any(|v| v == name))
    }
}
