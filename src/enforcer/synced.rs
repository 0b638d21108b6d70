//! Synced enforcer (§4.8): a [`CoreEnforcer`] behind a single-writer/
//! many-reader `tokio::sync::RwLock`. Enforce calls take the read side and
//! may run concurrently; mutations take the write side and exclude every
//! reader, so no enforce call ever observes a partially applied mutation
//! (§5's linearizable-writes / read-observes-completed-writes guarantee).

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::EnforceError;
use crate::model::Model;
use crate::policy::Rule;
use crate::value::Value;

use super::{CoreEnforcer, EnforcerOptions};

#[derive(Clone)]
pub struct SyncedEnforcer {
    inner: Arc<RwLock<CoreEnforcer>>,
}

impl SyncedEnforcer {
    pub fn new(model: Model) -> Self {
        Self::from_core(CoreEnforcer::new(model))
    }

    pub fn with_options(model: Model, options: EnforcerOptions) -> Self {
        Self::from_core(CoreEnforcer::with_options(model, options))
    }

    pub fn from_core(core: CoreEnforcer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(core)),
        }
    }

    /// A point-in-time clone of the inner enforcer, useful for handing off
    /// to a [`super::functional::Enforcer`] or for a transaction snapshot.
    pub async fn snapshot(&self) -> CoreEnforcer {
        self.inner.read().await.clone()
    }

    // ---- reads --------------------------------------------------------

    pub async fn enforce(&self, request: &[Value]) -> Result<bool, EnforceError> {
        self.inner.read().await.enforce(request)
    }

    pub async fn enforce_ex(&self, request: &[Value]) -> Result<(bool, Vec<Rule>), EnforceError> {
        self.inner.read().await.enforce_ex(request)
    }

    pub async fn enforce_with_matcher(&self, matcher: &str, request: &[Value]) -> Result<bool, EnforceError> {
        self.inner.read().await.enforce_with_matcher(matcher, request)
    }

    pub async fn batch_enforce(&self, requests: &[Vec<Value>]) -> Result<Vec<bool>, EnforceError> {
        self.inner.read().await.batch_enforce(requests)
    }

    pub async fn is_enabled(&self) -> bool {
        self.inner.read().await.is_enabled()
    }

    // ---- writes ---------------------------------------------------------

    pub async fn set_enabled(&self, enabled: bool) {
        self.inner.write().await.set_enabled(enabled);
    }

    pub async fn add_policy(&self, rule: Rule) -> bool {
        self.inner.write().await.add_policy(rule)
    }

    pub async fn add_policies(&self, rules: Vec<Rule>) -> Vec<bool> {
        self.inner.write().await.add_policies(rules)
    }

    pub async fn remove_policy(&self, rule: &[String]) -> bool {
        self.inner.write().await.remove_policy(rule)
    }

    pub async fn remove_filtered_policy(&self, field_index: usize, field_values: &[String]) -> Vec<Rule> {
        self.inner.write().await.remove_filtered_policy(field_index, field_values)
    }

    pub async fn add_grouping_policy(&self, rule: Rule) -> bool {
        self.inner.write().await.add_grouping_policy(rule)
    }

    pub async fn remove_grouping_policy(&self, rule: &[String]) -> bool {
        self.inner.write().await.remove_grouping_policy(rule)
    }

    pub async fn build_role_links(&self) {
        self.inner.write().await.build_role_links();
    }

    /// Runs an arbitrary mutation against the write-locked core, for
    /// callers (the management API's fuller surface, [`super::distributed`])
    /// that need access beyond the thin wrappers above.
    pub async fn with_write<R>(&self, f: impl FnOnce(&mut CoreEnforcer) -> R) -> R {
        let mut guard = self.inner.write().await;
        f(&mut guard)
    }

    pub async fn with_read<R>(&self, f: impl FnOnce(&CoreEnforcer) -> R) -> R {
        let guard = self.inner.read().await;
        f(&guard)
    }
}
