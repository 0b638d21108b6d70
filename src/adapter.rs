//! The `Adapter` port (§6): storage is out of scope for this crate (§1) —
//! concrete file/CSV/SQL/KV/HTTP adapters are external collaborators. This
//! module defines only the trait they implement, in the donor's
//! `#[async_trait]` style (`src/policy.rs`'s `trait PolicyStore`), so the
//! core can depend on an abstract port rather than a concrete backend.

use async_trait::async_trait;

use crate::error::AdapterError;
use crate::model::Model;
use crate::policy::Rule;

/// Loads and persists the policy/grouping tables an [`crate::enforcer`]
/// operates on. No implementation ships in this crate.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Loads every policy and grouping rule for `model` from the backing
    /// store.
    async fn load_policy(&self, model: &Model) -> Result<(PolicyTables, PolicyTables), AdapterError>;

    /// Persists the full current state, overwriting whatever the adapter
    /// held before.
    async fn save_policy(&self, policies: &PolicyTables, grouping: &PolicyTables) -> Result<(), AdapterError>;

    async fn add_policy(&self, section: &str, ptype: &str, rule: &[String]) -> Result<(), AdapterError>;

    async fn remove_policy(&self, section: &str, ptype: &str, rule: &[String]) -> Result<(), AdapterError>;

    async fn remove_filtered_policy(
        &self,
        section: &str,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Result<(), AdapterError>;

    /// Whether the last `load_policy` call applied a filter — an adapter
    /// that loaded a subset must refuse `save_policy` (the enforcer decides
    /// to require incremental-only mutation in that case).
    fn is_filtered(&self) -> bool {
        false
    }

    /// Incremental filtered load. Adapters that don't support this return
    /// the `unsupported` error variant by default.
    async fn load_filtered_policy(
        &self,
        _model: &Model,
        _field_index: usize,
        _field_values: &[String],
    ) -> Result<(PolicyTables, PolicyTables), AdapterError> {
        Err(AdapterError("load_filtered_policy is not supported by this adapter".into()))
    }

    async fn load_incremental_filtered_policy(
        &self,
        _model: &Model,
        _field_index: usize,
        _field_values: &[String],
    ) -> Result<(PolicyTables, PolicyTables), AdapterError> {
        Err(AdapterError(
            "load_incremental_filtered_policy is not supported by this adapter".into(),
        ))
    }
}

/// `ptype → rules`, the shape both the policy and grouping tables share
/// across the adapter boundary.
pub type PolicyTables = std::collections::BTreeMap<String, Vec<Rule>>;
