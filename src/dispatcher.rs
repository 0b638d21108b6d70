//! The `Dispatcher` port (§6): cross-node replication transports are out of
//! scope; this trait is what [`crate::enforcer::distributed::DistributedEnforcer`]
//! calls to broadcast a local mutation, fire-and-forget, to other replicas.

use async_trait::async_trait;

use crate::error::AdapterError;
use crate::policy::Rule;

#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn add_policies(&self, ptype: &str, rules: &[Rule]) -> Result<(), AdapterError>;

    async fn remove_policies(&self, ptype: &str, rules: &[Rule]) -> Result<(), AdapterError>;

    async fn remove_filtered_policy(
        &self,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Result<(), AdapterError>;

    async fn clear_policy(&self) -> Result<(), AdapterError>;

    async fn update_policy(&self, ptype: &str, old_rule: &[String], new_rule: &[String]) -> Result<(), AdapterError>;

    async fn update_policies(&self, ptype: &str, old_rules: &[Rule], new_rules: &[Rule]) -> Result<(), AdapterError>;
}
