//! Distributed enforcer (§4.8): wraps a [`SyncedEnforcer`] and forwards
//! every local mutation to a [`Dispatcher`], fire-and-forget. Received
//! remote mutations are applied through the `self_*` path, which skips
//! re-broadcasting — required to avoid an echo loop across replicas (§6).
//! Ordering across nodes is eventual-consistency only (§5): the dispatcher
//! guarantees delivery, not a total order between concurrent writers.

use std::sync::Arc;

use tracing::warn;

use crate::dispatcher::Dispatcher;
use crate::error::EnforceError;
use crate::model::Model;
use crate::policy::Rule;
use crate::value::Value;

use super::{EnforcerOptions, SyncedEnforcer};

#[derive(Clone)]
pub struct DistributedEnforcer {
    inner: SyncedEnforcer,
    dispatcher: Arc<dyn Dispatcher>,
}

impl DistributedEnforcer {
    pub fn new(model: Model, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            inner: SyncedEnforcer::with_options(model, EnforcerOptions::default()),
            dispatcher,
        }
    }

    pub fn wrap(inner: SyncedEnforcer, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self { inner, dispatcher }
    }

    pub async fn enforce(&self, request: &[Value]) -> Result<bool, EnforceError> {
        self.inner.enforce(request).await
    }

    pub async fn enforce_ex(&self, request: &[Value]) -> Result<(bool, Vec<Rule>), EnforceError> {
        self.inner.enforce_ex(request).await
    }

    pub async fn batch_enforce(&self, requests: &[Vec<Value>]) -> Result<Vec<bool>, EnforceError> {
        self.inner.batch_enforce(requests).await
    }

    // ---- local mutations: apply, then broadcast ----------------------

    pub async fn add_policy(&self, ptype: &str, rule: Rule) -> bool {
        let added = self.self_add_policy(ptype, rule.clone()).await;
        if added {
            if let Err(e) = self.dispatcher.add_policies(ptype, std::slice::from_ref(&rule)).await {
                warn!(error = %e, "dispatcher broadcast of add_policy failed");
            }
        }
        added
    }

    pub async fn remove_policy(&self, ptype: &str, rule: &[String]) -> bool {
        let removed = self.self_remove_policy(ptype, rule).await;
        if removed {
            if let Err(e) = self.dispatcher.remove_policies(ptype, std::slice::from_ref(&rule.to_vec())).await {
                warn!(error = %e, "dispatcher broadcast of remove_policy failed");
            }
        }
        removed
    }

    pub async fn remove_filtered_policy(&self, ptype: &str, field_index: usize, field_values: &[String]) -> Vec<Rule> {
        let removed = self.self_remove_filtered_policy(ptype, field_index, field_values).await;
        if !removed.is_empty() {
            if let Err(e) = self
                .dispatcher
                .remove_filtered_policy(ptype, field_index, field_values)
                .await
            {
                warn!(error = %e, "dispatcher broadcast of remove_filtered_policy failed");
            }
        }
        removed
    }

    pub async fn add_grouping_policy(&self, gtype: &str, rule: Rule) -> bool {
        let added = self.self_add_grouping_policy(gtype, rule.clone()).await;
        if added {
            if let Err(e) = self.dispatcher.add_policies(gtype, std::slice::from_ref(&rule)).await {
                warn!(error = %e, "dispatcher broadcast of add_grouping_policy failed");
            }
        }
        added
    }

    pub async fn remove_grouping_policy(&self, gtype: &str, rule: &[String]) -> bool {
        let removed = self.self_remove_grouping_policy(gtype, rule).await;
        if removed {
            if let Err(e) = self.dispatcher.remove_policies(gtype, std::slice::from_ref(&rule.to_vec())).await {
                warn!(error = %e, "dispatcher broadcast of remove_grouping_policy failed");
            }
        }
        removed
    }

    // ---- self_* path: applies without re-broadcasting ----------------
    //
    // Used both by the public methods above (after which they do
    // broadcast) and directly by the inbound message handler that applies
    // a remote change (which must not echo it back out).

    pub async fn self_add_policy(&self, ptype: &str, rule: Rule) -> bool {
        self.inner.with_write(|core| core.add_named_policy(ptype, rule)).await
    }

    pub async fn self_remove_policy(&self, ptype: &str, rule: &[String]) -> bool {
        self.inner
            .with_write(|core| core.remove_named_policy(ptype, rule))
            .await
    }

    pub async fn self_remove_filtered_policy(&self, ptype: &str, field_index: usize, field_values: &[String]) -> Vec<Rule> {
        self.inner
            .with_write(|core| core.remove_filtered_named_policy(ptype, field_index, field_values))
            .await
    }

    pub async fn self_add_grouping_policy(&self, gtype: &str, rule: Rule) -> bool {
        self.inner
            .with_write(|core| core.add_named_grouping_policy(gtype, rule))
            .await
    }

    pub async fn self_remove_grouping_policy(&self, gtype: &str, rule: &[String]) -> bool {
        self.inner
            .with_write(|core| core.remove_named_grouping_policy(gtype, rule))
            .await
    }

    pub async fn self_clear_policy(&self) {
        self.inner
            .with_write(|core| {
                *core = crate::enforcer::CoreEnforcer::with_options(
                    core.model().clone(),
                    EnforcerOptions::default(),
                );
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use crate::error::AdapterError;

    #[derive(Default)]
    struct RecordingDispatcher {
        adds: StdMutex<Vec<(String, Vec<Rule>)>>,
    }

    #[async_trait]
    impl Dispatcher for RecordingDispatcher {
        async fn add_policies(&self, ptype: &str, rules: &[Rule]) -> Result<(), AdapterError> {
            self.adds.lock().unwrap().push((ptype.to_string(), rules.to_vec()));
            Ok(())
        }
        async fn remove_policies(&self, _ptype: &str, _rules: &[Rule]) -> Result<(), AdapterError> {
            Ok(())
        }
        async fn remove_filtered_policy(
            &self,
            _ptype: &str,
            _field_index: usize,
            _field_values: &[String],
        ) -> Result<(), AdapterError> {
            Ok(())
        }
        async fn clear_policy(&self) -> Result<(), AdapterError> {
            Ok(())
        }
        async fn update_policy(&self, _ptype: &str, _old: &[String], _new: &[String]) -> Result<(), AdapterError> {
            Ok(())
        }
        async fn update_policies(&self, _ptype: &str, _old: &[Rule], _new: &[Rule]) -> Result<(), AdapterError> {
            Ok(())
        }
    }

    const MODEL: &str = r#"
        [request_definition]
        r = sub, obj, act

        [policy_definition]
        p = sub, obj, act

        [policy_effect]
        e = some(where (p.eft == allow))

        [matchers]
        m = r.sub == p.sub && r.obj == p.obj && r.act == p.act
    "#;

    #[tokio::test]
    async fn local_mutation_broadcasts_exactly_once() {
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let e = DistributedEnforcer::new(Model::from_str(MODEL).unwrap(), dispatcher.clone());

        e.add_policy("p", vec!["alice".into(), "data1".into(), "read".into()]).await;
        assert_eq!(dispatcher.adds.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn self_mutation_never_broadcasts() {
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let e = DistributedEnforcer::new(Model::from_str(MODEL).unwrap(), dispatcher.clone());

        e.self_add_policy("p", vec!["alice".into(), "data1".into(), "read".into()])
            .await;
        assert!(dispatcher.adds.lock().unwrap().is_empty());

        let req = vec![Value::from("alice"), Value::from("data1"), Value::from("read")];
        assert!(e.enforce(&req).await.unwrap());
    }
}
