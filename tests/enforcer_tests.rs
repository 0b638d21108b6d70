//! Integration tests exercising the public API across the four concurrency
//! variants, the management API, and transactions.

use casbin_core::{CachedEnforcer, DistributedEnforcer, Enforcer, Model, SyncedEnforcer, Txn, Value};

const ACL_MODEL: &str = r#"
    [request_definition]
    r = sub, obj, act

    [policy_definition]
    p = sub, obj, act

    [policy_effect]
    e = some(where (p.eft == allow))

    [matchers]
    m = r.sub == p.sub && r.obj == p.obj && r.act == p.act
"#;

const RBAC_MODEL: &str = r#"
    [request_definition]
    r = sub, obj, act

    [policy_definition]
    p = sub, obj, act

    [role_definition]
    g = _, _

    [policy_effect]
    e = some(where (p.eft == allow))

    [matchers]
    m = g(r.sub, p.sub) && r.obj == p.obj && r.act == p.act
"#;

fn req(sub: &str, obj: &str, act: &str) -> Vec<Value> {
    vec![Value::from(sub), Value::from(obj), Value::from(act)]
}

#[test]
fn functional_enforcer_threads_state_explicitly() {
    let model = Model::from_str(ACL_MODEL).unwrap();
    let e0 = Enforcer::new(model);
    let (e1, added) = e0.add_policy(vec!["alice".into(), "data1".into(), "read".into()]);
    assert!(added);

    assert!(!e0.enforce(&req("alice", "data1", "read")).unwrap());
    assert!(e1.enforce(&req("alice", "data1", "read")).unwrap());
}

#[tokio::test]
async fn synced_enforcer_serializes_writes_behind_concurrent_reads() {
    let model = Model::from_str(ACL_MODEL).unwrap();
    let e = SyncedEnforcer::new(model);
    e.add_policy(vec!["alice".into(), "data1".into(), "read".into()]).await;

    let r = req("alice", "data1", "read");
    let (a, b) = tokio::join!(e.enforce(&r), e.enforce(&r));
    assert!(a.unwrap() && b.unwrap());
}

#[tokio::test]
async fn cached_enforcer_never_serves_a_stale_decision() {
    let model = Model::from_str(ACL_MODEL).unwrap();
    let e = CachedEnforcer::new(model);
    let r = req("alice", "data1", "read");

    assert!(!e.enforce(&r).await.unwrap());
    e.add_policy(vec!["alice".into(), "data1".into(), "read".into()]).await;
    assert!(e.enforce(&r).await.unwrap());
}

#[derive(Default)]
struct NullDispatcher;

#[async_trait::async_trait]
impl casbin_core::Dispatcher for NullDispatcher {
    async fn add_policies(&self, _ptype: &str, _rules: &[Vec<String>]) -> Result<(), casbin_core::PortError> {
        Ok(())
    }
    async fn remove_policies(&self, _ptype: &str, _rules: &[Vec<String>]) -> Result<(), casbin_core::PortError> {
        Ok(())
    }
    async fn remove_filtered_policy(
        &self,
        _ptype: &str,
        _field_index: usize,
        _field_values: &[String],
    ) -> Result<(), casbin_core::PortError> {
        Ok(())
    }
    async fn clear_policy(&self) -> Result<(), casbin_core::PortError> {
        Ok(())
    }
    async fn update_policy(&self, _ptype: &str, _old: &[String], _new: &[String]) -> Result<(), casbin_core::PortError> {
        Ok(())
    }
    async fn update_policies(
        &self,
        _ptype: &str,
        _old: &[Vec<String>],
        _new: &[Vec<String>],
    ) -> Result<(), casbin_core::PortError> {
        Ok(())
    }
}

#[tokio::test]
async fn distributed_enforcer_applies_remote_changes_via_self_path() {
    let model = Model::from_str(ACL_MODEL).unwrap();
    let e = DistributedEnforcer::new(model, std::sync::Arc::new(NullDispatcher));

    e.self_add_policy("p", vec!["alice".into(), "data1".into(), "read".into()])
        .await;
    assert!(e.enforce(&req("alice", "data1", "read")).await.unwrap());
}

#[test]
fn rbac_hierarchy_grants_through_role_inheritance() {
    let model = Model::from_str(RBAC_MODEL).unwrap();
    let e = Enforcer::new(model);
    let (e, _) = e.add_policy(vec!["data2_admin".into(), "data2".into(), "read".into()]);
    let (e, _) = e.add_grouping_policy(vec!["alice".into(), "admin".into()]);
    let (e, _) = e.add_grouping_policy(vec!["admin".into(), "data2_admin".into()]);
    let e = e.build_role_links();

    assert!(e.enforce(&req("alice", "data2", "read")).unwrap());
    assert!(!e.enforce(&req("bob", "data2", "read")).unwrap());
}

#[test]
fn transaction_commit_and_rollback_round_trip() {
    let model = Model::from_str(ACL_MODEL).unwrap();
    let core = casbin_core::CoreEnforcer::new(model);

    let mut txn = Txn::begin(&core);
    txn.stage_add_policy("p", vec!["alice".into(), "data1".into(), "read".into()])
        .unwrap();
    let committed = txn.commit().unwrap();
    assert!(committed.enforce(&req("alice", "data1", "read")).unwrap());
    assert!(!core.enforce(&req("alice", "data1", "read")).unwrap());

    let mut txn2 = Txn::begin(&committed);
    txn2.stage_remove_policy("p", vec!["alice".into(), "data1".into(), "read".into()])
        .unwrap();
    let rolled_back = txn2.rollback();
    assert!(rolled_back.enforce(&req("alice", "data1", "read")).unwrap());
}
