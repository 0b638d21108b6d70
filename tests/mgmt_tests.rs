//! Integration tests for the management API surface (§4.10) against
//! [`casbin_core::CoreEnforcer`] directly.

use casbin_core::{CoreEnforcer, Model};

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

fn rule(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|s| s.to_string()).collect()
}

#[test]
fn duplicate_policy_add_is_a_no_op() {
    let mut e = CoreEnforcer::new(Model::from_str(RBAC_MODEL).unwrap());
    assert!(e.add_policy(rule(&["alice", "data1", "read"])));
    assert!(!e.add_policy(rule(&["alice", "data1", "read"])));
    assert_eq!(e.get_policy().len(), 1);
}

#[test]
fn filtered_removal_only_touches_matching_rows() {
    let mut e = CoreEnforcer::new(Model::from_str(RBAC_MODEL).unwrap());
    e.add_policy(rule(&["alice", "data1", "read"]));
    e.add_policy(rule(&["bob", "data1", "read"]));
    e.add_policy(rule(&["alice", "data2", "write"]));

    let removed = e.remove_filtered_policy(0, &["alice".to_string()]);
    assert_eq!(removed.len(), 2);
    assert_eq!(e.get_policy(), vec![rule(&["bob", "data1", "read"])]);
}

#[test]
fn update_policy_is_atomic_remove_then_add() {
    let mut e = CoreEnforcer::new(Model::from_str(RBAC_MODEL).unwrap());
    e.add_policy(rule(&["alice", "data1", "read"]));
    assert!(!e.update_policy(&rule(&["bob", "data1", "read"]), rule(&["bob", "data1", "write"])));
    assert!(e.update_policy(&rule(&["alice", "data1", "read"]), rule(&["alice", "data1", "write"])));
    assert_eq!(e.get_policy(), vec![rule(&["alice", "data1", "write"])]);
}

#[test]
fn named_grouping_policy_mutations_keep_distinct_role_graphs_independent() {
    let mut e = CoreEnforcer::new(Model::from_str(RBAC_MODEL).unwrap());
    e.add_named_grouping_policy("g", rule(&["alice", "admin"]));
    assert!(e.roles().has_link("g", "alice", "admin", None, &Default::default()).unwrap());
    assert!(!e.roles().has_link("g", "bob", "admin", None, &Default::default()).unwrap());
}

#[test]
fn add_policies_ex_reports_which_rows_were_actually_new() {
    let mut e = CoreEnforcer::new(Model::from_str(RBAC_MODEL).unwrap());
    e.add_policy(rule(&["alice", "data1", "read"]));

    let results = e.add_policies_ex(vec![
        rule(&["alice", "data1", "read"]),
        rule(&["carol", "data1", "read"]),
    ]);
    assert_eq!(results, vec![false, true]);
}

#[test]
fn build_role_links_rebuilds_from_the_grouping_table_after_direct_store_mutation() {
    let mut e = CoreEnforcer::new(Model::from_str(RBAC_MODEL).unwrap());
    e.add_named_grouping_policy("g", rule(&["alice", "admin"]));
    e.add_named_grouping_policy("g", rule(&["bob", "admin"]));
    e.remove_filtered_grouping_policy(1, &["admin".to_string()]);

    assert!(!e.roles().has_link("g", "alice", "admin", None, &Default::default()).unwrap());
    assert!(!e.roles().has_link("g", "bob", "admin", None, &Default::default()).unwrap());
    assert!(e.get_grouping_policy().is_empty());

    e.build_role_links();
    assert!(!e.roles().has_link("g", "alice", "admin", None, &Default::default()).unwrap());
}
