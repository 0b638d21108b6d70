//! Throughput benchmarks for the enforcement hot path: plain ACL matching,
//! RBAC role-graph traversal, and the cached enforcer's hit path.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use casbin_core::{CachedEnforcer, CoreEnforcer, Model, Value};

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

fn acl_enforcer(rule_count: usize) -> CoreEnforcer {
    let mut e = CoreEnforcer::new(Model::from_str(ACL_MODEL).unwrap());
    for i in 0..rule_count {
        e.add_policy(vec![format!("user{i}"), format!("data{i}"), "read".into()]);
    }
    e
}

fn rbac_enforcer(role_count: usize) -> CoreEnforcer {
    let mut e = CoreEnforcer::new(Model::from_str(RBAC_MODEL).unwrap());
    e.add_policy(vec!["admin".into(), "data0".into(), "read".into()]);
    let mut parent = "admin".to_string();
    for i in 0..role_count {
        let child = format!("role{i}");
        e.add_grouping_policy(vec![child.clone(), parent]);
        parent = child;
    }
    e.add_grouping_policy(vec!["alice".into(), parent]);
    e.build_role_links();
    e
}

fn bench_acl_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("acl_enforce");
    for size in [10usize, 100, 1_000] {
        let e = acl_enforcer(size);
        let req = vec![Value::from("user0"), Value::from("data0"), Value::from("read")];
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| e.enforce(&req).unwrap());
        });
    }
    group.finish();
}

fn bench_rbac_hierarchy_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("rbac_enforce_by_hierarchy_depth");
    for depth in [1usize, 10, 50] {
        let e = rbac_enforcer(depth);
        let req = vec![Value::from("alice"), Value::from("data0"), Value::from("read")];
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| e.enforce(&req).unwrap());
        });
    }
    group.finish();
}

fn bench_cached_enforce_hit(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
    let e = CachedEnforcer::new(Model::from_str(ACL_MODEL).unwrap());
    rt.block_on(e.add_policy(vec!["alice".into(), "data1".into(), "read".into()]));
    let req = vec![Value::from("alice"), Value::from("data1"), Value::from("read")];
    rt.block_on(e.enforce(&req)).unwrap();

    c.bench_function("cached_enforce_hit", |b| {
        b.to_async(&rt).iter(|| async { e.enforce(&req).await.unwrap() });
    });
}

criterion_group!(benches, bench_acl_lookup, bench_rbac_hierarchy_depth, bench_cached_enforce_hit);
criterion_main!(benches);
