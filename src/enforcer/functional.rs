//! Functional enforcer (§4.8): every mutation consumes `self` and returns a
//! new value. No locking, no interior mutability — the caller threads
//! state explicitly, matching §5's "thread-agnostic, pure data transform"
//! description. This is the base every other concurrency variant wraps.

use crate::error::EnforceError;
use crate::model::Model;
use crate::policy::Rule;
use crate::value::Value;

use super::{CoreEnforcer, EnforcerOptions};

/// A pure, `Clone`-able enforcer. Read operations borrow `&self`; every
/// mutation takes `self` by value and returns the updated enforcer
/// alongside whatever result the operation produces, so a caller who wants
/// to keep using the old value needs to have cloned it first — exactly the
/// ownership discipline a persistent/functional data structure implies.
#[derive(Clone)]
pub struct Enforcer(CoreEnforcer);

impl Enforcer {
    pub fn new(model: Model) -> Self {
        Self(CoreEnforcer::new(model))
    }

    pub fn with_options(model: Model, options: EnforcerOptions) -> Self {
        Self(CoreEnforcer::with_options(model, options))
    }

    pub fn into_core(self) -> CoreEnforcer {
        self.0
    }

    pub fn core(&self) -> &CoreEnforcer {
        &self.0
    }

    // ---- reads: plain borrows, no state change -----------------------

    pub fn enforce(&self, request: &[Value]) -> Result<bool, EnforceError> {
        self.0.enforce(request)
    }

    pub fn enforce_ex(&self, request: &[Value]) -> Result<(bool, Vec<Rule>), EnforceError> {
        self.0.enforce_ex(request)
    }

    pub fn enforce_with_matcher(&self, matcher: &str, request: &[Value]) -> Result<bool, EnforceError> {
        self.0.enforce_with_matcher(matcher, request)
    }

    pub fn batch_enforce(&self, requests: &[Vec<Value>]) -> Result<Vec<bool>, EnforceError> {
        self.0.batch_enforce(requests)
    }

    pub fn is_enabled(&self) -> bool {
        self.0.is_enabled()
    }

    // ---- mutations: consume self, return (new self, outcome) --------

    pub fn set_enabled(mut self, enabled: bool) -> Self {
        self.0.set_enabled(enabled);
        self
    }

    pub fn add_policy(mut self, rule: Rule) -> (Self, bool) {
        let added = self.0.add_policy(rule);
        (self, added)
    }

    pub fn remove_policy(mut self, rule: &[String]) -> (Self, bool) {
        let removed = self.0.remove_policy(rule);
        (self, removed)
    }

    pub fn remove_filtered_policy(mut self, field_index: usize, field_values: &[String]) -> (Self, Vec<Rule>) {
        let removed = self.0.remove_filtered_policy(field_index, field_values);
        (self, removed)
    }

    pub fn add_grouping_policy(mut self, rule: Rule) -> (Self, bool) {
        let added = self.0.add_grouping_policy(rule);
        (self, added)
    }

    pub fn remove_grouping_policy(mut self, rule: &[String]) -> (Self, bool) {
        let removed = self.0.remove_grouping_policy(rule);
        (self, removed)
    }

    pub fn build_role_links(mut self) -> Self {
        self.0.build_role_links();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn mutation_returns_a_new_value_leaving_old_clone_untouched() {
        let e0 = Enforcer::new(Model::from_str(MODEL).unwrap());
        let snapshot = e0.clone();

        let (e1, added) = e0.add_policy(vec!["alice".into(), "data1".into(), "read".into()]);
        assert!(added);

        let req = vec![Value::from("alice"), Value::from("data1"), Value::from("read")];
        assert!(e1.enforce(&req).unwrap());
        assert!(!snapshot.enforce(&req).unwrap());
    }

    #[test]
    fn disable_then_enforce_is_always_true() {
        let e = Enforcer::new(Model::from_str(MODEL).unwrap()).set_enabled(false);
        let req = vec![Value::from("nobody"), Value::from("nothing"), Value::from("anything")];
        assert!(e.enforce(&req).unwrap());
    }
}
