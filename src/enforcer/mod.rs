//! Enforcer Core (§4.7) and the four Concurrency Variants (§4.8) built on
//! top of it.
//!
//! [`CoreEnforcer`] is the orchestration engine: it owns the [`Model`], the
//! [`PolicyStore`], the [`RoleManager`], a compiled-matcher cache, and the
//! [`FunctionRegistry`]. It is plain, synchronous, `Clone`-able data — the
//! concurrency variants in [`functional`], [`synced`], [`cached`], and
//! [`distributed`] wrap it with the coordination style their name promises,
//! mirroring how the donor codebase layers `Arc<RwLock<...>>` coordination
//! on top of a plain inner engine rather than baking locking into the
//! engine itself.

mod env;

pub mod cached;
pub mod distributed;
pub mod functional;
pub mod synced;

use std::sync::Arc;

use tracing::debug;

use crate::effect::{Aggregator, Effect, RuleOutcome};
use crate::error::{EnforceError, ModelError};
use crate::expr::{self, FunctionRegistry, MatcherCache};
use crate::model::Model;
use crate::policy::{PolicyStore, Rule};
use crate::rbac::RoleManager;
use crate::value::Value;

use env::EvalEnv;

pub use functional::Enforcer;
pub use synced::SyncedEnforcer;
pub use cached::CachedEnforcer;
pub use distributed::DistributedEnforcer;

/// Programmatic configuration for an enforcer, playing the role the donor
/// codebase fills with `EngineConfig`/`CacheConfig`: a small `Default`
/// struct, not an external config-file crate, since the model file is
/// already the configuration surface for everything matcher-shaped.
#[derive(Debug, Clone)]
pub struct EnforcerOptions {
    /// `enforce` always returns `true` without touching any other
    /// component while this is `false` (§7: "disabled enforcer
    /// short-circuits to true").
    pub enabled: bool,
    /// Whether grouping-policy mutations made through the management API
    /// keep the role graph in lock-step automatically. Always `true` in
    /// this implementation (§4.6's invariant is non-optional); the flag is
    /// kept for parity with the donor's config-struct shape and as a
    /// documented extension point.
    pub auto_build_role_links: bool,
    /// Role-graph cache capacity for the cached enforcer variant.
    pub cache_capacity: usize,
}

impl Default for EnforcerOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_build_role_links: true,
            cache_capacity: 10_000,
        }
    }
}

/// The enforcement engine itself: immutable [`Model`], mutable
/// [`PolicyStore`] and [`RoleManager`], a shared compiled-matcher cache,
/// and a function registry. `Clone` is cheap — the matcher cache is
/// `Arc`-shared across clones (recompiling the same matcher string twice is
/// wasted work, not a correctness concern, so sharing it is safe even
/// across otherwise-independent functional snapshots).
#[derive(Clone)]
pub struct CoreEnforcer {
    pub(crate) model: Model,
    pub(crate) policies: PolicyStore,
    pub(crate) roles: RoleManager,
    pub(crate) matcher_cache: Arc<MatcherCache>,
    pub(crate) registry: FunctionRegistry,
    pub(crate) options: EnforcerOptions,
}

const DEFAULT_REQUEST: &str = "r";
const DEFAULT_POLICY: &str = "p";
const DEFAULT_EFFECT: &str = "e";
const DEFAULT_MATCHER: &str = "m";

impl CoreEnforcer {
    pub fn new(model: Model) -> Self {
        Self::with_options(model, EnforcerOptions::default())
    }

    pub fn with_options(model: Model, options: EnforcerOptions) -> Self {
        let mut roles = RoleManager::new();
        for gtype in model.role_defs.keys() {
            roles.ensure(gtype);
        }
        Self {
            model,
            policies: PolicyStore::new(),
            roles,
            matcher_cache: Arc::new(MatcherCache::new()),
            registry: FunctionRegistry::new(),
            options,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn policies(&self) -> &PolicyStore {
        &self.policies
    }

    pub fn roles(&self) -> &RoleManager {
        &self.roles
    }

    pub fn is_enabled(&self) -> bool {
        self.options.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.options.enabled = enabled;
    }

    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Result<Value, crate::error::EvalError> + Send + Sync + 'static,
    ) {
        self.registry.register(name, f);
    }

    /// Rebuilds every named role graph from scratch using the current
    /// contents of `grouping_policies` (§4.6's invariant, restated in bulk:
    /// useful after a full `load_policy` from an adapter rather than the
    /// incremental per-rule path the management API uses).
    pub fn build_role_links(&mut self) {
        let gtypes: Vec<String> = self.model.role_defs.keys().cloned().collect();
        for gtype in gtypes {
            self.roles.ensure(&gtype).clear();
            for rule in self.policies.get_grouping_policy(&gtype).to_vec() {
                link_from_rule(&mut self.roles, &gtype, &rule);
            }
        }
    }

    pub fn enforce(&self, request: &[Value]) -> Result<bool, EnforceError> {
        Ok(self.enforce_ex(request)?.0)
    }

    pub fn enforce_ex(&self, request: &[Value]) -> Result<(bool, Vec<Rule>), EnforceError> {
        self.enforce_named(DEFAULT_REQUEST, DEFAULT_POLICY, DEFAULT_EFFECT, DEFAULT_MATCHER, request)
    }

    pub fn enforce_with_matcher(&self, matcher: &str, request: &[Value]) -> Result<bool, EnforceError> {
        if !self.options.enabled {
            return Ok(true);
        }
        let req_fields = self
            .model
            .request_fields(DEFAULT_REQUEST)
            .ok_or_else(|| ModelError::UnknownAssertion(DEFAULT_REQUEST.to_string()))?;
        let pol_fields = self
            .model
            .policy_fields(DEFAULT_POLICY)
            .ok_or_else(|| ModelError::UnknownAssertion(DEFAULT_POLICY.to_string()))?;
        let effect_expr = self
            .model
            .effect_expr(DEFAULT_EFFECT)
            .ok_or_else(|| ModelError::UnknownAssertion(DEFAULT_EFFECT.to_string()))?;
        let effect = Effect::parse(effect_expr)?;
        let ast = self
            .matcher_cache
            .compile(matcher)
            .map_err(|e| ModelError::BadMatcher(matcher.to_string(), e.to_string()))?;

        let (decision, _) = self.run(req_fields, pol_fields, effect, &ast, matcher, DEFAULT_POLICY, request);
        Ok(decision)
    }

    pub fn batch_enforce(&self, requests: &[Vec<Value>]) -> Result<Vec<bool>, EnforceError> {
        requests.iter().map(|r| self.enforce(r)).collect()
    }

    /// The general-purpose form behind `enforce`/`enforce_ex`, parameterized
    /// over which named assertion of each kind to use (supports models that
    /// declare more than one request/policy/effect/matcher type).
    pub fn enforce_named(
        &self,
        req_name: &str,
        ptype: &str,
        effect_name: &str,
        matcher_name: &str,
        request: &[Value],
    ) -> Result<(bool, Vec<Rule>), EnforceError> {
        if !self.options.enabled {
            return Ok((true, Vec::new()));
        }

        let req_fields = self
            .model
            .request_fields(req_name)
            .ok_or_else(|| ModelError::UnknownAssertion(req_name.to_string()))?;
        let pol_fields = self
            .model
            .policy_fields(ptype)
            .ok_or_else(|| ModelError::UnknownAssertion(ptype.to_string()))?;
        let effect_expr = self
            .model
            .effect_expr(effect_name)
            .ok_or_else(|| ModelError::UnknownAssertion(effect_name.to_string()))?;
        let matcher_src = self
            .model
            .matcher_expr(matcher_name)
            .ok_or_else(|| ModelError::UnknownAssertion(matcher_name.to_string()))?;
        let effect = Effect::parse(effect_expr)?;
        let ast = self
            .matcher_cache
            .compile(matcher_src)
            .map_err(|e| ModelError::BadMatcher(matcher_src.to_string(), e.to_string()))?;

        Ok(self.run(req_fields, pol_fields, effect, &ast, matcher_src, ptype, request))
    }

    fn run(
        &self,
        req_fields: &[String],
        pol_fields: &[String],
        effect: Effect,
        ast: &expr::Ast,
        matcher_src: &str,
        ptype: &str,
        request: &[Value],
    ) -> (bool, Vec<Rule>) {
        let rules = self.policies.get_policy(ptype);

        if rules.is_empty() {
            if references_field_root(matcher_src, "p") {
                return (false, Vec::new());
            }
            let env = EvalEnv::new(req_fields, request, pol_fields, &[], &self.roles, &self.registry);
            let truthy = expr::eval(ast, &env).map(|v| v.is_truthy()).unwrap_or_else(|e| {
                debug!(error = %e, matcher = matcher_src, "matcher evaluation error; treating as non-match");
                false
            });
            return (truthy, Vec::new());
        }

        let eft_idx = pol_fields.iter().position(|f| f == "eft");
        let mut ordered: Vec<&Rule> = rules.iter().collect();
        if matches!(effect, Effect::Priority | Effect::SubjectPriority) {
            if let Some(pidx) = pol_fields.iter().position(|f| f == "priority") {
                ordered.sort_by_key(|r| r.get(pidx).and_then(|s| s.parse::<i64>().ok()).unwrap_or(i64::MAX));
            }
        }

        let mut aggregator = Aggregator::new(effect);
        let mut contributing = Vec::new();
        for rule in ordered {
            let env = EvalEnv::new(req_fields, request, pol_fields, rule, &self.roles, &self.registry);
            let matched = match expr::eval(ast, &env) {
                Ok(v) => v.is_truthy(),
                Err(e) => {
                    debug!(error = %e, matcher = matcher_src, rule = ?rule, "matcher evaluation error; treating rule as non-match");
                    false
                }
            };

            let outcome = if !matched {
                RuleOutcome::Indeterminate
            } else {
                contributing.push(rule.clone());
                let eft = eft_idx.and_then(|i| rule.get(i)).map(String::as_str).unwrap_or("allow");
                if eft == "deny" {
                    RuleOutcome::Deny
                } else {
                    RuleOutcome::Allow
                }
            };

            if let Some(decision) = aggregator.feed(outcome) {
                return (decision, contributing);
            }
        }

        (aggregator.finish(), contributing)
    }
}

/// Installs the role-graph edge for one grouping rule row (`[child,
/// parent]` or `[child, parent, domain]`), the shared step behind both the
/// incremental management-API path and [`CoreEnforcer::build_role_links`]'s
/// bulk rebuild.
pub(crate) fn link_from_rule(roles: &mut RoleManager, gtype: &str, rule: &[String]) {
    if rule.len() < 2 {
        return;
    }
    let domain = rule.get(2).map(String::as_str);
    let _ = roles.add_link(gtype, &rule[0], &rule[1], domain);
}

pub(crate) fn unlink_from_rule(roles: &mut RoleManager, gtype: &str, rule: &[String]) {
    if rule.len() < 2 {
        return;
    }
    let domain = rule.get(2).map(String::as_str);
    let _ = roles.delete_link(gtype, &rule[0], &rule[1], domain);
}

/// Coarse textual check for whether `expr` references `root.<field>`
/// (e.g. `p.sub`) anywhere, used only to decide the §4.7 step-4 ABAC
/// fallback (empty policy set, matcher has no `p.*` reference). A full
/// parse happens regardless at matcher-compile time; this is just a scan
/// for the dotted-root prefix with a word-boundary check on the left.
fn references_field_root(expr: &str, root: &str) -> bool {
    let needle = format!("{root}.");
    let bytes = expr.as_bytes();
    let mut start = 0;
    while let Some(offset) = expr[start..].find(&needle) {
        let idx = start + offset;
        let boundary_ok = idx == 0
            || !(bytes[idx - 1].is_ascii_alphanumeric() || bytes[idx - 1] == b'_');
        if boundary_ok {
            return true;
        }
        start = idx + needle.len();
    }
    false
}
