//! The per-enforce-call binding context: resolves `r.*`/`p.*` identifiers
//! against a bound request/rule pair and intercepts grouping-type function
//! calls (`g(...)`, `g2(...)`) on behalf of the role manager (§4.3, §4.5).

use std::collections::HashMap;

use crate::error::EvalError;
use crate::expr::{Environment, FunctionRegistry};
use crate::rbac::RoleManager;
use crate::value::Value;

pub struct EvalEnv<'a> {
    req_fields: &'a [String],
    req_values: &'a [Value],
    pol_fields: &'a [String],
    pol_values: &'a [String],
    roles: &'a RoleManager,
    registry: &'a FunctionRegistry,
}

impl<'a> EvalEnv<'a> {
    pub fn new(
        req_fields: &'a [String],
        req_values: &'a [Value],
        pol_fields: &'a [String],
        pol_values: &'a [String],
        roles: &'a RoleManager,
        registry: &'a FunctionRegistry,
    ) -> Self {
        Self {
            req_fields,
            req_values,
            pol_fields,
            pol_values,
            roles,
            registry,
        }
    }

    /// The parameter bag threaded to a role graph's conditional-link
    /// functions (§4.5, §9): every top-level `r.*` field by name, so a
    /// conditional link registered against e.g. `"active"` sees the
    /// current request's `active` field without a global context.
    fn params(&self) -> HashMap<String, Value> {
        self.req_fields
            .iter()
            .cloned()
            .zip(self.req_values.iter().cloned())
            .collect()
    }
}

impl Environment for EvalEnv<'_> {
    fn resolve(&self, ident: &str) -> Value {
        let mut parts = ident.splitn(2, '.');
        let root = parts.next().unwrap_or("");
        let Some(field) = parts.next() else {
            return Value::Nil;
        };

        match root {
            "r" => self
                .req_fields
                .iter()
                .position(|f| f == field)
                .and_then(|idx| self.req_values.get(idx))
                .cloned()
                .unwrap_or(Value::Nil),
            "p" => {
                if field == "eft" && !self.pol_fields.iter().any(|f| f == "eft") {
                    return Value::Str("allow".to_string());
                }
                self.pol_fields
                    .iter()
                    .position(|f| f == field)
                    .and_then(|idx| self.pol_values.get(idx))
                    .map(|s| Value::Str(s.clone()))
                    .unwrap_or(Value::Nil)
            }
            _ => Value::Nil,
        }
    }

    fn call_function(&self, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        if self.roles.has_manager(name) {
            let a = args.first().map(Value::as_display_string).unwrap_or_default();
            let b = args.get(1).map(Value::as_display_string).unwrap_or_default();
            let domain = args.get(2).map(Value::as_display_string);
            let params = self.params();
            return self
                .roles
                .has_link(name, &a, &b, domain.as_deref(), &params)
                .map(Value::Bool)
                .map_err(|e| EvalError::TypeError(e.to_string()));
        }
        self.registry.call(name, &args)
    }
}
