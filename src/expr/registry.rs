//! Dynamic dispatch over matcher functions (§9 design notes): a registry
//! mapping string names to callable objects with a uniform variadic
//! signature, so the AST holds registry keys rather than closures. Built-in
//! functions (§4.3) are registered first; user functions added via
//! [`FunctionRegistry::register`] (the `function_map` of §4.3) may shadow a
//! built-in of the same name.

use std::collections::HashMap;
use std::sync::Arc;

use super::functions;
use crate::error::EvalError;
use crate::value::Value;

pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>;

#[derive(Clone)]
pub struct FunctionRegistry {
    custom: HashMap<String, NativeFn>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut registry = Self {
            custom: HashMap::new(),
        };
        registry.register_builtins();
        registry
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a function under `name`. User-supplied
    /// functions registered this way take precedence over a built-in of
    /// the same name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) {
        self.custom.insert(name.into(), Arc::new(f));
    }

    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let f = self
            .custom
            .get(name)
            .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
        f(args)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.custom.contains_key(name)
    }

    fn register_builtins(&mut self) {
        self.register("keyMatch", |args| {
            let (a, b) = two_strings("keyMatch", args)?;
            Ok(Value::Bool(functions::key_match(&a, &b)))
        });
        self.register("keyMatch2", |args| {
            let (a, b) = two_strings("keyMatch2", args)?;
            Ok(Value::Bool(functions::key_match2(&a, &b)))
        });
        self.register("keyMatch3", |args| {
            let (a, b) = two_strings("keyMatch3", args)?;
            Ok(Value::Bool(functions::key_match3(&a, &b)))
        });
        self.register("keyMatch4", |args| {
            let (a, b) = two_strings("keyMatch4", args)?;
            Ok(Value::Bool(functions::key_match4(&a, &b)))
        });
        self.register("keyMatch5", |args| {
            let (a, b) = two_strings("keyMatch5", args)?;
            Ok(Value::Bool(functions::key_match5(&a, &b)))
        });
        self.register("regexMatch", |args| {
            let (a, b) = two_strings("regexMatch", args)?;
            Ok(Value::Bool(functions::regex_match(&a, &b)))
        });
        self.register("globMatch", |args| {
            let (a, b) = two_strings("globMatch", args)?;
            Ok(Value::Bool(functions::glob_match(&a, &b)))
        });
        self.register("ipMatch", |args| {
            let (a, b) = two_strings("ipMatch", args)?;
            Ok(Value::Bool(functions::ip_match(&a, &b)?))
        });
        self.register("keyGet", |args| {
            let (a, b) = two_strings("keyGet", args)?;
            Ok(Value::Str(functions::key_get(&a, &b)))
        });
        self.register("keyGet2", |args| {
            let (a, b, c) = three_strings("keyGet2", args)?;
            Ok(Value::Str(functions::key_get2(&a, &b, &c)))
        });
        self.register("keyGet3", |args| {
            let (a, b, c) = three_strings("keyGet3", args)?;
            Ok(Value::Str(functions::key_get3(&a, &b, &c)))
        });
        self.register("timeMatch", |args| {
            let (a, b, c) = three_strings("timeMatch", args)?;
            Ok(Value::Bool(functions::time_match(&a, &b, &c)?))
        });
    }
}

fn two_strings(name: &str, args: &[Value]) -> Result<(String, String), EvalError> {
    if args.len() != 2 {
        return Err(EvalError::ArityMismatch(name.to_string(), args.len(), 2));
    }
    Ok((args[0].as_display_string(), args[1].as_display_string()))
}

fn three_strings(name: &str, args: &[Value]) -> Result<(String, String, String), EvalError> {
    if args.len() != 3 {
        return Err(EvalError::ArityMismatch(name.to_string(), args.len(), 3));
    }
    Ok((
        args[0].as_display_string(),
        args[1].as_display_string(),
        args[2].as_display_string(),
    ))
}
