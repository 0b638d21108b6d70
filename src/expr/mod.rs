//! The expression engine (§4.3): compiles matcher strings into an AST once
//! and evaluates the cached AST many times against an [`Environment`].

pub mod ast;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod registry;

use std::sync::Arc;

use dashmap::DashMap;

pub use ast::Ast;
pub use eval::Environment;
pub use registry::FunctionRegistry;

use crate::error::EvalError;
use crate::value::Value;

/// Compiles and caches matcher ASTs keyed by their source string, mirroring
/// a compile-once-evaluate-many program cache: the same matcher string
/// (the common case — one matcher per model, evaluated once per policy
/// rule per enforce call) is parsed exactly once.
#[derive(Default)]
pub struct MatcherCache {
    compiled: DashMap<String, Arc<Ast>>,
}

impl MatcherCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(&self, source: &str) -> Result<Arc<Ast>, EvalError> {
        if let Some(ast) = self.compiled.get(source) {
            return Ok(Arc::clone(&ast));
        }
        let ast = Arc::new(parser::Parser::parse(source)?);
        self.compiled.insert(source.to_string(), Arc::clone(&ast));
        Ok(ast)
    }

    pub fn clear(&self) {
        self.compiled.clear();
    }
}

/// Evaluate a compiled matcher against an environment.
pub fn eval(ast: &Ast, env: &dyn Environment) -> Result<Value, EvalError> {
    eval::eval(ast, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct Empty;
    impl Environment for Empty {
        fn resolve(&self, _ident: &str) -> Value {
            Value::Nil
        }
        fn call_function(&self, name: &str, _args: Vec<Value>) -> Result<Value, EvalError> {
            Err(EvalError::UnknownFunction(name.to_string()))
        }
    }

    #[test]
    fn caches_compiled_matcher_by_source_string() {
        let cache = MatcherCache::new();
        let a = cache.compile("r.sub == p.sub").unwrap();
        let b = cache.compile("r.sub == p.sub").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn clear_forces_recompilation() {
        let cache = MatcherCache::new();
        let a = cache.compile("true").unwrap();
        cache.clear();
        let b = cache.compile("true").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn evaluates_literal_true() {
        let ast = parser::Parser::parse("true").unwrap();
        let _ = BTreeMap::<String, Value>::new();
        assert!(eval(&ast, &Empty).unwrap().is_truthy());
    }
}
