//! Role Manager (§4.5): a registry of [`RoleGraph`]s keyed by grouping-type
//! name (`g`, `g2`, …), so `g(r.sub, p.sub)` and `g2(r.obj, p.obj)` each
//! resolve against their own independent role hierarchy.

pub mod graph;

use std::collections::HashMap;

pub use graph::RoleGraph;

use crate::error::RoleError;
use crate::value::Value;

#[derive(Default, Clone)]
pub struct RoleManager {
    graphs: HashMap<String, RoleGraph>,
}

impl RoleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named role graph, replacing any graph already registered
    /// under that name.
    pub fn register(&mut self, name: &str, graph: RoleGraph) {
        self.graphs.insert(name.to_string(), graph);
    }

    /// Registers a named role graph with default settings if none exists yet.
    pub fn ensure(&mut self, name: &str) -> &mut RoleGraph {
        self.graphs.entry(name.to_string()).or_default()
    }

    fn get(&self, name: &str) -> Result<&RoleGraph, RoleError> {
        self.graphs
            .get(name)
            .ok_or_else(|| RoleError::ManagerNotFound(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut RoleGraph, RoleError> {
        self.graphs
            .get_mut(name)
            .ok_or_else(|| RoleError::ManagerNotFound(name.to_string()))
    }

    pub fn add_link(&mut self, name: &str, a: &str, b: &str, domain: Option<&str>) -> Result<(), RoleError> {
        self.get_mut(name)?.add_link(a, b, domain);
        Ok(())
    }

    pub fn delete_link(&mut self, name: &str, a: &str, b: &str, domain: Option<&str>) -> Result<(), RoleError> {
        self.get_mut(name)?.delete_link(a, b, domain);
        Ok(())
    }

    pub fn has_link(
        &self,
        name: &str,
        a: &str,
        b: &str,
        domain: Option<&str>,
        params: &HashMap<String, Value>,
    ) -> Result<bool, RoleError> {
        Ok(self.get(name)?.has_link(a, b, domain, params))
    }

    pub fn get_roles(&self, name: &str, a: &str, domain: Option<&str>) -> Result<Vec<String>, RoleError> {
        Ok(self.get(name)?.get_roles(a, domain))
    }

    pub fn get_users(&self, name: &str, r: &str, domain: Option<&str>) -> Result<Vec<String>, RoleError> {
        Ok(self.get(name)?.get_users(r, domain))
    }

    pub fn clear(&mut self, name: &str) -> Result<(), RoleError> {
        self.get_mut(name)?.clear();
        Ok(())
    }

    pub fn clear_all(&mut self) {
        for graph in self.graphs.values_mut() {
            graph.clear();
        }
    }

    pub fn set_matching_func(
        &mut self,
        name: &str,
        f: impl Fn(&str, &str) -> bool + Send + Sync + 'static,
    ) -> Result<(), RoleError> {
        self.get_mut(name)?.set_matching_func(f);
        Ok(())
    }

    pub fn set_domain_matching_func(
        &mut self,
        name: &str,
        f: impl Fn(&str, &str) -> bool + Send + Sync + 'static,
    ) -> Result<(), RoleError> {
        self.get_mut(name)?.set_domain_matching_func(f);
        Ok(())
    }

    pub fn set_conditional_link(
        &mut self,
        name: &str,
        a: &str,
        b: &str,
        domain: Option<&str>,
        f: impl Fn(&HashMap<String, Value>) -> bool + Send + Sync + 'static,
    ) -> Result<(), RoleError> {
        self.get_mut(name)?.set_conditional_link(a, b, domain, f);
        Ok(())
    }

    pub fn has_manager(&self, name: &str) -> bool {
        self.graphs.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.graphs.keys()
    }
}
