//! A single directed role graph (§4.5): one per grouping-type name.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::value::Value;

type MatchFn = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;
type ConditionalLinkFn = Arc<dyn Fn(&HashMap<String, Value>) -> bool + Send + Sync>;

const DEFAULT_MAX_HIERARCHY_LEVEL: usize = 10;

/// Domain-qualified directed graph over role/user identifiers. `a → b`
/// means "a has role b" (child → parent, in the grouping-rule sense of
/// `[child, parent]`).
///
/// `Clone`-able (closures are `Arc`-wrapped, not boxed) so a whole
/// [`crate::rbac::RoleManager`] can be snapshotted cheaply — required by
/// the functional enforcer's copy-on-mutate style and by transaction
/// rollback.
#[derive(Clone)]
pub struct RoleGraph {
    edges: HashMap<String, Vec<String>>,
    match_fn: Option<MatchFn>,
    domain_match_fn: Option<MatchFn>,
    conditional_links: HashMap<(String, String), ConditionalLinkFn>,
    max_hierarchy_level: usize,
}

impl Default for RoleGraph {
    fn default() -> Self {
        Self {
            edges: HashMap::new(),
            match_fn: None,
            domain_match_fn: None,
            conditional_links: HashMap::new(),
            max_hierarchy_level: DEFAULT_MAX_HIERARCHY_LEVEL,
        }
    }
}

fn key(id: &str, domain: Option<&str>) -> String {
    match domain {
        Some(d) if !d.is_empty() => format!("{id}::{d}"),
        _ => id.to_string(),
    }
}

impl RoleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_hierarchy_level(max_hierarchy_level: usize) -> Self {
        Self {
            max_hierarchy_level,
            ..Self::default()
        }
    }

    pub fn set_matching_func(&mut self, f: impl Fn(&str, &str) -> bool + Send + Sync + 'static) {
        self.match_fn = Some(Arc::new(f));
    }

    pub fn set_domain_matching_func(&mut self, f: impl Fn(&str, &str) -> bool + Send + Sync + 'static) {
        self.domain_match_fn = Some(Arc::new(f));
    }

    pub fn set_conditional_link(
        &mut self,
        a: &str,
        b: &str,
        domain: Option<&str>,
        f: impl Fn(&HashMap<String, Value>) -> bool + Send + Sync + 'static,
    ) {
        self.conditional_links
            .insert((key(a, domain), key(b, domain)), Arc::new(f));
    }

    pub fn add_link(&mut self, a: &str, b: &str, domain: Option<&str>) {
        let from = key(a, domain);
        let to = key(b, domain);
        let parents = self.edges.entry(from).or_default();
        if !parents.contains(&to) {
            parents.push(to);
        }
    }

    pub fn delete_link(&mut self, a: &str, b: &str, domain: Option<&str>) {
        let from = key(a, domain);
        let to = key(b, domain);
        if let Some(parents) = self.edges.get_mut(&from) {
            parents.retain(|p| p != &to);
        }
        self.conditional_links.remove(&(from, to));
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.conditional_links.clear();
    }

    /// `hasLink(a, b, dom)`: reflexive, transitively closed up to
    /// `max_hierarchy_level`, cycle-tolerant via a visited set, widened by
    /// a matching function if installed (re-applied at every traversal
    /// step — the conservative reading of the open question in the design
    /// notes), gated per-edge by a conditional-link function evaluated
    /// against `params`, and — if a domain-matching function is installed —
    /// tried again under every recorded domain the requested one matches,
    /// not just an exact domain string.
    pub fn has_link(&self, a: &str, b: &str, domain: Option<&str>, params: &HashMap<String, Value>) -> bool {
        if a == b {
            return true;
        }
        if self.bfs_has_link(a, b, domain, params) {
            return true;
        }
        if let (Some(d), Some(dm)) = (domain, &self.domain_match_fn) {
            for other in self.recorded_domains() {
                if other != d && dm(d, &other) && self.bfs_has_link(a, b, Some(&other), params) {
                    return true;
                }
            }
        }
        false
    }

    fn recorded_domains(&self) -> HashSet<String> {
        self.edges
            .keys()
            .chain(self.edges.values().flatten())
            .filter_map(|k| k.split_once("::").map(|(_, d)| d.to_string()))
            .collect()
    }

    fn bfs_has_link(&self, a: &str, b: &str, domain: Option<&str>, params: &HashMap<String, Value>) -> bool {
        let start = key(a, domain);
        let target = key(b, domain);

        if let Some(mf) = &self.match_fn {
            if mf(a, b) {
                return true;
            }
        }

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(start.clone());
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        queue.push_back((start, 0));

        while let Some((node, depth)) = queue.pop_front() {
            if depth >= self.max_hierarchy_level {
                continue;
            }
            let Some(parents) = self.edges.get(&node) else {
                continue;
            };
            for parent in parents {
                if let Some(gate) = self.conditional_links.get(&(node.clone(), parent.clone())) {
                    if !gate(params) {
                        continue;
                    }
                }
                if parent == &target {
                    return true;
                }
                let parent_id = strip_domain(parent);
                if let Some(mf) = &self.match_fn {
                    if mf(parent_id, b) {
                        return true;
                    }
                }
                if visited.insert(parent.clone()) {
                    queue.push_back((parent.clone(), depth + 1));
                }
            }
        }

        false
    }

    /// Direct parents of `a` (one hop), the `getRoles` operation.
    pub fn get_roles(&self, a: &str, domain: Option<&str>) -> Vec<String> {
        let from = key(a, domain);
        self.edges
            .get(&from)
            .map(|parents| parents.iter().map(|p| strip_domain(p).to_string()).collect())
            .unwrap_or_default()
    }

    /// Direct children of `r` (one hop), the `getUsers` operation. A linear
    /// scan over all edges — acceptable per the role counts this component
    /// is designed for.
    pub fn get_users(&self, r: &str, domain: Option<&str>) -> Vec<String> {
        let target = key(r, domain);
        self.edges
            .iter()
            .filter_map(|(child, parents)| {
                if parents.contains(&target) {
                    Some(strip_domain(child).to_string())
                } else {
                    None
                }
            })
            .collect()
    }
}

fn strip_domain(keyed: &str) -> &str {
    keyed.split("::").next().unwrap_or(keyed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflexive_for_any_node() {
        let g = RoleGraph::new();
        assert!(g.has_link("alice", "alice", None, &HashMap::new()));
    }

    #[test]
    fn direct_and_transitive_links() {
        let mut g = RoleGraph::new();
        g.add_link("alice", "admin", None);
        g.add_link("admin", "data2_admin", None);
        assert!(g.has_link("alice", "admin", None, &HashMap::new()));
        assert!(g.has_link("alice", "data2_admin", None, &HashMap::new()));
        assert!(!g.has_link("alice", "nobody", None, &HashMap::new()));
    }

    #[test]
    fn delete_link_breaks_transitivity() {
        let mut g = RoleGraph::new();
        g.add_link("alice", "admin", None);
        g.add_link("admin", "data2_admin", None);
        g.delete_link("admin", "data2_admin", None);
        assert!(!g.has_link("alice", "data2_admin", None, &HashMap::new()));
        assert!(g.has_link("alice", "admin", None, &HashMap::new()));
    }

    #[test]
    fn cycles_terminate_without_extending_reachability() {
        let mut g = RoleGraph::new();
        g.add_link("a", "b", None);
        g.add_link("b", "c", None);
        g.add_link("c", "a", None); // cycle
        assert!(g.has_link("a", "c", None, &HashMap::new()));
        assert!(!g.has_link("a", "nonexistent", None, &HashMap::new()));
    }

    #[test]
    fn domain_qualified_links_are_isolated() {
        let mut g = RoleGraph::new();
        g.add_link("alice", "admin", Some("tenant1"));
        assert!(g.has_link("alice", "admin", Some("tenant1"), &HashMap::new()));
        assert!(!g.has_link("alice", "admin", Some("tenant2"), &HashMap::new()));
        assert!(!g.has_link("alice", "admin", None, &HashMap::new()));
    }

    #[test]
    fn matching_function_widens_haslink() {
        let mut g = RoleGraph::new();
        g.set_matching_func(|x, b| x == "admin:finance" && b == "admin:*");
        g.add_link("alice", "admin:finance", None);
        assert!(g.has_link("alice", "admin:*", None, &HashMap::new()));
    }

    #[test]
    fn conditional_link_gates_traversal() {
        let mut g = RoleGraph::new();
        g.add_link("alice", "admin", None);
        g.set_conditional_link("alice", "admin", None, |params| {
            params.get("active").map(|v| v.is_truthy()).unwrap_or(false)
        });

        let mut params = HashMap::new();
        params.insert("active".to_string(), Value::Bool(false));
        assert!(!g.has_link("alice", "admin", None, &params));

        params.insert("active".to_string(), Value::Bool(true));
        assert!(g.has_link("alice", "admin", None, &params));
    }

    #[test]
    fn domain_matching_function_widens_haslink_across_domains() {
        let mut g = RoleGraph::new();
        g.add_link("alice", "admin", Some("tenant1"));
        g.set_domain_matching_func(|requested, candidate| {
            requested == "*" || requested == candidate
        });
        assert!(g.has_link("alice", "admin", Some("*"), &HashMap::new()));
        assert!(!g.has_link("alice", "admin", Some("tenant2"), &HashMap::new()));
    }

    #[test]
    fn get_roles_and_get_users_are_direct_only() {
        let mut g = RoleGraph::new();
        g.add_link("alice", "admin", None);
        g.add_link("admin", "superadmin", None);
        assert_eq!(g.get_roles("alice", None), vec!["admin".to_string()]);
        assert_eq!(g.get_users("admin", None), vec!["alice".to_string()]);
        assert!(g.get_roles("admin", None).contains(&"superadmin".to_string()));
    }
}
