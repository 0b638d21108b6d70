//! Policy Store (§4.6): in-memory `policies`/`grouping_policies` tables
//! keyed by policy type (`p`, `p2`, …, `g`, `g2`, …), each an ordered list
//! of rules with set-insertion semantics and positional-field filtered
//! removal (empty string as wildcard).

use std::collections::BTreeMap;

pub type Rule = Vec<String>;

#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    policies: BTreeMap<String, Vec<Rule>>,
    grouping_policies: BTreeMap<String, Vec<Rule>>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_policy(&self, ptype: &str) -> &[Rule] {
        self.policies.get(ptype).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_grouping_policy(&self, ptype: &str) -> &[Rule] {
        self.grouping_policies.get(ptype).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Inserts `rule` under `ptype` if not already present. Returns whether
    /// it was actually added (a duplicate insert is a no-op, not an error).
    pub fn add_policy(&mut self, ptype: &str, rule: Rule) -> bool {
        add_rule(self.policies.entry(ptype.to_string()).or_default(), rule)
    }

    pub fn add_grouping_policy(&mut self, ptype: &str, rule: Rule) -> bool {
        add_rule(self.grouping_policies.entry(ptype.to_string()).or_default(), rule)
    }

    pub fn remove_policy(&mut self, ptype: &str, rule: &[String]) -> bool {
        remove_exact(self.policies.get_mut(ptype), rule)
    }

    pub fn remove_grouping_policy(&mut self, ptype: &str, rule: &[String]) -> bool {
        remove_exact(self.grouping_policies.get_mut(ptype), rule)
    }

    /// Removes every rule whose fields starting at `field_index` match
    /// `field_values` positionally; an empty string in `field_values` means
    /// "don't care" for that position. Returns the removed rules.
    pub fn remove_filtered_policy(&mut self, ptype: &str, field_index: usize, field_values: &[String]) -> Vec<Rule> {
        remove_filtered(self.policies.get_mut(ptype), field_index, field_values)
    }

    pub fn remove_filtered_grouping_policy(
        &mut self,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Vec<Rule> {
        remove_filtered(self.grouping_policies.get_mut(ptype), field_index, field_values)
    }

    pub fn has_policy(&self, ptype: &str, rule: &[String]) -> bool {
        self.policies
            .get(ptype)
            .map(|rules| rules.iter().any(|r| r.as_slice() == rule))
            .unwrap_or(false)
    }

    pub fn has_grouping_policy(&self, ptype: &str, rule: &[String]) -> bool {
        self.grouping_policies
            .get(ptype)
            .map(|rules| rules.iter().any(|r| r.as_slice() == rule))
            .unwrap_or(false)
    }

    pub fn policy_types(&self) -> impl Iterator<Item = &String> {
        self.policies.keys()
    }

    pub fn grouping_policy_types(&self) -> impl Iterator<Item = &String> {
        self.grouping_policies.keys()
    }

    pub fn clear(&mut self) {
        self.policies.clear();
        self.grouping_policies.clear();
    }
}

fn add_rule(rules: &mut Vec<Rule>, rule: Rule) -> bool {
    if rules.iter().any(|r| r == &rule) {
        false
    } else {
        rules.push(rule);
        true
    }
}

fn remove_exact(rules: Option<&mut Vec<Rule>>, rule: &[String]) -> bool {
    let Some(rules) = rules else { return false };
    let before = rules.len();
    rules.retain(|r| r.as_slice() != rule);
    rules.len() != before
}

fn remove_filtered(rules: Option<&mut Vec<Rule>>, field_index: usize, field_values: &[String]) -> Vec<Rule> {
    let Some(rules) = rules else { return Vec::new() };
    let mut removed = Vec::new();
    rules.retain(|r| {
        let is_match = field_values
            .iter()
            .enumerate()
            .all(|(i, v)| v.is_empty() || r.get(field_index + i).map(|f| f == v).unwrap_or(false));
        if is_match {
            removed.push(r.clone());
            false
        } else {
            true
        }
    });
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(fields: &[&str]) -> Rule {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn duplicate_insert_is_a_no_op() {
        let mut store = PolicyStore::new();
        assert!(store.add_policy("p", rule(&["alice", "data1", "read"])));
        assert!(!store.add_policy("p", rule(&["alice", "data1", "read"])));
        assert_eq!(store.get_policy("p").len(), 1);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut store = PolicyStore::new();
        store.add_policy("p", rule(&["1", "alice", "data1", "read", "deny"]));
        store.add_policy("p", rule(&["2", "alice", "data1", "read", "allow"]));
        store.add_policy("p", rule(&["3", "*", "*", "read", "allow"]));
        let rules = store.get_policy("p");
        assert_eq!(rules[0][0], "1");
        assert_eq!(rules[2][0], "3");
    }

    #[test]
    fn remove_filtered_with_wildcard_matches_dont_care_fields() {
        let mut store = PolicyStore::new();
        store.add_policy("p", rule(&["alice", "data1", "read"]));
        store.add_policy("p", rule(&["bob", "data1", "write"]));
        store.add_policy("p", rule(&["alice", "data2", "read"]));

        let removed = store.remove_filtered_policy("p", 1, &["data1".to_string(), "".to_string()]);
        assert_eq!(removed.len(), 2);
        assert_eq!(store.get_policy("p").len(), 1);
        assert_eq!(store.get_policy("p")[0][0], "alice");
    }

    #[test]
    fn grouping_policies_are_tracked_independently_of_policies() {
        let mut store = PolicyStore::new();
        store.add_grouping_policy("g", rule(&["alice", "admin"]));
        assert!(store.has_grouping_policy("g", &rule(&["alice", "admin"])));
        assert!(!store.has_policy("g", &rule(&["alice", "admin"])));
    }

    #[test]
    fn remove_policy_is_idempotent_on_missing_rule() {
        let mut store = PolicyStore::new();
        assert!(!store.remove_policy("p", &rule(&["ghost", "data1", "read"])));
    }
}
