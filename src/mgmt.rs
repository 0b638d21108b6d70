//! Management API (§4.10): add/remove/update/query policy and grouping
//! rules, filtered operations, and `*_named_*` variants for non-default
//! policy types. Implemented directly on [`CoreEnforcer`] so every
//! concurrency variant gets the identical surface by delegating into it —
//! `functional::Enforcer` calls these on an owned copy, `synced`/`cached`/
//! `distributed` call them under their write lock.
//!
//! The default-named wrappers (`add_policy`, `get_policy`, …) are thin
//! calls into the `*_named_*` form with ptype `"p"` (or `"g"` for grouping),
//! mirroring how real Casbin enforcers expose both.

use crate::enforcer::{link_from_rule, unlink_from_rule, CoreEnforcer};
use crate::error::PolicyError;
use crate::policy::Rule;

impl CoreEnforcer {
    // ---- policy rules -----------------------------------------------

    pub fn add_named_policy(&mut self, ptype: &str, rule: Rule) -> bool {
        self.policies.add_policy(ptype, rule)
    }

    /// Fallible form of [`Self::add_named_policy`]: reports `PolicyExists`
    /// instead of a bare `false` for a duplicate add (§7, §8).
    pub fn try_add_named_policy(&mut self, ptype: &str, rule: Rule) -> Result<(), PolicyError> {
        if self.add_named_policy(ptype, rule.clone()) {
            Ok(())
        } else {
            Err(PolicyError::PolicyExists(rule))
        }
    }

    pub fn try_add_policy(&mut self, rule: Rule) -> Result<(), PolicyError> {
        self.try_add_named_policy("p", rule)
    }

    /// Fallible form of [`Self::remove_named_policy`]: reports
    /// `PolicyMissing` instead of a bare `false` when the rule isn't present.
    pub fn try_remove_named_policy(&mut self, ptype: &str, rule: &[String]) -> Result<(), PolicyError> {
        if self.remove_named_policy(ptype, rule) {
            Ok(())
        } else {
            Err(PolicyError::PolicyMissing(rule.to_vec()))
        }
    }

    pub fn try_remove_policy(&mut self, rule: &[String]) -> Result<(), PolicyError> {
        self.try_remove_named_policy("p", rule)
    }

    pub fn add_policy(&mut self, rule: Rule) -> bool {
        self.add_named_policy("p", rule)
    }

    pub fn add_named_policies(&mut self, ptype: &str, rules: Vec<Rule>) -> Vec<bool> {
        rules.into_iter().map(|r| self.add_named_policy(ptype, r)).collect()
    }

    pub fn add_policies(&mut self, rules: Vec<Rule>) -> Vec<bool> {
        self.add_named_policies("p", rules)
    }

    /// Skips rules already present instead of reporting them as a no-op
    /// add — same net effect as `add_named_policies` but named to match
    /// the `_ex` surface in §4.10.
    pub fn add_named_policies_ex(&mut self, ptype: &str, rules: Vec<Rule>) -> Vec<bool> {
        rules
            .into_iter()
            .map(|rule| {
                if self.policies.has_policy(ptype, &rule) {
                    false
                } else {
                    self.add_named_policy(ptype, rule)
                }
            })
            .collect()
    }

    pub fn add_policies_ex(&mut self, rules: Vec<Rule>) -> Vec<bool> {
        self.add_named_policies_ex("p", rules)
    }

    pub fn remove_named_policy(&mut self, ptype: &str, rule: &[String]) -> bool {
        self.policies.remove_policy(ptype, rule)
    }

    pub fn remove_policy(&mut self, rule: &[String]) -> bool {
        self.remove_named_policy("p", rule)
    }

    pub fn remove_named_policies(&mut self, ptype: &str, rules: &[Rule]) -> Vec<bool> {
        rules.iter().map(|r| self.remove_named_policy(ptype, r)).collect()
    }

    pub fn remove_policies(&mut self, rules: &[Rule]) -> Vec<bool> {
        self.remove_named_policies("p", rules)
    }

    pub fn remove_filtered_named_policy(
        &mut self,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Vec<Rule> {
        self.policies.remove_filtered_policy(ptype, field_index, field_values)
    }

    pub fn remove_filtered_policy(&mut self, field_index: usize, field_values: &[String]) -> Vec<Rule> {
        self.remove_filtered_named_policy("p", field_index, field_values)
    }

    pub fn update_named_policy(&mut self, ptype: &str, old_rule: &[String], new_rule: Rule) -> bool {
        if !self.policies.remove_policy(ptype, old_rule) {
            return false;
        }
        self.policies.add_policy(ptype, new_rule);
        true
    }

    pub fn update_policy(&mut self, old_rule: &[String], new_rule: Rule) -> bool {
        self.update_named_policy("p", old_rule, new_rule)
    }

    pub fn update_named_policies(&mut self, ptype: &str, old_rules: &[Rule], new_rules: Vec<Rule>) -> Vec<bool> {
        old_rules
            .iter()
            .zip(new_rules)
            .map(|(old, new)| self.update_named_policy(ptype, old, new))
            .collect()
    }

    pub fn update_policies(&mut self, old_rules: &[Rule], new_rules: Vec<Rule>) -> Vec<bool> {
        self.update_named_policies("p", old_rules, new_rules)
    }

    /// Removes every rule matching the positional filter and replaces them
    /// with `new_rules`; returns the removed rows.
    pub fn update_filtered_named_policies(
        &mut self,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
        new_rules: Vec<Rule>,
    ) -> Vec<Rule> {
        let removed = self.policies.remove_filtered_policy(ptype, field_index, field_values);
        for rule in new_rules {
            self.policies.add_policy(ptype, rule);
        }
        removed
    }

    pub fn update_filtered_policies(
        &mut self,
        field_index: usize,
        field_values: &[String],
        new_rules: Vec<Rule>,
    ) -> Vec<Rule> {
        self.update_filtered_named_policies("p", field_index, field_values, new_rules)
    }

    pub fn has_named_policy(&self, ptype: &str, rule: &[String]) -> bool {
        self.policies.has_policy(ptype, rule)
    }

    pub fn has_policy(&self, rule: &[String]) -> bool {
        self.has_named_policy("p", rule)
    }

    pub fn get_named_policy(&self, ptype: &str) -> Vec<Rule> {
        self.policies.get_policy(ptype).to_vec()
    }

    pub fn get_policy(&self) -> Vec<Rule> {
        self.get_named_policy("p")
    }

    pub fn get_filtered_named_policy(&self, ptype: &str, field_index: usize, field_values: &[String]) -> Vec<Rule> {
        filter_rules(self.policies.get_policy(ptype), field_index, field_values)
    }

    pub fn get_filtered_policy(&self, field_index: usize, field_values: &[String]) -> Vec<Rule> {
        self.get_filtered_named_policy("p", field_index, field_values)
    }

    // ---- grouping rules (role graph kept in lock-step, §4.6) ---------

    pub fn add_named_grouping_policy(&mut self, gtype: &str, rule: Rule) -> bool {
        let added = self.policies.add_grouping_policy(gtype, rule.clone());
        if added {
            self.roles.ensure(gtype);
            link_from_rule(&mut self.roles, gtype, &rule);
        }
        added
    }

    pub fn add_grouping_policy(&mut self, rule: Rule) -> bool {
        self.add_named_grouping_policy("g", rule)
    }

    /// Fallible form of [`Self::add_named_grouping_policy`]: reports
    /// `PolicyExists` for a duplicate edge instead of a bare `false`.
    pub fn try_add_named_grouping_policy(&mut self, gtype: &str, rule: Rule) -> Result<(), PolicyError> {
        if self.add_named_grouping_policy(gtype, rule.clone()) {
            Ok(())
        } else {
            Err(PolicyError::PolicyExists(rule))
        }
    }

    pub fn try_add_grouping_policy(&mut self, rule: Rule) -> Result<(), PolicyError> {
        self.try_add_named_grouping_policy("g", rule)
    }

    pub fn add_named_grouping_policies(&mut self, gtype: &str, rules: Vec<Rule>) -> Vec<bool> {
        rules
            .into_iter()
            .map(|r| self.add_named_grouping_policy(gtype, r))
            .collect()
    }

    pub fn add_grouping_policies(&mut self, rules: Vec<Rule>) -> Vec<bool> {
        self.add_named_grouping_policies("g", rules)
    }

    pub fn add_named_grouping_policies_ex(&mut self, gtype: &str, rules: Vec<Rule>) -> Vec<bool> {
        rules
            .into_iter()
            .map(|rule| {
                if self.policies.has_grouping_policy(gtype, &rule) {
                    false
                } else {
                    self.add_named_grouping_policy(gtype, rule)
                }
            })
            .collect()
    }

    pub fn add_grouping_policies_ex(&mut self, rules: Vec<Rule>) -> Vec<bool> {
        self.add_named_grouping_policies_ex("g", rules)
    }

    pub fn remove_named_grouping_policy(&mut self, gtype: &str, rule: &[String]) -> bool {
        let removed = self.policies.remove_grouping_policy(gtype, rule);
        if removed {
            unlink_from_rule(&mut self.roles, gtype, rule);
        }
        removed
    }

    pub fn remove_grouping_policy(&mut self, rule: &[String]) -> bool {
        self.remove_named_grouping_policy("g", rule)
    }

    /// Fallible form of [`Self::remove_named_grouping_policy`]: reports
    /// `PolicyMissing` instead of a bare `false` when the edge isn't present.
    pub fn try_remove_named_grouping_policy(&mut self, gtype: &str, rule: &[String]) -> Result<(), PolicyError> {
        if self.remove_named_grouping_policy(gtype, rule) {
            Ok(())
        } else {
            Err(PolicyError::PolicyMissing(rule.to_vec()))
        }
    }

    pub fn try_remove_grouping_policy(&mut self, rule: &[String]) -> Result<(), PolicyError> {
        self.try_remove_named_grouping_policy("g", rule)
    }

    pub fn remove_named_grouping_policies(&mut self, gtype: &str, rules: &[Rule]) -> Vec<bool> {
        rules
            .iter()
            .map(|r| self.remove_named_grouping_policy(gtype, r))
            .collect()
    }

    pub fn remove_grouping_policies(&mut self, rules: &[Rule]) -> Vec<bool> {
        self.remove_named_grouping_policies("g", rules)
    }

    pub fn remove_filtered_named_grouping_policy(
        &mut self,
        gtype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Vec<Rule> {
        let removed = self
            .policies
            .remove_filtered_grouping_policy(gtype, field_index, field_values);
        for rule in &removed {
            unlink_from_rule(&mut self.roles, gtype, rule);
        }
        removed
    }

    pub fn remove_filtered_grouping_policy(&mut self, field_index: usize, field_values: &[String]) -> Vec<Rule> {
        self.remove_filtered_named_grouping_policy("g", field_index, field_values)
    }

    pub fn update_named_grouping_policy(&mut self, gtype: &str, old_rule: &[String], new_rule: Rule) -> bool {
        if !self.remove_named_grouping_policy(gtype, old_rule) {
            return false;
        }
        self.add_named_grouping_policy(gtype, new_rule);
        true
    }

    pub fn update_grouping_policy(&mut self, old_rule: &[String], new_rule: Rule) -> bool {
        self.update_named_grouping_policy("g", old_rule, new_rule)
    }

    pub fn has_named_grouping_policy(&self, gtype: &str, rule: &[String]) -> bool {
        self.policies.has_grouping_policy(gtype, rule)
    }

    pub fn has_grouping_policy(&self, rule: &[String]) -> bool {
        self.has_named_grouping_policy("g", rule)
    }

    pub fn get_named_grouping_policy(&self, gtype: &str) -> Vec<Rule> {
        self.policies.get_grouping_policy(gtype).to_vec()
    }

    pub fn get_grouping_policy(&self) -> Vec<Rule> {
        self.get_named_grouping_policy("g")
    }

    pub fn get_filtered_named_grouping_policy(
        &self,
        gtype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Vec<Rule> {
        filter_rules(self.policies.get_grouping_policy(gtype), field_index, field_values)
    }

    pub fn get_filtered_grouping_policy(&self, field_index: usize, field_values: &[String]) -> Vec<Rule> {
        self.get_filtered_named_grouping_policy("g", field_index, field_values)
    }

    /// Generic `self_*` mutation keyed by table-kind (`"p"` or `"g"`)
    /// rather than a typed policy/grouping call, mirroring the `Adapter`
    /// port's `section` parameter (§6). A distributed enforcer receiving a
    /// remote change over the wire (where only the section name travelled,
    /// not a typed method) dispatches through this, and any section outside
    /// the two recognized kinds is an `InvalidSection` error (§7).
    pub fn self_apply_policy_in_section(&mut self, section: &str, ptype: &str, rule: Rule) -> Result<bool, PolicyError> {
        match section {
            "p" => Ok(self.add_named_policy(ptype, rule)),
            "g" => Ok(self.add_named_grouping_policy(ptype, rule)),
            other => Err(PolicyError::InvalidSection(other.to_string())),
        }
    }
}

fn filter_rules(rules: &[Rule], field_index: usize, field_values: &[String]) -> Vec<Rule> {
    rules
        .iter()
        .filter(|r| {
            field_values
                .iter()
                .enumerate()
                .all(|(i, v)| v.is_empty() || r.get(field_index + i).map(|f| f == v).unwrap_or(false))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;

    const MODEL: &str = r#"
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

    fn rule(fields: &[&str]) -> Rule {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_and_remove_grouping_policy_keeps_role_graph_in_sync() {
        let model = Model::from_str(MODEL).unwrap();
        let mut e = CoreEnforcer::new(model);
        assert!(e.add_grouping_policy(rule(&["alice", "admin"])));
        assert!(e.roles().has_link("g", "alice", "admin", None, &Default::default()).unwrap());

        assert!(e.remove_grouping_policy(&rule(&["alice", "admin"])));
        assert!(!e.roles().has_link("g", "alice", "admin", None, &Default::default()).unwrap());
    }

    #[test]
    fn add_policies_ex_skips_existing_rules() {
        let model = Model::from_str(MODEL).unwrap();
        let mut e = CoreEnforcer::new(model);
        e.add_policy(rule(&["alice", "data1", "read"]));

        let results = e.add_policies_ex(vec![
            rule(&["alice", "data1", "read"]),
            rule(&["bob", "data1", "read"]),
        ]);
        assert_eq!(results, vec![false, true]);
        assert_eq!(e.get_policy().len(), 2);
    }

    #[test]
    fn update_policy_replaces_matching_rule() {
        let model = Model::from_str(MODEL).unwrap();
        let mut e = CoreEnforcer::new(model);
        e.add_policy(rule(&["alice", "data1", "read"]));

        assert!(e.update_policy(&rule(&["alice", "data1", "read"]), rule(&["alice", "data1", "write"])));
        assert!(e.has_policy(&rule(&["alice", "data1", "write"])));
        assert!(!e.has_policy(&rule(&["alice", "data1", "read"])));
    }

    #[test]
    fn remove_filtered_grouping_policy_severs_matching_links() {
        let model = Model::from_str(MODEL).unwrap();
        let mut e = CoreEnforcer::new(model);
        e.add_grouping_policy(rule(&["alice", "admin"]));
        e.add_grouping_policy(rule(&["bob", "admin"]));

        let removed = e.remove_filtered_grouping_policy(1, &["admin".to_string()]);
        assert_eq!(removed.len(), 2);
        assert!(!e.roles().has_link("g", "alice", "admin", None, &Default::default()).unwrap());
        assert!(!e.roles().has_link("g", "bob", "admin", None, &Default::default()).unwrap());
    }

    #[test]
    fn try_add_policy_reports_policy_exists_on_a_duplicate() {
        let model = Model::from_str(MODEL).unwrap();
        let mut e = CoreEnforcer::new(model);
        assert!(e.try_add_policy(rule(&["alice", "data1", "read"])).is_ok());
        assert!(matches!(
            e.try_add_policy(rule(&["alice", "data1", "read"])),
            Err(PolicyError::PolicyExists(r)) if r == rule(&["alice", "data1", "read"])
        ));
    }

    #[test]
    fn try_remove_policy_reports_policy_missing() {
        let model = Model::from_str(MODEL).unwrap();
        let mut e = CoreEnforcer::new(model);
        assert!(matches!(
            e.try_remove_policy(&rule(&["ghost", "data1", "read"])),
            Err(PolicyError::PolicyMissing(r)) if r == rule(&["ghost", "data1", "read"])
        ));
    }

    #[test]
    fn try_add_grouping_policy_reports_policy_exists_on_a_duplicate() {
        let model = Model::from_str(MODEL).unwrap();
        let mut e = CoreEnforcer::new(model);
        assert!(e.try_add_grouping_policy(rule(&["alice", "admin"])).is_ok());
        assert!(matches!(
            e.try_add_grouping_policy(rule(&["alice", "admin"])),
            Err(PolicyError::PolicyExists(r)) if r == rule(&["alice", "admin"])
        ));
    }

    #[test]
    fn try_remove_grouping_policy_reports_policy_missing() {
        let model = Model::from_str(MODEL).unwrap();
        let mut e = CoreEnforcer::new(model);
        assert!(matches!(
            e.try_remove_grouping_policy(&rule(&["ghost", "admin"])),
            Err(PolicyError::PolicyMissing(r)) if r == rule(&["ghost", "admin"])
        ));
    }

    #[test]
    fn self_apply_policy_in_section_rejects_an_unknown_section() {
        let model = Model::from_str(MODEL).unwrap();
        let mut e = CoreEnforcer::new(model);
        assert!(matches!(
            e.self_apply_policy_in_section("x", "p", rule(&["alice", "data1", "read"])),
            Err(PolicyError::InvalidSection(s)) if s == "x"
        ));
    }

    #[test]
    fn self_apply_policy_in_section_dispatches_p_and_g() {
        let model = Model::from_str(MODEL).unwrap();
        let mut e = CoreEnforcer::new(model);
        assert!(e
            .self_apply_policy_in_section("p", "p", rule(&["alice", "data1", "read"]))
            .unwrap());
        assert!(e
            .self_apply_policy_in_section("g", "g", rule(&["alice", "admin"]))
            .unwrap());
        assert!(e.has_policy(&rule(&["alice", "data1", "read"])));
        assert!(e.roles().has_link("g", "alice", "admin", None, &Default::default()).unwrap());
    }
}
