//! Effect Aggregator (§4.4): reduces an ordered sequence of per-rule
//! outcomes to a final allow/deny decision per one of five closed-set
//! effect expressions, with short-circuit support.

use crate::error::ModelError;

/// One of the five effect expressions a model's `[policy_effect]` section
/// may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// `some(where (p.eft == allow))`
    AllowOverride,
    /// `!some(where (p.eft == deny))`
    DenyOverride,
    /// `some(where (p.eft == allow)) && !some(where (p.eft == deny))`
    AllowAndDenyOverride,
    /// `priority(p.eft) || deny`
    Priority,
    /// `subjectPriority(p.eft)` — same reduction as `Priority`; the
    /// subject-specific priority ordering is the caller's job to establish
    /// before feeding rules in.
    SubjectPriority,
}

impl Effect {
    pub fn parse(expr: &str) -> Result<Self, ModelError> {
        let normalized: String = expr.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.as_str() {
            "some(where (p.eft == allow))" => Ok(Effect::AllowOverride),
            "!some(where (p.eft == deny))" => Ok(Effect::DenyOverride),
            "some(where (p.eft == allow)) && !some(where (p.eft == deny))" => {
                Ok(Effect::AllowAndDenyOverride)
            }
            "priority(p.eft) || deny" => Ok(Effect::Priority),
            "subjectPriority(p.eft)" => Ok(Effect::SubjectPriority),
            other => Err(ModelError::BadMatcher(
                other.to_string(),
                "not one of the five supported effect expressions".to_string(),
            )),
        }
    }
}

/// The per-rule result fed into an [`Aggregator`]: a matcher that evaluated
/// false (or errored, per §4.7's evaluation-error isolation) is
/// indeterminate; a matcher that evaluated true carries the rule's `eft`
/// field (defaulting to allow when the policy type has none).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Allow,
    Deny,
    Indeterminate,
}

/// Accumulates [`RuleOutcome`]s in order and reports as soon as the final
/// decision is settled, so the enforcer can stop evaluating remaining
/// rules.
pub struct Aggregator {
    effect: Effect,
    seen_allow: bool,
    decided: Option<bool>,
}

impl Aggregator {
    pub fn new(effect: Effect) -> Self {
        Self {
            effect,
            seen_allow: false,
            decided: None,
        }
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// Feed the next rule's outcome. Returns `Some(decision)` once the
    /// result is settled — the caller may stop iterating at that point.
    pub fn feed(&mut self, outcome: RuleOutcome) -> Option<bool> {
        if self.decided.is_some() {
            return self.decided;
        }
        match self.effect {
            Effect::AllowOverride => {
                if outcome == RuleOutcome::Allow {
                    self.decided = Some(true);
                }
            }
            Effect::DenyOverride => {
                if outcome == RuleOutcome::Deny {
                    self.decided = Some(false);
                }
            }
            Effect::AllowAndDenyOverride => match outcome {
                RuleOutcome::Allow => self.seen_allow = true,
                RuleOutcome::Deny => self.decided = Some(false),
                RuleOutcome::Indeterminate => {}
            },
            Effect::Priority | Effect::SubjectPriority => match outcome {
                RuleOutcome::Allow => self.decided = Some(true),
                RuleOutcome::Deny => self.decided = Some(false),
                RuleOutcome::Indeterminate => {}
            },
        }
        self.decided
    }

    /// The decision once no more rules remain, applying each expression's
    /// default when nothing ever settled it.
    pub fn finish(&self) -> bool {
        self.decided.unwrap_or(match self.effect {
            Effect::AllowOverride => false,
            Effect::DenyOverride => true,
            Effect::AllowAndDenyOverride => self.seen_allow,
            Effect::Priority | Effect::SubjectPriority => false,
        })
    }
}
