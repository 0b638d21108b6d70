//! Transactions (§4.9): stage a batch of management-API mutations against a
//! snapshot, then atomically `commit` (all staged ops applied in order) or
//! `rollback` (snapshot returned untouched). Staging never touches the live
//! enforcer — only `commit`'s caller decides whether to install the result.

use crate::enforcer::CoreEnforcer;
use crate::error::EnforceError;
use crate::policy::Rule;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum State {
    Open,
    Committed,
    RolledBack,
}

type StagedOp = Box<dyn FnOnce(&mut CoreEnforcer) + Send>;

/// A staged batch of mutations over a point-in-time copy of a
/// [`CoreEnforcer`]. Nothing staged is visible anywhere until [`Txn::commit`]
/// hands back the resulting enforcer for the caller to install.
pub struct Txn {
    snapshot: CoreEnforcer,
    ops: Vec<StagedOp>,
    state: State,
}

impl Txn {
    /// Begins a transaction from a clone of `enforcer`'s current state.
    /// `enforcer` itself is never touched.
    pub fn begin(enforcer: &CoreEnforcer) -> Self {
        Self {
            snapshot: enforcer.clone(),
            ops: Vec::new(),
            state: State::Open,
        }
    }

    fn stage(&mut self, op: impl FnOnce(&mut CoreEnforcer) + Send + 'static) -> Result<(), EnforceError> {
        if self.state != State::Open {
            return Err(EnforceError::TransactionAborted(
                "transaction is no longer open".into(),
            ));
        }
        self.ops.push(Box::new(op));
        Ok(())
    }

    pub fn stage_add_policy(&mut self, ptype: impl Into<String>, rule: Rule) -> Result<(), EnforceError> {
        let ptype = ptype.into();
        self.stage(move |core| {
            core.add_named_policy(&ptype, rule);
        })
    }

    pub fn stage_remove_policy(&mut self, ptype: impl Into<String>, rule: Rule) -> Result<(), EnforceError> {
        let ptype = ptype.into();
        self.stage(move |core| {
            core.remove_named_policy(&ptype, &rule);
        })
    }

    pub fn stage_update_policy(
        &mut self,
        ptype: impl Into<String>,
        old_rule: Rule,
        new_rule: Rule,
    ) -> Result<(), EnforceError> {
        let ptype = ptype.into();
        self.stage(move |core| {
            core.update_named_policy(&ptype, &old_rule, new_rule);
        })
    }

    pub fn stage_add_grouping_policy(&mut self, gtype: impl Into<String>, rule: Rule) -> Result<(), EnforceError> {
        let gtype = gtype.into();
        self.stage(move |core| {
            core.add_named_grouping_policy(&gtype, rule);
        })
    }

    pub fn stage_remove_grouping_policy(&mut self, gtype: impl Into<String>, rule: Rule) -> Result<(), EnforceError> {
        let gtype = gtype.into();
        self.stage(move |core| {
            core.remove_named_grouping_policy(&gtype, &rule);
        })
    }

    /// Applies every staged operation, in order, to a clone of the
    /// begin-time snapshot and returns the result. The `Txn` is consumed and
    /// cannot be committed or rolled back again.
    pub fn commit(mut self) -> Result<CoreEnforcer, EnforceError> {
        if self.state != State::Open {
            return Err(EnforceError::TransactionAborted(
                "transaction already closed".into(),
            ));
        }
        let mut working = self.snapshot.clone();
        for op in self.ops.drain(..) {
            op(&mut working);
        }
        self.state = State::Committed;
        Ok(working)
    }

    /// Discards every staged operation and returns the begin-time snapshot
    /// unchanged. The `Txn` is consumed and cannot be committed or rolled
    /// back again.
    pub fn rollback(mut self) -> CoreEnforcer {
        self.state = State::RolledBack;
        self.snapshot
    }

    pub fn staged_len(&self) -> usize {
        self.ops.len()
    }
}
