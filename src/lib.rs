//! # casbin-core
//!
//! A Casbin-compatible authorization engine core: model/config parsing, the
//! matcher expression language, a role-manager/role-graph, an effect
//! aggregator, an in-memory policy store, and an enforcement engine offered
//! in four concurrency flavors, with thin `Adapter`/`Watcher`/`Dispatcher`
//! ports for external storage and replication.
//!
//! Storage backends, HTTP/gRPC frontends, and wire transports are out of
//! scope — see [`adapter`], [`watcher`], and [`dispatcher`] for the ports an
//! embedding application implements.
//!
//! ## Example
//!
//! ```rust
//! use casbin_core::{Enforcer, Model, Value};
//!
//! # fn main() -> casbin_core::error::Result<()> {
//! let model = Model::from_str(r#"
//!     [request_definition]
//!     r = sub, obj, act
//!
//!     [policy_definition]
//!     p = sub, obj, act
//!
//!     [policy_effect]
//!     e = some(where (p.eft == allow))
//!
//!     [matchers]
//!     m = r.sub == p.sub && r.obj == p.obj && r.act == p.act
//! "#)?;
//!
//! let (enforcer, added) = Enforcer::new(model).add_policy(vec![
//!     "alice".into(), "data1".into(), "read".into(),
//! ]);
//! assert!(added);
//! assert!(enforcer.enforce(&[Value::from("alice"), Value::from("data1"), Value::from("read")])?);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod dispatcher;
pub mod effect;
pub mod enforcer;
pub mod error;
pub mod expr;
pub mod mgmt;
pub mod model;
pub mod policy;
pub mod rbac;
pub mod txn;
pub mod value;
pub mod watcher;

pub use adapter::{Adapter, PolicyTables};
pub use dispatcher::Dispatcher;
pub use effect::{Effect, RuleOutcome};
pub use enforcer::{CachedEnforcer, CoreEnforcer, DistributedEnforcer, Enforcer, EnforcerOptions, SyncedEnforcer};
pub use error::{AdapterError as PortError, EnforceError, EvalError, ModelError, PolicyError, RoleError};
pub use model::Model;
pub use policy::{PolicyStore, Rule};
pub use rbac::RoleManager;
pub use txn::Txn;
pub use value::Value;
pub use watcher::Watcher;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
