//! Rule-based authorization decisions.
//!
//! A `Policy` holds a per-entity `RuleTable` and answers whether an entity
//! may access a resource, given optional request parameters. Rules for the
//! requested resource are scanned before the entity's resource-agnostic
//! rules, the first matching `RuleSet` decides, and requests matching nothing
//! get the configured default (deny unless set otherwise).
//!
//! ```
//! use entity_acl::{Decision, PolicyBuilder, Request};
//!
//! let policy = PolicyBuilder::from_json(
//!     r#"{ "rules": { "alice": [{ "effect": "allow", "resource": "kitchen" }] } }"#,
//! )
//! .with_default_decision(Decision::Denied)
//! .build()?;
//!
//! assert!(policy.check(&Request::new("alice", "kitchen")?));
//! assert!(!policy.check(&Request::new("alice", "garage")?));
//! # Ok::<(), entity_acl::Error>(())
//! ```
#![deny(rust_2018_idioms, warnings)]
#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc
)]
mod errors;
mod matcher;
mod policy;
mod validator;

pub use errors::{Error, Result};
pub use matcher::{Accepted, Condition, Conditions, Params};
pub use policy::PolicyBuilder;
pub use policy::{
    Decision, Effect, EntityPolicy, Policy, Request, RuleSet, RuleTable, Verdict, ANY_RESOURCE,
};
pub use validator::{DefaultValidator, Field, PolicyValidator};
