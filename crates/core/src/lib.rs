//! Typed object model and structural validation for CircleCI configuration.
//!
//! This crate decides whether a configuration document is well-formed. It
//! takes a generic value tree, already parsed from YAML or JSON by the
//! caller, and produces either a typed [`Document`] or a [`DecodeError`]
//! naming the offending field and its path from the root.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//!
//! let config = json!({
//!     "version": 2.1,
//!     "jobs": {
//!         "build": {
//!             "docker": [{"image": "cimg/rust:1.80"}],
//!             "steps": ["checkout", {"run": "cargo test"}]
//!         }
//!     },
//!     "workflows": {"main": {"jobs": ["build"]}}
//! });
//!
//! let document = ccvalidator_core::validate(&config).unwrap();
//! assert_eq!(document.jobs.len(), 1);
//! ```
//!
//! Two modes are available. [`Validator::permissive`] follows the object
//! model; [`Validator::strict`] follows the schema model and also requires
//! schema-only fields such as `setup` and `resource_class`. Unknown keys on
//! closed entities are rejected in both.

pub mod codec;
pub mod error;
pub mod model;
pub mod resolver;
pub mod schema;
pub mod validator;

pub use codec::{Codec, Entity, Mode};
pub use error::{DecodeError, ErrorKind, FieldPath, PathSegment, Result, ValueKind};
pub use model::*;
pub use schema::{EntitySchema, Registry};
pub use validator::{Outcome, Validator, validate, validate_strict};
