//! Core types for the fleetwire orchestration message layer.
//!
//! This crate defines the shared data structures used across the
//! fleetwire envelope, security, and transport layers: the error
//! taxonomy, targeting filters, data plugin capability descriptors, and
//! process configuration. It contains no protocol logic.

pub mod config;
pub mod ddl;
pub mod error;
pub mod filter;

pub use config::{load_config, Config, DEFAULT_TTL};
pub use ddl::{DataDdl, DdlInput, DdlRegistry, StaticDdlRegistry};
pub use error::{FleetwireError, FleetwireResult};
pub use filter::{FactCriterion, Filter, FilterExpr, Fstatement};
