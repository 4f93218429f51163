//! Turns flattened constraint models into dependency-ordered, solver-ready
//! programs.
//!
//! A front end registers variables, constraints, and output bindings on a
//! [`ModelBuilder`], then calls [`ModelBuilder::compile`] with a
//! [`ModelSink`]. The pipeline analyses which constraints define which
//! introduced variables, presolves domains to a fixpoint, replaces alias
//! declarations with explicit equalities, orders constraints so every
//! definition precedes its uses, and materializes variables, constraints,
//! and output composition into the sink.

pub mod ast;
pub mod constraint;
pub mod containers;
pub mod error;
pub mod sink;
pub mod variables;

mod builder;
mod compiler;
mod output;

pub use builder::ModelBuilder;
pub use error::CompileError;
pub use sink::ModelSink;
