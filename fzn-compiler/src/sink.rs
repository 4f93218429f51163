//! The boundary to the solver that materializes the compiled model.

use crate::ast::Node;
use crate::constraint::CtSpec;
use crate::variables::BoolVarSpec;
use crate::variables::IntVarSpec;
use crate::variables::SetVarSpec;

/// Receives the ordered variables and constraints produced by the pipeline.
///
/// Variables are announced in declaration order; a skipped variable keeps
/// its declaration index reserved so later domain reductions can still
/// address it. Constraints arrive in final topological order: every
/// variable a constraint requires is defined by a constraint posted
/// earlier.
pub trait ModelSink {
    fn init(&mut self, num_int_vars: usize, num_bool_vars: usize, num_set_vars: usize);

    fn new_int_var(&mut self, name: &str, spec: &IntVarSpec, active: bool);

    /// The variable at the next integer index is computed by a defining
    /// constraint and gets no domain of its own.
    fn skip_int_var(&mut self);

    fn new_bool_var(&mut self, name: &str, spec: &BoolVarSpec);

    fn skip_bool_var(&mut self);

    fn new_set_var(&mut self, name: &str, spec: &SetVarSpec);

    fn post_constraint(&mut self, spec: &CtSpec);

    /// Current bounds of the integer variable at `variable`, used to keep
    /// deferred domain reductions monotone.
    fn int_var_bounds(&self, variable: usize) -> (i64, i64);

    fn set_int_range(&mut self, variable: usize, min: i64, max: i64);

    fn set_int_values(&mut self, variable: usize, values: &[i64]);

    fn set_bool_range(&mut self, variable: usize, min: i64, max: i64);

    fn set_bool_values(&mut self, variable: usize, values: &[i64]);

    /// Hands over the composed output specification.
    fn init_output(&mut self, output: Vec<Node>);
}
