//! Replaces alias declarations with explicit equality constraints.
//!
//! An alias is a declaration-time fact, not a constraint, so nothing would
//! ever materialize it. This pass appends one `int2int`/`bool2bool` spec per
//! aliased variable, each pre-marked as defining the alias, so the scheduler
//! orders them like any other defining constraint.

use log::debug;

use super::context::CompilationContext;
use crate::ast::Node;
use crate::constraint::CtSpec;

pub(crate) fn run(context: &mut CompilationContext) {
    for variable in 0..context.int_variables.len() {
        if let Some(target) = context.int_variables[variable].alias {
            debug!("  - alias: xi({variable}) := xi({target})");
            let index = context.constraints.len();
            let mut spec = CtSpec::new(
                index,
                "int2int",
                vec![Node::IntVar(target), Node::IntVar(variable)],
                None,
            );
            spec.set_defines(variable);
            context.constraints.push(spec);
        }
    }

    let num_int_variables = context.int_variables.len();
    for variable in 0..context.bool_variables.len() {
        if let Some(target) = context.bool_variables[variable].alias {
            debug!("  - alias: xb({variable}) := xb({target})");
            let index = context.constraints.len();
            let mut spec = CtSpec::new(
                index,
                "bool2bool",
                vec![Node::BoolVar(target), Node::BoolVar(variable)],
                None,
            );
            spec.set_defines(num_int_variables + variable);
            context.constraints.push(spec);
        }
    }
}
