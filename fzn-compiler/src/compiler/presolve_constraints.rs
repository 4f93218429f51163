//! Fixpoint rule engine that rewrites and nullifies constraints by
//! propagating bound, alias, and reification information into the variable
//! specs and other constraints.

use log::debug;

use super::context::CompilationContext;
use crate::ast::Call;
use crate::ast::Node;
use crate::ast::SetLit;
use crate::error::CompileError;

/// Scans all active constraints until a full pass fires no rule.
///
/// Each pass either nullifies constraints or shrinks variable domains, both
/// monotone, so the loop terminates. A failed domain merge is infeasibility
/// and aborts the pipeline; it is never folded into "nothing changed".
pub(crate) fn run(context: &mut CompilationContext) -> Result<(), CompileError> {
    let mut repeat = true;
    while repeat {
        repeat = false;
        for position in 0..context.constraints.len() {
            if context.constraints[position].is_nullified() {
                continue;
            }
            if presolve_constraint(context, position)? {
                repeat = true;
            }
        }
    }

    Ok(())
}

/// Extension point for strengthening `array_bool_or` constraints.
/// Intentionally does nothing.
pub(crate) fn strongify(_context: &mut CompilationContext, _position: usize) {}

/// Applies the first matching rule to the constraint at `position`.
/// Returns whether a rule fired.
fn presolve_constraint(
    context: &mut CompilationContext,
    position: usize,
) -> Result<bool, CompileError> {
    let id = context.constraints[position].id().to_owned();
    let index = context.constraints[position].index();

    if id == "int_le" {
        let lhs = context.constraints[position].arg(0).clone();
        let rhs = context.constraints[position].arg(1).clone();

        if let (Some(variable), Some(bound)) = (lhs.int_var(), context.bound_of(&rhs)) {
            let end = context.end_int_variable(variable)?;
            debug!("  - presolve: merge xi({end}) with ..{bound}");
            context.int_variables[end].merge_bounds(i64::MIN, bound)?;
            context.constraints[position].nullify();
            return Ok(true);
        }
        if let (Some(bound), Some(variable)) = (context.bound_of(&lhs), rhs.int_var()) {
            let end = context.end_int_variable(variable)?;
            debug!("  - presolve: merge xi({end}) with {bound}..");
            context.int_variables[end].merge_bounds(bound, i64::MAX)?;
            context.constraints[position].nullify();
            return Ok(true);
        }
    }

    if id == "int_eq" {
        let lhs = context.constraints[position].arg(0).clone();
        let rhs = context.constraints[position].arg(1).clone();

        if let (Some(variable), Some(bound)) = (lhs.int_var(), context.bound_of(&rhs)) {
            let end = context.end_int_variable(variable)?;
            debug!("  - presolve: assign xi({end}) to {bound}");
            context.int_variables[end].merge_bounds(bound, bound)?;
            context.constraints[position].nullify();
            return Ok(true);
        }
        if let (Some(bound), Some(variable)) = (context.bound_of(&lhs), rhs.int_var()) {
            let end = context.end_int_variable(variable)?;
            debug!("  - presolve: assign xi({end}) to {bound}");
            context.int_variables[end].merge_bounds(bound, bound)?;
            context.constraints[position].nullify();
            return Ok(true);
        }

        // Equality between two plain variables can explain one orphan:
        // the orphan becomes the variable this constraint defines.
        if let (Some(first), Some(second)) = (lhs.int_var(), rhs.int_var()) {
            if context.constraints[position].annotations().is_none()
                && !context.stored_constraints.contains(&index)
                && (context.orphans.contains(&first) || context.orphans.contains(&second))
            {
                let _ = context.stored_constraints.insert(index);
                let orphan = if context.orphans.contains(&first) {
                    first
                } else {
                    second
                };
                debug!("  - presolve: aliasing orphan xi({orphan})");
                context.constraints[position]
                    .add_annotation(Node::Call(Call::new("defines_var", Node::IntVar(orphan))));
                let _ = context.orphans.remove(&orphan);
                return Ok(true);
            }
        }
    }

    if id == "set_in" {
        let lhs = context.constraints[position].arg(0).clone();
        let rhs = context.constraints[position].arg(1).clone();

        if let (Some(variable), Some(domain)) = (lhs.int_var(), rhs.set_lit()) {
            let end = context.end_int_variable(variable)?;
            debug!("  - presolve: merge xi({end}) with {domain}");
            match domain {
                SetLit::Interval { min, max } => {
                    context.int_variables[end].merge_bounds(*min, *max)?;
                }
                SetLit::Values(values) => {
                    context.int_variables[end].merge_values(values)?;
                }
            }
            context.constraints[position].nullify();
            return Ok(true);
        }
    }

    if id == "array_bool_and"
        && context.bound_of(context.constraints[position].arg(1)) == Some(1)
    {
        debug!("  - presolve: force array_bool_and c{index} to true");
        let forced: Vec<usize> = context.constraints[position]
            .arg(0)
            .array()
            .into_iter()
            .flatten()
            .filter_map(Node::bool_var)
            .collect();
        for variable in forced {
            context.bool_variables[variable].assign(true)?;
        }
        context.constraints[position].nullify();
        return Ok(true);
    }

    if id.ends_with("_reif")
        && context.bound_of(context.constraints[position].last_arg()) == Some(1)
    {
        debug!("  - presolve: unreify c{index} ({id})");
        context.constraints[position].unreify();
        return Ok(true);
    }

    if id == "all_different_int" && !context.stored_constraints.contains(&index) {
        let Some(items) = context.constraints[position].arg(0).array() else {
            return Ok(false);
        };
        let mut variables = Vec::with_capacity(items.len());
        for item in items {
            match item.int_var() {
                Some(variable) => variables.push(variable),
                None => return Ok(false),
            }
        }
        variables.sort_unstable();

        debug!("  - presolve: record all-different set of c{index}");
        let _ = context.stored_constraints.insert(index);
        if !context.all_differents.contains(&variables) {
            context.all_differents.push(variables);
        }
        return Ok(true);
    }

    if id == "array_var_int_element" {
        let value = context.constraints[position].arg(2).clone();
        if let Some(bound) = context.bound_of(&value) {
            if context.is_all_different(context.constraints[position].arg(1)) {
                debug!("  - presolve: specialize c{index} to array_var_int_position");
                context.constraints[position].set_id("array_var_int_position");
                context.constraints[position].replace_arg(2, Node::IntLit(bound));
                return Ok(true);
            }
        }
    }

    if id == "int_abs" && !context.stored_constraints.contains(&index) {
        let argument = context.constraints[position].arg(0).int_var();
        let result = context.constraints[position].arg(1).int_var();
        if let (Some(argument), Some(result)) = (argument, result) {
            let _ = context.abs_map.insert(result, argument);
            let _ = context.stored_constraints.insert(index);
            return Ok(true);
        }
    }

    // Comparisons of an absolute-value result against zero hold for the
    // argument as well, eliminating the intermediate variable. The rewrite
    // does not count as a rule firing (the fixpoint loop would not settle
    // otherwise).
    if matches!(id.as_str(), "int_eq_reif" | "int_ne_reif" | "int_ne") {
        let first = context.constraints[position].arg(0).clone();
        let second = context.constraints[position].arg(1).clone();
        if let (Some(variable), Some(0)) = (first.int_var(), second.int_lit()) {
            if let Some(&source) = context.abs_map.get(&variable) {
                debug!("  - presolve: strip abs from c{index}");
                context.constraints[position].replace_arg(0, Node::IntVar(source));
            }
        }
    }

    Ok(false)
}
