//! Resolves, for each constraint, which variable it defines and which
//! already-computed variables it requires as inputs.

use log::debug;

use super::context::CompilationContext;
use crate::ast::Node;
use crate::constraint::CtSpec;
use crate::containers::HashSet;

/// Strips bogus definition claims before any analysis runs: an `int_lin_eq`
/// carrying a `domain` annotation encodes a domain, it does not compute its
/// annotated target.
pub(crate) fn sanitize(context: &mut CompilationContext) {
    for spec in &mut context.constraints {
        if spec.id() == "int_lin_eq" && has_domain_annotation(spec.annotations()) {
            debug!("  - sanitize: remove defines from int_lin_eq c{}", spec.index());
            spec.remove_defines();
        }
    }
}

/// Flags introduced integer variables that no constraint is annotated to
/// define. Presolve may later explain them through an equality.
pub(crate) fn mark_orphans(context: &mut CompilationContext) {
    let mut targets: HashSet<usize> = HashSet::default();
    for spec in &context.constraints {
        if let Some(target) = find_target(context, spec.annotations()) {
            let _ = targets.insert(target);
        }
    }

    for (index, spec) in context.int_variables.iter().enumerate() {
        if spec.introduced && !targets.contains(&index) {
            debug!("  - mark xi({index}) as orphan");
            let _ = context.orphans.insert(index);
        }
    }
}

/// Computes the global candidate set and the final `defines`/`requires`
/// state of every active constraint.
pub(crate) fn run(context: &mut CompilationContext) {
    let mut candidates = HashSet::default();
    for spec in &context.constraints {
        if !spec.is_nullified() {
            compute_viable_target(context, spec, &mut candidates);
        }
    }

    for position in 0..context.constraints.len() {
        if context.constraints[position].is_nullified() {
            continue;
        }

        let define = match context.constraints[position].defines() {
            Some(target) => Some(target),
            None => find_target(context, context.constraints[position].annotations()),
        };

        let mut require = HashSet::default();
        collect_required(
            context,
            context.constraints[position].args(),
            &candidates,
            &mut require,
        );

        if let Some(define) = define {
            // A constraint never needs its own output as input.
            let _ = require.remove(&define);
            if candidates.contains(&define) {
                context.constraints[position].set_defines(define);
            }
        }
        *context.constraints[position].requires_mut() = require;
    }

    context.candidates = candidates;
}

/// The variable index named by a leading `defines_var` annotation.
pub(crate) fn find_target(
    context: &CompilationContext,
    annotations: Option<&Node>,
) -> Option<usize> {
    let Node::Array(items) = annotations? else {
        return None;
    };
    let call = items.first()?.as_call()?;
    if call.id != "defines_var" {
        return None;
    }
    context.var_index(&call.args)
}

fn has_domain_annotation(annotations: Option<&Node>) -> bool {
    annotations.is_some_and(|node| node.has_atom("domain"))
}

/// Adds the constraint's annotated target to `candidates` if its family is
/// on the closed allow-list of invertible constraints. Families outside the
/// list never produce a defined variable.
fn compute_viable_target(
    context: &CompilationContext,
    spec: &CtSpec,
    candidates: &mut HashSet<usize>,
) {
    let id = spec.id();

    let defines_int = matches!(
        id,
        "bool2int"
            | "int_plus"
            | "int_minus"
            | "int_times"
            | "array_int_element"
            | "int_abs"
            | "int_max"
            | "int_min"
            | "int_eq"
    ) || (id == "array_var_int_element" && !context.is_bound(spec.arg(2)))
        || (id == "int_lin_eq" && !has_domain_annotation(spec.annotations()));

    let defines_bool = matches!(
        id,
        "array_bool_and"
            | "array_bool_or"
            | "array_bool_element"
            | "int_lin_eq_reif"
            | "int_eq_reif"
            | "int_ne_reif"
            | "bool_eq_reif"
            | "bool_ne_reif"
    );

    if defines_int || defines_bool {
        if let Some(target) = find_target(context, spec.annotations()) {
            debug!("{id} -> candidate {target}");
            let _ = candidates.insert(target);
        }
    } else if id == "int2int" || id == "bool2bool" {
        if let Some(target) = context.var_index(spec.arg(1)) {
            debug!("{id} -> candidate {target}");
            let _ = candidates.insert(target);
        }
    }
}

/// Walks argument nodes, descending into arrays, and records every variable
/// reference whose index is in `candidates`. Only dependencies on variables
/// that are themselves computed matter for ordering.
fn collect_required(
    context: &CompilationContext,
    args: &[Node],
    candidates: &HashSet<usize>,
    require: &mut HashSet<usize>,
) {
    for node in args {
        match node {
            Node::Array(items) => collect_required(context, items, candidates, require),
            Node::IntVar(_) | Node::BoolVar(_) => {
                if let Some(index) = context.var_index(node) {
                    if candidates.contains(&index) {
                        let _ = require.insert(index);
                    }
                }
            }
            _ => {}
        }
    }
}
