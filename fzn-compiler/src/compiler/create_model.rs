//! Materializes the ordered program into a model sink.

use log::debug;

use super::context::CompilationContext;
use crate::ast::Node;
use crate::ast::SetLit;
use crate::error::CompileError;
use crate::output;
use crate::sink::ModelSink;

pub(crate) fn run<S: ModelSink>(
    context: &mut CompilationContext,
    sink: &mut S,
) -> Result<(), CompileError> {
    mark_computed_variables(context);

    sink.init(
        context.int_variables.len(),
        context.bool_variables.len(),
        context.set_variables.len(),
    );

    debug!("creating variables");

    let mut names = DisplayNames::default();
    for variable in 0..context.int_variables.len() {
        let spec = &context.int_variables[variable];
        let name = names.next(&spec.name);
        if context.candidates.contains(&variable) {
            debug!("  - xi({variable}) skipped");
            sink.skip_int_var();
            // The defining constraint knows nothing about the declared
            // domain, so the domain is reimposed after posting.
            if spec.alias.is_none() && spec.assigned.is_none() {
                if let Some(domain) = &spec.domain {
                    context
                        .int_domain_constraints
                        .push((variable, domain.clone()));
                }
            }
        } else {
            let active =
                !spec.introduced && !context.computed_variables.contains(&variable);
            sink.new_int_var(&name, spec, active);
        }
    }

    let mut names = DisplayNames::default();
    let num_int_variables = context.int_variables.len();
    for variable in 0..context.bool_variables.len() {
        let spec = &context.bool_variables[variable];
        let name = names.next(&spec.name);
        if context.candidates.contains(&(num_int_variables + variable)) {
            debug!("  - xb({variable}) skipped");
            sink.skip_bool_var();
        } else {
            sink.new_bool_var(&name, spec);
        }
    }

    let mut names = DisplayNames::default();
    for spec in &context.set_variables {
        let name = names.next(&spec.name);
        sink.new_set_var(&name, spec);
    }

    debug!("creating constraints");

    for spec in &context.constraints {
        if !spec.is_nullified() {
            sink.post_constraint(spec);
        }
    }

    debug!("adding domain constraints");

    for (variable, domain) in context.int_domain_constraints.iter().rev() {
        let (lb, ub) = sink.int_var_bounds(*variable);
        match domain {
            SetLit::Interval { min, max } => {
                if *min > lb || *max < ub {
                    if *min > ub || *max < lb {
                        return Err(CompileError::InfeasibleDomain {
                            variable: context.int_variables[*variable].name.clone(),
                            narrowing: domain.to_string(),
                        });
                    }
                    debug!("  - reduce xi({variable}) to {domain}");
                    // Clamp to the intersection; a partially overlapping
                    // interval must not widen the other side.
                    sink.set_int_range(*variable, (*min).max(lb), (*max).min(ub));
                }
            }
            SetLit::Values(values) => {
                let kept: Vec<i64> = values
                    .iter()
                    .copied()
                    .filter(|value| *value >= lb && *value <= ub)
                    .collect();
                if kept.is_empty() {
                    return Err(CompileError::InfeasibleDomain {
                        variable: context.int_variables[*variable].name.clone(),
                        narrowing: domain.to_string(),
                    });
                }
                debug!("  - reduce xi({variable}) to {domain}");
                sink.set_int_values(*variable, &kept);
            }
        }
    }

    for (variable, domain) in context.bool_domain_constraints.iter().rev() {
        debug!("  - reduce xb({variable}) to {domain}");
        match domain {
            SetLit::Interval { min, max } => sink.set_bool_range(*variable, *min, *max),
            SetLit::Values(values) => sink.set_bool_values(*variable, values),
        }
    }

    sink.init_output(output::compose(std::mem::take(&mut context.output)));
    Ok(())
}

/// Variables a `global_cardinality` constraint counts into are reconstructed
/// from its result, never searched over.
fn mark_computed_variables(context: &mut CompilationContext) {
    let mut computed = std::mem::take(&mut context.computed_variables);
    for spec in &context.constraints {
        if spec.id() == "global_cardinality" && !spec.is_nullified() {
            debug!("  - mark counts of c{} as computed", spec.index());
            mark_all_variables(context, spec.arg(2), &mut computed);
        }
    }
    context.computed_variables = computed;
}

fn mark_all_variables(
    context: &CompilationContext,
    node: &Node,
    computed: &mut crate::containers::HashSet<usize>,
) {
    match node {
        Node::Array(items) => {
            for item in items {
                mark_all_variables(context, item, computed);
            }
        }
        Node::IntVar(_) | Node::BoolVar(_) => {
            if let Some(index) = context.var_index(node) {
                let _ = computed.insert(index);
            }
        }
        _ => {}
    }
}

/// Derives solver-facing display names.
///
/// Variables flattened out of an array arrive with a `[`-prefixed raw name;
/// consecutive such names share the stripped base and get 1-based positions
/// appended.
#[derive(Default)]
struct DisplayNames {
    array_index: usize,
}

impl DisplayNames {
    fn next(&mut self, raw_name: &str) -> String {
        if let Some(base) = raw_name.strip_prefix('[') {
            self.array_index += 1;
            format!("{base}[{}]", self.array_index)
        } else if self.array_index == 0 {
            raw_name.to_owned()
        } else {
            let name = format!("{raw_name}[{}]", self.array_index + 1);
            self.array_index = 0;
            name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_pass_through() {
        let mut names = DisplayNames::default();
        assert_eq!(names.next("x"), "x");
        assert_eq!(names.next("y"), "y");
    }

    #[test]
    fn array_prefixed_names_get_positions() {
        let mut names = DisplayNames::default();
        assert_eq!(names.next("[xs"), "xs[1]");
        assert_eq!(names.next("[xs"), "xs[2]");
        assert_eq!(names.next("[xs"), "xs[3]");
    }

    #[test]
    fn name_following_an_array_run_closes_the_run() {
        let mut names = DisplayNames::default();
        assert_eq!(names.next("[xs"), "xs[1]");
        assert_eq!(names.next("y"), "y[2]");
        assert_eq!(names.next("z"), "z");
    }
}
