//! The transformation pipeline: dependency analysis, presolve, alias
//! elimination, topological scheduling, and materialization.

mod add_alias_constraints;
mod compute_dependencies;
mod context;
mod create_model;
mod presolve_constraints;
mod sort_constraints;

use std::collections::BTreeMap;

use context::CompilationContext;
use log::debug;

use crate::builder::ModelBuilder;
use crate::error::CompileError;
use crate::output;
use crate::sink::ModelSink;

pub(crate) fn compile<S: ModelSink>(
    model: ModelBuilder,
    sink: &mut S,
) -> Result<(), CompileError> {
    let mut context = CompilationContext::new(model);

    if context.had_error {
        // Input errors were reported at registration; the sink stays
        // unpopulated, only the output composition is handed over.
        sink.init_output(output::compose(std::mem::take(&mut context.output)));
        return Ok(());
    }

    compute_dependencies::sanitize(&mut context);
    compute_dependencies::mark_orphans(&mut context);
    presolve_constraints::run(&mut context)?;
    add_alias_constraints::run(&mut context);
    log_constraint_census(&context);

    for position in 0..context.constraints.len() {
        if context.constraints[position].id() == "array_bool_or"
            && !context.constraints[position].is_nullified()
        {
            presolve_constraints::strongify(&mut context, position);
        }
    }

    compute_dependencies::run(&mut context);
    sort_constraints::run(&mut context)?;
    create_model::run(&mut context, sink)
}

/// Per-family counts of the active constraints, including synthesized alias
/// equalities.
fn log_constraint_census(context: &CompilationContext) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let mut census: BTreeMap<&str, usize> = BTreeMap::new();
    for spec in &context.constraints {
        if !spec.is_nullified() {
            *census.entry(spec.id()).or_default() += 1;
        }
    }
    debug!("model statistics");
    for (id, count) in census {
        debug!("  - {id}: {count}");
    }
}
