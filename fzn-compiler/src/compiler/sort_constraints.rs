//! Orders constraints so every defined variable is computed before use.

use log::debug;

use super::context::CompilationContext;
use crate::containers::HashSet;
use crate::error::CompileError;

/// Reorders `context.constraints` into a valid evaluation order.
///
/// Defining constraints without dependencies go first, then the remaining
/// defining constraints in dependency closure order, then everything that
/// defines nothing. A closure round that places no constraint means the
/// definitions left over depend on each other, which is fatal.
pub(crate) fn run(context: &mut CompilationContext) -> Result<(), CompileError> {
    let mut defines_only = Vec::new();
    let mut no_defines = Vec::new();
    let mut defines_and_require = Vec::new();
    let mut nullified = Vec::new();

    for spec in std::mem::take(&mut context.constraints) {
        if spec.is_nullified() {
            nullified.push(spec);
        } else if spec.defines().is_none() {
            no_defines.push(spec);
        } else if spec.requires().is_empty() {
            defines_only.push(spec);
        } else {
            defines_and_require.push(spec);
        }
    }

    debug!("  - defines only        : {}", defines_only.len());
    debug!("  - no defines          : {}", no_defines.len());
    debug!("  - defines and require : {}", defines_and_require.len());

    let mut defined: HashSet<usize> = HashSet::default();
    let mut ordered =
        Vec::with_capacity(defines_only.len() + no_defines.len() + defines_and_require.len());
    for spec in defines_only {
        if let Some(target) = spec.defines() {
            let _ = defined.insert(target);
        }
        ordered.push(spec);
    }

    let mut to_insert = defines_and_require;
    while !to_insert.is_empty() {
        let mut deferred = Vec::with_capacity(to_insert.len());
        let mut inserted_any = false;

        for spec in to_insert {
            if spec.requires().iter().all(|required| defined.contains(required)) {
                if let Some(target) = spec.defines() {
                    let _ = defined.insert(target);
                }
                ordered.push(spec);
                inserted_any = true;
            } else {
                deferred.push(spec);
            }
        }

        if !inserted_any {
            let cycle = deferred
                .iter()
                .filter_map(|spec| spec.defines())
                .map(|target| variable_name(context, target))
                .collect();
            return Err(CompileError::DefinitionCycle(cycle));
        }
        to_insert = deferred;
    }

    ordered.extend(no_defines);
    ordered.extend(nullified);
    context.constraints = ordered;
    Ok(())
}

fn variable_name(context: &CompilationContext, index: usize) -> String {
    if index < context.int_variables.len() {
        context.int_variables[index].name.clone()
    } else {
        context.bool_variables[index - context.int_variables.len()]
            .name
            .clone()
    }
}
