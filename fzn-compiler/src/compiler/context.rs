//! The shared state threaded through every pipeline pass.

use crate::ast::Node;
use crate::ast::SetLit;
use crate::builder::ModelBuilder;
use crate::constraint::CtSpec;
use crate::containers::HashMap;
use crate::containers::HashSet;
use crate::error::CompileError;
use crate::variables::BoolVarSpec;
use crate::variables::IntVarSpec;
use crate::variables::SetVarSpec;

/// Owns the variable and constraint specs for the pipeline's duration.
///
/// Candidate, orphan, and rule registries live here so that every mutation
/// point is explicit at the pass call sites. Variable indices in the
/// candidate/orphan/defined sets use a single space: integer variable `i`
/// maps to `i`, boolean variable `b` maps to `num_int_variables + b`.
pub(crate) struct CompilationContext {
    pub(crate) int_variables: Vec<IntVarSpec>,
    pub(crate) bool_variables: Vec<BoolVarSpec>,
    pub(crate) set_variables: Vec<SetVarSpec>,
    pub(crate) constraints: Vec<CtSpec>,
    pub(crate) output: Vec<(String, Node)>,
    pub(crate) int_domain_constraints: Vec<(usize, SetLit)>,
    pub(crate) bool_domain_constraints: Vec<(usize, SetLit)>,
    pub(crate) had_error: bool,

    /// Variables some constraint is willing to define.
    pub(crate) candidates: HashSet<usize>,
    /// Variables reconstructed from other constraints' results.
    pub(crate) computed_variables: HashSet<usize>,
    /// Introduced variables with no constraint annotated to define them.
    pub(crate) orphans: HashSet<usize>,
    /// Constraints already consumed by a run-once presolve rule, keyed by
    /// creation-time index.
    pub(crate) stored_constraints: HashSet<usize>,
    /// Distinct variable sets known to be all-different, each sorted.
    pub(crate) all_differents: Vec<Vec<usize>>,
    /// Maps an absolute-value result variable to its argument variable.
    pub(crate) abs_map: HashMap<usize, usize>,
}

impl CompilationContext {
    pub(crate) fn new(model: ModelBuilder) -> CompilationContext {
        CompilationContext {
            int_variables: model.int_variables,
            bool_variables: model.bool_variables,
            set_variables: model.set_variables,
            constraints: model.constraints,
            output: model.output,
            int_domain_constraints: model.int_domain_constraints,
            bool_domain_constraints: model.bool_domain_constraints,
            had_error: model.had_error,

            candidates: HashSet::default(),
            computed_variables: HashSet::default(),
            orphans: HashSet::default(),
            stored_constraints: HashSet::default(),
            all_differents: Vec::default(),
            abs_map: HashMap::default(),
        }
    }

    /// The index of a variable-reference node in the unified index space.
    pub(crate) fn var_index(&self, node: &Node) -> Option<usize> {
        match node {
            Node::IntVar(index) => Some(*index),
            Node::BoolVar(index) => Some(self.int_variables.len() + *index),
            _ => None,
        }
    }

    /// Whether the variable at a unified index was front-end introduced.
    pub(crate) fn is_introduced(&self, index: usize) -> bool {
        if index < self.int_variables.len() {
            self.int_variables[index].introduced
        } else {
            self.bool_variables[index - self.int_variables.len()].introduced
        }
    }

    /// Follows the alias chain of an integer variable to its non-alias end.
    ///
    /// An alias chain of N links resolves in exactly N steps; taking more
    /// steps than there are variables means the chain is cyclic.
    pub(crate) fn end_int_variable(&self, start: usize) -> Result<usize, CompileError> {
        let mut index = start;
        let mut steps = 0;
        while let Some(target) = self.int_variables[index].alias {
            index = target;
            steps += 1;
            if steps > self.int_variables.len() {
                return Err(CompileError::CyclicAlias(
                    self.int_variables[start].name.clone(),
                ));
            }
        }
        Ok(index)
    }

    /// The literal value of a node, if it has one: a literal, or a variable
    /// that is already fully bound. Booleans are widened to 0/1.
    pub(crate) fn bound_of(&self, node: &Node) -> Option<i64> {
        match node {
            Node::IntLit(value) => Some(*value),
            Node::BoolLit(value) => Some(i64::from(*value)),
            Node::IntVar(index) => self.int_variables[*index].bound_value(),
            Node::BoolVar(index) => self.bool_variables[*index].bound_value().map(i64::from),
            _ => None,
        }
    }

    pub(crate) fn is_bound(&self, node: &Node) -> bool {
        self.bound_of(node).is_some()
    }

    /// Whether this exact variable set is already known to be all-different.
    pub(crate) fn is_all_different(&self, node: &Node) -> bool {
        let Some(items) = node.array() else {
            return false;
        };

        let mut variables = Vec::with_capacity(items.len());
        for item in items {
            match item.int_var() {
                Some(variable) => variables.push(variable),
                None => return false,
            }
        }
        variables.sort_unstable();

        self.all_differents.iter().any(|known| *known == variables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with_int_vars(specs: Vec<IntVarSpec>) -> CompilationContext {
        let mut builder = ModelBuilder::new();
        for spec in specs {
            let _ = builder.add_int_var(spec);
        }
        CompilationContext::new(builder)
    }

    #[test]
    fn alias_chain_resolves_to_non_alias_end() {
        let context = context_with_int_vars(vec![
            IntVarSpec::new("x0", None),
            IntVarSpec::alias_of("x1", 0),
            IntVarSpec::alias_of("x2", 1),
            IntVarSpec::alias_of("x3", 2),
        ]);

        assert_eq!(context.end_int_variable(3).expect("acyclic chain"), 0);
        assert_eq!(context.end_int_variable(0).expect("not an alias"), 0);
    }

    #[test]
    fn cyclic_alias_chain_is_a_fatal_error() {
        let context = context_with_int_vars(vec![
            IntVarSpec::alias_of("x0", 1),
            IntVarSpec::alias_of("x1", 0),
        ]);

        assert!(matches!(
            context.end_int_variable(0),
            Err(CompileError::CyclicAlias(_))
        ));
    }

    #[test]
    fn bool_variables_share_the_index_space_after_integers() {
        let mut builder = ModelBuilder::new();
        let _ = builder.add_int_var(IntVarSpec::new("x", None));
        let _ = builder.add_int_var(IntVarSpec::new("y", None));
        let _ = builder.add_bool_var(BoolVarSpec::new("b"));
        let context = CompilationContext::new(builder);

        assert_eq!(context.var_index(&Node::IntVar(1)), Some(1));
        assert_eq!(context.var_index(&Node::BoolVar(0)), Some(2));
        assert_eq!(context.var_index(&Node::IntLit(3)), None);
    }

    #[test]
    fn bound_of_sees_through_assignments_and_singleton_domains() {
        let context = context_with_int_vars(vec![
            IntVarSpec::constant("x", 4),
            IntVarSpec::new("y", Some(SetLit::Interval { min: 2, max: 9 })),
        ]);

        assert_eq!(context.bound_of(&Node::IntVar(0)), Some(4));
        assert_eq!(context.bound_of(&Node::IntVar(1)), None);
        assert_eq!(context.bound_of(&Node::BoolLit(true)), Some(1));
    }
}
