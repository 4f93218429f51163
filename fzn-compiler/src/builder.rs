//! The append-only registration surface used by the front end.

use log::error;

use crate::ast::Node;
use crate::ast::SetLit;
use crate::compiler;
use crate::constraint::CtSpec;
use crate::containers::HashMap;
use crate::error::CompileError;
use crate::sink::ModelSink;
use crate::variables::BoolVarSpec;
use crate::variables::IntVarSpec;
use crate::variables::SetVarSpec;

/// Accumulates variable declarations, constraint calls, and output bindings,
/// then compiles them into an ordered, dependency-resolved program.
///
/// Malformed input (undefined identifiers, out-of-range array accesses) is
/// recoverable at registration time: the lookup reports the error, sets the
/// hard-error flag, and substitutes a placeholder node so the front end can
/// keep scanning for further errors. Once the flag is set, nothing is
/// materialized into the model sink.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    pub(crate) int_variables: Vec<IntVarSpec>,
    pub(crate) bool_variables: Vec<BoolVarSpec>,
    pub(crate) set_variables: Vec<SetVarSpec>,
    pub(crate) constraints: Vec<CtSpec>,
    pub(crate) output: Vec<(String, Node)>,
    pub(crate) int_domain_constraints: Vec<(usize, SetLit)>,
    pub(crate) bool_domain_constraints: Vec<(usize, SetLit)>,
    pub(crate) had_error: bool,

    int_var_names: HashMap<String, usize>,
    bool_var_names: HashMap<String, usize>,
    set_var_names: HashMap<String, usize>,
    int_var_arrays: HashMap<String, Vec<usize>>,
    bool_var_arrays: HashMap<String, Vec<usize>>,
    set_var_arrays: HashMap<String, Vec<usize>>,
    int_value_arrays: HashMap<String, Vec<i64>>,
    bool_value_arrays: HashMap<String, Vec<bool>>,
    set_value_arrays: HashMap<String, Vec<SetLit>>,
}

impl ModelBuilder {
    pub fn new() -> ModelBuilder {
        ModelBuilder::default()
    }

    /// Declares an integer variable and returns its index.
    pub fn add_int_var(&mut self, spec: IntVarSpec) -> usize {
        let index = self.int_variables.len();
        let _ = self.int_var_names.insert(spec.name.clone(), index);
        self.int_variables.push(spec);
        index
    }

    /// Declares a boolean variable and returns its index.
    pub fn add_bool_var(&mut self, spec: BoolVarSpec) -> usize {
        let index = self.bool_variables.len();
        let _ = self.bool_var_names.insert(spec.name.clone(), index);
        self.bool_variables.push(spec);
        index
    }

    /// Declares a set variable and returns its index.
    pub fn add_set_var(&mut self, spec: SetVarSpec) -> usize {
        let index = self.set_variables.len();
        let _ = self.set_var_names.insert(spec.name.clone(), index);
        self.set_variables.push(spec);
        index
    }

    /// Registers one constraint call.
    pub fn add_constraint(
        &mut self,
        id: impl Into<String>,
        args: Vec<Node>,
        annotations: Option<Node>,
    ) {
        self.constraints
            .push(CtSpec::new(self.constraints.len(), id, args, annotations));
    }

    /// Registers an output binding.
    pub fn add_output(&mut self, name: impl Into<String>, value: Node) {
        self.output.push((name.into(), value));
    }

    /// Queues a deferred domain reduction for an integer variable.
    pub fn add_int_domain_constraint(&mut self, variable: usize, domain: SetLit) {
        self.int_domain_constraints.push((variable, domain));
    }

    /// Queues a deferred domain reduction for a boolean variable.
    pub fn add_bool_domain_constraint(&mut self, variable: usize, domain: SetLit) {
        self.bool_domain_constraints.push((variable, domain));
    }

    pub fn add_int_var_array(&mut self, name: impl Into<String>, variables: Vec<usize>) {
        let _ = self.int_var_arrays.insert(name.into(), variables);
    }

    pub fn add_bool_var_array(&mut self, name: impl Into<String>, variables: Vec<usize>) {
        let _ = self.bool_var_arrays.insert(name.into(), variables);
    }

    pub fn add_set_var_array(&mut self, name: impl Into<String>, variables: Vec<usize>) {
        let _ = self.set_var_arrays.insert(name.into(), variables);
    }

    pub fn add_int_value_array(&mut self, name: impl Into<String>, values: Vec<i64>) {
        let _ = self.int_value_arrays.insert(name.into(), values);
    }

    pub fn add_bool_value_array(&mut self, name: impl Into<String>, values: Vec<bool>) {
        let _ = self.bool_value_arrays.insert(name.into(), values);
    }

    pub fn add_set_value_array(&mut self, name: impl Into<String>, values: Vec<SetLit>) {
        let _ = self.set_value_arrays.insert(name.into(), values);
    }

    /// Resolves an identifier to a variable-reference node.
    ///
    /// Inside annotations an unknown identifier is a bare atom; everywhere
    /// else it is an input error, reported and replaced by a placeholder so
    /// scanning can continue.
    pub fn var_ref_arg(&mut self, id: &str, in_annotation: bool) -> Node {
        if let Some(&index) = self.int_var_names.get(id) {
            return Node::IntVar(index);
        }
        if let Some(&index) = self.bool_var_names.get(id) {
            return Node::BoolVar(index);
        }
        if let Some(&index) = self.set_var_names.get(id) {
            return Node::SetVar(index);
        }
        if in_annotation {
            return Node::Atom(id.to_owned());
        }

        error!("undefined variable '{id}'");
        self.had_error = true;
        Node::IntVar(0)
    }

    /// Resolves a 1-based element access into a registered array.
    pub fn array_element(&mut self, id: &str, offset: usize) -> Node {
        if offset > 0 {
            if let Some(variables) = self.int_var_arrays.get(id) {
                if offset <= variables.len() {
                    return Node::IntVar(variables[offset - 1]);
                }
            }
            if let Some(variables) = self.bool_var_arrays.get(id) {
                if offset <= variables.len() {
                    return Node::BoolVar(variables[offset - 1]);
                }
            }
            if let Some(variables) = self.set_var_arrays.get(id) {
                if offset <= variables.len() {
                    return Node::SetVar(variables[offset - 1]);
                }
            }
            if let Some(values) = self.int_value_arrays.get(id) {
                if offset <= values.len() {
                    return Node::IntLit(values[offset - 1]);
                }
            }
            if let Some(values) = self.bool_value_arrays.get(id) {
                if offset <= values.len() {
                    return Node::BoolLit(values[offset - 1]);
                }
            }
            if let Some(values) = self.set_value_arrays.get(id) {
                if offset <= values.len() {
                    return Node::SetLit(values[offset - 1].clone());
                }
            }
        }

        error!("invalid array access '{id}[{offset}]'");
        self.had_error = true;
        Node::IntVar(0)
    }

    /// Marks the input as malformed, suppressing materialization.
    pub fn set_error(&mut self) {
        self.had_error = true;
    }

    pub fn has_error(&self) -> bool {
        self.had_error
    }

    /// Runs the full pipeline and materializes the result into `sink`.
    pub fn compile<S: ModelSink>(self, sink: &mut S) -> Result<(), CompileError> {
        compiler::compile(self, sink)
    }
}
