//! End-to-end tests driving the full pipeline into a recording sink.

use fzn_compiler::ast::{Call, Node, SetLit};
use fzn_compiler::constraint::CtSpec;
use fzn_compiler::variables::{BoolVarSpec, IntVarSpec, SetVarSpec};
use fzn_compiler::{CompileError, ModelBuilder, ModelSink};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, PartialEq)]
enum VarEvent {
    Int {
        name: String,
        domain: Option<SetLit>,
        active: bool,
    },
    SkippedInt,
    Bool {
        name: String,
        assigned: Option<bool>,
    },
    SkippedBool,
    Set {
        name: String,
    },
}

/// Records every sink call for later inspection.
#[derive(Debug, Default)]
struct RecordingSink {
    initialized: Option<(usize, usize, usize)>,
    variables: Vec<VarEvent>,
    posted: Vec<(String, Vec<Node>)>,
    int_bounds: Vec<(i64, i64)>,
    range_reductions: Vec<(usize, i64, i64)>,
    value_reductions: Vec<(usize, Vec<i64>)>,
    bool_reductions: Vec<(usize, i64, i64)>,
    output: Option<Vec<Node>>,
}

impl ModelSink for RecordingSink {
    fn init(&mut self, num_int_vars: usize, num_bool_vars: usize, num_set_vars: usize) {
        self.initialized = Some((num_int_vars, num_bool_vars, num_set_vars));
        self.int_bounds = vec![(i64::MIN, i64::MAX); num_int_vars];
    }

    fn new_int_var(&mut self, name: &str, spec: &IntVarSpec, active: bool) {
        let index = self
            .variables
            .iter()
            .filter(|event| matches!(event, VarEvent::Int { .. } | VarEvent::SkippedInt))
            .count();
        if let Some(SetLit::Interval { min, max }) = &spec.domain {
            self.int_bounds[index] = (*min, *max);
        }
        self.variables.push(VarEvent::Int {
            name: name.to_owned(),
            domain: spec.domain.clone(),
            active,
        });
    }

    fn skip_int_var(&mut self) {
        self.variables.push(VarEvent::SkippedInt);
    }

    fn new_bool_var(&mut self, name: &str, spec: &BoolVarSpec) {
        self.variables.push(VarEvent::Bool {
            name: name.to_owned(),
            assigned: spec.assigned,
        });
    }

    fn skip_bool_var(&mut self) {
        self.variables.push(VarEvent::SkippedBool);
    }

    fn new_set_var(&mut self, name: &str, _spec: &SetVarSpec) {
        self.variables.push(VarEvent::Set {
            name: name.to_owned(),
        });
    }

    fn post_constraint(&mut self, spec: &CtSpec) {
        self.posted.push((spec.id().to_owned(), spec.args().to_vec()));
    }

    fn int_var_bounds(&self, variable: usize) -> (i64, i64) {
        self.int_bounds[variable]
    }

    fn set_int_range(&mut self, variable: usize, min: i64, max: i64) {
        self.int_bounds[variable] = (min, max);
        self.range_reductions.push((variable, min, max));
    }

    fn set_int_values(&mut self, variable: usize, values: &[i64]) {
        self.value_reductions.push((variable, values.to_vec()));
    }

    fn set_bool_range(&mut self, variable: usize, min: i64, max: i64) {
        self.bool_reductions.push((variable, min, max));
    }

    fn set_bool_values(&mut self, variable: usize, values: &[i64]) {
        let _ = (variable, values);
    }

    fn init_output(&mut self, output: Vec<Node>) {
        self.output = Some(output);
    }
}

fn defines_var(target: Node) -> Option<Node> {
    Some(Node::Array(vec![Node::Call(Call::new(
        "defines_var",
        target,
    ))]))
}

#[test]
fn literal_equalities_vanish_and_domains_arrive_narrowed() {
    init_logger();
    let mut builder = ModelBuilder::new();
    let v = builder.add_int_var(IntVarSpec::new(
        "v",
        Some(SetLit::Interval { min: 0, max: 10 }),
    ));
    builder.add_constraint("int_eq", vec![Node::IntVar(v), Node::IntLit(3)], None);

    let mut sink = RecordingSink::default();
    builder.compile(&mut sink).expect("feasible model");

    assert!(sink.posted.is_empty());
    assert!(sink.value_reductions.is_empty());
    assert_eq!(
        sink.variables,
        vec![VarEvent::Int {
            name: "v".to_owned(),
            domain: Some(SetLit::Interval { min: 3, max: 3 }),
            active: true,
        }]
    );
}

#[test]
fn definitions_are_posted_before_their_uses() {
    init_logger();
    let mut builder = ModelBuilder::new();
    let a = builder.add_int_var(IntVarSpec::new("a", None));
    let b = builder.add_int_var(IntVarSpec::new("b", None).introduced());
    let c = builder.add_int_var(IntVarSpec::new("c", None).introduced());
    builder.add_constraint(
        "int_times",
        vec![Node::IntVar(b), Node::IntVar(a), Node::IntVar(c)],
        defines_var(Node::IntVar(c)),
    );
    builder.add_constraint("int_lt", vec![Node::IntVar(c), Node::IntLit(100)], None);
    builder.add_constraint(
        "int_plus",
        vec![Node::IntVar(a), Node::IntVar(a), Node::IntVar(b)],
        defines_var(Node::IntVar(b)),
    );

    let mut sink = RecordingSink::default();
    builder.compile(&mut sink).expect("feasible model");

    let order: Vec<&str> = sink.posted.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(order, vec!["int_plus", "int_times", "int_lt"]);

    // The two defined variables are skipped, the declared one is active.
    assert_eq!(
        sink.variables,
        vec![
            VarEvent::Int {
                name: "a".to_owned(),
                domain: None,
                active: true,
            },
            VarEvent::SkippedInt,
            VarEvent::SkippedInt,
        ]
    );
}

#[test]
fn skipped_variable_domains_come_back_as_deferred_reductions() {
    init_logger();
    let mut builder = ModelBuilder::new();
    let a = builder.add_int_var(IntVarSpec::new("a", None));
    let b = builder.add_int_var(IntVarSpec::new(
        "b",
        Some(SetLit::Interval { min: 0, max: 10 }),
    ));
    builder.add_constraint(
        "int_plus",
        vec![Node::IntVar(a), Node::IntVar(a), Node::IntVar(b)],
        defines_var(Node::IntVar(b)),
    );

    let mut sink = RecordingSink::default();
    builder.compile(&mut sink).expect("feasible model");

    assert_eq!(sink.variables[1], VarEvent::SkippedInt);
    assert_eq!(sink.range_reductions, vec![(b, 0, 10)]);
}

#[test]
fn registered_domain_constraints_apply_in_reverse_and_narrow_monotonically() {
    init_logger();
    let mut builder = ModelBuilder::new();
    let v = builder.add_int_var(IntVarSpec::new("v", None));
    builder.add_int_domain_constraint(v, SetLit::Interval { min: 0, max: 100 });
    builder.add_int_domain_constraint(v, SetLit::Interval { min: 10, max: 20 });

    let mut sink = RecordingSink::default();
    builder.compile(&mut sink).expect("feasible model");

    // Last registered applies first; the earlier, wider one is not narrower
    // than the sink's bounds by then and is dropped.
    assert_eq!(sink.range_reductions, vec![(v, 10, 20)]);
}

#[test]
fn partially_overlapping_deferred_domains_clamp_to_the_intersection() {
    init_logger();
    let mut builder = ModelBuilder::new();
    let v = builder.add_int_var(IntVarSpec::new(
        "v",
        Some(SetLit::Interval { min: 5, max: 10 }),
    ));
    builder.add_int_domain_constraint(v, SetLit::Interval { min: 0, max: 8 });

    let mut sink = RecordingSink::default();
    builder.compile(&mut sink).expect("feasible model");

    // The deferred interval reaches below the declared minimum; only the
    // upper bound may tighten.
    assert_eq!(sink.range_reductions, vec![(v, 5, 8)]);
    assert_eq!(sink.int_bounds[v], (5, 8));
}

#[test]
fn contradicting_deferred_domains_are_infeasible() {
    init_logger();
    let mut builder = ModelBuilder::new();
    let v = builder.add_int_var(IntVarSpec::new("v", None));
    builder.add_int_domain_constraint(v, SetLit::Interval { min: 0, max: 5 });
    builder.add_int_domain_constraint(v, SetLit::Interval { min: 10, max: 20 });

    let mut sink = RecordingSink::default();
    let result = builder.compile(&mut sink);

    assert!(matches!(
        result,
        Err(CompileError::InfeasibleDomain { .. })
    ));
}

#[test]
fn boolean_domain_constraints_apply_unchecked() {
    init_logger();
    let mut builder = ModelBuilder::new();
    let b = builder.add_bool_var(BoolVarSpec::new("b"));
    builder.add_bool_domain_constraint(b, SetLit::Interval { min: 1, max: 1 });

    let mut sink = RecordingSink::default();
    builder.compile(&mut sink).expect("feasible model");

    assert_eq!(sink.bool_reductions, vec![(b, 1, 1)]);
}

#[test]
fn infeasible_presolve_aborts_before_materialization() {
    init_logger();
    let mut builder = ModelBuilder::new();
    let v = builder.add_int_var(IntVarSpec::new(
        "v",
        Some(SetLit::Interval { min: 0, max: 10 }),
    ));
    builder.add_constraint("int_eq", vec![Node::IntVar(v), Node::IntLit(3)], None);
    builder.add_constraint("int_eq", vec![Node::IntVar(v), Node::IntLit(7)], None);

    let mut sink = RecordingSink::default();
    let result = builder.compile(&mut sink);

    assert!(matches!(
        result,
        Err(CompileError::InfeasibleDomain { .. })
    ));
    assert!(sink.initialized.is_none());
}

#[test]
fn definition_cycles_are_fatal() {
    init_logger();
    let mut builder = ModelBuilder::new();
    let a = builder.add_int_var(IntVarSpec::new("a", None).introduced());
    let b = builder.add_int_var(IntVarSpec::new("b", None).introduced());
    builder.add_constraint(
        "int_plus",
        vec![Node::IntVar(b), Node::IntLit(1), Node::IntVar(a)],
        defines_var(Node::IntVar(a)),
    );
    builder.add_constraint(
        "int_plus",
        vec![Node::IntVar(a), Node::IntLit(1), Node::IntVar(b)],
        defines_var(Node::IntVar(b)),
    );

    let mut sink = RecordingSink::default();
    let result = builder.compile(&mut sink);

    assert!(matches!(result, Err(CompileError::DefinitionCycle(_))));
}

#[test]
fn aliases_become_equality_constraints() {
    init_logger();
    let mut builder = ModelBuilder::new();
    let x = builder.add_int_var(IntVarSpec::new("x", None));
    let y = builder.add_int_var(IntVarSpec::alias_of("y", x));
    builder.add_constraint("int_lt", vec![Node::IntVar(y), Node::IntLit(5)], None);

    let mut sink = RecordingSink::default();
    builder.compile(&mut sink).expect("feasible model");

    assert_eq!(
        sink.posted[0],
        (
            "int2int".to_owned(),
            vec![Node::IntVar(x), Node::IntVar(y)]
        )
    );
    assert_eq!(sink.variables[1], VarEvent::SkippedInt);
}

#[test]
fn unreified_constraints_lose_their_control_argument() {
    init_logger();
    let mut builder = ModelBuilder::new();
    let v = builder.add_int_var(IntVarSpec::new("v", None));
    let control = builder.add_bool_var(BoolVarSpec::constant("control", true));
    builder.add_constraint(
        "int_lt_reif",
        vec![Node::IntVar(v), Node::IntLit(5), Node::BoolVar(control)],
        None,
    );

    let mut sink = RecordingSink::default();
    builder.compile(&mut sink).expect("feasible model");

    assert_eq!(
        sink.posted,
        vec![(
            "int_lt".to_owned(),
            vec![Node::IntVar(v), Node::IntLit(5)]
        )]
    );
}

#[test]
fn bound_element_over_all_different_variables_is_specialized() {
    init_logger();
    let mut builder = ModelBuilder::new();
    let xs: Vec<usize> = (0..3)
        .map(|i| builder.add_int_var(IntVarSpec::new(format!("x{i}"), None)))
        .collect();
    let idx = builder.add_int_var(IntVarSpec::new("idx", None));
    let array = Node::Array(xs.iter().map(|&x| Node::IntVar(x)).collect());
    builder.add_constraint("all_different_int", vec![array.clone()], None);
    builder.add_constraint(
        "array_var_int_element",
        vec![Node::IntVar(idx), array, Node::IntLit(2)],
        None,
    );

    let mut sink = RecordingSink::default();
    builder.compile(&mut sink).expect("feasible model");

    let ids: Vec<&str> = sink.posted.iter().map(|(id, _)| id.as_str()).collect();
    assert!(ids.contains(&"array_var_int_position"));
    assert!(!ids.contains(&"array_var_int_element"));
}

#[test]
fn hard_errors_suppress_materialization_but_not_output() {
    init_logger();
    let mut builder = ModelBuilder::new();
    let _ = builder.add_int_var(IntVarSpec::new("x", None));
    let node = builder.var_ref_arg("unknown", false);
    builder.add_constraint("int_eq", vec![node, Node::IntLit(1)], None);
    builder.add_output("x", Node::IntLit(4));

    let mut sink = RecordingSink::default();
    builder.compile(&mut sink).expect("input errors are not fatal");

    assert!(sink.initialized.is_none());
    assert!(sink.variables.is_empty());
    assert!(sink.posted.is_empty());
    assert_eq!(
        sink.output,
        Some(vec![
            Node::Str("x = ".to_owned()),
            Node::IntLit(4),
            Node::Str(";\n".to_owned()),
        ])
    );
}

#[test]
fn output_bindings_are_composed_sorted_with_arrays_spliced() {
    init_logger();
    let mut builder = ModelBuilder::new();
    let x = builder.add_int_var(IntVarSpec::new("x", None));
    builder.add_output(
        "ys",
        Node::Array(vec![Node::IntLit(1), Node::IntLit(2)]),
    );
    builder.add_output("x", Node::IntVar(x));

    let mut sink = RecordingSink::default();
    builder.compile(&mut sink).expect("feasible model");

    assert_eq!(
        sink.output,
        Some(vec![
            Node::Str("x = ".to_owned()),
            Node::IntVar(x),
            Node::Str(";\n".to_owned()),
            Node::Str("ys = ".to_owned()),
            Node::IntLit(1),
            Node::IntLit(2),
            Node::Str(";\n".to_owned()),
        ])
    );
}

#[test]
fn global_cardinality_counts_are_not_active() {
    init_logger();
    let mut builder = ModelBuilder::new();
    let x = builder.add_int_var(IntVarSpec::new("x", None));
    let count = builder.add_int_var(IntVarSpec::new("count", None));
    builder.add_constraint(
        "global_cardinality",
        vec![
            Node::Array(vec![Node::IntVar(x)]),
            Node::Array(vec![Node::IntLit(1)]),
            Node::Array(vec![Node::IntVar(count)]),
        ],
        None,
    );

    let mut sink = RecordingSink::default();
    builder.compile(&mut sink).expect("feasible model");

    assert_eq!(
        sink.variables[count],
        VarEvent::Int {
            name: "count".to_owned(),
            domain: None,
            active: false,
        }
    );
}
