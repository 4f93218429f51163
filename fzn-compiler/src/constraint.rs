//! One constraint occurrence, with its identity and dependency state.

use crate::ast::Node;
use crate::containers::HashSet;

/// Wraps one constraint call.
///
/// `index` is a stable identity assigned at creation; it is independent of
/// the constraint's position in the final ordered list and never changes.
/// Rule registries are keyed by it, so they stay correct across reordering.
#[derive(Clone, Debug)]
pub struct CtSpec {
    index: usize,
    id: String,
    args: Vec<Node>,
    annotations: Option<Node>,
    defines: Option<usize>,
    requires: HashSet<usize>,
    nullified: bool,
}

impl CtSpec {
    pub fn new(
        index: usize,
        id: impl Into<String>,
        args: Vec<Node>,
        annotations: Option<Node>,
    ) -> CtSpec {
        CtSpec {
            index,
            id: id.into(),
            args,
            annotations,
            defines: None,
            requires: HashSet::default(),
            nullified: false,
        }
    }

    /// The creation-time identity of this constraint.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The constraint family name, e.g. `int_eq`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn args(&self) -> &[Node] {
        &self.args
    }

    pub fn arg(&self, position: usize) -> &Node {
        &self.args[position]
    }

    pub fn last_arg(&self) -> &Node {
        &self.args[self.args.len() - 1]
    }

    /// Replaces the argument at `position` by value, preserving the
    /// owns-its-children invariant of the node tree.
    pub fn replace_arg(&mut self, position: usize, node: Node) {
        self.args[position] = node;
    }

    pub fn annotations(&self) -> Option<&Node> {
        self.annotations.as_ref()
    }

    /// Appends an annotation node, creating the annotation array if absent.
    pub fn add_annotation(&mut self, annotation: Node) {
        match &mut self.annotations {
            Some(Node::Array(items)) => items.push(annotation),
            Some(other) => {
                let existing = std::mem::replace(other, Node::Array(Vec::new()));
                *other = Node::Array(vec![existing, annotation]);
            }
            None => self.annotations = Some(Node::Array(vec![annotation])),
        }
    }

    /// The variable this constraint is considered to compute.
    pub fn defines(&self) -> Option<usize> {
        self.defines
    }

    pub fn set_defines(&mut self, variable: usize) {
        self.defines = Some(variable);
    }

    /// Drops both the resolved target and any `defines_var` annotation.
    pub fn remove_defines(&mut self) {
        self.defines = None;
        if let Some(Node::Array(items)) = &mut self.annotations {
            items.retain(
                |item| !matches!(item, Node::Call(call) if call.id == "defines_var"),
            );
        }
    }

    /// Variables this constraint consumes that are computed by others.
    pub fn requires(&self) -> &HashSet<usize> {
        &self.requires
    }

    pub fn requires_mut(&mut self) -> &mut HashSet<usize> {
        &mut self.requires
    }

    /// Marks the constraint as presolved away. It will not be posted to the
    /// model sink and contributes no dependency edges.
    pub fn nullify(&mut self) {
        self.nullified = true;
    }

    pub fn is_nullified(&self) -> bool {
        self.nullified
    }

    /// Rewrites a reified constraint to its non-reified form: the trailing
    /// boolean argument is dropped and the `_reif` suffix removed.
    pub fn unreify(&mut self) {
        if let Some(stripped) = self.id.strip_suffix("_reif") {
            self.id = stripped.to_owned();
            let _ = self.args.pop();
        }
    }
}
