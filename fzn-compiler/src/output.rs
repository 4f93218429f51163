//! Merges registered output bindings into one ordered fragment sequence.

use crate::ast::Node;

/// Composes `(name, value)` bindings into printable fragments, sorted by
/// name. Array values are spliced inline; each binding is terminated with
/// `";\n"`. Value-to-text conversion of variable results happens after
/// solving, outside this crate.
pub(crate) fn compose(mut bindings: Vec<(String, Node)>) -> Vec<Node> {
    bindings.sort_by(|a, b| a.0.cmp(&b.0));

    let mut fragments = Vec::new();
    for (name, value) in bindings {
        fragments.push(Node::Str(format!("{name} = ")));
        match value {
            Node::Array(elements) => fragments.extend(elements),
            other => fragments.push(other),
        }
        fragments.push(Node::Str(";\n".to_owned()));
    }
    fragments
}
