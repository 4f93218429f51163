use thiserror::Error;

/// Fatal pipeline errors.
///
/// Recoverable input errors (undefined identifiers, out-of-range array
/// accesses) do not surface here; they set the hard-error flag on the
/// [`ModelBuilder`](crate::ModelBuilder) and suppress materialization.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("domain of variable '{variable}' is empty after intersecting with {narrowing}")]
    InfeasibleDomain { variable: String, narrowing: String },

    #[error("definition cycle among constraints {0:?}")]
    DefinitionCycle(Vec<String>),

    #[error("alias chain starting at variable '{0}' does not terminate")]
    CyclicAlias(String),
}
