//! Per-variable specs: domain, alias, assignment, and introduced state.
//!
//! Specs are mutated only by the presolve engine (domain narrowing,
//! assignment) before model construction, and are immutable afterward.

use crate::ast::SetLit;
use crate::error::CompileError;

/// Spec of one declared integer variable.
#[derive(Clone, Debug)]
pub struct IntVarSpec {
    pub name: String,
    pub domain: Option<SetLit>,
    /// This variable is declared exactly equal to another integer variable.
    pub alias: Option<usize>,
    /// This variable is bound to a single literal value.
    pub assigned: Option<i64>,
    /// Synthesized by the front end rather than declared by name.
    pub introduced: bool,
}

impl IntVarSpec {
    pub fn new(name: impl Into<String>, domain: Option<SetLit>) -> IntVarSpec {
        IntVarSpec {
            name: name.into(),
            domain,
            alias: None,
            assigned: None,
            introduced: false,
        }
    }

    pub fn alias_of(name: impl Into<String>, target: usize) -> IntVarSpec {
        IntVarSpec {
            name: name.into(),
            domain: None,
            alias: Some(target),
            assigned: None,
            introduced: false,
        }
    }

    pub fn constant(name: impl Into<String>, value: i64) -> IntVarSpec {
        IntVarSpec {
            name: name.into(),
            domain: None,
            alias: None,
            assigned: Some(value),
            introduced: false,
        }
    }

    pub fn introduced(mut self) -> IntVarSpec {
        self.introduced = true;
        self
    }

    pub fn is_bound(&self) -> bool {
        self.bound_value().is_some()
    }

    pub fn bound_value(&self) -> Option<i64> {
        self.assigned
            .or_else(|| self.domain.as_ref().and_then(SetLit::singleton))
    }

    /// Intersects the current domain with `[lb, ub]`. An empty intersection
    /// is infeasibility, not a no-op.
    pub fn merge_bounds(&mut self, lb: i64, ub: i64) -> Result<(), CompileError> {
        if let Some(value) = self.assigned {
            if value < lb || value > ub {
                return Err(self.infeasible(&SetLit::Interval { min: lb, max: ub }));
            }
            return Ok(());
        }

        let merged = match self.domain.take() {
            None => SetLit::Interval { min: lb, max: ub },
            Some(SetLit::Interval { min, max }) => SetLit::Interval {
                min: min.max(lb),
                max: max.min(ub),
            },
            Some(SetLit::Values(values)) => SetLit::Values(
                values
                    .into_iter()
                    .filter(|value| *value >= lb && *value <= ub)
                    .collect(),
            ),
        };

        if merged.is_empty() {
            return Err(self.infeasible(&SetLit::Interval { min: lb, max: ub }));
        }

        self.domain = Some(merged);
        Ok(())
    }

    /// Intersects the current domain with an explicit value set.
    pub fn merge_values(&mut self, values: &[i64]) -> Result<(), CompileError> {
        if let Some(value) = self.assigned {
            if !values.contains(&value) {
                return Err(self.infeasible(&SetLit::Values(values.to_vec())));
            }
            return Ok(());
        }

        let merged = match self.domain.take() {
            None => SetLit::Values(values.to_vec()),
            Some(current) => SetLit::Values(
                values
                    .iter()
                    .copied()
                    .filter(|value| current.contains(*value))
                    .collect(),
            ),
        };

        if merged.is_empty() {
            return Err(self.infeasible(&SetLit::Values(values.to_vec())));
        }

        self.domain = Some(merged);
        Ok(())
    }

    fn infeasible(&self, narrowing: &SetLit) -> CompileError {
        CompileError::InfeasibleDomain {
            variable: self.name.clone(),
            narrowing: narrowing.to_string(),
        }
    }
}

/// Spec of one declared boolean variable.
#[derive(Clone, Debug)]
pub struct BoolVarSpec {
    pub name: String,
    pub domain: Option<SetLit>,
    /// This variable is declared exactly equal to another boolean variable.
    pub alias: Option<usize>,
    pub assigned: Option<bool>,
    pub introduced: bool,
}

impl BoolVarSpec {
    pub fn new(name: impl Into<String>) -> BoolVarSpec {
        BoolVarSpec {
            name: name.into(),
            domain: None,
            alias: None,
            assigned: None,
            introduced: false,
        }
    }

    pub fn alias_of(name: impl Into<String>, target: usize) -> BoolVarSpec {
        BoolVarSpec {
            alias: Some(target),
            ..BoolVarSpec::new(name)
        }
    }

    pub fn constant(name: impl Into<String>, value: bool) -> BoolVarSpec {
        BoolVarSpec {
            assigned: Some(value),
            ..BoolVarSpec::new(name)
        }
    }

    pub fn introduced(mut self) -> BoolVarSpec {
        self.introduced = true;
        self
    }

    pub fn is_bound(&self) -> bool {
        self.bound_value().is_some()
    }

    pub fn bound_value(&self) -> Option<bool> {
        self.assigned.or_else(|| {
            self.domain
                .as_ref()
                .and_then(SetLit::singleton)
                .map(|value| value != 0)
        })
    }

    /// Fixes the variable to `value`; a conflicting earlier assignment is
    /// infeasibility.
    pub fn assign(&mut self, value: bool) -> Result<(), CompileError> {
        if let Some(current) = self.bound_value() {
            if current != value {
                return Err(CompileError::InfeasibleDomain {
                    variable: self.name.clone(),
                    narrowing: i64::from(value).to_string(),
                });
            }
            return Ok(());
        }
        self.assigned = Some(value);
        Ok(())
    }
}

/// Spec of one declared set variable.
#[derive(Clone, Debug)]
pub struct SetVarSpec {
    pub name: String,
    pub domain: Option<SetLit>,
    pub introduced: bool,
}

impl SetVarSpec {
    pub fn new(name: impl Into<String>, domain: Option<SetLit>) -> SetVarSpec {
        SetVarSpec {
            name: name.into(),
            domain,
            introduced: false,
        }
    }
}
