//! Custom validation through a named subject method or an inline block.

use super::Failure;
use crate::core::{MethodOutcome, Subject};
use crate::validation::{ValidationError, ViolationType};
use std::fmt;
use std::sync::Arc;

/// Inline validation block. Compares by identity.
#[derive(Clone)]
pub struct BlockFn(Arc<dyn Fn(&dyn Subject) -> MethodOutcome + Send + Sync>);

impl BlockFn {
    pub fn new<F>(block: F) -> Self
    where
        F: Fn(&dyn Subject) -> MethodOutcome + Send + Sync + 'static,
    {
        Self(Arc::new(block))
    }

    pub fn call(&self, subject: &dyn Subject) -> MethodOutcome {
        (self.0)(subject)
    }
}

impl PartialEq for BlockFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for BlockFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BlockFn(..)")
    }
}

fn failure_for(outcome: MethodOutcome, violation_type: ViolationType) -> Option<Failure> {
    match outcome {
        MethodOutcome::Valid => None,
        MethodOutcome::Invalid(message) => Some(Failure {
            violation_type,
            data: Vec::new(),
            message,
        }),
    }
}

pub(super) fn check_method(
    subject: &dyn Subject,
    method: &str,
    violation_type: ViolationType,
) -> Result<Option<Failure>, ValidationError> {
    let outcome = subject
        .call_method(method)
        .ok_or_else(|| ValidationError::UnknownMethod {
            model: subject.model_name().to_string(),
            name: method.to_string(),
        })?;
    Ok(failure_for(outcome, violation_type))
}

pub(super) fn check_block(subject: &dyn Subject, block: &BlockFn) -> Option<Failure> {
    failure_for(block.call(subject), ViolationType::UnsatisfiedCondition)
}
