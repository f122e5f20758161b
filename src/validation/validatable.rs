//! Subjects that own their violation set.

use super::contextual::ContextualRuleSet;
use super::error::ValidationError;
use super::violation::ViolationSet;
use crate::core::Subject;
use std::sync::Arc;

/// A subject with a validation profile and a violation set of its own.
///
/// The provided methods clear the set, validate under the requested (or
/// current) context, and store the result, so repeated calls never
/// accumulate stale violations.
pub trait Validatable: Subject + Sized {
    /// The profile of this subject's type.
    fn validation_rules(&self) -> Arc<ContextualRuleSet>;

    fn violations(&self) -> &ViolationSet;

    fn violations_mut(&mut self) -> &mut ViolationSet;

    /// Validate and store the outcome in [`violations`](Validatable::violations).
    fn validate(&mut self, context: Option<&str>) -> Result<&ViolationSet, ValidationError> {
        self.violations_mut().clear();
        let found = self
            .validation_rules()
            .validate_in_context(&*self, context)?;
        *self.violations_mut() = found;
        Ok(self.violations())
    }

    fn is_valid(&mut self, context: Option<&str>) -> Result<bool, ValidationError> {
        Ok(self.validate(context)?.is_empty())
    }
}
