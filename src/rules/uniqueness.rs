//! Uniqueness against already-persisted subjects.

use super::{Failure, Rule};
use crate::core::Subject;
use crate::validation::{ValidationError, ViolationType};
use serde_json::Value;
use tracing::trace;

pub(super) fn check(
    rule: &Rule,
    subject: &dyn Subject,
    value: Option<&Value>,
    scope: &[String],
) -> Result<Option<Failure>, ValidationError> {
    if rule.is_optional(value) {
        return Ok(None);
    }

    let lookup = subject
        .uniqueness_lookup()
        .ok_or_else(|| ValidationError::MissingCollaborator {
            model: subject.model_name().to_string(),
        })?;

    let attribute = rule.attribute_name();
    let key = vec![(attribute.to_string(), value.cloned().unwrap_or(Value::Null))];
    let scope = scope
        .iter()
        .map(|name| {
            let value = subject.attribute_value(name).unwrap_or(Value::Null);
            (name.clone(), value)
        })
        .collect::<Vec<_>>();

    let Some(existing) = lookup.find_existing(subject.model_name(), &key, &scope)? else {
        return Ok(None);
    };

    let is_self = !subject.is_new() && lookup.subject_identity(subject) == Some(existing);
    trace!(
        model = subject.model_name(),
        attribute,
        %existing,
        is_self,
        "uniqueness lookup found a match"
    );

    Ok((!is_self).then(|| Failure::new(ViolationType::Taken)))
}
