//! Options shared by every rule declaration.

use crate::core::{Condition, Guard};
use crate::rules::{Message, Rule};

/// Declaration options: target contexts, guards, nil/blank handling, and a
/// custom message.
///
/// Contexts may be given under any of four names. The first one set, in the
/// order `context`, `group`, `when`, `on`, wins; with none set the rule
/// goes into the default context.
///
/// # Example
///
/// ```rust
/// use validity::builder::RuleOptions;
///
/// let options = RuleOptions::new().on(["signup"]).context(["admin"]);
/// assert_eq!(options.resolve_contexts("default"), vec!["admin".to_string()]);
///
/// let options = RuleOptions::new().unless("imported?").allow_nil(true);
/// assert_eq!(options.resolve_contexts("default"), vec!["default".to_string()]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleOptions {
    context: Option<Vec<String>>,
    group: Option<Vec<String>>,
    when: Option<Vec<String>>,
    on: Option<Vec<String>>,
    if_clause: Option<Condition>,
    unless_clause: Option<Condition>,
    allow_nil: Option<bool>,
    allow_blank: Option<bool>,
    message: Option<Message>,
}

fn names<I, S>(names: I) -> Option<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Some(names.into_iter().map(Into::into).collect())
}

impl RuleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context = names(contexts);
        self
    }

    pub fn group<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group = names(contexts);
        self
    }

    pub fn when<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.when = names(contexts);
        self
    }

    pub fn on<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.on = names(contexts);
        self
    }

    /// Only run the rule when `condition` holds.
    pub fn only_if(mut self, condition: impl Into<Condition>) -> Self {
        self.if_clause = Some(condition.into());
        self
    }

    /// Skip the rule when `condition` holds. Takes priority over `only_if`.
    pub fn unless(mut self, condition: impl Into<Condition>) -> Self {
        self.unless_clause = Some(condition.into());
        self
    }

    pub fn allow_nil(mut self, allow: bool) -> Self {
        self.allow_nil = Some(allow);
        self
    }

    pub fn allow_blank(mut self, allow: bool) -> Self {
        self.allow_blank = Some(allow);
        self
    }

    pub fn message(mut self, message: impl Into<Message>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Context names the rule is declared into.
    pub fn resolve_contexts(&self, default: &str) -> Vec<String> {
        [&self.context, &self.group, &self.when, &self.on]
            .into_iter()
            .find_map(Clone::clone)
            .unwrap_or_else(|| vec![default.to_string()])
    }

    pub fn guard(&self) -> Guard {
        Guard {
            if_clause: self.if_clause.clone(),
            unless_clause: self.unless_clause.clone(),
        }
    }

    /// Apply guards, nil/blank flags, and message to a freshly built rule.
    pub(crate) fn apply(&self, rule: Rule) -> Rule {
        let mut rule = rule.guard(self.guard());
        if let Some(allow) = self.allow_nil {
            rule = rule.allow_nil(allow);
        }
        if let Some(allow) = self.allow_blank {
            rule = rule.allow_blank(allow);
        }
        if let Some(message) = &self.message {
            rule = rule.message(message.clone());
        }
        rule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{RuleKind, Within};

    #[test]
    fn context_aliases_resolve_in_order() {
        let options = RuleOptions::new().on(["c"]).when(["b"]).group(["a"]);
        assert_eq!(options.resolve_contexts("default"), vec!["a"]);

        let options = RuleOptions::new().on(["c"]).when(["b"]);
        assert_eq!(options.resolve_contexts("default"), vec!["b"]);

        let options = RuleOptions::new().on(["signup", "admin"]);
        assert_eq!(options.resolve_contexts("default"), vec!["signup", "admin"]);
    }

    #[test]
    fn default_context_when_none_given() {
        assert_eq!(RuleOptions::new().resolve_contexts("main"), vec!["main"]);
    }

    #[test]
    fn apply_sets_guards_flags_and_message() {
        let options = RuleOptions::new()
            .only_if("active?")
            .unless("imported?")
            .allow_blank(true)
            .message("is required");

        let rule = options.apply(Rule::new("name", RuleKind::Within(Within::Set(vec![]))));

        assert_eq!(rule.guards().if_clause, Some(Condition::method("active?")));
        assert_eq!(rule.guards().unless_clause, Some(Condition::method("imported?")));
        assert_eq!(rule.allows_blank(), Some(true));
        assert_eq!(rule.allows_nil(), None);
        assert_eq!(rule.custom_message(), Some(&Message::from("is required")));
    }

    #[test]
    fn apply_cannot_relax_presence() {
        let rule = RuleOptions::new()
            .allow_nil(true)
            .apply(Rule::new("name", RuleKind::Presence));
        assert_eq!(rule.allows_nil(), Some(false));
    }
}
