//! Rule sets for every context of one subject type.

use super::config::ValidationConfig;
use super::error::ValidationError;
use super::rule_set::RuleSet;
use super::transformer::{default_transformer, MessageTransformer};
use super::violation::{Violation, ViolationSet};
use crate::builder::{infer_rules, DeclarationError, PropertySpec, RuleOptions, RuleSpec};
use crate::core::{context, ContextScope, Subject};
use crate::rules::Rule;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// The validation profile of a subject type: one [`RuleSet`] per context.
///
/// Until a rule is declared the profile is unconstrained and accepts any
/// context name. Afterwards only declared contexts are valid.
///
/// # Example
///
/// ```rust
/// use validity::builder::{RuleOptions, RuleSpec};
/// use validity::validation::ContextualRuleSet;
///
/// let mut rules = ContextualRuleSet::new();
/// assert!(rules.is_valid_context("anything"));
///
/// rules
///     .add(RuleSpec::Presence, &["name"], RuleOptions::new())
///     .unwrap()
///     .add(RuleSpec::Presence, &["email"], RuleOptions::new().on(["signup"]))
///     .unwrap();
///
/// assert!(rules.is_valid_context("signup"));
/// assert!(!rules.is_valid_context("publish"));
/// ```
#[derive(Clone, Default)]
pub struct ContextualRuleSet {
    rule_sets: IndexMap<String, RuleSet>,
    config: ValidationConfig,
    transformer: Option<Arc<dyn MessageTransformer>>,
}

impl ContextualRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidationConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Replace the settings, reconfiguring every existing rule set.
    pub fn configure(&mut self, config: ValidationConfig) {
        for rule_set in self.rule_sets.values_mut() {
            rule_set.configure(&config);
        }
        self.config = config;
    }

    /// Use `transformer` for violations produced by this profile.
    pub fn set_transformer(&mut self, transformer: Arc<dyn MessageTransformer>) {
        self.transformer = Some(transformer);
    }

    /// This profile's transformer, or the process-wide default.
    pub fn transformer(&self) -> Arc<dyn MessageTransformer> {
        self.transformer.clone().unwrap_or_else(default_transformer)
    }

    /// Rule set for `name`, created empty on first use.
    pub fn context(&mut self, name: &str) -> &mut RuleSet {
        let config = &self.config;
        self.rule_sets
            .entry(name.to_string())
            .or_insert_with(|| RuleSet::with_config(config))
    }

    pub fn get(&self, name: &str) -> Option<&RuleSet> {
        self.rule_sets.get(name)
    }

    /// Names of every declared context, in declaration order.
    pub fn contexts(&self) -> impl Iterator<Item = &str> {
        self.rule_sets.keys().map(String::as_str)
    }

    pub fn rule_sets(&self) -> impl Iterator<Item = (&str, &RuleSet)> {
        self.rule_sets.iter().map(|(name, set)| (name.as_str(), set))
    }

    pub fn is_empty(&self) -> bool {
        self.rule_sets.is_empty()
    }

    pub fn clear(&mut self) {
        self.rule_sets.clear();
    }

    /// Declare `spec` on each attribute, in every context the options name.
    ///
    /// Nothing is added when any attribute's rules fail to build.
    pub fn add(
        &mut self,
        spec: RuleSpec,
        attribute_names: &[&str],
        options: RuleOptions,
    ) -> Result<&mut Self, DeclarationError> {
        let mut rules = Vec::new();
        for attribute in attribute_names {
            rules.extend(spec.rules_for(attribute, &options)?);
        }
        let rules = rules.into_iter().map(Arc::new).collect::<Vec<_>>();

        for context_name in options.resolve_contexts(&self.config.default_context) {
            let rule_set = self.context(&context_name);
            for rule in &rules {
                rule_set.add(Arc::clone(rule));
            }
        }
        Ok(self)
    }

    /// Add an already built rule to one context.
    pub fn add_rule(&mut self, context_name: &str, rule: Rule) -> bool {
        self.context(context_name).add(rule)
    }

    /// Declare the rules inferred from a property declaration.
    pub fn add_inferred(&mut self, property: &PropertySpec) -> Result<&mut Self, DeclarationError> {
        for (spec, options) in infer_rules(property)? {
            self.add(spec, &[property.name.as_str()], options)?;
        }
        Ok(self)
    }

    /// Copy every rule into `child`, context by context.
    ///
    /// Used when a derived type is introduced so it validates with its
    /// ancestors' rules as well as its own.
    pub fn inherit(&self, child: &mut ContextualRuleSet) {
        for (name, rule_set) in &self.rule_sets {
            let target = child.context(name);
            for rule in rule_set {
                target.add(Rule::clone(rule));
            }
        }
    }

    /// Run the rules of `context_name` against `subject`.
    ///
    /// An undeclared context has no rules.
    pub fn validate(
        &self,
        subject: &dyn Subject,
        context_name: &str,
    ) -> Result<Vec<Violation>, ValidationError> {
        match self.rule_sets.get(context_name) {
            Some(rule_set) => rule_set.validate(subject),
            None => Ok(Vec::new()),
        }
    }

    /// Context from the current thread's stack if it is valid here,
    /// otherwise the default context.
    pub fn current_context(&self) -> String {
        context::current()
            .filter(|name| self.is_valid_context(name))
            .unwrap_or_else(|| self.config.default_context.clone())
    }

    pub fn is_valid_context(&self, name: &str) -> bool {
        self.rule_sets.is_empty() || self.rule_sets.contains_key(name)
    }

    pub fn assert_valid_context(&self, name: &str) -> Result<(), ValidationError> {
        if self.is_valid_context(name) {
            return Ok(());
        }

        let known = self.contexts().map(str::to_string).collect::<Vec<_>>();
        warn!(context = name, ?known, "rejected invalid validation context");
        Err(ValidationError::InvalidContext {
            context: name.to_string(),
            known,
        })
    }

    /// Resolve the context, then validate under it with the context pushed
    /// on the current thread's stack.
    ///
    /// Without an explicit context the [current
    /// context](ContextualRuleSet::current_context) is used. The stack entry
    /// is popped on every exit path.
    pub fn validate_in_context(
        &self,
        subject: &dyn Subject,
        context_name: Option<&str>,
    ) -> Result<ViolationSet, ValidationError> {
        let name = match context_name {
            Some(name) => name.to_string(),
            None => self.current_context(),
        };
        self.assert_valid_context(&name)?;

        let _scope = ContextScope::enter(name.as_str());
        let violations = self.validate(subject, &name)?;
        debug!(
            model = subject.model_name(),
            context = %name,
            violations = violations.len(),
            "validated subject"
        );

        Ok(violations
            .into_iter()
            .map(|violation| violation.with_transformer(self.transformer.clone()))
            .collect())
    }
}

impl fmt::Debug for ContextualRuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextualRuleSet")
            .field("rule_sets", &self.rule_sets)
            .field("config", &self.config)
            .field("custom_transformer", &self.transformer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::LengthSpec;
    use crate::validation::ViolationType;
    use serde_json::{json, Value};

    struct Person {
        name: Value,
        email: Value,
    }

    impl Subject for Person {
        fn model_name(&self) -> &str {
            "Person"
        }

        fn attribute_value(&self, name: &str) -> Option<Value> {
            match name {
                "name" => Some(self.name.clone()),
                "email" => Some(self.email.clone()),
                _ => None,
            }
        }
    }

    fn blank_person() -> Person {
        Person {
            name: json!(""),
            email: Value::Null,
        }
    }

    fn profile() -> ContextualRuleSet {
        let mut rules = ContextualRuleSet::new();
        rules
            .add(RuleSpec::Presence, &["name"], RuleOptions::new())
            .unwrap()
            .add(
                RuleSpec::Presence,
                &["email"],
                RuleOptions::new().on(["signup", "admin"]),
            )
            .unwrap();
        rules
    }

    #[test]
    fn rules_go_into_resolved_contexts() {
        let rules = profile();
        assert_eq!(
            rules.contexts().collect::<Vec<_>>(),
            vec!["default", "signup", "admin"]
        );
        assert_eq!(rules.get("signup").map(RuleSet::len), Some(1));
    }

    #[test]
    fn contexts_are_isolated() {
        let rules = profile();
        let person = blank_person();

        let default = rules.validate(&person, "default").unwrap();
        assert_eq!(default.len(), 1);
        assert_eq!(default[0].attribute_name(), "name");

        let signup = rules.validate(&person, "signup").unwrap();
        assert_eq!(signup.len(), 1);
        assert_eq!(signup[0].attribute_name(), "email");
    }

    #[test]
    fn failed_declaration_adds_nothing() {
        let mut rules = ContextualRuleSet::new();
        let result = rules.add(
            RuleSpec::Length(LengthSpec::new()),
            &["name"],
            RuleOptions::new(),
        );
        assert!(result.is_err());
        assert!(rules.is_empty());
    }

    #[test]
    fn unconstrained_until_first_rule() {
        let mut rules = ContextualRuleSet::new();
        assert!(rules.assert_valid_context("whatever").is_ok());

        rules.add_rule("default", Rule::new("name", crate::rules::RuleKind::Presence));
        let error = rules.assert_valid_context("whatever").unwrap_err();
        assert_eq!(
            error,
            ValidationError::InvalidContext {
                context: "whatever".into(),
                known: vec!["default".into()],
            }
        );
    }

    #[test]
    fn current_context_falls_back_to_default() {
        let rules = profile();
        assert_eq!(rules.current_context(), "default");

        context::with_context("signup", || {
            assert_eq!(rules.current_context(), "signup");
        });
        context::with_context("unknown", || {
            assert_eq!(rules.current_context(), "default");
        });
    }

    #[test]
    fn validate_in_context_pushes_and_pops() {
        let mut rules = ContextualRuleSet::new();
        rules
            .add(
                RuleSpec::block(|_| {
                    let seen = context::current().unwrap_or_default();
                    (seen == "signup").into()
                }),
                &["base"],
                RuleOptions::new().on(["signup"]),
            )
            .unwrap();

        let violations = rules
            .validate_in_context(&blank_person(), Some("signup"))
            .unwrap();
        assert!(violations.is_empty());
        assert_eq!(context::depth(), 0);
    }

    #[test]
    fn nested_validation_inherits_context() {
        let rules = profile();
        let violations = context::with_context("admin", || {
            rules.validate_in_context(&blank_person(), None).unwrap()
        });
        assert_eq!(violations.len(), 1);
        assert!(violations.on("email").is_some());
    }

    #[test]
    fn invalid_context_is_rejected_before_running() {
        let rules = profile();
        let result = rules.validate_in_context(&blank_person(), Some("publish"));
        assert!(matches!(result, Err(ValidationError::InvalidContext { .. })));
        assert_eq!(context::depth(), 0);
    }

    #[test]
    fn inherit_copies_rules_per_context() {
        let parent = profile();
        let mut child = ContextualRuleSet::new();
        child
            .add(RuleSpec::Absence, &["email"], RuleOptions::new())
            .unwrap();

        parent.inherit(&mut child);

        assert_eq!(child.get("default").map(RuleSet::len), Some(2));
        assert_eq!(child.get("signup").map(RuleSet::len), Some(1));

        parent.inherit(&mut child);
        assert_eq!(child.get("default").map(RuleSet::len), Some(2));
    }

    #[test]
    fn profile_transformer_renders_messages() {
        struct Terse;
        impl MessageTransformer for Terse {
            fn transform(&self, violation: &Violation) -> String {
                format!("{}!", violation.attribute_name())
            }
        }

        let mut rules = profile();
        rules.set_transformer(Arc::new(Terse));

        let violations = rules.validate_in_context(&blank_person(), None).unwrap();
        assert_eq!(violations.full_messages(), vec!["name!"]);

        let violation = violations.iter().next().unwrap();
        assert_eq!(violation.violation_type(), Some(ViolationType::Blank));
    }

    #[test]
    fn configure_reaches_existing_rule_sets() {
        let mut rules = profile();
        rules.configure(ValidationConfig {
            optimize: false,
            ..ValidationConfig::default()
        });
        assert!(rules.rule_sets().all(|(_, set)| !set.is_optimized()));
        assert!(!rules.context("later").is_optimized());
    }
}
