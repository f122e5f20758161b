//! Rules scoped to a single context.

use super::config::ValidationConfig;
use super::error::ValidationError;
use super::violation::Violation;
use crate::core::Subject;
use crate::rules::{Rule, RuleKindTag};
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;
use tracing::{debug, trace};

/// An ordered, duplicate-free collection of rules, indexed by attribute.
#[derive(Clone, Debug)]
pub struct RuleSet {
    rules: Vec<Arc<Rule>>,
    by_attribute: IndexMap<String, Vec<Arc<Rule>>>,
    optimize: bool,
    always_run: Vec<RuleKindTag>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::with_config(&ValidationConfig::default())
    }
}

impl PartialEq for RuleSet {
    fn eq(&self, other: &Self) -> bool {
        self.rules == other.rules
    }
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &ValidationConfig) -> Self {
        Self {
            rules: Vec::new(),
            by_attribute: IndexMap::new(),
            optimize: config.optimize,
            always_run: config.always_run.clone(),
        }
    }

    pub fn configure(&mut self, config: &ValidationConfig) {
        self.optimize = config.optimize;
        self.always_run = config.always_run.clone();
    }

    /// Add a rule unless an equal one is already present.
    ///
    /// Returns whether the rule was added.
    pub fn add(&mut self, rule: impl Into<Arc<Rule>>) -> bool {
        let rule = rule.into();
        if self.rules.contains(&rule) {
            return false;
        }

        self.by_attribute
            .entry(rule.attribute_name().to_string())
            .or_default()
            .push(Arc::clone(&rule));
        self.rules.push(rule);
        true
    }

    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    /// Rules declared on `attribute_name`.
    pub fn get(&self, attribute_name: &str) -> &[Arc<Rule>] {
        self.by_attribute
            .get(attribute_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.by_attribute.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn is_optimized(&self) -> bool {
        self.optimize
    }

    /// Run every applicable rule against `subject`.
    ///
    /// Rules whose guards reject the subject are skipped. For a persisted
    /// subject with optimization on, only the [optimized
    /// subset](RuleSet::optimized_subset) runs. Lazy attributes the selected
    /// rules need are loaded in one batch before any rule is checked.
    pub fn validate(&self, subject: &dyn Subject) -> Result<Vec<Violation>, ValidationError> {
        let mut applicable = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            if rule.applies_to(subject)? {
                applicable.push(Arc::clone(rule));
            }
        }

        let optimized = self.optimize && !subject.is_new();
        let selected = if optimized {
            self.optimized_subset(subject, applicable)
        } else {
            applicable
        };

        debug!(
            model = subject.model_name(),
            declared = self.rules.len(),
            selected = selected.len(),
            optimized,
            "running rule set"
        );

        load_lazy_attributes(subject, &selected);

        let mut violations = Vec::new();
        for rule in &selected {
            if let Some(violation) = Rule::check(rule, subject)? {
                trace!(
                    attribute = rule.attribute_name(),
                    violation_type = ?violation.violation_type(),
                    "rule failed"
                );
                violations.push(violation);
            }
        }
        Ok(violations)
    }

    /// Narrow `candidates` for a persisted subject.
    ///
    /// A rule is kept when its attribute is not a declared property (a
    /// virtual or whole-object rule), when the attribute changed since the
    /// subject was persisted, when its kind is configured to always run, or
    /// when the attribute is declared but not yet loaded.
    pub fn optimized_subset(
        &self,
        subject: &dyn Subject,
        candidates: Vec<Arc<Rule>>,
    ) -> Vec<Arc<Rule>> {
        let declared = subject.declared_attributes();
        let dirty = subject.changed_attributes();

        candidates
            .into_iter()
            .filter(|rule| {
                let attribute = rule.attribute_name();
                !declared.contains(attribute)
                    || dirty.contains(attribute)
                    || self.always_run.contains(&rule.kind().tag())
                    || !subject.is_loaded(attribute)
            })
            .collect()
    }
}

fn load_lazy_attributes(subject: &dyn Subject, rules: &[Arc<Rule>]) {
    let declared = subject.declared_attributes();
    let pending = rules
        .iter()
        .map(|rule| rule.attribute_name())
        .filter(|name| declared.contains(*name) && !subject.is_loaded(name))
        .map(str::to_string)
        .collect::<IndexSet<_>>();

    if !pending.is_empty() {
        let names = pending.into_iter().collect::<Vec<_>>();
        debug!(model = subject.model_name(), attributes = ?names, "eager loading attributes");
        subject.eager_load(&names);
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Arc<Rule>;
    type IntoIter = std::slice::Iter<'a, Arc<Rule>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Condition, Guard, MethodOutcome};
    use crate::rules::{LengthBound, RuleKind};
    use crate::validation::ViolationType;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::BTreeSet;

    #[derive(Default)]
    struct Doc {
        values: IndexMap<String, Value>,
        persisted: bool,
        dirty: BTreeSet<String>,
        unloaded: RefCell<BTreeSet<String>>,
        loads: RefCell<Vec<Vec<String>>>,
    }

    impl Doc {
        fn with(mut self, name: &str, value: Value) -> Self {
            self.values.insert(name.to_string(), value);
            self
        }
    }

    impl Subject for Doc {
        fn model_name(&self) -> &str {
            "Doc"
        }

        fn attribute_value(&self, name: &str) -> Option<Value> {
            self.values.get(name).cloned()
        }

        fn declared_attributes(&self) -> BTreeSet<String> {
            ["title", "body", "summary"].map(String::from).into()
        }

        fn changed_attributes(&self) -> BTreeSet<String> {
            self.dirty.clone()
        }

        fn is_new(&self) -> bool {
            !self.persisted
        }

        fn is_loaded(&self, name: &str) -> bool {
            !self.unloaded.borrow().contains(name)
        }

        fn eager_load(&self, names: &[String]) {
            let mut unloaded = self.unloaded.borrow_mut();
            for name in names {
                unloaded.remove(name);
            }
            self.loads.borrow_mut().push(names.to_vec());
        }

        fn condition(&self, name: &str) -> Option<bool> {
            (name == "draft?").then(|| self.values.get("draft") == Some(&json!(true)))
        }

        fn call_method(&self, name: &str) -> Option<MethodOutcome> {
            (name == "consistent").then_some(MethodOutcome::Invalid(None))
        }
    }

    fn max_length(attribute: &str, max: usize) -> Rule {
        Rule::new(attribute, RuleKind::Length(LengthBound::Maximum(max)))
    }

    #[test]
    fn add_rejects_duplicates_and_indexes() {
        let mut set = RuleSet::new();
        assert!(set.add(max_length("title", 5)));
        assert!(!set.add(max_length("title", 5)));
        assert!(set.add(max_length("title", 6)));
        assert!(set.add(Rule::new("body", RuleKind::Presence)));

        assert_eq!(set.len(), 3);
        assert_eq!(set.get("title").len(), 2);
        assert_eq!(set.get("missing").len(), 0);
        assert_eq!(set.attributes().collect::<Vec<_>>(), vec!["title", "body"]);
        assert_eq!(
            set.iter().map(|r| r.attribute_name()).collect::<Vec<_>>(),
            vec!["title", "title", "body"]
        );
    }

    #[test]
    fn guards_filter_rules() {
        let mut set = RuleSet::new();
        set.add(Rule::new("body", RuleKind::Presence).guard(Guard {
            if_clause: None,
            unless_clause: Some(Condition::method("draft?")),
        }));

        let draft = Doc::default().with("draft", json!(true));
        assert!(set.validate(&draft).unwrap().is_empty());

        let published = Doc::default().with("draft", json!(false));
        let violations = set.validate(&published).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].violation_type(), Some(ViolationType::Blank));
    }

    #[test]
    fn new_subjects_run_every_rule() {
        let mut set = RuleSet::new();
        set.add(max_length("title", 3));
        set.add(max_length("body", 3));

        let doc = Doc::default()
            .with("title", json!("long title"))
            .with("body", json!("long body"));
        assert_eq!(set.validate(&doc).unwrap().len(), 2);
    }

    #[test]
    fn persisted_subjects_skip_clean_attributes() {
        let mut set = RuleSet::new();
        set.add(max_length("title", 3));
        set.add(max_length("body", 3));
        set.add(max_length("virtual", 3));

        let doc = Doc {
            persisted: true,
            dirty: ["body".to_string()].into(),
            ..Doc::default()
        }
        .with("title", json!("long title"))
        .with("body", json!("long body"))
        .with("virtual", json!("long virtual"));

        let violations = set.validate(&doc).unwrap();
        let attributes = violations
            .iter()
            .map(Violation::attribute_name)
            .collect::<Vec<_>>();
        assert_eq!(attributes, vec!["body", "virtual"]);
    }

    #[test]
    fn always_run_kinds_ignore_dirtiness() {
        let mut set = RuleSet::new();
        set.add(Rule::new("title", RuleKind::Presence));
        set.add(Rule::new(
            "title",
            RuleKind::Method {
                method: "consistent".into(),
                violation_type: ViolationType::UnsatisfiedCondition,
            },
        ));

        let doc = Doc {
            persisted: true,
            ..Doc::default()
        };
        assert_eq!(set.validate(&doc).unwrap().len(), 2);
    }

    #[test]
    fn optimization_can_be_disabled() {
        let config = ValidationConfig {
            optimize: false,
            ..ValidationConfig::default()
        };
        let mut set = RuleSet::with_config(&config);
        set.add(max_length("title", 3));

        let doc = Doc {
            persisted: true,
            ..Doc::default()
        }
        .with("title", json!("long title"));
        assert_eq!(set.validate(&doc).unwrap().len(), 1);
    }

    #[test]
    fn unloaded_attributes_are_kept_and_loaded_once() {
        let mut set = RuleSet::new();
        set.add(max_length("summary", 3));
        set.add(Rule::new("summary", RuleKind::Presence));
        set.add(max_length("title", 3));

        let doc = Doc {
            persisted: true,
            unloaded: RefCell::new(["summary".to_string()].into()),
            ..Doc::default()
        }
        .with("summary", json!("lazy and long"))
        .with("title", json!("clean but long"));

        let violations = set.validate(&doc).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].attribute_name(), "summary");
        assert_eq!(*doc.loads.borrow(), vec![vec!["summary".to_string()]]);
        assert!(doc.is_loaded("summary"));
    }

    #[test]
    fn guard_errors_propagate() {
        let mut set = RuleSet::new();
        set.add(Rule::new("title", RuleKind::Presence).guard(Guard {
            if_clause: Some(Condition::method("nope?")),
            unless_clause: None,
        }));
        assert!(matches!(
            set.validate(&Doc::default()),
            Err(ValidationError::UnknownCondition { .. })
        ));
    }
}
