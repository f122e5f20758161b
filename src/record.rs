//! A map-backed subject for hosts without an object model of their own.
//!
//! [`Record`] keeps attribute values in an ordered map, tracks changes
//! against the values it was last saved with, and tracks which lazy
//! properties have been loaded. [`MemoryIndex`] stores saved records and
//! answers uniqueness lookups.

use crate::builder::PropertySpec;
use crate::core::{
    loosely_equal, Identity, LookupError, MethodOutcome, Property, Subject, UniquenessLookup,
};
use crate::validation::{ContextualRuleSet, Validatable, ViolationSet};
use indexmap::IndexMap;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

type ConditionFn = Arc<dyn Fn(&Record) -> bool + Send + Sync>;
type MethodFn = Arc<dyn Fn(&Record) -> MethodOutcome + Send + Sync>;

/// A validatable record of JSON attribute values.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use serde_json::json;
/// use validity::builder::{RuleOptions, RuleSpec};
/// use validity::record::Record;
/// use validity::validation::{ContextualRuleSet, Validatable};
///
/// let mut rules = ContextualRuleSet::new();
/// rules.add(RuleSpec::Presence, &["name"], RuleOptions::new()).unwrap();
///
/// let mut record = Record::new("Person", Arc::new(rules)).with("name", json!(""));
/// assert!(!record.is_valid(None).unwrap());
///
/// record.set("name", json!("Sam"));
/// assert!(record.is_valid(None).unwrap());
/// ```
#[derive(Clone)]
pub struct Record {
    model: String,
    rules: Arc<ContextualRuleSet>,
    properties: IndexMap<String, Property>,
    values: IndexMap<String, Value>,
    saved: Option<IndexMap<String, Value>>,
    identity: Option<Identity>,
    unloaded: RefCell<BTreeSet<String>>,
    load_requests: RefCell<Vec<Vec<String>>>,
    conditions: HashMap<String, ConditionFn>,
    methods: HashMap<String, MethodFn>,
    index: Option<Arc<MemoryIndex>>,
    violations: ViolationSet,
}

impl Record {
    pub fn new(model: impl Into<String>, rules: Arc<ContextualRuleSet>) -> Self {
        Self {
            model: model.into(),
            rules,
            properties: IndexMap::new(),
            values: IndexMap::new(),
            saved: None,
            identity: None,
            unloaded: RefCell::new(BTreeSet::new()),
            load_requests: RefCell::new(Vec::new()),
            conditions: HashMap::new(),
            methods: HashMap::new(),
            index: None,
            violations: ViolationSet::new(),
        }
    }

    /// Declare a schema property.
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.insert(property.name.clone(), property);
        self
    }

    /// Declare the properties described by `specs`.
    pub fn with_properties<'a>(mut self, specs: impl IntoIterator<Item = &'a PropertySpec>) -> Self {
        for spec in specs {
            self = self.with_property(spec.property());
        }
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }

    pub fn with_condition<F>(mut self, name: impl Into<String>, condition: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        self.conditions.insert(name.into(), Arc::new(condition));
        self
    }

    pub fn with_method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&Record) -> MethodOutcome + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    /// Store saved records in, and look uniqueness up against, `index`.
    pub fn with_index(mut self, index: Arc<MemoryIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.unloaded.get_mut().remove(&name);
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Persist the current values, assigning an identity on first save.
    pub fn save(&mut self) -> Identity {
        let identity = *self.identity.get_or_insert_with(Uuid::new_v4);
        if let Some(index) = &self.index {
            index.store(&self.model, identity, self.values.clone());
        }
        self.saved = Some(self.values.clone());
        debug!(model = %self.model, %identity, "saved record");
        identity
    }

    /// Treat lazy properties as not yet fetched, as for a freshly loaded
    /// record.
    pub fn unload_lazy(&mut self) {
        let lazy = self
            .properties
            .values()
            .filter(|property| property.lazy)
            .map(|property| property.name.clone());
        self.unloaded.get_mut().extend(lazy);
    }

    /// Batches of attributes eager loading was asked for, in order.
    pub fn load_requests(&self) -> Vec<Vec<String>> {
        self.load_requests.borrow().clone()
    }
}

impl Subject for Record {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn attribute_value(&self, name: &str) -> Option<Value> {
        if self.unloaded.borrow_mut().remove(name) {
            self.load_requests.borrow_mut().push(vec![name.to_string()]);
        }
        self.values.get(name).cloned()
    }

    fn property(&self, name: &str) -> Option<Property> {
        self.properties.get(name).cloned()
    }

    fn declared_attributes(&self) -> BTreeSet<String> {
        self.properties.keys().cloned().collect()
    }

    fn changed_attributes(&self) -> BTreeSet<String> {
        self.properties
            .keys()
            .filter(|name| {
                let current = self.values.get(*name);
                let saved = self.saved.as_ref().and_then(|saved| saved.get(*name));
                match (current, saved) {
                    (Some(current), Some(saved)) => !loosely_equal(current, saved),
                    (None, None) => false,
                    _ => true,
                }
            })
            .cloned()
            .collect()
    }

    fn is_new(&self) -> bool {
        self.saved.is_none()
    }

    fn is_loaded(&self, name: &str) -> bool {
        !self.unloaded.borrow().contains(name)
    }

    fn eager_load(&self, names: &[String]) {
        let mut unloaded = self.unloaded.borrow_mut();
        let batch = names
            .iter()
            .filter(|name| unloaded.remove(*name))
            .cloned()
            .collect::<Vec<_>>();
        if !batch.is_empty() {
            self.load_requests.borrow_mut().push(batch);
        }
    }

    fn condition(&self, name: &str) -> Option<bool> {
        self.conditions.get(name).map(|condition| condition(self))
    }

    fn call_method(&self, name: &str) -> Option<MethodOutcome> {
        self.methods.get(name).map(|method| method(self))
    }

    fn identity(&self) -> Option<Identity> {
        self.identity
    }

    fn uniqueness_lookup(&self) -> Option<&dyn UniquenessLookup> {
        self.index
            .as_deref()
            .map(|index| index as &dyn UniquenessLookup)
    }
}

impl Validatable for Record {
    fn validation_rules(&self) -> Arc<ContextualRuleSet> {
        Arc::clone(&self.rules)
    }

    fn violations(&self) -> &ViolationSet {
        &self.violations
    }

    fn violations_mut(&mut self) -> &mut ViolationSet {
        &mut self.violations
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("model", &self.model)
            .field("identity", &self.identity)
            .field("values", &self.values)
            .field("new", &self.saved.is_none())
            .field("violations", &self.violations)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct Row {
    model: String,
    identity: Identity,
    values: IndexMap<String, Value>,
}

impl Row {
    fn matches(&self, fields: &[(String, Value)]) -> bool {
        fields.iter().all(|(name, expected)| {
            let actual = self.values.get(name).unwrap_or(&Value::Null);
            loosely_equal(actual, expected)
        })
    }
}

/// In-memory store of saved records, used as a uniqueness collaborator.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    rows: Mutex<Vec<Row>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the row for `identity`.
    pub fn store(&self, model: &str, identity: Identity, values: IndexMap<String, Value>) {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let row = Row {
            model: model.to_string(),
            identity,
            values,
        };
        match rows.iter_mut().find(|row| row.identity == identity) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UniquenessLookup for MemoryIndex {
    fn find_existing(
        &self,
        model: &str,
        key: &[(String, Value)],
        scope: &[(String, Value)],
    ) -> Result<Option<Identity>, LookupError> {
        let rows = self
            .rows
            .lock()
            .map_err(|_| LookupError("memory index lock poisoned".to_string()))?;

        Ok(rows
            .iter()
            .find(|row| row.model == model && row.matches(key) && row.matches(scope))
            .map(|row| row.identity))
    }
}
