//! Rendering violations into human-readable messages.
//!
//! A [`MessageTransformer`] turns a violation's type and data into text.
//! Each rule profile may carry its own transformer; violations from a
//! profile without one use the process-wide default.

use super::violation::{Violation, ViolationType};
use crate::core::display_value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

/// Renders a violation into a message.
pub trait MessageTransformer: Send + Sync {
    fn transform(&self, violation: &Violation) -> String;
}

/// Turns attribute names into display names.
pub trait Humanizer: Send + Sync {
    fn humanize(&self, attribute_name: &str) -> String;
}

/// `account_id` becomes `Account`, `first_name` becomes `First name`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultHumanizer;

impl Humanizer for DefaultHumanizer {
    fn humanize(&self, attribute_name: &str) -> String {
        let name = attribute_name
            .strip_suffix("_id")
            .unwrap_or(attribute_name)
            .replace('_', " ");
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(char::to_lowercase))
                .collect(),
            None => String::new(),
        }
    }
}

/// Template-table transformer.
///
/// Templates use `%s` placeholders filled positionally with the humanized
/// attribute name and then the violation data. Types without a template
/// render as their snake_case name.
///
/// # Example
///
/// ```rust
/// use validity::validation::{DefaultTransformer, ViolationType};
///
/// let transformer = DefaultTransformer::new()
///     .with_template(ViolationType::Blank, "%s is required");
/// assert_eq!(transformer.render(ViolationType::Blank, "first_name", &[]), "First name is required");
/// ```
#[derive(Clone)]
pub struct DefaultTransformer {
    humanizer: Arc<dyn Humanizer>,
    templates: HashMap<ViolationType, String>,
}

impl DefaultTransformer {
    pub fn new() -> Self {
        Self {
            humanizer: Arc::new(DefaultHumanizer),
            templates: HashMap::new(),
        }
    }

    pub fn with_humanizer(mut self, humanizer: impl Humanizer + 'static) -> Self {
        self.humanizer = Arc::new(humanizer);
        self
    }

    /// Override the template for one violation type.
    pub fn with_template(mut self, violation_type: ViolationType, template: impl Into<String>) -> Self {
        self.templates.insert(violation_type, template.into());
        self
    }

    fn template(&self, violation_type: ViolationType) -> Option<&str> {
        self.templates
            .get(&violation_type)
            .map(String::as_str)
            .or_else(|| violation_type.template())
    }

    pub fn render(
        &self,
        violation_type: ViolationType,
        attribute_name: &str,
        data: &[serde_json::Value],
    ) -> String {
        let Some(template) = self.template(violation_type) else {
            return violation_type.name().to_string();
        };

        let args = std::iter::once(self.humanizer.humanize(attribute_name))
            .chain(data.iter().map(display_value))
            .collect::<Vec<_>>();
        interpolate(template, &args)
    }
}

impl Default for DefaultTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DefaultTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultTransformer")
            .field("templates", &self.templates)
            .finish_non_exhaustive()
    }
}

impl MessageTransformer for DefaultTransformer {
    fn transform(&self, violation: &Violation) -> String {
        match violation.violation_type() {
            Some(violation_type) => self.render(
                violation_type,
                violation.attribute_name(),
                violation.violation_data(),
            ),
            None => violation.custom_message().unwrap_or_default().to_string(),
        }
    }
}

// Fill `%s` placeholders in order; missing arguments render empty.
fn interpolate(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut args = args.iter();
    let mut pieces = template.split("%s");
    if let Some(head) = pieces.next() {
        out.push_str(head);
    }
    for piece in pieces {
        if let Some(arg) = args.next() {
            out.push_str(arg);
        }
        out.push_str(piece);
    }
    out
}

static DEFAULT: LazyLock<RwLock<Arc<dyn MessageTransformer>>> =
    LazyLock::new(|| RwLock::new(Arc::new(DefaultTransformer::new())));

/// The process-wide default transformer.
pub fn default_transformer() -> Arc<dyn MessageTransformer> {
    Arc::clone(&DEFAULT.read().unwrap_or_else(PoisonError::into_inner))
}

/// Replace the process-wide default transformer.
pub fn set_default_transformer(transformer: Arc<dyn MessageTransformer>) {
    *DEFAULT.write().unwrap_or_else(PoisonError::into_inner) = transformer;
}
