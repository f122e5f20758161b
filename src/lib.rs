//! Validity: a contextual validation engine
//!
//! Validity checks structured objects against declarative rules. Rules are
//! grouped into named contexts ("default", "signup", "publish", ...), so the
//! same object can be held to different standards at different moments of
//! its life. Every violated rule is collected rather than stopping at the
//! first one, and violations render human-readable messages through a
//! pluggable transformer.
//!
//! # Core Concepts
//!
//! - **Subject**: Anything that exposes attributes via the `Subject` trait
//! - **Rules**: Presence, length, format, numeric, inclusion and friends
//! - **Contexts**: One rule set per context, selected per validation call
//! - **Violations**: Accumulated per attribute, with lazy message rendering
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use validity::builder::{RuleOptions, RuleSpec};
//! use validity::record::Record;
//! use validity::validation::{ContextualRuleSet, Validatable, ViolationType};
//!
//! let mut rules = ContextualRuleSet::new();
//! rules
//!     .add(RuleSpec::Presence, &["name"], RuleOptions::new())
//!     .unwrap()
//!     .add(RuleSpec::within_range(1, 5), &["rating"], RuleOptions::new())
//!     .unwrap();
//! let rules = Arc::new(rules);
//!
//! let mut review = Record::new("Review", Arc::clone(&rules))
//!     .with("name", json!(""))
//!     .with("rating", json!(9));
//!
//! let violations = review.validate(None).unwrap();
//! assert_eq!(violations.len(), 2);
//! assert_eq!(violations.full_messages(), vec![
//!     "Name must not be blank".to_string(),
//!     "Rating must be between 1 and 5".to_string(),
//! ]);
//!
//! let rating = &violations.on("rating").unwrap()[0];
//! assert_eq!(rating.violation_type(), Some(ViolationType::ValueBetween));
//! assert_eq!(rating.violation_data(), &[json!(1), json!(5)]);
//!
//! review.set("name", json!("Sam"));
//! review.set("rating", json!(4));
//! assert!(review.is_valid(None).unwrap());
//! ```

pub mod builder;
pub mod core;
pub mod record;
pub mod rules;
pub mod validation;

// Re-export commonly used types
pub use builder::{DeclarationError, PropertySpec, RuleOptions, RuleSpec};
pub use crate::core::{with_context, Condition, Subject};
pub use record::{MemoryIndex, Record};
pub use rules::{Rule, RuleKind};
pub use validation::{
    ContextualRuleSet, RuleSet, Validatable, ValidationConfig, ValidationError, Violation,
    ViolationSet, ViolationType,
};
