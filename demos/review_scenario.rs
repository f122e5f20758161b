//! Review Validation
//!
//! This example validates product reviews in the default context.
//!
//! Key concepts:
//! - Declaring presence and range rules
//! - Collecting every violation in one pass
//! - Reading violation types, data, and rendered messages
//!
//! Run with: cargo run --example review_scenario

use serde_json::json;
use std::sync::Arc;
use validity::builder::{RuleOptions, RuleSpec};
use validity::record::Record;
use validity::validation::{ContextualRuleSet, Validatable};

fn main() {
    println!("=== Review Validation Example ===\n");

    let mut rules = ContextualRuleSet::new();
    rules
        .add(RuleSpec::Presence, &["name"], RuleOptions::new())
        .and_then(|rules| rules.add(RuleSpec::within_range(1, 5), &["rating"], RuleOptions::new()))
        .expect("review rules are well formed");
    let rules = Arc::new(rules);

    let reviews = [
        ("blank name", json!(""), json!(3)),
        ("rating out of range", json!("Sam"), json!(9)),
        ("valid review", json!("Sam"), json!(5)),
    ];

    for (label, name, rating) in reviews {
        println!("Review: {label}");
        let mut review = Record::new("Review", Arc::clone(&rules))
            .with("name", name)
            .with("rating", rating);

        match review.validate(None) {
            Ok(violations) if violations.is_empty() => println!("  valid\n"),
            Ok(violations) => {
                for violation in violations {
                    println!(
                        "  {} [{}] data={:?}",
                        violation.message(),
                        violation
                            .violation_type()
                            .map(|t| t.name())
                            .unwrap_or("custom"),
                        violation.violation_data()
                    );
                }
                println!();
            }
            Err(error) => println!("  validation failed: {error}\n"),
        }
    }

    println!("=== Example Complete ===");
}
