//! Signup Context
//!
//! This example holds the same account to different rules depending on the
//! validation context.
//!
//! Key concepts:
//! - Rules scoped to a named context with `on`
//! - Guards (`unless`) backed by named conditions
//! - Nested validation picking up the surrounding context
//!
//! Run with: cargo run --example signup_context

use serde_json::json;
use std::sync::Arc;
use validity::builder::{LengthSpec, RuleOptions, RuleSpec};
use validity::core::context;
use validity::record::Record;
use validity::validation::{ContextualRuleSet, Validatable};

fn main() {
    println!("=== Signup Context Example ===\n");

    let mut rules = ContextualRuleSet::new();
    rules
        .add(
            RuleSpec::Presence,
            &["email"],
            RuleOptions::new().on(["default", "signup"]),
        )
        .and_then(|rules| {
            rules.add(
                RuleSpec::Length(LengthSpec::new().minimum(8)),
                &["password"],
                RuleOptions::new().on(["signup"]).unless("invited?"),
            )
        })
        .and_then(|rules| {
            rules.add(
                RuleSpec::confirmation(),
                &["password"],
                RuleOptions::new().on(["signup"]),
            )
        })
        .expect("account rules are well formed");
    let rules = Arc::new(rules);

    let mut account = Record::new("Account", Arc::clone(&rules))
        .with("email", json!("sam@example.com"))
        .with("password", json!("short"))
        .with("password_confirmation", json!("shorter"))
        .with_condition("invited?", |_| false);

    // Example 1: the default context only checks the email
    println!("Example 1: default context");
    report(&mut account, None);

    // Example 2: signup adds password rules
    println!("Example 2: signup context");
    report(&mut account, Some("signup"));

    // Example 3: nested validation inherits the surrounding context
    println!("Example 3: inside with_context(\"signup\")");
    context::with_context("signup", || report(&mut account, None));

    // Example 4: unknown contexts are rejected once rules exist
    println!("Example 4: unknown context");
    report(&mut account, Some("publish"));

    println!("=== Example Complete ===");
}

fn report(account: &mut Record, context_name: Option<&str>) {
    match account.validate(context_name) {
        Ok(violations) if violations.is_empty() => println!("  valid\n"),
        Ok(violations) => {
            for message in violations.full_messages() {
                println!("  {message}");
            }
            println!();
        }
        Err(error) => println!("  {error}\n"),
    }
}
