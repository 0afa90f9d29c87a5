//! Tests for constants.rs - Option table and fixed defaults
//!
//! These tests verify that the static option table assigns every option to
//! exactly one catalog context.

// Allow unwrap() in tests for cleaner test code
#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use crate::constants::{
    DEFAULT_SERVERNAME, LOCAL_SERVERNAMES, LOCAL_STARTUP_COST, REMOTE_STARTUP_COST,
    TABLE_QUERY_PREFIX, VALID_OPTIONS,
};
use crate::models::OptionContext;

#[test]
fn test_option_names_are_unique() {
    let names: HashSet<_> = VALID_OPTIONS.iter().map(|(name, _)| *name).collect();
    assert_eq!(names.len(), VALID_OPTIONS.len());
}

#[test]
fn test_option_contexts() {
    let context_of = |option: &str| {
        VALID_OPTIONS
            .iter()
            .find(|(name, _)| *name == option)
            .map(|(_, ctx)| *ctx)
            .unwrap()
    };

    for option in ["servername", "language", "character_set", "port"] {
        assert_eq!(context_of(option), OptionContext::Server, "{option}");
    }
    for option in ["username", "password"] {
        assert_eq!(context_of(option), OptionContext::UserMapping, "{option}");
    }
    for option in ["database", "query", "table"] {
        assert_eq!(context_of(option), OptionContext::Table, "{option}");
    }
    assert!(!VALID_OPTIONS
        .iter()
        .any(|(_, ctx)| *ctx == OptionContext::Wrapper));
}

#[test]
fn test_defaults() {
    assert_eq!(DEFAULT_SERVERNAME, "127.0.0.1");
    assert!(LOCAL_SERVERNAMES.contains(&DEFAULT_SERVERNAME));
    assert_eq!(TABLE_QUERY_PREFIX, "SELECT * FROM ");
    assert!(LOCAL_STARTUP_COST < REMOTE_STARTUP_COST);
}
