#![no_main]
//! Fuzz test for option resolution
//!
//! Splits the input into table, server and user mapping sections separated
//! by blank lines and resolves them. A successful resolution must always
//! produce a non-empty query.

use libfuzzer_sys::fuzz_target;
use tds_fdw::{resolve_options, FdwOption};

fn parse_level(section: &str) -> Vec<FdwOption> {
    section
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(name, value)| FdwOption::new(name, value))
        .collect()
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let mut sections = text.split("\n\n");
    let table = parse_level(sections.next().unwrap_or_default());
    let server = parse_level(sections.next().unwrap_or_default());
    let user_mapping = parse_level(sections.next().unwrap_or_default());

    if let Ok(plan) = resolve_options(&table, &server, &user_mapping) {
        assert!(!plan.query().is_empty() || table.iter().any(|o| o.name == "query"));
        let _ = plan.host_string();
    }
});
