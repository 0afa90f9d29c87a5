#![no_main]
//! Fuzz test for option validation
//!
//! Option lists come straight from user DDL. Each input line is read as
//! `name=value`; validation must reject bad input with an error, never panic.

use libfuzzer_sys::fuzz_target;
use tds_fdw::{validate_options, FdwOption, OptionContext};

const CONTEXTS: [OptionContext; 4] = [
    OptionContext::Wrapper,
    OptionContext::Server,
    OptionContext::Table,
    OptionContext::UserMapping,
];

fuzz_target!(|data: &[u8]| {
    let Some((selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(text) = std::str::from_utf8(rest) else {
        return;
    };

    let options: Vec<FdwOption> = text
        .lines()
        .map(|line| match line.split_once('=') {
            Some((name, value)) => FdwOption::new(name, value),
            None => FdwOption::new(line, ""),
        })
        .collect();

    let context = CONTEXTS[usize::from(*selector) % CONTEXTS.len()];
    let _ = validate_options(&options, context);
});
