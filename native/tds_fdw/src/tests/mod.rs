//! Unit and scenario tests for tds_fdw
//!
//! This module organizes the tests into submodules that correspond to the
//! main library modules. Protocol interaction runs against the scripted
//! client in `test_utils`.

mod constants_tests;
mod fdw_tests;
mod planner_tests;
mod proptest_tests;
