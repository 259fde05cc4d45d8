#[path = "../common/mod.rs"]
mod common;

mod auth_tests;
mod command_tests;
mod run_tests;
