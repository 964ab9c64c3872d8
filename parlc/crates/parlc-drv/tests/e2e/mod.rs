pub mod cli_tests;
pub mod compilation_tests;
pub mod seed_scenarios;
