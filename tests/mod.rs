//! Integration tests for streamscout
//!
//! Tests are organized by component:
//! - justwatch_test: JustWatch GraphQL client against a mock server
//! - normalize_test: Offer table normalization and title lookup
//! - cli_test: Argument parsing, command handlers, JSON output
//! - app_test: TUI state transitions and rendering

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs
