//! RC Node CLI library: command implementations shared by the `rcnode`
//! binary and its integration tests.

pub mod commands;
