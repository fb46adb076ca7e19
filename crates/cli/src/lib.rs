//! testtool CLI
//!
//! Command-line front end for listing modules and submitting them against
//! a backend without the web console.

pub mod commands;
pub mod output;
