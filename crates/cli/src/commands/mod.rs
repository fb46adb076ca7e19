//! CLI Commands

pub mod modules;
pub mod submit;
