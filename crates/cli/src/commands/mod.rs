//! CLI Commands

pub mod configure;
pub mod prompt;
pub mod publish;
