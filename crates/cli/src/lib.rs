//! PowerSeq CLI
//!
//! Command-line front end for the PowerSeq sequence generator.

pub mod commands;
pub mod output;
pub mod prompt;
