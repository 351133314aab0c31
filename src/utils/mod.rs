//! Utility modules for the publisher.

pub mod checker;
pub mod command;
pub mod git;
pub mod log;
