//! fwbuild - shared utilities for firmware build-automation scripts
//!
//! This crate provides both a library and CLI for fwbuild, including:
//! - External command execution with streamed log capture and failure reports
//! - Version-control queries (current branch, merge-base, changed files)
//! - Build-tool invocation with a reproducible environment
//! - Hardware-definition include resolution
//! - Board impact analysis (which boards a change forces to rebuild)

pub mod boards;
pub mod commands;
pub mod config;
pub mod error;
pub mod git;
pub mod hwdef;
pub mod impact;
pub mod process;
pub mod waf;

pub use error::{Error, Result};
