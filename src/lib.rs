//! arena-exec library
//!
//! Builds and runs user-submitted programs against host toolchains with a
//! bounded, uniform result:
//! - Per-request workspaces with guaranteed cleanup
//! - Per-language toolchains (C++, Python, JavaScript)
//! - Deadline-bounded process execution with process-group termination
//! - MCP server exposing the pipeline as a tool

pub mod backend;
pub mod config;
pub mod error;
pub mod language;
pub mod mcp;
pub mod outcome;
pub mod output;
pub mod process;
pub mod toolchain;
pub mod workspace;
