//! # kiln - parallel build orchestrator for C/C++ sources
//!
//! kiln probes a compiler, discovers every source under the configured roots,
//! compiles them all in parallel and links the resulting objects into one
//! executable. There is no dependency tracking: every invocation is a full
//! rebuild.
//!
//! ## Pipeline
//!
//! ```text
//! toolchain::locate -> build::discover -> build::compile_all -> build::link
//! ```
//!
//! A failing compile job never stops its siblings. Whether the surviving
//! objects get linked is decided by [`config::FailurePolicy`].
//!
//! ## Module Organization
//!
//! - [`build`] - Discovery, parallel compilation, linking and the orchestrator
//! - [`config`] - Configuration parsing (`kiln.toml`) and flag composition
//! - [`toolchain`] - Compiler detection and external tool installation
//! - [`error`] - Errors that abort a build
//! - [`logging`] - `tracing` subscriber setup

/// Core build system with parallel compilation.
pub mod build;

/// Configuration file parsing (`kiln.toml`).
pub mod config;

/// Build abort reasons.
pub mod error;

/// Log output setup.
pub mod logging;

/// Toolchain detection and external tools.
pub mod toolchain;
