//! Bootstrap pinned developer tooling and manage encrypted project secrets.
//!
//! Two binaries ship from this package:
//! - `secrets`: keygen/encrypt/decrypt subcommands that delegate all
//!   cryptography to pinned releases of age-keygen and sops, downloaded
//!   into a local cache on first use.
//! - `mise-run`: ensures the mise version manager is installed, then
//!   replaces itself with either `mise install` or the given command line.

pub mod app;
pub mod command;
pub mod config;
pub mod error;
pub mod tools;
