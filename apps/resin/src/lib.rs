//! # resin
//!
//! Command-line surface for the Resin normalized store.
//!
//! The binary wires files and terminal output to the pure engine in
//! `resin-core`: it loads a state snapshot (JSON) and a schema
//! configuration (TOML), executes one read or write, and prints or writes
//! the result.

pub mod cli;
