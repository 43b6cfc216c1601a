//! Fathom MCP tool surface.
//!
//! `schemas` holds the tool arguments, `operations` the tool bodies, `output` the
//! pruning/serialization of results and `service` the rmcp wiring.

mod error;
mod operations;
mod output;
mod schemas;
mod service;

pub use service::FathomService;
