#![deny(missing_docs)]

//! Capability probe harness for an MCP memory service integration.

/// Memory service client abstraction and adapters.
pub mod client;
/// Environment-driven configuration management.
pub mod config;
/// Sequential probe execution and aggregation.
pub mod harness;
/// Structured logging and tracing setup.
pub mod logging;
/// Probe contract and standard checks.
pub mod probe;
/// Run results and their renderings.
pub mod report;
/// Standard probe suite.
pub mod suite;
