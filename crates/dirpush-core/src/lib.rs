//! dirpush Core - Domain logic and contracts
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `RemoteId`, `LocalTree`, `LocalNode`
//! - **Port definitions** - Traits for adapters: `IRemoteHierarchy`, `IStatusReporter`
//! - **Operation governor** - The ceiling on mutating remote calls, carried in `OpContext`
//! - **Configuration** - `PushConfig`, loaded from YAML and validated before a run
//!
//! # Architecture
//!
//! The domain module contains pure data structures with no I/O beyond reading
//! metadata handed to it. Ports define trait interfaces that adapter crates
//! implement; the reconciler in `dirpush-sync` drives them.

pub mod config;
pub mod domain;
pub mod error;
pub mod governor;
pub mod ports;

pub use error::{PushError, RemoteOp};
pub use governor::{CeilingPolicy, GovernorError, OpContext, OperationGovernor};
