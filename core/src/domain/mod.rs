//! # Domain Module
//!
//! Business logic for the goal cycle engine.
//!
//! This module is where the cycle's rules live, independent of any
//! rendering surface or storage backend.
//!
//! ## Module Organization
//!
//! - **period**: pure mapping from elapsed days to month/week/day buckets
//! - **task_service**: per-period task lists kept in sync with the
//!   remote collection through a single live subscription
//! - **goal_service**: one-shot goal records (cycle, monthly, weekly)
//!   with merge-semantics writes
//! - **session**: the owned root object handed to every consumer
//! - **navigation**: the declarative period list for the surface
//!
//! ## Core Concepts
//!
//! - **Cycle**: an 84-day run toward one goal, bucketed into 3 months,
//!   12 weeks, and 84 days
//! - **Period**: one such bucket; each owns a disjoint task collection
//! - **Snapshot**: a full replacement delivery of a period's tasks from
//!   the remote store; always the single source of displayed state
//!
//! ## Design Principles
//!
//! - **Storage Agnostic**: services are generic over the storage
//!   connection
//! - **No optimistic task state**: task lists converge through snapshot
//!   replay, never local mutation
//! - **No globals**: the session object is created at app start and
//!   passed explicitly

pub mod goal_service;
pub mod navigation;
pub mod period;
pub mod session;
pub mod task_service;

pub use goal_service::*;
pub use navigation::*;
pub use period::*;
pub use session::*;
pub use task_service::*;
