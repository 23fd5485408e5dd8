//! # Memory Storage Backend
//!
//! In-process implementation of the document store contract, used by
//! tests and by embedders that want the engine without a hosted backend.
//!
//! ## Layout
//!
//! Documents are addressed by the same paths a hosted document store
//! would use:
//!
//! ```text
//! users/{uid}/days/{n}/tasks      ← task collections, one per period
//! users/{uid}/weeks/{n}/tasks
//! users/{uid}/months/{n}/tasks
//! users/{uid}/Goal/goal           ← goal documents, one per scope
//! users/{uid}/monthlyGoals/month-{n}
//! users/{uid}/weeklyGoals/week-{n}
//! ```
//!
//! ## Features
//!
//! - Strictly monotonic creation timestamps (total `created_at` order)
//! - Synchronous snapshot fan-out in registration order
//! - Merge-semantics goal writes

mod connection;
mod goal_repository;
mod task_repository;

pub use connection::MemoryConnection;
pub use goal_repository::MemoryGoalRepository;
pub use task_repository::MemoryTaskRepository;
