//! # Storage Module
//!
//! The remote document store seam for the goal cycle engine.
//!
//! The engine never talks to a concrete backend directly: the domain
//! layer is written against the traits in [`traits`] (query, write, and
//! subscribe primitives over key-path addressed documents), and a
//! backend is chosen by the embedder via a [`Connection`]
//! implementation. The [`memory`] backend is the concrete store used in
//! tests and local embeddings.

pub mod memory;
pub mod traits;

pub use memory::MemoryConnection;
pub use traits::{
    Connection, GoalDoc, GoalPatch, GoalPath, GoalStorage, SnapshotCallback, StoreError,
    TaskScope, TaskStorage, TaskSubscription,
};
