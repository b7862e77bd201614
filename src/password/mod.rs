//! Password generation and strength heuristics.
//!
//! Both are pure functions; `VaultService` wraps them with the vault's
//! settings and activity tracking.

pub mod generator;
pub mod strength;

pub use generator::{generate, CharClasses, DEFAULT_LENGTH};
pub use strength::{evaluate, Strength};
