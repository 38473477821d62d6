//! Scope annotations: [`Scope`] and the built-in [`Singleton`].
//!
//! A scope is a small, typically zero-sized type implementing [`Scope`];
//! extending the container with a new scope (a bounded pool, for instance)
//! is a matter of implementing the trait for a new marker type, not
//! registering anything into a runtime table. See `demos/` for a worked
//! `Pooled` scope.

pub use crate::provider::scope_wrapper::{Scope, Singleton};
