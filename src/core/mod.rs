//! core
//!
//! Domain types for cross-repository references: the reference grammar and
//! its security policy, reference discovery across file trees, semantic
//! versions with compatibility rules, and the configuration surface.
//!
//! Everything here is a leaf: no module in `core` performs resolution or
//! touches a cache store, so each is unit-testable in isolation.

pub mod config;
pub mod reference;
pub mod scan;
pub mod version;
