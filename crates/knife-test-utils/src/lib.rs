//! Shared test fixtures for the knife workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`repo`]: [`TestRepo`], a local repository plus a `file://` server in
//!   temporary directories
//! - [`faulty`]: [`FaultyStore`], an in-memory server that fails chosen calls

pub mod faulty;
pub mod repo;

pub use faulty::{Fault, FaultyStore};
pub use repo::TestRepo;
