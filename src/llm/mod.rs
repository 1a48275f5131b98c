//! Collaborator interfaces for external services.
//!
//! The collaboration loops in this crate never perform I/O themselves; every
//! external call happens behind one of the traits in this module. Concrete
//! implementations (HTTP clients for hosted models, search APIs) live in the
//! applications that embed the crate; the test suites here use scripted
//! doubles.

pub mod gateway;
pub mod search;

pub use gateway::CompletionGateway;
pub use search::SearchProvider;
