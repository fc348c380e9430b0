//! Domain enumerations
//!
//! Fixed value sets shared between the server and API clients.
//! Records themselves (users, shops, jobs, rules) live in the server's db layer.

pub mod certification;
pub mod job;
pub mod role;

// Re-exports
pub use certification::*;
pub use job::*;
pub use role::*;
