//! Identity: users, sessions and the authoritative caller profile

pub mod actor;
mod error;
mod service;
pub mod stats;

pub use actor::Actor;
pub use error::{IdentityError, IdentityResult};
pub use service::{
    IdentityService, LoginRequest, LoginResponse, ProfileUpdate, SettingsUpdate, SignupRequest,
    SignupResponse,
};
pub use stats::{UserStats, progress_to_goal, weekly_snapshot};
