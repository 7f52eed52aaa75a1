pub mod auth;
pub mod availability;
pub mod routes;
pub mod types;
pub mod username_check;
pub mod validation;

// Convenient re-exports (so call sites can do `linkit_core::UsernameCheck`, etc.)
pub use availability::{AvailabilityClient, CheckError, HttpAvailabilityClient, MockAvailabilityClient};
pub use username_check::{CheckPhase, UsernameCheck, UsernameCheckState};
pub use validation::{Username, ValidationError, normalize_username, validate_username};
