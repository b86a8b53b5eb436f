//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories. They are
//! responsible for:
//! - Enforcing existence rules (a user, pet or household must exist)
//! - Coordinating across repositories (adoption touches users and pets)
//! - Logging mutations

pub mod household;
pub mod pet;
pub mod user;

pub use household::HouseholdService;
pub use pet::PetService;
pub use user::{Adoption, UserService, UserServiceError};
