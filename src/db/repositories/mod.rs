//! Database repositories
//!
//! Each repository owns a clone of the pool handle and runs every operation
//! on its own connection; nothing is shared between requests but the pool.

pub mod household;
pub mod pet;
pub mod user;

pub use household::{HouseholdRepository, SqlxHouseholdRepository};
pub use pet::{PetRepository, SqlxPetRepository};
pub use user::{SqlxUserRepository, UserRepository};
