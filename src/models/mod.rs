//! Data models
//!
//! Database entities (User, Pet, Household) and the validated input types
//! used to create or change them.

mod household;
mod pet;
mod user;

pub use household::{Household, NewHousehold};
pub use pet::{NewPet, Pet};
pub use user::{NewUser, UpdateUser, User};
