//! Shared API response types
//!
//! Every entity is rendered through an explicit response struct so the wire
//! shape stays fixed even if the models grow.

use serde::{Deserialize, Serialize};

use crate::models::{Household, Pet, User};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub household_id: Option<i64>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            household_id: user.household_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PetResponse {
    pub id: i64,
    pub name: String,
    pub animal: String,
}

impl From<Pet> for PetResponse {
    fn from(pet: Pet) -> Self {
        Self {
            id: pet.id,
            name: pet.name,
            animal: pet.animal,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HouseholdResponse {
    pub id: i64,
    pub address: String,
    pub residence_type: String,
    pub fenced_yard: bool,
    pub grass_access: bool,
}

impl From<Household> for HouseholdResponse {
    fn from(household: Household) -> Self {
        Self {
            id: household.id,
            address: household.address,
            residence_type: household.residence_type,
            fenced_yard: household.fenced_yard,
            grass_access: household.grass_access,
        }
    }
}

/// `{"message": "..."}`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
