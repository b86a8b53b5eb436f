//! User model

/// A person who may own pets and live in at most one household.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique identifier, assigned by the database
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Household this user lives in, if any
    pub household_id: Option<i64>,
}

/// Validated fields for creating a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub household_id: Option<i64>,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            household_id: None,
        }
    }

    pub fn in_household(mut self, household_id: i64) -> Self {
        self.household_id = Some(household_id);
        self
    }
}

/// Validated fields for updating a user. Only name and email are mutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateUser {
    pub name: String,
    pub email: String,
}

impl User {
    /// Apply an update in place, leaving id and household untouched.
    pub fn apply(&mut self, update: UpdateUser) {
        self.name = update.name;
        self.email = update.email;
    }
}
