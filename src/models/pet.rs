//! Pet model

/// A pet. Owned by any number of users through the `user_pet` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pet {
    pub id: i64,
    pub name: String,
    /// Species, e.g. "dog"
    pub animal: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPet {
    pub name: String,
    pub animal: String,
}

impl NewPet {
    pub fn new(name: impl Into<String>, animal: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            animal: animal.into(),
        }
    }
}
