//! Household model

/// A residence. Users point at it through `users.household_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Household {
    pub id: i64,
    pub address: String,
    /// Kind of residence, e.g. "house" or "apartment"
    pub residence_type: String,
    pub fenced_yard: bool,
    pub grass_access: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHousehold {
    pub address: String,
    pub residence_type: String,
    pub fenced_yard: bool,
    pub grass_access: bool,
}
