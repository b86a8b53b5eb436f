//! Request schemas
//!
//! Turns raw JSON payloads into the typed inputs in [`crate::models`],
//! collecting every field-level problem into [`ValidationErrors`]. The
//! error map is what clients receive as the body of a 400 response, e.g.
//!
//! ```json
//! {"name": ["Missing data for required field."], "extra": ["Unknown field."]}
//! ```

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::{NewHousehold, NewPet, NewUser, UpdateUser};

pub const MISSING: &str = "Missing data for required field.";
pub const NULL: &str = "Field may not be null.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const NOT_A_BOOLEAN: &str = "Not a valid boolean.";
pub const NOT_AN_INTEGER: &str = "Not a valid integer.";
pub const NOT_A_LIST: &str = "Not a valid list.";
pub const UNKNOWN_FIELD: &str = "Unknown field.";
pub const INVALID_INPUT: &str = "Invalid input type.";

/// Key used for errors that concern the payload as a whole
pub const SCHEMA_KEY: &str = "_schema";

// Column widths from the migrations.
pub const USER_NAME_MAX: usize = 50;
pub const USER_EMAIL_MAX: usize = 200;
pub const PET_NAME_MAX: usize = 50;
pub const PET_ANIMAL_MAX: usize = 100;
pub const HOUSEHOLD_ADDRESS_MAX: usize = 255;
pub const HOUSEHOLD_RESIDENCE_TYPE_MAX: usize = 100;

/// Field name to messages, ordered by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single error for one field
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field
    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// A payload shape that can be loaded from JSON.
pub trait Schema: Sized {
    fn load(payload: &Value) -> Result<Self, ValidationErrors>;
}

/// Reads declared fields out of a JSON object, accumulating errors.
///
/// Accessors return a placeholder when a field is invalid; callers must
/// only use the values once [`Fields::finish`] succeeded.
struct Fields<'a> {
    object: &'a Map<String, Value>,
    declared: Vec<&'static str>,
    errors: ValidationErrors,
}

impl<'a> Fields<'a> {
    fn new(payload: &'a Value) -> Result<Self, ValidationErrors> {
        match payload {
            Value::Object(object) => Ok(Self {
                object,
                declared: Vec::new(),
                errors: ValidationErrors::new(),
            }),
            _ => Err(ValidationErrors::single(SCHEMA_KEY, INVALID_INPUT)),
        }
    }

    fn required(&mut self, name: &'static str) -> Option<&'a Value> {
        self.declared.push(name);
        match self.object.get(name) {
            None => {
                self.errors.add(name, MISSING);
                None
            }
            Some(Value::Null) => {
                self.errors.add(name, NULL);
                None
            }
            Some(value) => Some(value),
        }
    }

    fn string(&mut self, name: &'static str, max_len: usize) -> String {
        match self.required(name) {
            Some(Value::String(s)) => {
                if s.chars().count() > max_len {
                    self.errors
                        .add(name, format!("Longer than maximum length {}.", max_len));
                }
                s.clone()
            }
            Some(_) => {
                self.errors.add(name, NOT_A_STRING);
                String::new()
            }
            None => String::new(),
        }
    }

    fn boolean(&mut self, name: &'static str) -> bool {
        match self.required(name) {
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                self.errors.add(name, NOT_A_BOOLEAN);
                false
            }
            None => false,
        }
    }

    fn optional_id(&mut self, name: &'static str) -> Option<i64> {
        self.declared.push(name);
        match self.object.get(name) {
            None | Some(Value::Null) => None,
            Some(value) => match value.as_i64() {
                Some(id) => Some(id),
                None => {
                    self.errors.add(name, NOT_AN_INTEGER);
                    None
                }
            },
        }
    }

    /// Accept a read-only integer field (e.g. `id` echoed back by a client)
    /// and discard it. Type errors are still reported.
    fn read_only_id(&mut self, name: &'static str) {
        self.optional_id(name);
    }

    fn id_list(&mut self, name: &'static str) -> Vec<i64> {
        match self.required(name) {
            Some(Value::Array(items)) => {
                let mut ids = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match item.as_i64() {
                        Some(id) => ids.push(id),
                        None => self.errors.add(format!("{}.{}", name, index), NOT_AN_INTEGER),
                    }
                }
                ids
            }
            Some(_) => {
                self.errors.add(name, NOT_A_LIST);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    fn finish(mut self) -> Result<(), ValidationErrors> {
        for key in self.object.keys() {
            if !self.declared.contains(&key.as_str()) {
                self.errors.add(key.clone(), UNKNOWN_FIELD);
            }
        }
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

impl Schema for NewUser {
    fn load(payload: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(payload)?;
        let name = fields.string("name", USER_NAME_MAX);
        let email = fields.string("email", USER_EMAIL_MAX);
        let household_id = fields.optional_id("household_id");
        fields.read_only_id("id");
        fields.finish()?;

        Ok(Self {
            name,
            email,
            household_id,
        })
    }
}

impl Schema for UpdateUser {
    fn load(payload: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(payload)?;
        let name = fields.string("name", USER_NAME_MAX);
        let email = fields.string("email", USER_EMAIL_MAX);
        // Household membership is not changed through an update.
        fields.read_only_id("id");
        fields.read_only_id("household_id");
        fields.finish()?;

        Ok(Self { name, email })
    }
}

impl Schema for NewPet {
    fn load(payload: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(payload)?;
        let name = fields.string("name", PET_NAME_MAX);
        let animal = fields.string("animal", PET_ANIMAL_MAX);
        fields.read_only_id("id");
        fields.finish()?;

        Ok(Self { name, animal })
    }
}

impl Schema for NewHousehold {
    fn load(payload: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(payload)?;
        let address = fields.string("address", HOUSEHOLD_ADDRESS_MAX);
        let residence_type = fields.string("residence_type", HOUSEHOLD_RESIDENCE_TYPE_MAX);
        let fenced_yard = fields.boolean("fenced_yard");
        let grass_access = fields.boolean("grass_access");
        fields.read_only_id("id");
        fields.finish()?;

        Ok(Self {
            address,
            residence_type,
            fenced_yard,
            grass_access,
        })
    }
}

/// Body of the batch adoption endpoint: `{"pet_ids": [1, 2, 3]}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetIds {
    pub pet_ids: Vec<i64>,
}

impl Schema for PetIds {
    fn load(payload: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(payload)?;
        let pet_ids = fields.id_list("pet_ids");
        fields.finish()?;

        Ok(Self { pet_ids })
    }
}
