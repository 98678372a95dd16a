#![allow(dead_code)]

use membank_core::errors::{MembankError, Result};
use membank_core::{Entity, FieldDef, FieldType, Record, RecordType, Value};

/// Dog with an implicit identity and two defaulted fields
#[derive(Debug, Clone, PartialEq)]
pub struct Dog {
    pub id: Option<i64>,
    pub breed: String,
    pub color: Option<String>,
    pub weight: Option<f64>,
}

impl Dog {
    pub fn new(breed: &str) -> Self {
        Self {
            id: None,
            breed: breed.to_string(),
            color: None,
            weight: None,
        }
    }

    pub fn weighing(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }
}

impl Entity for Dog {
    fn record_type() -> RecordType {
        RecordType::new("Dog")
            .field(FieldDef::text("breed"))
            .field(FieldDef::text("color").with_default("black"))
            .field(FieldDef::real("weight").with_default(0.0))
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new("dog")
            .with("breed", self.breed.as_str())
            .with("color", self.color.clone())
            .with("weight", self.weight);
        if let Some(id) = self.id {
            record.set("id", id);
        }
        record
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: record.id(),
            breed: record.text("breed").unwrap_or_default().to_string(),
            color: record.text("color").map(str::to_string),
            weight: record.get("weight").and_then(Value::as_f64),
        })
    }

    fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

/// Earlier shape of the dog table: breed only
#[derive(Debug, Clone, PartialEq)]
pub struct OldDog {
    pub id: Option<i64>,
    pub breed: String,
}

impl OldDog {
    pub fn new(breed: &str) -> Self {
        Self {
            id: None,
            breed: breed.to_string(),
        }
    }
}

impl Entity for OldDog {
    fn record_type() -> RecordType {
        RecordType::new("dog").field(FieldDef::text("breed"))
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new("dog").with("breed", self.breed.as_str());
        if let Some(id) = self.id {
            record.set("id", id);
        }
        record
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: record.id(),
            breed: record.text("breed").unwrap_or_default().to_string(),
        })
    }

    fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

/// Booking whose `id` field is derived from the description when empty
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub amount: f64,
    pub description: String,
    pub id: String,
}

impl Transaction {
    pub fn new(amount: f64, description: &str) -> Self {
        Self {
            amount,
            description: description.to_string(),
            id: String::new(),
        }
    }
}

impl Entity for Transaction {
    fn record_type() -> RecordType {
        RecordType::new("Transaction")
            .field(FieldDef::real("amount"))
            .field(FieldDef::text("description"))
            .field(FieldDef::text("id").derived_by("add_id"))
    }

    fn to_record(&self) -> Record {
        Record::new("transaction")
            .with("amount", self.amount)
            .with("description", self.description.as_str())
            .with("id", self.id.as_str())
    }

    fn from_record(record: &Record) -> Result<Self> {
        let amount = record
            .get("amount")
            .and_then(Value::as_f64)
            .ok_or_else(|| MembankError::MissingColumn {
                table: "transaction".to_string(),
                field: "amount".to_string(),
            })?;
        Ok(Self {
            amount,
            description: record.text("description").unwrap_or_default().to_string(),
            id: record.text("id").unwrap_or_default().to_string(),
        })
    }

    fn derive(&self, method: &str) -> Option<std::result::Result<Value, String>> {
        match method {
            "add_id" => Some(Ok(Value::from(format!("special_id:{}", self.description)))),
            _ => None,
        }
    }
}

/// User identified by a natural key
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub email: String,
    pub name: String,
}

impl Entity for User {
    fn record_type() -> RecordType {
        RecordType::new("user")
            .field(FieldDef::text("email").key())
            .field(FieldDef::text("name"))
    }

    fn to_record(&self) -> Record {
        Record::new("user")
            .with("email", self.email.as_str())
            .with("name", self.name.as_str())
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            email: record.text("email").unwrap_or_default().to_string(),
            name: record.text("name").unwrap_or_default().to_string(),
        })
    }
}

/// Type holding another record type as a field
pub struct Kennel;

impl Entity for Kennel {
    fn record_type() -> RecordType {
        RecordType::new("kennel")
            .field(FieldDef::text("name"))
            .field(FieldDef::new("resident", FieldType::Record("dog".to_string())))
    }

    fn to_record(&self) -> Record {
        Record::new("kennel").with("name", "north")
    }

    fn from_record(_record: &Record) -> Result<Self> {
        Ok(Self)
    }
}

/// Type named after a facade operation
pub struct Put;

impl Entity for Put {
    fn record_type() -> RecordType {
        RecordType::new("put").field(FieldDef::text("name"))
    }

    fn to_record(&self) -> Record {
        Record::new("put").with("name", "x")
    }

    fn from_record(_record: &Record) -> Result<Self> {
        Ok(Self)
    }
}

/// Dog that grew a text-only field without a default
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedDog {
    pub id: Option<i64>,
    pub breed: String,
    pub owner: Option<String>,
}

impl Entity for OwnedDog {
    fn record_type() -> RecordType {
        RecordType::new("dog")
            .field(FieldDef::text("breed"))
            .field(FieldDef::text("owner"))
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new("dog")
            .with("breed", self.breed.as_str())
            .with("owner", self.owner.clone());
        if let Some(id) = self.id {
            record.set("id", id);
        }
        record
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: record.id(),
            breed: record.text("breed").unwrap_or_default().to_string(),
            owner: record.text("owner").map(str::to_string),
        })
    }

    fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}
