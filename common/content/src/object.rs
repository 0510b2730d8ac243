use serde_json::{Map, Value};

use crate::mode::ValidationMode;
use crate::report::ValidationReport;
use crate::schema::{Schema, ValidatedFields};
use crate::validator::FieldValidator;

/// An immutable record built only from validated fields.
pub trait ValueObject: Sized {
    const SCHEMA: Schema;

    /// Build the object from fields that already passed [`Self::SCHEMA`].
    fn from_fields(fields: ValidatedFields) -> Option<Self>;

    /// Plain JSON form. Absent optional fields are omitted.
    fn to_json_object(&self) -> Map<String, Value>;

    /// JSON-LD form, keyed by `@id` instead of the plain identifier.
    fn to_jsonld_object(&self) -> Map<String, Value>;

    fn from_json(item: &Value, validator: &mut FieldValidator) -> Option<Self> {
        let fields = Self::SCHEMA.evaluate(item, validator)?;
        Self::from_fields(fields)
    }
}

/// Outcome of [`parse`]: the object, if one could be built, and every issue found.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub value: Option<T>,
    pub report: ValidationReport,
}

impl<T> Parsed<T> {
    pub fn is_accepted(&self) -> bool {
        self.value.is_some()
    }
}

pub fn parse<T: ValueObject>(item: &Value, mode: ValidationMode) -> Parsed<T> {
    let mut validator = FieldValidator::new(mode);
    let value = T::from_json(item, &mut validator);
    Parsed {
        value,
        report: validator.into_report(),
    }
}
