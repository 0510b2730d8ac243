use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::validator::{
    field_path, json_type, parse_boolean, parse_integer, parse_string, parse_url, FieldOutcome,
    FieldValidator, IntegerBounds,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Url,
    Integer(IntegerBounds),
    Text { allow_empty: bool },
    Boolean,
}

/// Validation rule for one logical field of a value object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    /// Canonical key, also used to look the value up in [`ValidatedFields`].
    pub name: &'static str,
    /// Alternate keys accepted for the same field, in order of preference.
    pub aliases: &'static [&'static str],
    pub required: bool,
    pub kind: FieldKind,
}

impl FieldRule {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            aliases: &[],
            required: true,
            kind,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            aliases: &[],
            required: false,
            kind,
        }
    }

    pub const fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }

    fn validate(
        &self,
        validator: &mut FieldValidator,
        label: &str,
        key: &str,
        value: Option<&Value>,
    ) -> FieldOutcome<FieldValue> {
        match self.kind {
            FieldKind::Url => validator
                .check_value(label, key, self.required, value, parse_url)
                .map(FieldValue::Url),
            FieldKind::Integer(bounds) => validator
                .check_value(label, key, self.required, value, |value| {
                    parse_integer(value, bounds)
                })
                .map(FieldValue::Integer),
            FieldKind::Text { allow_empty } => validator
                .check_value(label, key, self.required, value, |value| {
                    parse_string(value, allow_empty)
                })
                .map(FieldValue::Text),
            FieldKind::Boolean => validator
                .check_value(label, key, self.required, value, parse_boolean)
                .map(FieldValue::Boolean),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Url(String),
    Integer(i64),
    Text(String),
    Boolean(bool),
}

/// Fields that passed validation, keyed by canonical rule name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedFields {
    values: HashMap<&'static str, FieldValue>,
}

impl ValidatedFields {
    pub fn insert(&mut self, name: &'static str, value: FieldValue) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn url(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(FieldValue::Url(url)) => Some(url),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(FieldValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(FieldValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(FieldValue::Boolean(flag)) => Some(*flag),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Declarative description of a value object's JSON shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    /// Object label used as the first segment of field paths.
    pub label: &'static str,
    pub fields: &'static [FieldRule],
    /// Field that a bare JSON string stands for, if the shorthand is allowed.
    pub shorthand: Option<&'static str>,
}

impl Schema {
    /// Evaluate every rule once against `item`.
    ///
    /// Returns the validated fields when no required field is absent or
    /// invalid and, in strict mode, no optional field is invalid. Keys that
    /// no rule names are ignored.
    pub fn evaluate(
        &self,
        item: &Value,
        validator: &mut FieldValidator,
    ) -> Option<ValidatedFields> {
        let container = match item {
            Value::Object(map) => Some(map),
            Value::String(_) if self.shorthand.is_some() => None,
            Value::String(_) => {
                validator.record_error(self.label, "shorthand string form is not accepted");
                return None;
            }
            other => {
                validator.record_error(
                    self.label,
                    format!("expected an object or a string, found {}", json_type(other)),
                );
                return None;
            }
        };

        let strict = validator.is_strict();
        let mut fields = ValidatedFields::default();
        let mut accepted = true;

        for rule in self.fields {
            let (key, value) = match container {
                Some(map) => match self.locate(map, rule, validator) {
                    Some((key, value)) => (key, Some(value)),
                    None => (rule.name, None),
                },
                None if self.shorthand == Some(rule.name) => (rule.name, Some(item)),
                None => (rule.name, None),
            };

            match rule.validate(validator, self.label, key, value) {
                FieldOutcome::Valid(value) => fields.insert(rule.name, value),
                FieldOutcome::Absent => accepted &= !rule.required,
                FieldOutcome::Invalid(_) if rule.required || strict => accepted = false,
                FieldOutcome::Invalid(reason) => {
                    debug!(object = self.label, field = key, %reason, "dropping invalid optional field");
                }
            }
        }

        accepted.then_some(fields)
    }

    /// First non-null key of the rule wins: canonical name, then aliases.
    fn locate<'a>(
        &self,
        map: &'a Map<String, Value>,
        rule: &FieldRule,
        validator: &mut FieldValidator,
    ) -> Option<(&'static str, &'a Value)> {
        let mut present = rule
            .keys()
            .filter_map(|key| map.get(key).filter(|value| !value.is_null()).map(|value| (key, value)));
        let (key, value) = present.next()?;

        let shadowed: Vec<&str> = present.map(|(other, _)| other).collect();
        if !shadowed.is_empty() {
            validator.record_warning(
                field_path(self.label, key),
                format!("takes precedence over {}", shadowed.join(", ")),
            );
        }
        Some((key, value))
    }
}
