//! Validation of JSON and JSON-LD content-item fragments received from a
//! remote LTI platform or tool.
//!
//! Raw JSON is evaluated against a declarative [`Schema`] by a
//! [`FieldValidator`], which accumulates every problem it finds into a
//! [`ValidationReport`]. Value objects such as [`Image`] are only constructed
//! from fields that passed validation.

pub mod error;
pub mod image;
pub mod mode;
pub mod object;
pub mod report;
pub mod schema;
pub mod validator;

pub use error::{ContentError, ContentResult};
pub use image::Image;
pub use mode::ValidationMode;
pub use object::{parse, Parsed, ValueObject};
pub use report::{FieldIssue, IssueSeverity, ValidationReport};
pub use schema::{FieldKind, FieldRule, FieldValue, Schema, ValidatedFields};
pub use validator::{FieldOutcome, FieldValidator, IntegerBounds};
