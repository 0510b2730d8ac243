use serde_json::{Map, Value};

use crate::error::{ContentError, ContentResult};
use crate::mode::ValidationMode;
use crate::object::{parse, ValueObject};
use crate::schema::{FieldKind, FieldRule, Schema, ValidatedFields};
use crate::validator::IntegerBounds;

const DIMENSION: IntegerBounds = IntegerBounds::at_least(0)
    .with_max(u32::MAX as i64)
    .allowing_float();

// `url` is preferred over `@id` when an item carries both.
const IMAGE_FIELDS: &[FieldRule] = &[
    FieldRule::required("url", FieldKind::Url).with_aliases(&["@id"]),
    FieldRule::optional("width", FieldKind::Integer(DIMENSION)),
    FieldRule::optional("height", FieldKind::Integer(DIMENSION)),
];

/// Content-item image, such as an icon or thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    url: String,
    width: Option<u32>,
    height: Option<u32>,
}

impl Image {
    /// Construct from trusted values; no validation is performed.
    pub fn new(url: impl Into<String>, width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            url: url.into(),
            width,
            height,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }

    /// Parse and validate, returning the full report when rejected.
    pub fn try_from_json(item: &Value, mode: ValidationMode) -> ContentResult<Self> {
        let parsed = parse::<Image>(item, mode);
        match parsed.value {
            Some(image) => Ok(image),
            None => Err(ContentError::Rejected {
                object: Self::SCHEMA.label,
                report: parsed.report,
            }),
        }
    }

    fn with_dimensions(&self, mut object: Map<String, Value>) -> Map<String, Value> {
        if let Some(width) = self.width {
            object.insert("width".to_string(), Value::from(width));
        }
        if let Some(height) = self.height {
            object.insert("height".to_string(), Value::from(height));
        }
        object
    }
}

impl ValueObject for Image {
    const SCHEMA: Schema = Schema {
        label: "Image",
        fields: IMAGE_FIELDS,
        shorthand: Some("url"),
    };

    fn from_fields(fields: ValidatedFields) -> Option<Self> {
        let url = fields.url("url").filter(|url| !url.is_empty())?;
        let dimension = |name: &str| fields.integer(name).and_then(|value| u32::try_from(value).ok());
        Some(Self::new(url, dimension("width"), dimension("height")))
    }

    fn to_json_object(&self) -> Map<String, Value> {
        let mut object = Map::new();
        object.insert("url".to_string(), Value::String(self.url.clone()));
        self.with_dimensions(object)
    }

    fn to_jsonld_object(&self) -> Map<String, Value> {
        let mut object = Map::new();
        object.insert("@id".to_string(), Value::String(self.url.clone()));
        self.with_dimensions(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::FieldValidator;
    use serde_json::json;

    fn lenient(item: Value) -> Option<Image> {
        Image::from_json(&item, &mut FieldValidator::lenient())
    }

    fn strict(item: Value) -> Option<Image> {
        Image::from_json(&item, &mut FieldValidator::strict())
    }

    #[test]
    fn builds_from_full_object() {
        let image = strict(json!({
            "url": "https://example.test/img.png",
            "width": 64,
            "height": 48
        }))
        .expect("image");
        assert_eq!(image, Image::new("https://example.test/img.png", Some(64), Some(48)));
    }

    #[test]
    fn serializations_omit_absent_dimensions() {
        let image = Image::new("https://example.test/img.png", None, Some(10));
        assert_eq!(
            Value::Object(image.to_json_object()),
            json!({ "url": "https://example.test/img.png", "height": 10 })
        );
        assert_eq!(
            Value::Object(image.to_jsonld_object()),
            json!({ "@id": "https://example.test/img.png", "height": 10 })
        );
    }

    #[test]
    fn accepts_jsonld_identifier() {
        let image = strict(json!({ "@id": "https://example.test/a.png", "width": 1 })).expect("image");
        assert_eq!(image.url(), "https://example.test/a.png");
        assert_eq!(image.width(), Some(1));
    }

    #[test]
    fn url_wins_over_jsonld_identifier() {
        let item = json!({ "@id": "https://example.test/ld.png", "url": "https://example.test/plain.png" });
        let parsed = parse::<Image>(&item, ValidationMode::Strict);
        let image = parsed.value.expect("image");
        assert_eq!(image.url(), "https://example.test/plain.png");
        assert!(parsed.report.mentions("Image/url"));
        assert!(!parsed.report.has_errors());
    }

    #[test]
    fn shorthand_string_is_the_url() {
        let image = lenient(json!("https://example.test/img.png")).expect("image");
        assert_eq!(image, Image::new("https://example.test/img.png", None, None));
        assert!(lenient(json!("not a url")).is_none());
    }

    #[test]
    fn negative_width_depends_on_mode() {
        let item = json!({ "url": "https://example.test/img.png", "width": -1 });
        assert!(strict(item.clone()).is_none());

        let image = lenient(item).expect("lenient keeps image");
        assert_eq!(image.url(), "https://example.test/img.png");
        assert_eq!(image.width(), None);
    }

    #[test]
    fn integral_floats_are_coerced() {
        let image = strict(json!({ "url": "https://example.test/img.png", "height": 32.0 })).expect("image");
        assert_eq!(image.height(), Some(32));
    }

    #[test]
    fn missing_url_is_always_rejected() {
        assert!(strict(json!({})).is_none());
        assert!(lenient(json!({})).is_none());
        assert!(lenient(json!({ "width": 10, "height": 10 })).is_none());
    }

    #[test]
    fn try_from_json_returns_report() {
        let err = Image::try_from_json(&json!({ "width": "wide" }), ValidationMode::Lenient)
            .expect_err("missing url");
        let report = err.report();
        assert!(report.mentions("Image/url"));
        assert!(report.mentions("Image/width"));
        assert!(err.to_string().starts_with("Image rejected: "));
    }
}
