use std::env;

/// Environment variable consulted by [`ValidationMode::from_env`].
pub const STRICT_VALIDATION_ENV: &str = "LTI_STRICT_VALIDATION";

/// Controls whether an invalid optional field rejects its owning object.
///
/// Required-field failures reject the object in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Any invalid field, required or not, rejects the object.
    Strict,
    /// Invalid optional fields are dropped with a warning.
    #[default]
    Lenient,
}

impl ValidationMode {
    pub fn is_strict(self) -> bool {
        matches!(self, ValidationMode::Strict)
    }

    /// Read the mode from `LTI_STRICT_VALIDATION`, defaulting to lenient.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(STRICT_VALIDATION_ENV).map(|value| is_truthy(&value)) {
            Some(true) => ValidationMode::Strict,
            _ => ValidationMode::Lenient,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
