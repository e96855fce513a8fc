//! Scalar field definition within an entity schema.

use crate::generator::Generator;

/// Scalar field definition within an entity schema.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Whether the field must be resolved when building
    pub required: bool,
    /// Generator used when the specification does not mention the field
    pub default: Option<Generator>,
}

impl FieldDef {
    /// Creates a required field with no default generator.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            default: None,
        }
    }

    /// Creates an optional field with no default generator.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            default: None,
        }
    }

    /// Sets the default generator.
    pub fn generated(mut self, generator: Generator) -> Self {
        self.default = Some(generator);
        self
    }
}
