use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;

/// Closure producing a value from the source's random number generator.
pub type GeneratorFn = Arc<dyn Fn(&mut StdRng) -> serde_json::Value + Send + Sync>;

/// Declarative description of how to produce a field value.
#[derive(Clone)]
pub enum Generator {
    /// Alphanumeric text, `None` = configured default length
    Text { length: Option<usize> },
    /// Integer in `min..=max`
    Integer { min: i64, max: i64 },
    /// Float in `min..max`
    Float { min: f64, max: f64 },
    /// Fair coin
    Boolean,
    /// Counter rendered into a template, `{n}` is replaced by the next value
    Sequence { template: String },
    /// Uniform pick from a fixed list
    OneOf(Vec<serde_json::Value>),
    /// Always the same value
    Constant(serde_json::Value),
    /// Arbitrary closure
    Custom(GeneratorFn),
}

impl Generator {
    pub fn text() -> Self {
        Generator::Text { length: None }
    }

    pub fn text_of(length: usize) -> Self {
        Generator::Text {
            length: Some(length),
        }
    }

    /// Integer generator; bounds are reordered if given backwards.
    pub fn integer(min: i64, max: i64) -> Self {
        Generator::Integer {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Float generator; bounds are reordered if given backwards.
    ///
    /// Bounds are clamped to `±f64::MAX / 2` so the span stays finite; NaN
    /// bounds become `0.0`.
    pub fn float(min: f64, max: f64) -> Self {
        let (min, max) = (Self::float_bound(min), Self::float_bound(max));
        Generator::Float {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub(crate) fn float_bound(value: f64) -> f64 {
        const LIMIT: f64 = f64::MAX / 2.0;
        if value.is_nan() {
            0.0
        } else {
            value.clamp(-LIMIT, LIMIT)
        }
    }

    pub fn boolean() -> Self {
        Generator::Boolean
    }

    pub fn sequence(template: impl Into<String>) -> Self {
        Generator::Sequence {
            template: template.into(),
        }
    }

    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<serde_json::Value>,
    {
        Generator::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn constant(value: impl Into<serde_json::Value>) -> Self {
        Generator::Constant(value.into())
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&mut StdRng) -> serde_json::Value + Send + Sync + 'static,
    {
        Generator::Custom(Arc::new(f))
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generator::Text { length } => f.debug_struct("Text").field("length", length).finish(),
            Generator::Integer { min, max } => f
                .debug_struct("Integer")
                .field("min", min)
                .field("max", max)
                .finish(),
            Generator::Float { min, max } => f
                .debug_struct("Float")
                .field("min", min)
                .field("max", max)
                .finish(),
            Generator::Boolean => f.write_str("Boolean"),
            Generator::Sequence { template } => f
                .debug_struct("Sequence")
                .field("template", template)
                .finish(),
            Generator::OneOf(values) => f.debug_tuple("OneOf").field(values).finish(),
            Generator::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Generator::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
