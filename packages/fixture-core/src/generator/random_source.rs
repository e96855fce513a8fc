use std::collections::HashMap;

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::generator::Generator;

/// Supplies values for fields the specification leaves open.
pub trait GeneratorSource: Send {
    /// Produces a value for `field` according to `generator`.
    fn generate(&mut self, field: &str, generator: &Generator) -> serde_json::Value;

    /// Restores the initial state (seed and sequence counters).
    fn reset(&mut self);
}

/// Default [`GeneratorSource`] backed by a seedable PRNG.
///
/// Sequence counters are keyed by template and start at 1.
#[derive(Debug)]
pub struct RandomSource {
    rng: StdRng,
    seed: Option<u64>,
    text_length: usize,
    sequences: HashMap<String, u64>,
}

impl RandomSource {
    /// Creates a source; `None` seeds from OS entropy.
    pub fn new(seed: Option<u64>, text_length: usize) -> Self {
        Self {
            rng: Self::make_rng(seed),
            seed,
            text_length,
            sequences: HashMap::new(),
        }
    }

    fn make_rng(seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn next_in_sequence(&mut self, template: &str) -> u64 {
        let counter = self.sequences.entry(template.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    fn text(&mut self, length: usize) -> String {
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }
}

impl GeneratorSource for RandomSource {
    fn generate(&mut self, field: &str, generator: &Generator) -> serde_json::Value {
        tracing::trace!(field, ?generator, "generating value");
        match generator {
            Generator::Text { length } => {
                let length = length.unwrap_or(self.text_length);
                serde_json::Value::String(self.text(length))
            }
            Generator::Integer { min, max } => self.rng.gen_range(*min..=*max).into(),
            Generator::Float { min, max } => {
                // The variant may be built directly, bypassing `Generator::float`
                let (min, max) = (Generator::float_bound(*min), Generator::float_bound(*max));
                let value = if min < max {
                    self.rng.gen_range(min..max)
                } else {
                    min
                };
                serde_json::json!(value)
            }
            Generator::Boolean => self.rng.gen_bool(0.5).into(),
            Generator::Sequence { template } => {
                let n = self.next_in_sequence(template);
                serde_json::Value::String(template.replace("{n}", &n.to_string()))
            }
            Generator::OneOf(values) => {
                if values.is_empty() {
                    serde_json::Value::Null
                } else {
                    values[self.rng.gen_range(0..values.len())].clone()
                }
            }
            Generator::Constant(value) => value.clone(),
            Generator::Custom(f) => f(&mut self.rng),
        }
    }

    fn reset(&mut self) {
        self.rng = Self::make_rng(self.seed);
        self.sequences.clear();
    }
}
