//! Random-value generator for typed objects.
//!
//! [`Fuzzer`] populates any value implementing [`Fuzz`] with pseudo-random
//! data: numbers, strings, nested structs, variable-length collections and
//! optional fields. Empty/`None` values are produced with probability
//! `nil_chance`; populated collections hold between `min_elements` and
//! `max_elements` entries. Past `max_depth` nested values are left as they are,
//! which keeps recursive types finite.
//!
//! Struct types get an implementation through [`impl_fuzz!`](crate::impl_fuzz):
//!
//! ```
//! use crd_schema_fuzz_core::{impl_fuzz, Fuzzer};
//!
//! #[derive(Debug, Default)]
//! struct Spec {
//!     name: String,
//!     replicas: Option<i32>,
//!     tags: Vec<String>,
//! }
//! impl_fuzz!(Spec { name, replicas, tags });
//!
//! let mut spec = Spec::default();
//! Fuzzer::with_seed(7).fill(&mut spec);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Number, Value};

use crate::config::FuzzOptions;

/// Longest generated string, in characters (exclusive).
const MAX_STRING_LENGTH: usize = 20;

/// Upper bound on schema-driven collection lengths, unless `max_elements` is larger.
/// `minItems` beyond it is not honoured.
pub const MAX_SCHEMA_ITEMS: usize = 100;

/// Nesting depth of free-form JSON produced for `serde_json::Value` fields and
/// unknown-field extension points.
const MAX_JSON_DEPTH: usize = 3;

/// Character ranges strings are drawn from: printable ASCII, Latin-1/IPA
/// and a slice of CJK.
const UNICODE_RANGES: &[(char, char)] = &[
    (' ', '~'),
    ('\u{00a0}', '\u{02af}'),
    ('\u{4e00}', '\u{9fff}'),
];

/// A value the [`Fuzzer`] can populate in place.
pub trait Fuzz {
    fn fuzz(&mut self, fuzzer: &mut Fuzzer);
}

/// Seeded pseudo-random generator with gofuzz-style knobs.
pub struct Fuzzer {
    rng: StdRng,
    seed: u64,
    nil_chance: f64,
    min_elements: usize,
    max_elements: usize,
    max_depth: usize,
    depth: usize,
}

impl Fuzzer {
    /// A fuzzer with default knobs and a freshly drawn seed.
    pub fn new() -> Self {
        let seed: u64 = rand::random();
        tracing::debug!(seed, "drew random fuzz seed");
        Self::with_seed(seed)
    }

    /// A reproducible fuzzer with default knobs.
    pub fn with_seed(seed: u64) -> Self {
        let defaults = FuzzOptions::default();
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            nil_chance: defaults.nil_chance,
            min_elements: defaults.min_elements,
            max_elements: defaults.max_elements,
            max_depth: defaults.max_depth,
            depth: 0,
        }
    }

    pub fn from_options(options: &FuzzOptions) -> Self {
        let fuzzer = match options.seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        };
        fuzzer
            .nil_chance(options.nil_chance)
            .num_elements(options.min_elements, options.max_elements)
            .max_depth(options.max_depth)
    }

    /// Probability of leaving optional values and collections empty, clamped to `[0, 1]`.
    pub fn nil_chance(mut self, chance: f64) -> Self {
        self.nil_chance = if chance.is_nan() {
            0.0
        } else {
            chance.clamp(0.0, 1.0)
        };
        self
    }

    /// Element count range for populated collections. `max` is raised to `min` if smaller.
    pub fn num_elements(mut self, min: usize, max: usize) -> Self {
        self.min_elements = min;
        self.max_elements = max.max(min);
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Populate `target` with random data, unless the depth limit is reached.
    pub fn fill<T: Fuzz + ?Sized>(&mut self, target: &mut T) {
        self.descend(|fuzzer| target.fuzz(fuzzer));
    }

    /// Run `f` one nesting level deeper; `None` once the depth limit is hit.
    pub fn descend<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> Option<R> {
        if self.depth >= self.max_depth {
            return None;
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        Some(result)
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Whether the next optional value should be left empty.
    pub fn gen_nil(&mut self) -> bool {
        self.rng.gen_bool(self.nil_chance)
    }

    /// A collection length within the configured element range.
    pub fn gen_len(&mut self) -> usize {
        self.rng.gen_range(self.min_elements..=self.max_elements)
    }

    /// A collection length honouring schema bounds, defaulting to the configured range.
    ///
    /// `max` always wins over the configured minimum, and no length exceeds
    /// [`MAX_SCHEMA_ITEMS`] or `max_elements`, whichever is larger.
    pub fn gen_len_between(&mut self, min: Option<usize>, max: Option<usize>) -> usize {
        let cap = self.max_elements.max(MAX_SCHEMA_ITEMS);
        let ceiling = max.map_or(cap, |max| max.min(cap));
        let lo = min.unwrap_or(self.min_elements).min(ceiling);
        let hi = max.unwrap_or(self.max_elements).min(ceiling).max(lo);
        self.rng.gen_range(lo..=hi)
    }

    pub fn gen_char(&mut self) -> char {
        let (lo, hi) = UNICODE_RANGES[self.rng.gen_range(0..UNICODE_RANGES.len())];
        let code = self.rng.gen_range(lo as u32..=hi as u32);
        char::from_u32(code).unwrap_or(lo)
    }

    pub fn gen_string(&mut self) -> String {
        let len = self.rng.gen_range(0..MAX_STRING_LENGTH);
        (0..len).map(|_| self.gen_char()).collect()
    }

    /// A random scalar: null, boolean, integer, float or string.
    pub fn gen_scalar(&mut self) -> Value {
        match self.rng.gen_range(0..5) {
            0 => Value::Null,
            1 => Value::Bool(self.rng.gen()),
            2 => Value::from(self.rng.gen::<i64>()),
            3 => Number::from_f64(self.rng.gen::<f64>()).map_or(Value::Null, Value::Number),
            _ => Value::String(self.gen_string()),
        }
    }

    /// Free-form JSON, nested at most a few levels.
    pub fn gen_json(&mut self) -> Value {
        self.gen_json_within(MAX_JSON_DEPTH)
    }

    fn gen_json_within(&mut self, remaining: usize) -> Value {
        // Containers only while nesting budget remains.
        let choices = if remaining > 0 { 7 } else { 5 };
        match self.rng.gen_range(0..choices) {
            5 => {
                let len = self.gen_len();
                Value::Array((0..len).map(|_| self.gen_json_within(remaining - 1)).collect())
            }
            6 => {
                let len = self.gen_len();
                let mut map = Map::new();
                for _ in 0..len {
                    let key = self.gen_string();
                    let value = self.gen_json_within(remaining - 1);
                    map.insert(key, value);
                }
                Value::Object(map)
            }
            _ => self.gen_scalar(),
        }
    }
}

impl Default for Fuzzer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Fuzzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fuzzer")
            .field("seed", &self.seed)
            .field("nil_chance", &self.nil_chance)
            .field("min_elements", &self.min_elements)
            .field("max_elements", &self.max_elements)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

/// Implement [`Fuzz`] for a struct by filling each listed field.
///
/// Fields left out of the list keep whatever value they had, which is how a
/// type opts a field out of fuzzing (for example a `TypeMeta` header).
#[macro_export]
macro_rules! impl_fuzz {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::Fuzz for $ty {
            fn fuzz(&mut self, fuzzer: &mut $crate::Fuzzer) {
                $( fuzzer.fill(&mut self.$field); )*
            }
        }
    };
}

macro_rules! fuzz_via_standard {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Fuzz for $ty {
                fn fuzz(&mut self, fuzzer: &mut Fuzzer) {
                    *self = fuzzer.rng().gen();
                }
            }
        )*
    };
}

fuzz_via_standard!(bool, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

impl Fuzz for char {
    fn fuzz(&mut self, fuzzer: &mut Fuzzer) {
        *self = fuzzer.gen_char();
    }
}

impl Fuzz for String {
    fn fuzz(&mut self, fuzzer: &mut Fuzzer) {
        *self = fuzzer.gen_string();
    }
}

impl Fuzz for Value {
    fn fuzz(&mut self, fuzzer: &mut Fuzzer) {
        *self = fuzzer.gen_json();
    }
}

impl<T: Fuzz + ?Sized> Fuzz for Box<T> {
    fn fuzz(&mut self, fuzzer: &mut Fuzzer) {
        fuzzer.fill(&mut **self);
    }
}

impl<T: Fuzz + Default> Fuzz for Option<T> {
    fn fuzz(&mut self, fuzzer: &mut Fuzzer) {
        if fuzzer.gen_nil() {
            *self = None;
            return;
        }
        let mut value = T::default();
        fuzzer.fill(&mut value);
        *self = Some(value);
    }
}

impl<T: Fuzz + Default> Fuzz for Vec<T> {
    fn fuzz(&mut self, fuzzer: &mut Fuzzer) {
        self.clear();
        if fuzzer.gen_nil() {
            return;
        }
        let len = fuzzer.gen_len();
        for _ in 0..len {
            let mut value = T::default();
            fuzzer.fill(&mut value);
            self.push(value);
        }
    }
}

impl<V: Fuzz + Default> Fuzz for BTreeMap<String, V> {
    fn fuzz(&mut self, fuzzer: &mut Fuzzer) {
        self.clear();
        if fuzzer.gen_nil() {
            return;
        }
        let len = fuzzer.gen_len();
        for _ in 0..len {
            let key = fuzzer.gen_string();
            let mut value = V::default();
            fuzzer.fill(&mut value);
            self.insert(key, value);
        }
    }
}

impl<V: Fuzz + Default> Fuzz for HashMap<String, V> {
    fn fuzz(&mut self, fuzzer: &mut Fuzzer) {
        self.clear();
        if fuzzer.gen_nil() {
            return;
        }
        let len = fuzzer.gen_len();
        for _ in 0..len {
            let key = fuzzer.gen_string();
            let mut value = V::default();
            fuzzer.fill(&mut value);
            self.insert(key, value);
        }
    }
}
