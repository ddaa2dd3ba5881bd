//! Random sources
//!
//! Simulate passive measurement devices without hardware: values are produced only on request,
//! with configurable rates of missing keys and missing values.

use std::collections::HashMap;
use std::sync::Mutex;

use contracts::params::param_or;
use contracts::{ContractError, DataSource, Reading, Value};
use rand::rngs::StdRng;
use rand::seq::{index, IndexedRandom};
use rand::{Rng, SeedableRng};

const STRING_ALPHABET: &[char] = &['A', 'a', 'B', 'b', 'C', 'c', 'D', 'd', 'E', 'e'];

/// Random source configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RandomSourceConfig {
    /// Number of variables
    pub size: usize,
    /// Share of variables whose key is absent from a reading (0..=1)
    pub key_missing_rate: f64,
    /// Share of variables whose value is `None` in a reading (0..=1)
    pub value_missing_rate: f64,
    /// String length (string source only)
    pub str_length: usize,
    /// Fixed RNG seed for reproducible output
    pub seed: Option<u64>,
}

impl Default for RandomSourceConfig {
    fn default() -> Self {
        Self {
            size: 10,
            key_missing_rate: 0.5,
            value_missing_rate: 0.5,
            str_length: 5,
            seed: None,
        }
    }
}

impl RandomSourceConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ContractError> {
        let defaults = Self::default();
        let seed = params
            .get("seed")
            .map(|_| param_or(params, "seed", 0u64))
            .transpose()?;

        let config = Self {
            size: param_or(params, "size", defaults.size)?,
            key_missing_rate: param_or(params, "key_missing_rate", defaults.key_missing_rate)?,
            value_missing_rate: param_or(
                params,
                "value_missing_rate",
                defaults.value_missing_rate,
            )?,
            str_length: param_or(params, "str_length", defaults.str_length)?,
            seed,
        };
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ContractError> {
        for (field, rate) in [
            ("key_missing_rate", self.key_missing_rate),
            ("value_missing_rate", self.value_missing_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ContractError::config_validation(
                    format!("params.{field}"),
                    format!("must be within 0..=1, got {rate}"),
                ));
            }
        }
        Ok(())
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// Shared generator state: names, rates and the RNG behind a lock
struct Generator {
    names: Vec<String>,
    config: RandomSourceConfig,
    rng: Mutex<StdRng>,
}

impl Generator {
    fn new(prefix: &str, config: RandomSourceConfig) -> Self {
        let names = (0..config.size).map(|n| format!("{prefix}{n}")).collect();
        let rng = Mutex::new(config.rng());
        Self { names, config, rng }
    }

    fn read_with<F>(&self, mut value: F) -> Result<Reading, ContractError>
    where
        F: FnMut(&mut StdRng) -> Value,
    {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| ContractError::source_unavailable("random generator lock poisoned"))?;

        let size = self.names.len();
        let mut values: Vec<Option<Value>> = (0..size).map(|_| Some(value(&mut *rng))).collect();

        let value_missing = (size as f64 * self.config.value_missing_rate) as usize;
        for idx in index::sample(&mut *rng, size, value_missing.min(size)) {
            values[idx] = None;
        }

        let mut reading: Reading = self.names.iter().cloned().zip(values).collect();

        let key_missing = (size as f64 * self.config.key_missing_rate) as usize;
        for idx in index::sample(&mut *rng, size, key_missing.min(size)) {
            reading.remove(&self.names[idx]);
        }

        Ok(reading)
    }
}

/// Random float source
///
/// Variables are named `RandData0..RandData<size-1>`, values are uniform in `[0, 100)`.
pub struct RandomDataSource {
    generator: Generator,
}

impl RandomDataSource {
    /// Create a new random float source
    pub fn new(config: RandomSourceConfig) -> Self {
        Self {
            generator: Generator::new("RandData", config),
        }
    }

    /// Create from params map (for factory)
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ContractError> {
        Ok(Self::new(RandomSourceConfig::from_params(params)?))
    }
}

impl DataSource for RandomDataSource {
    fn variable_names(&self) -> &[String] {
        &self.generator.names
    }

    fn read(&self) -> Result<Reading, ContractError> {
        self.generator
            .read_with(|rng| Value::Float(rng.random_range(0.0..100.0)))
    }
}

/// Random string source
///
/// Variables are named `RandStr0..RandStr<size-1>`, values are strings of `str_length`
/// characters drawn from a small fixed alphabet.
pub struct RandomStringSource {
    generator: Generator,
}

impl RandomStringSource {
    /// Create a new random string source
    pub fn new(config: RandomSourceConfig) -> Self {
        Self {
            generator: Generator::new("RandStr", config),
        }
    }

    /// Create from params map (for factory)
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ContractError> {
        Ok(Self::new(RandomSourceConfig::from_params(params)?))
    }
}

impl DataSource for RandomStringSource {
    fn variable_names(&self) -> &[String] {
        &self.generator.names
    }

    fn read(&self) -> Result<Reading, ContractError> {
        let len = self.generator.config.str_length;
        self.generator.read_with(|rng| {
            let s: String = (0..len)
                .filter_map(|_| STRING_ALPHABET.choose(&mut *rng).copied())
                .collect();
            Value::Text(s)
        })
    }
}
