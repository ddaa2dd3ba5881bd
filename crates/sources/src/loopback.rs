//! Loopback device
//!
//! An in-memory register bank that can be read and written. The device hands out two independent
//! capability objects, a [`LoopbackSource`] and a [`LoopbackSink`], which share one internally
//! locked handle. Whatever a logger writes through the sink is visible to the next source read.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use contracts::{ContractError, DataSink, DataSource, Reading, Row, Value};
use tracing::debug;

type Registers = Arc<Mutex<BTreeMap<String, Value>>>;

/// Dual-role register bank
#[derive(Debug, Clone, Default)]
pub struct LoopbackDevice {
    name: String,
    registers: Registers,
}

impl LoopbackDevice {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registers: Registers::default(),
        }
    }

    /// Device name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read capability over the given registers
    pub fn source(&self, registers: Vec<String>) -> LoopbackSource {
        LoopbackSource {
            names: registers,
            registers: Arc::clone(&self.registers),
        }
    }

    /// Write capability over the whole bank
    pub fn sink(&self) -> LoopbackSink {
        LoopbackSink {
            device: self.name.clone(),
            registers: Arc::clone(&self.registers),
        }
    }

    /// Set one register directly
    pub fn set(&self, register: impl Into<String>, value: impl Into<Value>) {
        lock(&self.registers).insert(register.into(), value.into());
    }

    /// Current value of one register
    pub fn get(&self, register: &str) -> Option<Value> {
        lock(&self.registers).get(register).cloned()
    }

    /// Copy of the whole bank
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        lock(&self.registers).clone()
    }
}

/// Reads a fixed list of registers; unset registers are reported missing
pub struct LoopbackSource {
    names: Vec<String>,
    registers: Registers,
}

impl DataSource for LoopbackSource {
    fn variable_names(&self) -> &[String] {
        &self.names
    }

    fn read(&self) -> Result<Reading, ContractError> {
        let registers = lock(&self.registers);
        Ok(self
            .names
            .iter()
            .map(|name| (name.clone(), registers.get(name).cloned()))
            .collect())
    }
}

/// Writes every present value of a row into the register of the same name
pub struct LoopbackSink {
    device: String,
    registers: Registers,
}

impl DataSink for LoopbackSink {
    fn needs_timestamp(&self) -> bool {
        false
    }

    fn write(&self, row: &Row) -> Result<(), ContractError> {
        let mut registers = lock(&self.registers);
        let mut written = 0usize;
        for (key, value) in row.present() {
            registers.insert(key.to_string(), value.clone());
            written += 1;
        }
        debug!(device = %self.device, written, "Registers updated");
        Ok(())
    }
}

/// Named loopback devices shared between the sources and sinks of one logger
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: HashMap<String, LoopbackDevice>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device called `name`, created on first use
    pub fn device(&mut self, name: &str) -> LoopbackDevice {
        self.devices
            .entry(name.to_string())
            .or_insert_with(|| LoopbackDevice::new(name))
            .clone()
    }

    /// Device called `name`, if it was ever requested
    pub fn get(&self, name: &str) -> Option<&LoopbackDevice> {
        self.devices.get(name)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

fn lock(registers: &Registers) -> MutexGuard<'_, BTreeMap<String, Value>> {
    registers
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
