//! Push-buffered source
//!
//! Producer/consumer handoff for event-driven adapters: a delivery callback publishes updates
//! through a [`BufferPublisher`] at any time, and each `read` atomically takes and clears
//! everything delivered since the previous read (last write wins per key).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use contracts::{ContractError, DataSource, Reading, Value};
use tracing::trace;

type Buffer = Arc<Mutex<HashMap<String, Value>>>;

/// Source side of a push buffer
pub struct BufferedSource {
    names: Vec<String>,
    buffer: Buffer,
}

/// Producer side of a push buffer; cheap to clone and move into callbacks
#[derive(Clone)]
pub struct BufferPublisher {
    names: Arc<[String]>,
    buffer: Buffer,
}

impl BufferedSource {
    /// Create a buffered source for the given variables, plus its publisher
    pub fn new(names: Vec<String>) -> (Self, BufferPublisher) {
        let buffer: Buffer = Arc::default();
        let publisher = BufferPublisher {
            names: names.clone().into(),
            buffer: Arc::clone(&buffer),
        };
        (Self { names, buffer }, publisher)
    }
}

impl DataSource for BufferedSource {
    fn variable_names(&self) -> &[String] {
        &self.names
    }

    fn read(&self) -> Result<Reading, ContractError> {
        let drained = std::mem::take(&mut *lock(&self.buffer));
        Ok(drained.into_iter().map(|(k, v)| (k, Some(v))).collect())
    }
}

impl BufferPublisher {
    /// Publish one update; returns `false` if the variable is not declared (update dropped)
    pub fn publish(&self, name: &str, value: Value) -> bool {
        if !self.names.iter().any(|n| n == name) {
            trace!(variable = name, "Dropping update for undeclared variable");
            return false;
        }
        lock(&self.buffer).insert(name.to_string(), value);
        true
    }

    /// Publish several updates under one lock; returns how many were accepted
    pub fn publish_all<I>(&self, updates: I) -> usize
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut buffer = lock(&self.buffer);
        let mut accepted = 0;
        for (name, value) in updates {
            if self.names.iter().any(|n| *n == name) {
                buffer.insert(name, value);
                accepted += 1;
            }
        }
        accepted
    }

    /// Number of updates waiting for the next read
    pub fn pending(&self) -> usize {
        lock(&self.buffer).len()
    }
}

/// The buffer holds plain data, so a poisoned lock is still usable
fn lock(buffer: &Buffer) -> MutexGuard<'_, HashMap<String, Value>> {
    buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["t1".into(), "t2".into()]
    }

    #[test]
    fn test_read_takes_and_clears() {
        let (source, publisher) = BufferedSource::new(names());
        assert!(publisher.publish("t1", Value::Float(1.0)));

        let first = source.read().unwrap();
        assert_eq!(first.get("t1"), Some(&Some(Value::Float(1.0))));

        let second = source.read().unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let (source, publisher) = BufferedSource::new(names());
        publisher.publish("t2", Value::Int(1));
        publisher.publish("t2", Value::Int(2));
        assert_eq!(publisher.pending(), 1);

        let reading = source.read().unwrap();
        assert_eq!(reading.get("t2"), Some(&Some(Value::Int(2))));
    }

    #[test]
    fn test_undeclared_variables_dropped() {
        let (source, publisher) = BufferedSource::new(names());
        assert!(!publisher.publish("other", Value::Int(1)));

        let accepted = publisher.publish_all(vec![
            ("t1".to_string(), Value::Int(1)),
            ("nope".to_string(), Value::Int(2)),
        ]);
        assert_eq!(accepted, 1);
        assert_eq!(source.read().unwrap().len(), 1);
    }

    #[test]
    fn test_publisher_from_other_thread() {
        let (source, publisher) = BufferedSource::new(names());
        let handle = std::thread::spawn(move || {
            for i in 0..100 {
                publisher.publish("t1", Value::Int(i));
            }
        });
        handle.join().unwrap();

        let reading = source.read().unwrap();
        assert_eq!(reading.get("t1"), Some(&Some(Value::Int(99))));
    }
}
