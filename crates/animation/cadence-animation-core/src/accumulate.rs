//! Per-tick property buffer.
//!
//! Animators on the same property chain through the running value held here,
//! so every property is written to the sink once per tick, in first-touch order.

use hashbrown::HashMap;

use crate::property::{PropertyKey, PropertySink};
use cadence_api_core::Value;

#[derive(Clone, Debug)]
struct Entry {
    value: Value,
    /// Value to bake into the baseline before the frame value is written.
    baked: Option<Value>,
    /// The frame value moved on after the bake.
    dirty: bool,
}

#[derive(Debug, Default)]
pub struct Accumulator {
    entries: HashMap<PropertyKey, Entry>,
    order: Vec<PropertyKey>,
    reverts: Vec<PropertyKey>,
}

impl Accumulator {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            reverts: Vec::new(),
        }
    }

    /// Value animators for `key` build on this tick: the last value set, else the baseline.
    pub fn running(&self, key: PropertyKey, sink: &dyn PropertySink) -> Option<Value> {
        match self.entries.get(&key) {
            Some(entry) => Some(entry.value.clone()),
            None => sink.read_baseline(key),
        }
    }

    #[inline]
    pub fn contains(&self, key: PropertyKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn value(&self, key: PropertyKey) -> Option<&Value> {
        self.entries.get(&key).map(|e| &e.value)
    }

    /// Record the frame value for `key`.
    pub fn set(&mut self, key: PropertyKey, value: Value) {
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.value = value;
                entry.dirty = true;
            }
            None => {
                self.order.push(key);
                self.entries.insert(
                    key,
                    Entry {
                        value,
                        baked: None,
                        dirty: true,
                    },
                );
            }
        }
    }

    /// Record a value that also becomes the property's new baseline.
    pub fn bake(&mut self, key: PropertyKey, value: Value) {
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.baked = Some(value.clone());
                entry.value = value;
                entry.dirty = false;
            }
            None => {
                self.order.push(key);
                self.entries.insert(
                    key,
                    Entry {
                        baked: Some(value.clone()),
                        value,
                        dirty: false,
                    },
                );
            }
        }
    }

    /// Ask for `key` to return to its baseline.
    pub fn revert(&mut self, key: PropertyKey) {
        if !self.reverts.contains(&key) {
            self.reverts.push(key);
        }
    }

    pub fn take_reverts(&mut self) -> Vec<PropertyKey> {
        std::mem::take(&mut self.reverts)
    }

    /// Write the baseline as the frame value unless something already
    /// touched `key` this tick. Returns whether a write was queued.
    ///
    /// Holds run after every animation has been evaluated, so a discard
    /// never overrides a value animated or baked in the same tick, whether
    /// that animation was evaluated before or after the discarding one.
    pub fn hold_baseline(&mut self, key: PropertyKey, sink: &dyn PropertySink) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        match sink.read_baseline(key) {
            Some(base) => {
                self.set(key, base);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Push everything to the sink and clear. Returns the number of properties written.
    pub fn flush(&mut self, sink: &mut dyn PropertySink) -> usize {
        let written = self.order.len();
        for key in self.order.drain(..) {
            let Some(entry) = self.entries.remove(&key) else {
                continue;
            };
            match entry.baked {
                Some(baked) => {
                    sink.write_final(key, baked);
                    if entry.dirty {
                        sink.write(key, entry.value);
                    }
                }
                None => sink.write(key, entry.value),
            }
        }
        self.entries.clear();
        written
    }
}
