//! Property addressing and the sink the engine writes animated values into.
//!
//! Hosts with their own scene graph implement [`PropertySink`]; everyone else
//! can use the in-memory [`PropertyTable`].

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::ids::{IdAllocator, OwnerId};
use cadence_api_core::Value;

/// One whole property of an owner.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PropertyKey {
    pub owner: OwnerId,
    pub index: u32,
}

/// A property, optionally narrowed to one float component of a vector.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PropertyRef {
    pub owner: OwnerId,
    pub index: u32,
    #[serde(default)]
    pub component: Option<u8>,
}

impl PropertyRef {
    pub fn new(owner: OwnerId, index: u32) -> Self {
        Self {
            owner,
            index,
            component: None,
        }
    }

    pub fn component(owner: OwnerId, index: u32, component: u8) -> Self {
        Self {
            owner,
            index,
            component: Some(component),
        }
    }

    #[inline]
    pub fn key(&self) -> PropertyKey {
        PropertyKey {
            owner: self.owner,
            index: self.index,
        }
    }
}

impl From<PropertyKey> for PropertyRef {
    fn from(key: PropertyKey) -> Self {
        PropertyRef::new(key.owner, key.index)
    }
}

/// Destination for animated values.
///
/// Each property has a baseline (the value it holds when nothing animates it)
/// and a current frame value. Engines write each property at most once per tick.
pub trait PropertySink {
    /// Baseline value, or None when the property (or its owner) is unknown.
    fn read_baseline(&self, key: PropertyKey) -> Option<Value>;

    /// Set the current frame value, leaving the baseline untouched.
    fn write(&mut self, key: PropertyKey, value: Value);

    /// Bake: set both the baseline and the current value.
    fn write_final(&mut self, key: PropertyKey, value: Value);

    /// Whether the owner is attached to the active scene.
    fn is_connected(&self, _owner: OwnerId) -> bool {
        true
    }
}

#[derive(Clone, Debug)]
struct Slot {
    base: Value,
    current: Value,
}

#[derive(Clone, Debug)]
struct OwnerRow {
    connected: bool,
    properties: Vec<Slot>,
}

/// In-memory property store implementing [`PropertySink`].
#[derive(Debug, Default)]
pub struct PropertyTable {
    ids: IdAllocator,
    owners: HashMap<OwnerId, OwnerRow>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new, connected owner with no properties.
    pub fn add_owner(&mut self) -> OwnerId {
        let id = self.ids.alloc_owner();
        self.owners.insert(
            id,
            OwnerRow {
                connected: true,
                properties: Vec::new(),
            },
        );
        id
    }

    /// Drop an owner; animators targeting it become orphans.
    pub fn remove_owner(&mut self, owner: OwnerId) -> bool {
        self.owners.remove(&owner).is_some()
    }

    /// Add a property to `owner` with an initial value. None for an unknown owner.
    pub fn register(&mut self, owner: OwnerId, initial: Value) -> Option<PropertyKey> {
        let row = self.owners.get_mut(&owner)?;
        let index = row.properties.len() as u32;
        row.properties.push(Slot {
            base: initial.clone(),
            current: initial,
        });
        Some(PropertyKey { owner, index })
    }

    pub fn set_connected(&mut self, owner: OwnerId, connected: bool) {
        if let Some(row) = self.owners.get_mut(&owner) {
            row.connected = connected;
        }
    }

    /// Host-side assignment: sets baseline and current value.
    pub fn set(&mut self, key: PropertyKey, value: Value) -> bool {
        match self.slot_mut(key) {
            Some(slot) => {
                slot.base = value.clone();
                slot.current = value;
                true
            }
            None => false,
        }
    }

    pub fn current(&self, key: PropertyKey) -> Option<&Value> {
        self.slot(key).map(|s| &s.current)
    }

    pub fn base(&self, key: PropertyKey) -> Option<&Value> {
        self.slot(key).map(|s| &s.base)
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    fn slot(&self, key: PropertyKey) -> Option<&Slot> {
        self.owners
            .get(&key.owner)
            .and_then(|row| row.properties.get(key.index as usize))
    }

    fn slot_mut(&mut self, key: PropertyKey) -> Option<&mut Slot> {
        self.owners
            .get_mut(&key.owner)
            .and_then(|row| row.properties.get_mut(key.index as usize))
    }
}

impl PropertySink for PropertyTable {
    fn read_baseline(&self, key: PropertyKey) -> Option<Value> {
        self.slot(key).map(|s| s.base.clone())
    }

    fn write(&mut self, key: PropertyKey, value: Value) {
        if let Some(slot) = self.slot_mut(key) {
            slot.current = value;
        }
    }

    fn write_final(&mut self, key: PropertyKey, value: Value) {
        if let Some(slot) = self.slot_mut(key) {
            slot.base = value.clone();
            slot.current = value;
        }
    }

    fn is_connected(&self, owner: OwnerId) -> bool {
        self.owners.get(&owner).map(|r| r.connected).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_keeps_baseline_and_bake_moves_it() {
        let mut table = PropertyTable::new();
        let owner = table.add_owner();
        let key = table.register(owner, Value::f(1.0)).unwrap();

        table.write(key, Value::f(2.0));
        assert_eq!(table.current(key), Some(&Value::f(2.0)));
        assert_eq!(table.read_baseline(key), Some(Value::f(1.0)));

        table.write_final(key, Value::f(3.0));
        assert_eq!(table.base(key), Some(&Value::f(3.0)));
        assert_eq!(table.current(key), Some(&Value::f(3.0)));
    }

    #[test]
    fn unknown_owner_reads_none() {
        let mut table = PropertyTable::new();
        let owner = table.add_owner();
        let key = table.register(owner, Value::Bool(true)).unwrap();
        assert!(table.is_connected(owner));
        table.remove_owner(owner);
        assert_eq!(table.read_baseline(key), None);
        assert!(!table.is_connected(owner));
    }
}
