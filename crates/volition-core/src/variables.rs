//! Per-agent variable schema and runtime storage.
//!
//! A [`VariableLayout`] maps names to typed slots; a [`VariablePack`] holds
//! the values for one agent. Number and Name variables live in disjoint slot
//! spaces, each assigned in insertion order.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::name::Name;

/// Type of an expression result or variable.
///
/// `Bool` is a valid expression result and operand but not a valid variable
/// type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpType {
    Number,
    Name,
    Bool,
}

impl fmt::Display for ExpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExpType::Number => "NUMBER",
            ExpType::Name => "NAME",
            ExpType::Bool => "BOOL",
        })
    }
}

/// Index of a variable slot, constant-table entry or VM register.
pub type SlotIndex = u16;

/// Ordered mapping from variable name to `(type, slot)`.
///
/// Immutable once agents start running; share it via `Arc`.
#[derive(Debug, Default)]
pub struct VariableLayout {
    slots: FxHashMap<Name, (ExpType, SlotIndex)>,
    number_count: SlotIndex,
    name_count: SlotIndex,
}

impl VariableLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, assigning the next slot in its type's index space.
    ///
    /// Re-adding with a matching type is a no-op returning the existing slot.
    ///
    /// # Panics
    ///
    /// Panics when `name` is already registered with a different type, or
    /// when `ty` is [`ExpType::Bool`].
    pub fn add(&mut self, name: Name, ty: ExpType) -> SlotIndex {
        if let Some(&(existing, slot)) = self.slots.get(&name) {
            assert!(
                existing == ty,
                "variable '{name}' re-added as {ty} but is already {existing}"
            );
            return slot;
        }

        let slot = match ty {
            ExpType::Number => {
                let slot = self.number_count;
                self.number_count += 1;
                slot
            }
            ExpType::Name => {
                let slot = self.name_count;
                self.name_count += 1;
                slot
            }
            ExpType::Bool => panic!("variable '{name}': bool variables are not supported"),
        };

        self.slots.insert(name, (ty, slot));
        slot
    }

    pub fn get(&self, name: Name) -> Option<(ExpType, SlotIndex)> {
        self.slots.get(&name).copied()
    }

    pub fn contains(&self, name: Name) -> bool {
        self.slots.contains_key(&name)
    }

    pub fn number_count(&self) -> SlotIndex {
        self.number_count
    }

    pub fn name_count(&self) -> SlotIndex {
        self.name_count
    }
}

/// Runtime values for one agent, sized exactly to a layout.
///
/// One evaluator owns a pack; the host may read and write it between ticks.
#[derive(Debug, Clone)]
pub struct VariablePack {
    layout: Arc<VariableLayout>,
    numbers: Vec<f32>,
    names: Vec<Name>,
}

impl VariablePack {
    pub fn new(layout: Arc<VariableLayout>, init_name: Name, init_number: f32) -> Self {
        let numbers = vec![init_number; layout.number_count() as usize];
        let names = vec![init_name; layout.name_count() as usize];
        Self {
            layout,
            numbers,
            names,
        }
    }

    pub fn layout(&self) -> &Arc<VariableLayout> {
        &self.layout
    }

    /// # Panics
    ///
    /// Panics when `name` is not a Number variable of this pack's layout.
    pub fn set_number(&mut self, name: Name, value: f32) {
        let slot = self.expect_slot(name, ExpType::Number);
        self.numbers[slot as usize] = value;
    }

    /// # Panics
    ///
    /// Panics when `name` is not a Name variable of this pack's layout.
    pub fn set_name(&mut self, name: Name, value: Name) {
        let slot = self.expect_slot(name, ExpType::Name);
        self.names[slot as usize] = value;
    }

    pub fn number(&self, name: Name) -> f32 {
        self.numbers[self.expect_slot(name, ExpType::Number) as usize]
    }

    pub fn name(&self, name: Name) -> Name {
        self.names[self.expect_slot(name, ExpType::Name) as usize]
    }

    pub fn number_slot(&self, slot: SlotIndex) -> f32 {
        self.numbers[slot as usize]
    }

    pub fn name_slot(&self, slot: SlotIndex) -> Name {
        self.names[slot as usize]
    }

    pub fn set_number_slot(&mut self, slot: SlotIndex, value: f32) {
        self.numbers[slot as usize] = value;
    }

    pub fn set_name_slot(&mut self, slot: SlotIndex, value: Name) {
        self.names[slot as usize] = value;
    }

    fn expect_slot(&self, name: Name, ty: ExpType) -> SlotIndex {
        match self.layout.get(name) {
            Some((actual, slot)) if actual == ty => slot,
            Some((actual, _)) => {
                panic!("variable '{name}' accessed as {ty} but is {actual}")
            }
            None => panic!("variable '{name}' does not exist in this layout"),
        }
    }
}
