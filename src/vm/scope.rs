//! Variable scopes and pronoun tracking.
//!
//! Scopes form a tree stored in an arena. Every scope belongs to a compiled
//! unit: the top-level program or one function. Slots of the top-level unit
//! live in the VM's global arena, slots of a function unit are frame locals.

use ahash::AHashMap;
use tracing::trace;

use crate::error::{CompileError, InternalError};
use crate::span::Span;

pub type ScopeId = usize;
pub type UnitId = usize;

/// The top-level program.
pub const MAIN_UNIT: UnitId = 0;

/// A storage slot: which unit owns it and its index there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub unit: UnitId,
    pub index: u16,
}

/// How compiled code reaches a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Global(u16),
    Local(u16),
}

#[derive(Debug)]
struct Unit {
    name: String,
    /// Slot names by index.
    slots: Vec<String>,
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    unit: UnitId,
    names: AHashMap<String, u16>,
}

/// Maps normalised variable names to slots.
///
/// Reads walk from the innermost scope outwards. A write reuses any slot
/// found on the way and otherwise allocates in the innermost scope.
/// Parameters always get a fresh slot.
#[derive(Debug)]
pub struct ScopeResolver {
    scopes: Vec<Scope>,
    units: Vec<Unit>,
    current: ScopeId,
}

impl Default for ScopeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeResolver {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                parent: None,
                unit: MAIN_UNIT,
                names: AHashMap::new(),
            }],
            units: vec![Unit {
                name: "<main>".to_string(),
                slots: Vec::new(),
            }],
            current: 0,
        }
    }

    pub fn current_unit(&self) -> UnitId {
        self.scopes[self.current].unit
    }

    pub fn unit_name(&self, unit: UnitId) -> &str {
        &self.units[unit].name
    }

    /// Open a block scope inside the current one.
    pub fn enter_scope(&mut self) -> ScopeId {
        let unit = self.current_unit();
        self.push_scope(unit)
    }

    /// Open the root scope of a new function unit. Local 0 holds the callee.
    ///
    /// The new scope still reads through to the declaring scope, so a
    /// function sees the variables assigned before it.
    pub fn enter_function(&mut self, name: &str) -> UnitId {
        let unit = self.units.len();
        self.units.push(Unit {
            name: name.to_string(),
            slots: vec![String::new()],
        });
        self.push_scope(unit);
        unit
    }

    /// Close the innermost scope.
    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    fn push_scope(&mut self, unit: UnitId) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope {
            parent: Some(self.current),
            unit,
            names: AHashMap::new(),
        });
        self.current = id;
        id
    }

    fn lookup(&self, name: &str) -> Option<Slot> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            let node = &self.scopes[id];
            if let Some(&index) = node.names.get(name) {
                return Some(Slot {
                    unit: node.unit,
                    index,
                });
            }
            scope = node.parent;
        }
        None
    }

    pub fn resolve_read(&self, name: &str, span: Span) -> Result<Slot, CompileError> {
        self.lookup(name)
            .ok_or_else(|| CompileError::unknown_variable(name, span))
    }

    pub fn resolve_write(&mut self, name: &str, span: Span) -> Result<Slot, CompileError> {
        match self.lookup(name) {
            Some(slot) => Ok(slot),
            None => self.allocate(name, span),
        }
    }

    /// Bind a parameter in the current scope, shadowing any outer variable.
    pub fn declare_param(&mut self, name: &str, span: Span) -> Result<Slot, CompileError> {
        self.allocate(name, span)
    }

    fn allocate(&mut self, name: &str, span: Span) -> Result<Slot, CompileError> {
        let unit = self.current_unit();
        let index = u16::try_from(self.units[unit].slots.len()).map_err(|_| {
            CompileError::Internal(InternalError::TooManySlots {
                unit: self.units[unit].name.clone(),
                span,
            })
        })?;
        self.units[unit].slots.push(name.to_string());
        self.scopes[self.current]
            .names
            .insert(name.to_string(), index);
        trace!(name, unit = %self.units[unit].name, index, "allocated slot");
        Ok(Slot { unit, index })
    }

    /// Translate a slot into an access from the current unit.
    ///
    /// Global slots are reachable from everywhere. A local of another
    /// function unit is not.
    pub fn storage(&self, name: &str, slot: Slot, span: Span) -> Result<Storage, CompileError> {
        if slot.unit == MAIN_UNIT {
            return Ok(Storage::Global(slot.index));
        }
        let current = self.current_unit();
        if slot.unit == current {
            return Ok(Storage::Local(slot.index));
        }
        Err(CompileError::Internal(InternalError::SlotUnitMismatch {
            name: name.to_string(),
            declared_in: self.unit_name(slot.unit).to_string(),
            used_in: self.unit_name(current).to_string(),
            span,
        }))
    }

    pub fn slot_count(&self, unit: UnitId) -> u16 {
        self.units[unit].slots.len() as u16
    }

    pub fn slot_names(&self, unit: UnitId) -> Vec<String> {
        self.units[unit].slots.clone()
    }
}

/// Remembers the most recently assigned variable for `it`, `she` and friends.
#[derive(Debug, Default)]
pub struct PronounTracker {
    last: Option<String>,
}

impl PronounTracker {
    pub fn track(&mut self, name: &str) {
        self.last = Some(name.to_string());
    }

    pub fn resolve(&self, pronoun: &str, span: Span) -> Result<String, CompileError> {
        self.last
            .clone()
            .ok_or_else(|| CompileError::unassociated_pronoun(pronoun, span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn span() -> Span {
        Span::default()
    }

    #[test]
    fn test_write_then_read_same_slot() {
        let mut scopes = ScopeResolver::new();
        let written = scopes.resolve_write("my heart", span()).unwrap();
        let read = scopes.resolve_read("my heart", span()).unwrap();
        assert_eq!(written, read);
        assert_eq!(written, Slot { unit: MAIN_UNIT, index: 0 });
    }

    #[test]
    fn test_block_variables_stay_in_their_block() {
        let mut scopes = ScopeResolver::new();
        scopes.resolve_write("outer", span()).unwrap();
        scopes.enter_scope();
        let reused = scopes.resolve_write("outer", span()).unwrap();
        scopes.resolve_write("inner", span()).unwrap();
        scopes.exit_scope();

        assert_eq!(reused.index, 0);
        let err = scopes.resolve_read("inner", span()).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_parameters_shadow_outer_variables() {
        let mut scopes = ScopeResolver::new();
        let outer = scopes.resolve_write("x", span()).unwrap();
        let unit = scopes.enter_function("f");
        let param = scopes.declare_param("x", span()).unwrap();
        assert_eq!(param, Slot { unit, index: 1 });
        assert_eq!(scopes.resolve_read("x", span()).unwrap(), param);
        scopes.exit_scope();
        assert_eq!(scopes.resolve_read("x", span()).unwrap(), outer);
    }

    #[test]
    fn test_functions_reach_globals_but_not_other_locals() {
        let mut scopes = ScopeResolver::new();
        let global = scopes.resolve_write("g", span()).unwrap();
        scopes.enter_function("outer");
        let local = scopes.resolve_write("l", span()).unwrap();
        scopes.enter_function("inner");

        assert_eq!(scopes.storage("g", global, span()).unwrap(), Storage::Global(0));
        let err = scopes.storage("l", local, span()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Internal(InternalError::SlotUnitMismatch { .. })
        ));
    }

    #[test]
    fn test_pronoun_needs_an_antecedent() {
        let mut pronouns = PronounTracker::default();
        assert!(matches!(
            pronouns.resolve("it", span()),
            Err(CompileError::UnassociatedPronoun { .. })
        ));
        pronouns.track("tommy");
        assert_eq!(pronouns.resolve("it", span()).unwrap(), "tommy");
        assert_eq!(pronouns.resolve("she", span()).unwrap(), "tommy");
    }
}
