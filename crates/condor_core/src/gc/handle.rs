//! Generational handles and the slot arenas they index.
//!
//! A [`Handle<T>`] is a `(index, generation)` pair into a [`Slots<T>`]
//! arena.  Freeing a slot bumps its generation, so a handle kept past the
//! free no longer resolves: lookups return `None` instead of aliasing
//! whatever object later reuses the slot.
//!
//! [`PersistentRoots`] is the isolate's registry of objects the collector
//! must always treat as live.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::gc::pool::SizeClass;
use crate::gc::trace::GcRef;

/// A typed, generation-checked index into a [`Slots<T>`] arena.
///
/// `Handle<T>` is `Copy` regardless of `T`; it is just two integers.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot index inside the owning arena.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation the slot had when this handle was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Slots
// ─────────────────────────────────────────────────────────────────────────────

struct Occupant<T> {
    value: T,
    class: SizeClass,
    size: usize,
}

struct Slot<T> {
    generation: u32,
    occupant: Option<Occupant<T>>,
}

/// A generational arena.  Each occupied slot also records the size class and
/// byte size it was charged with, so the isolate can release exactly that
/// amount when the slot is freed.
pub struct Slots<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Slots<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Store `value`, reusing a freed slot when one is available.
    pub fn insert(&mut self, value: T, class: SizeClass, size: usize) -> Handle<T> {
        let occupant = Some(Occupant { value, class, size });
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.occupant = occupant;
            return Handle::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            occupant,
        });
        Handle::new(index, 0)
    }

    fn slot(&self, handle: Handle<T>) -> Option<&Occupant<T>> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.occupant.as_ref())
    }

    /// Resolve `handle`, or `None` when it is stale.
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slot(handle).map(|o| &o.value)
    }

    /// Resolve `handle` mutably, or `None` when it is stale.
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.occupant.as_mut())
            .map(|o| &mut o.value)
    }

    /// The `(class, size)` the slot was charged with.
    pub fn charge(&self, handle: Handle<T>) -> Option<(SizeClass, usize)> {
        self.slot(handle).map(|o| (o.class, o.size))
    }

    /// Returns `true` when `handle` still resolves.
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.slot(handle).is_some()
    }

    /// Vacate the slot and return its value together with its charge.
    /// The slot's generation is bumped so `handle` goes stale.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<(T, SizeClass, usize)> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)?;
        let occupant = slot.occupant.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some((occupant.value, occupant.class, occupant.size))
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Handles of every occupied slot, in index order.
    pub fn handles(&self) -> impl Iterator<Item = Handle<T>> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.occupant
                .as_ref()
                .map(|_| Handle::new(i as u32, s.generation))
        })
    }

    /// Vacate every slot.  All outstanding handles go stale.
    pub fn clear(&mut self) {
        self.free.clear();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.occupant.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(i as u32);
        }
        self.len = 0;
    }
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PersistentRoots
// ─────────────────────────────────────────────────────────────────────────────

/// Registry of collector roots owned by an `Isolate`.
///
/// Anything registered here survives every collection until it is removed
/// again.
#[derive(Debug, Default)]
pub struct PersistentRoots {
    /// Slot `i` is `Some(root)` while registered and `None` once removed.
    roots: Vec<Option<GcRef>>,
}

impl PersistentRoots {
    /// Create an empty root set.
    pub fn new() -> Self {
        Self { roots: Vec::new() }
    }

    /// Register `root` and return its slot index.
    pub fn register(&mut self, root: GcRef) -> usize {
        // Reuse a freed slot when available.
        if let Some(idx) = self.roots.iter().position(|s| s.is_none()) {
            self.roots[idx] = Some(root);
            return idx;
        }
        let idx = self.roots.len();
        self.roots.push(Some(root));
        idx
    }

    /// Remove every registration of `root`.  Returns `true` if any existed.
    pub fn unregister(&mut self, root: GcRef) -> bool {
        let mut found = false;
        for slot in self.roots.iter_mut().filter(|s| **s == Some(root)) {
            *slot = None;
            found = true;
        }
        found
    }

    /// Returns `true` when `root` is registered.
    pub fn contains(&self, root: GcRef) -> bool {
        self.roots.contains(&Some(root))
    }

    /// Iterate all registered roots.
    pub fn iter_roots(&self) -> impl Iterator<Item = GcRef> + '_ {
        self.roots.iter().filter_map(|s| *s)
    }

    /// Drop every registration.
    pub fn clear(&mut self) {
        self.roots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::scope::Scope;

    // ── Handle ───────────────────────────────────────────────────────────────

    #[test]
    fn test_handle_is_copy_and_comparable() {
        let mut slots: Slots<String> = Slots::new();
        let a = slots.insert("a".to_string(), SizeClass::Small, 24);
        let b = a;
        assert_eq!(a, b);
        assert_eq!(format!("{a:?}"), "Handle(0v0)");
    }

    // ── Slots ────────────────────────────────────────────────────────────────

    #[test]
    fn test_insert_and_get() {
        let mut slots = Slots::new();
        let h = slots.insert(42u64, SizeClass::Small, 8);
        assert_eq!(slots.get(h), Some(&42));
        assert_eq!(slots.charge(h), Some((SizeClass::Small, 8)));
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn test_remove_makes_handle_stale() {
        let mut slots = Slots::new();
        let h = slots.insert(1u8, SizeClass::Small, 1);
        assert_eq!(slots.remove(h), Some((1, SizeClass::Small, 1)));
        assert!(slots.get(h).is_none());
        assert!(slots.remove(h).is_none());
        assert!(slots.is_empty());
    }

    #[test]
    fn test_reused_slot_does_not_alias_old_handle() {
        let mut slots = Slots::new();
        let old = slots.insert(1u8, SizeClass::Small, 1);
        slots.remove(old);
        let new = slots.insert(2u8, SizeClass::Small, 1);
        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert!(slots.get(old).is_none());
        assert_eq!(slots.get(new), Some(&2));
    }

    #[test]
    fn test_get_mut_updates_value() {
        let mut slots = Slots::new();
        let h = slots.insert(vec![1, 2], SizeClass::Small, 24);
        slots.get_mut(h).unwrap().push(3);
        assert_eq!(slots.get(h).unwrap(), &vec![1, 2, 3]);
    }

    #[test]
    fn test_handles_lists_only_occupied() {
        let mut slots = Slots::new();
        let a = slots.insert('a', SizeClass::Small, 4);
        let b = slots.insert('b', SizeClass::Small, 4);
        let c = slots.insert('c', SizeClass::Small, 4);
        slots.remove(b);
        assert_eq!(slots.handles().collect::<Vec<_>>(), vec![a, c]);
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut slots = Slots::new();
        let a = slots.insert(1, SizeClass::Small, 4);
        let b = slots.insert(2, SizeClass::Small, 4);
        slots.clear();
        assert!(slots.is_empty());
        assert!(!slots.contains(a));
        assert!(!slots.contains(b));
        let c = slots.insert(3, SizeClass::Small, 4);
        assert_eq!(slots.get(c), Some(&3));
    }

    // ── PersistentRoots ──────────────────────────────────────────────────────

    #[test]
    fn test_roots_register_and_unregister() {
        let mut scopes = Slots::new();
        let s = scopes.insert(Scope::new(), SizeClass::Medium, 0);
        let mut roots = PersistentRoots::new();
        roots.register(GcRef::Scope(s));
        assert!(roots.contains(GcRef::Scope(s)));
        assert_eq!(roots.iter_roots().count(), 1);
        assert!(roots.unregister(GcRef::Scope(s)));
        assert!(!roots.unregister(GcRef::Scope(s)));
        assert_eq!(roots.iter_roots().count(), 0);
    }

    #[test]
    fn test_roots_reuse_freed_slot() {
        let mut scopes = Slots::new();
        let a = scopes.insert(Scope::new(), SizeClass::Medium, 0);
        let b = scopes.insert(Scope::new(), SizeClass::Medium, 0);
        let mut roots = PersistentRoots::new();
        let ia = roots.register(GcRef::Scope(a));
        roots.unregister(GcRef::Scope(a));
        let ib = roots.register(GcRef::Scope(b));
        assert_eq!(ia, ib);
    }
}
