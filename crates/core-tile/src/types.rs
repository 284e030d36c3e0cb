//! The tile type catalog: identities, bitmask sets, and the per-type
//! relations a technology loader fills in (connectivity, plane ownership,
//! contact residues/stacking, and the plowing adjuncts).

use std::collections::HashMap;

/// Identity of a material type. `SPACE` (id 0) always means "nothing
/// painted here" and is never a key in [`TypeTable`]'s per-type maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileType(pub u16);

impl TileType {
    pub const SPACE: TileType = TileType(0);

    /// Sentinel produced when a checked paint runs into an illegal overlap
    /// (two non-stacking types painted over the same area). A plane is
    /// allowed to contain `ERROR_S` tiles; the next DRC sweep flags them.
    pub const ERROR_S: TileType = TileType(u16::MAX);

    pub fn is_space(self) -> bool {
        self == Self::SPACE
    }

    pub fn is_error(self) -> bool {
        self == Self::ERROR_S
    }
}

/// A set of [`TileType`]s, stored as a growable bit vector so a technology
/// with an arbitrary number of types never overflows a fixed-width mask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMask {
    words: Vec<u64>,
}

impl TypeMask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, t: TileType) -> bool {
        let (word, bit) = Self::locate(t);
        self.words.get(word).is_some_and(|w| w & (1 << bit) != 0)
    }

    pub fn insert(&mut self, t: TileType) {
        let (word, bit) = Self::locate(t);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << bit;
    }

    pub fn remove(&mut self, t: TileType) {
        let (word, bit) = Self::locate(t);
        if let Some(w) = self.words.get_mut(word) {
            *w &= !(1 << bit);
        }
    }

    /// True if `self` and `other` share at least one type.
    pub fn intersects(&self, other: &TypeMask) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .any(|(a, b)| a & b != 0)
    }

    pub fn union(&self, other: &TypeMask) -> TypeMask {
        let len = self.words.len().max(other.words.len());
        let mut words = vec![0u64; len];
        for (i, w) in words.iter_mut().enumerate() {
            *w = self.words.get(i).copied().unwrap_or(0) | other.words.get(i).copied().unwrap_or(0);
        }
        TypeMask { words }
    }

    fn locate(t: TileType) -> (usize, u32) {
        ((t.0 as usize) / 64, (t.0 as u32) % 64)
    }
}

impl FromIterator<TileType> for TypeMask {
    fn from_iter<I: IntoIterator<Item = TileType>>(iter: I) -> Self {
        let mut mask = TypeMask::new();
        for t in iter {
            mask.insert(t);
        }
        mask
    }
}

/// Which plane (layer) a type belongs to. Planes are named rather than
/// indexed so technology files can add or reorder them freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlaneId(pub u16);

/// Per-type relations filled in by technology loading (`core-tech`).
/// Each table defaults to empty/identity so a type with no entry behaves
/// as "connects only to itself, has no residues, is not fixed/covered/
/// drag/contact".
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    names: HashMap<TileType, String>,
    plane_of: HashMap<TileType, PlaneId>,
    connects_to: HashMap<TileType, TypeMask>,
    /// For a contact type, the non-contact types it is built from.
    residues: HashMap<TileType, Vec<TileType>>,
    /// For a contact type, the other contact types it may legally stack
    /// with in the same location.
    stacking: HashMap<TileType, TypeMask>,
    active_layers: TypeMask,
    fixed_types: TypeMask,
    covered_types: TypeMask,
    drag_types: TypeMask,
    contact_types: TypeMask,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_type(&mut self, t: TileType, name: impl Into<String>, plane: PlaneId) {
        self.names.insert(t, name.into());
        self.plane_of.insert(t, plane);
        self.active_layers.insert(t);
        // every type connects to itself
        self.connects_to.entry(t).or_default().insert(t);
    }

    pub fn name_of(&self, t: TileType) -> Option<&str> {
        self.names.get(&t).map(String::as_str)
    }

    pub fn plane_of(&self, t: TileType) -> Option<PlaneId> {
        self.plane_of.get(&t).copied()
    }

    pub fn set_connects(&mut self, a: TileType, b: TileType) {
        self.connects_to.entry(a).or_default().insert(b);
        self.connects_to.entry(b).or_default().insert(a);
    }

    pub fn connects_to(&self, t: TileType) -> TypeMask {
        self.connects_to.get(&t).cloned().unwrap_or_else(|| {
            let mut m = TypeMask::new();
            m.insert(t);
            m
        })
    }

    pub fn connect(&self, a: TileType, b: TileType) -> bool {
        self.connects_to(a).contains(b)
    }

    pub fn set_residues(&mut self, contact: TileType, residues: Vec<TileType>) {
        self.contact_types.insert(contact);
        self.residues.insert(contact, residues);
    }

    pub fn residues(&self, contact: TileType) -> &[TileType] {
        self.residues.get(&contact).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_stacking(&mut self, a: TileType, b: TileType) {
        self.stacking.entry(a).or_default().insert(b);
        self.stacking.entry(b).or_default().insert(a);
    }

    pub fn may_stack(&self, a: TileType, b: TileType) -> bool {
        self.stacking.get(&a).is_some_and(|m| m.contains(b))
    }

    pub fn active_layers(&self) -> &TypeMask {
        &self.active_layers
    }

    pub fn mark_fixed(&mut self, t: TileType) {
        self.fixed_types.insert(t);
    }
    pub fn is_fixed(&self, t: TileType) -> bool {
        self.fixed_types.contains(t)
    }

    pub fn mark_covered(&mut self, t: TileType) {
        self.covered_types.insert(t);
    }
    pub fn is_covered(&self, t: TileType) -> bool {
        self.covered_types.contains(t)
    }

    pub fn mark_drag(&mut self, t: TileType) {
        self.drag_types.insert(t);
    }
    pub fn is_drag(&self, t: TileType) -> bool {
        self.drag_types.contains(t)
    }

    pub fn is_contact(&self, t: TileType) -> bool {
        self.contact_types.contains(t)
    }

    /// What painting `painting` over an area currently holding `existing`
    /// actually produces. Space and a repaint of the same type pass
    /// straight through; two contact types that may legally stack produce
    /// the new type (the residues underneath are unaffected, since they
    /// live on their own planes); anything else is an illegal overlap and
    /// produces [`TileType::ERROR_S`] rather than silently clobbering
    /// whatever was there.
    pub fn paint_transition(&self, existing: TileType, painting: TileType) -> TileType {
        if existing.is_space() || existing == painting {
            painting
        } else if self.may_stack(existing, painting) {
            painting
        } else {
            TileType::ERROR_S
        }
    }
}
