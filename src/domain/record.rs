//! Saved vs unsaved state. The id is assigned by storage exactly once and never changes afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Storage-assigned identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    pub const fn new(raw: i64) -> Self {
        EntityId(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(EntityId)
    }
}

/// A row that exists in storage. Equality and hashing use the id only.
#[derive(Clone, Debug)]
pub struct Persisted<F> {
    id: EntityId,
    pub fields: F,
}

impl<F> Persisted<F> {
    pub fn new(id: EntityId, fields: F) -> Self {
        Persisted { id, fields }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }
}

impl<F> PartialEq for Persisted<F> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<F> Eq for Persisted<F> {}

impl<F> Hash for Persisted<F> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Input to `save`: either a new row (storage assigns the id) or a replacement for an existing one.
#[derive(Clone, Debug)]
pub enum Record<F> {
    Unsaved(F),
    Saved(Persisted<F>),
}

impl<F> Record<F> {
    pub fn id(&self) -> Option<EntityId> {
        match self {
            Record::Unsaved(_) => None,
            Record::Saved(p) => Some(p.id()),
        }
    }

    pub fn fields(&self) -> &F {
        match self {
            Record::Unsaved(f) => f,
            Record::Saved(p) => &p.fields,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, Record::Saved(_))
    }
}

/// Unsaved records are never equal to anything, themselves included.
impl<F> PartialEq for Record<F> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Record::Saved(a), Record::Saved(b)) => a == b,
            _ => false,
        }
    }
}

impl<F> From<Persisted<F>> for Record<F> {
    fn from(p: Persisted<F>) -> Self {
        Record::Saved(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn persisted_equality_ignores_fields() {
        let a = Persisted::new(EntityId::new(1), "AAAAAAAAAA");
        let b = Persisted::new(EntityId::new(1), "BBBBBBBBBB");
        let c = Persisted::new(EntityId::new(2), "AAAAAAAAAA");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn unsaved_is_never_equal() {
        let unsaved = Record::Unsaved("x");
        assert!(unsaved != unsaved.clone());
        assert!(unsaved != Record::Saved(Persisted::new(EntityId::new(1), "x")));
        assert!(unsaved.id().is_none());
    }

    #[test]
    fn saved_records_compare_by_id() {
        let a: Record<&str> = Persisted::new(EntityId::new(7), "a").into();
        let b: Record<&str> = Persisted::new(EntityId::new(7), "b").into();
        assert!(a == b);
        assert_eq!(a.id(), Some(EntityId::new(7)));
        assert!(a.is_saved());
    }

    #[test]
    fn entity_id_parses_and_displays() {
        let id: EntityId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<EntityId>().is_err());
    }
}
