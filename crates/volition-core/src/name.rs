//! Process-wide string interning.
//!
//! A [`Name`] is a copyable handle to a canonical string in a global pool.
//! Equality and hashing operate on the handle, so compiled code compares
//! identifiers with a pointer compare. Pool entries are never freed.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use parking_lot::RwLock;
use rustc_hash::FxHashSet;

/// Content of the default [`Name`]. Defaulted names are well-defined and
/// compare equal to each other.
const UNINITIALISED: &str = "UNINITIALISED";

static POOL: OnceLock<RwLock<FxHashSet<&'static str>>> = OnceLock::new();

fn pool() -> &'static RwLock<FxHashSet<&'static str>> {
    POOL.get_or_init(|| {
        let mut strings = FxHashSet::default();
        strings.insert(UNINITIALISED);
        RwLock::new(strings)
    })
}

/// Warm the name pool at program startup.
///
/// Interning is lazy, so this is optional; calling it once from `main` keeps
/// pool construction out of the first tick.
pub fn init_pool() {
    let _ = pool();
}

/// Interned handle for a short identifier or string literal.
///
/// Two `Name`s are equal iff they refer to the same pool entry; the hash is
/// the handle itself.
#[derive(Clone, Copy)]
pub struct Name(&'static str);

impl Name {
    /// Intern `s` and return the canonical handle.
    pub fn new(s: &str) -> Self {
        if let Some(&existing) = pool().read().get(s) {
            return Name(existing);
        }

        let mut strings = pool().write();
        // Racing interners may have inserted between the read and write lock.
        if let Some(&existing) = strings.get(s) {
            return Name(existing);
        }

        let canonical: &'static str = Box::leak(s.to_owned().into_boxed_str());
        strings.insert(canonical);
        Name(canonical)
    }

    pub fn as_str(self) -> &'static str {
        self.0
    }

    fn handle(self) -> usize {
        self.0.as_ptr() as usize
    }
}

impl Default for Name {
    fn default() -> Self {
        Name::new(UNINITIALISED)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.handle() == other.handle()
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.handle());
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::new(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Name {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Name {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Name::new(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_canonical() {
        let a = Name::new("patrol");
        let b = Name::new(&String::from("patrol"));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "patrol");
        assert_ne!(a, Name::new("attack"));
    }

    #[test]
    fn default_is_the_sentinel() {
        assert_eq!(Name::default(), Name::new("UNINITIALISED"));
    }

    #[test]
    fn names_work_as_map_keys() {
        let mut set = std::collections::HashSet::new();
        set.insert(Name::new("idle"));
        set.insert(Name::new("idle"));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&Name::new("idle")));
    }
}
