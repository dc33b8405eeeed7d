//! Order-independent collection wrapper.
//!
//! Calendar properties such as `EXDATE`, `RDATE`, `RRULE`, `ATTENDEE` and
//! `CATEGORIES` are sequences on the wire but sets (strictly, multisets) in
//! meaning. [`UnorderedVec`] keeps the insertion order for serialization while
//! defining equality as multiset equality and hashing as a commutative
//! combination of per-element hashes.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::ops::{Deref, DerefMut};

/// A `Vec` whose equality and hash ignore element order.
///
/// Two collections are equal when every distinct element occurs the same
/// number of times in both. The hash is the wrapping sum of each element's
/// own hash, so any permutation hashes identically and `a == b` implies
/// `hash(a) == hash(b)`. An empty collection contributes only its length.
#[derive(Debug, Clone)]
pub struct UnorderedVec<T>(Vec<T>);

impl<T> UnorderedVec<T> {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Consumes the wrapper and returns the elements in insertion order.
    #[must_use]
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T: PartialEq> UnorderedVec<T> {
    /// Collects `items`, keeping only the first of any repeated element.
    #[must_use]
    pub fn distinct(items: impl IntoIterator<Item = T>) -> Self {
        let mut kept = Vec::new();
        for item in items {
            if !kept.contains(&item) {
                kept.push(item);
            }
        }
        Self(kept)
    }
}

impl<T: Hash> UnorderedVec<T> {
    /// Returns the order-independent digest of the elements.
    #[must_use]
    pub fn unordered_digest(&self) -> u64 {
        self.0
            .iter()
            .map(element_hash)
            .fold(0_u64, u64::wrapping_add)
    }
}

/// Hashes one element with a fixed-key hasher so results are comparable
/// across collections.
fn element_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl<T> Default for UnorderedVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash> PartialEq for UnorderedVec<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }

        let mut counts: HashMap<&T, isize> = HashMap::with_capacity(self.0.len());
        for item in &self.0 {
            *counts.entry(item).or_insert(0) += 1;
        }
        for item in &other.0 {
            match counts.get_mut(item) {
                Some(count) if *count > 0 => *count -= 1,
                _ => return false,
            }
        }
        counts.values().all(|&count| count == 0)
    }
}

impl<T: Eq + Hash> Eq for UnorderedVec<T> {}

impl<T: Hash> Hash for UnorderedVec<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.0.len());
        state.write_u64(self.unordered_digest());
    }
}

impl<T> Deref for UnorderedVec<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for UnorderedVec<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> From<Vec<T>> for UnorderedVec<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<T> FromIterator<T> for UnorderedVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T> IntoIterator for UnorderedVec<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a UnorderedVec<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
