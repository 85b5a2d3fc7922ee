//! Key Builder Module
//!
//! Turns an operation name plus its argument collections into one deterministic string key.
//!
//! Only three kinds of argument take part in a key: ordered sequences, unordered
//! sets and mappings (keys only). Set members and mapping keys are sorted first,
//! sequences keep their order, empty collections are skipped.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::BuildHasher;

use tracing::debug;

use crate::error::{CacheError, Result};

// == Key Atom ==
/// A single member of an argument collection.
///
/// Atoms of different kinds order by kind first (bool < int < float < char < str),
/// so a mixed set still sorts deterministically.
#[derive(Debug, Clone)]
pub enum KeyAtom {
    Bool(bool),
    Int(i128),
    Float(f64),
    Char(char),
    Str(String),
}

impl KeyAtom {
    fn rank(&self) -> u8 {
        match self {
            KeyAtom::Bool(_) => 0,
            KeyAtom::Int(_) => 1,
            KeyAtom::Float(_) => 2,
            KeyAtom::Char(_) => 3,
            KeyAtom::Str(_) => 4,
        }
    }
}

impl Ord for KeyAtom {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyAtom::Bool(a), KeyAtom::Bool(b)) => a.cmp(b),
            (KeyAtom::Int(a), KeyAtom::Int(b)) => a.cmp(b),
            (KeyAtom::Float(a), KeyAtom::Float(b)) => a.total_cmp(b),
            (KeyAtom::Char(a), KeyAtom::Char(b)) => a.cmp(b),
            (KeyAtom::Str(a), KeyAtom::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for KeyAtom {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for KeyAtom {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyAtom {}

impl fmt::Display for KeyAtom {
    // Strings and chars are quoted and escaped so they can never forge a delimiter
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAtom::Bool(v) => write!(f, "{}", v),
            KeyAtom::Int(v) => write!(f, "{}", v),
            KeyAtom::Float(v) => write!(f, "{:?}", v),
            KeyAtom::Char(v) => write!(f, "{:?}", v),
            KeyAtom::Str(v) => write!(f, "{:?}", v),
        }
    }
}

macro_rules! impl_int_atom {
    ($($t:ty),*) => {
        $(
            impl From<$t> for KeyAtom {
                fn from(v: $t) -> Self {
                    KeyAtom::Int(v as i128)
                }
            }
        )*
    };
}

impl_int_atom!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<bool> for KeyAtom {
    fn from(v: bool) -> Self {
        KeyAtom::Bool(v)
    }
}

impl From<f32> for KeyAtom {
    fn from(v: f32) -> Self {
        KeyAtom::Float(v as f64)
    }
}

impl From<f64> for KeyAtom {
    fn from(v: f64) -> Self {
        KeyAtom::Float(v)
    }
}

impl From<char> for KeyAtom {
    fn from(v: char) -> Self {
        KeyAtom::Char(v)
    }
}

impl From<String> for KeyAtom {
    fn from(v: String) -> Self {
        KeyAtom::Str(v)
    }
}

impl From<&str> for KeyAtom {
    fn from(v: &str) -> Self {
        KeyAtom::Str(v.to_string())
    }
}

impl From<&String> for KeyAtom {
    fn from(v: &String) -> Self {
        KeyAtom::Str(v.clone())
    }
}

// == Key Argument ==
/// One argument of a memoized call, as seen by the key builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyArg {
    /// Order is meaningful and preserved
    Sequence(Vec<KeyAtom>),
    /// Member order is irrelevant; sorted before stringification
    Set(Vec<KeyAtom>),
    /// Only the mapping's keys participate; sorted before stringification
    MappingKeys(Vec<KeyAtom>),
    /// A bare value. Never valid as a key component.
    Scalar(KeyAtom),
}

impl KeyArg {
    /// Returns true for collections with no members. Scalars are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            KeyArg::Sequence(items) | KeyArg::Set(items) | KeyArg::MappingKeys(items) => {
                items.is_empty()
            }
            KeyArg::Scalar(_) => false,
        }
    }

    // == Canonicalize ==
    /// Renders the argument into its canonical key segment.
    ///
    /// # Returns
    /// - `Ok(None)` for an empty collection (it contributes nothing)
    /// - `Ok(Some(segment))` otherwise
    /// - `Err(UnsupportedArgumentType)` for a scalar
    pub fn canonicalize(&self) -> Result<Option<String>> {
        let (tag, atoms): (&str, Vec<&KeyAtom>) = match self {
            KeyArg::Sequence(items) => ("seq", items.iter().collect()),
            KeyArg::Set(items) => ("set", sorted_unique(items)),
            KeyArg::MappingKeys(items) => ("map", sorted_unique(items)),
            KeyArg::Scalar(atom) => {
                return Err(CacheError::UnsupportedArgumentType(format!(
                    "expected a sequence, set or mapping, got scalar {}",
                    atom
                )))
            }
        };
        if atoms.is_empty() {
            return Ok(None);
        }

        let body = atoms
            .iter()
            .map(|atom| atom.to_string())
            .collect::<Vec<_>>()
            .join(",");
        Ok(Some(format!("|{}[{}]", tag, body)))
    }
}

fn sorted_unique(items: &[KeyAtom]) -> Vec<&KeyAtom> {
    let mut sorted: Vec<&KeyAtom> = items.iter().collect();
    sorted.sort();
    sorted.dedup();
    sorted
}

// == Build Key ==
/// Builds the cache key for one call of `operation_name`.
///
/// Logically equal calls (same name, canonically equal collections in the same
/// argument order) always map to the same key.
///
/// The name is written with its byte length in front, so no name can run
/// into the collection segments that follow it.
pub fn build_key(operation_name: &str, collections: &[KeyArg]) -> Result<String> {
    debug!(
        operation = operation_name,
        count = collections.len(),
        "Building cache key"
    );

    let mut key = format!("{}:{}", operation_name.len(), operation_name);
    for collection in collections {
        if let Some(segment) = collection.canonicalize()? {
            key.push_str(&segment);
        }
    }

    debug!(key_len = key.len(), "Cache key built");
    Ok(key)
}

// == To Key Arg ==
/// Conversion from a call argument into a [`KeyArg`].
///
/// Implemented for the standard sequences, sets and maps, and for common
/// scalar types (which convert to [`KeyArg::Scalar`] and are then rejected).
pub trait ToKeyArg {
    fn to_key_arg(&self) -> KeyArg;
}

impl ToKeyArg for KeyArg {
    fn to_key_arg(&self) -> KeyArg {
        self.clone()
    }
}

impl<T: ToKeyArg + ?Sized> ToKeyArg for &T {
    fn to_key_arg(&self) -> KeyArg {
        (**self).to_key_arg()
    }
}

impl<T: Clone + Into<KeyAtom>> ToKeyArg for [T] {
    fn to_key_arg(&self) -> KeyArg {
        KeyArg::Sequence(self.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Clone + Into<KeyAtom>, const N: usize> ToKeyArg for [T; N] {
    fn to_key_arg(&self) -> KeyArg {
        self.as_slice().to_key_arg()
    }
}

impl<T: Clone + Into<KeyAtom>> ToKeyArg for Vec<T> {
    fn to_key_arg(&self) -> KeyArg {
        self.as_slice().to_key_arg()
    }
}

impl<T: Clone + Into<KeyAtom>> ToKeyArg for VecDeque<T> {
    fn to_key_arg(&self) -> KeyArg {
        KeyArg::Sequence(self.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Clone + Into<KeyAtom>, S: BuildHasher> ToKeyArg for HashSet<T, S> {
    fn to_key_arg(&self) -> KeyArg {
        KeyArg::Set(self.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Clone + Into<KeyAtom>> ToKeyArg for BTreeSet<T> {
    fn to_key_arg(&self) -> KeyArg {
        KeyArg::Set(self.iter().cloned().map(Into::into).collect())
    }
}

impl<K: Clone + Into<KeyAtom>, V, S: BuildHasher> ToKeyArg for HashMap<K, V, S> {
    fn to_key_arg(&self) -> KeyArg {
        KeyArg::MappingKeys(self.keys().cloned().map(Into::into).collect())
    }
}

impl<K: Clone + Into<KeyAtom>, V> ToKeyArg for BTreeMap<K, V> {
    fn to_key_arg(&self) -> KeyArg {
        KeyArg::MappingKeys(self.keys().cloned().map(Into::into).collect())
    }
}

macro_rules! impl_scalar_key_arg {
    ($($t:ty),*) => {
        $(
            impl ToKeyArg for $t {
                fn to_key_arg(&self) -> KeyArg {
                    KeyArg::Scalar(KeyAtom::from(self.clone()))
                }
            }
        )*
    };
}

impl_scalar_key_arg!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, char, String
);

impl ToKeyArg for str {
    fn to_key_arg(&self) -> KeyArg {
        KeyArg::Scalar(KeyAtom::from(self))
    }
}

/// Builds a `Vec<KeyArg>` from a list of call arguments.
///
/// ```
/// use timed_sized_cache::key_args;
/// let col = vec![1, 2, 3];
/// let args = key_args![col];
/// assert_eq!(args.len(), 1);
/// ```
#[macro_export]
macro_rules! key_args {
    () => {
        ::std::vec::Vec::<$crate::cache::KeyArg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::cache::ToKeyArg::to_key_arg(&$arg)),+]
    };
}
