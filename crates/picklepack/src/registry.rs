//! Object type tags, injected resolution callbacks, and the encode-side
//! reduction registry.
//!
//! There is no global registry: every resolution surface is a value passed
//! explicitly into the pickler or unpickler.

use std::collections::HashMap;
use std::fmt;

use crate::value::{Object, Value};

/// Stable object type tag: a module plus a qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeTag {
    pub module: String,
    pub name: String,
}

impl TypeTag {
    pub fn new(module: &str, name: &str) -> Self {
        Self {
            module: module.to_owned(),
            name: name.to_owned(),
        }
    }

    pub fn qualified(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// Constructible type descriptor returned by a [`ClassResolver`] for
/// attribute-based reconstruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDescriptor {
    pub tag: TypeTag,
}

impl ClassDescriptor {
    pub fn new(tag: TypeTag) -> Self {
        Self { tag }
    }
}

/// Maps a type tag to a constructible descriptor, or declines.
pub type ClassResolver<'a> = Box<dyn Fn(&TypeTag) -> Option<ClassDescriptor> + 'a>;

/// Reconstructs an object from its tag and saved fields, or declines.
pub type ObjectLoader<'a> = Box<dyn Fn(&TypeTag, &[Value]) -> Option<Value> + 'a>;

type ReduceFn = Box<dyn Fn(&Object) -> Vec<Value>>;

/// Encode-side lookup table of reduction strategies keyed by type tag.
///
/// When supplied to a pickler the table is closed-world: an object whose tag
/// has no registered reducer fails the encode. Without a registry, the
/// default reduction (the object's ordered fields) applies to every tag.
#[derive(Default)]
pub struct ClassRegistry {
    reducers: HashMap<TypeTag, ReduceFn>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the reduction function for one object kind.
    pub fn register(&mut self, tag: TypeTag, reduce: impl Fn(&Object) -> Vec<Value> + 'static) {
        self.reducers.insert(tag, Box::new(reduce));
    }

    pub fn contains(&self, tag: &TypeTag) -> bool {
        self.reducers.contains_key(tag)
    }

    /// Reduces an object to its serialized fields, or `None` when its tag
    /// has no registered strategy.
    pub fn reduce(&self, object: &Object) -> Option<Vec<Value>> {
        self.reducers.get(&object.tag).map(|f| f(object))
    }
}
