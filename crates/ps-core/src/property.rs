//! Path-keyed registry of get/set hooks over an owning object.
//!
//! A tie pairs a getter with an optional setter. Both receive the target
//! object explicitly so the registry never holds a borrow of it.

use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};

pub type Getter<T> = Box<dyn Fn(&T) -> f64>;
pub type Setter<T> = Box<dyn Fn(&mut T, f64)>;

struct Tie<T> {
    getter: Getter<T>,
    setter: Option<Setter<T>>,
}

pub struct PropertyManager<T> {
    ties: BTreeMap<String, Tie<T>>,
}

impl<T> Default for PropertyManager<T> {
    fn default() -> Self {
        Self {
            ties: BTreeMap::new(),
        }
    }
}

impl<T> std::fmt::Debug for PropertyManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyManager")
            .field("paths", &self.ties.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T> PropertyManager<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a property. Tying an already tied path is an error.
    pub fn tie(
        &mut self,
        path: impl Into<String>,
        getter: impl Fn(&T) -> f64 + 'static,
        setter: Option<Setter<T>>,
    ) -> CoreResult<()> {
        let path = path.into();
        if self.ties.contains_key(&path) {
            return Err(CoreError::DuplicateProperty { path });
        }
        self.ties.insert(
            path,
            Tie {
                getter: Box::new(getter),
                setter,
            },
        );
        Ok(())
    }

    /// Register a read/write property.
    pub fn tie_rw(
        &mut self,
        path: impl Into<String>,
        getter: impl Fn(&T) -> f64 + 'static,
        setter: impl Fn(&mut T, f64) + 'static,
    ) -> CoreResult<()> {
        self.tie(path, getter, Some(Box::new(setter)))
    }

    /// Returns true when the path was tied.
    pub fn untie(&mut self, path: &str) -> bool {
        self.ties.remove(path).is_some()
    }

    /// Remove every tie whose path starts with `prefix`; returns how many.
    pub fn untie_prefix(&mut self, prefix: &str) -> usize {
        let before = self.ties.len();
        self.ties.retain(|path, _| !path.starts_with(prefix));
        before - self.ties.len()
    }

    pub fn get(&self, target: &T, path: &str) -> CoreResult<f64> {
        let tie = self.lookup(path)?;
        Ok((tie.getter)(target))
    }

    pub fn set(&self, target: &mut T, path: &str, value: f64) -> CoreResult<()> {
        let tie = self.lookup(path)?;
        match &tie.setter {
            Some(setter) => {
                setter(target, value);
                Ok(())
            }
            None => Err(CoreError::ReadOnlyProperty { path: path.into() }),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.ties.contains_key(path)
    }

    pub fn is_writable(&self, path: &str) -> bool {
        self.ties.get(path).is_some_and(|t| t.setter.is_some())
    }

    /// Tied paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.ties.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ties.is_empty()
    }

    fn lookup(&self, path: &str) -> CoreResult<&Tie<T>> {
        self.ties
            .get(path)
            .ok_or_else(|| CoreError::UnknownProperty { path: path.into() })
    }
}
