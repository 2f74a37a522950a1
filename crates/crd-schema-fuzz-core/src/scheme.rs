//! GVK-keyed registry of object types.
//!
//! A [`Scheme`] is built explicitly, filled once during setup and then only
//! read, so tests can hand each sweep its own isolated registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::SchemeError;
use crate::fuzzer::{Fuzz, Fuzzer};
use crate::gvk::GroupVersionKind;

/// A concrete, strongly typed object that can be registered in a [`Scheme`].
///
/// `Clone` is the deep-copy primitive: an object owns all of its data, so a
/// clone never shares storage with the original.
pub trait Object:
    Fuzz + Serialize + Clone + PartialEq + fmt::Debug + Default + Send + Sync + 'static
{
}

impl<T> Object for T where
    T: Fuzz + Serialize + Clone + PartialEq + fmt::Debug + Default + Send + Sync + 'static
{
}

/// Object-safe view of an object used by the fuzz loop.
pub trait DynObject: fmt::Debug + Send {
    /// A structurally independent duplicate.
    fn deep_copy(&self) -> Box<dyn DynObject>;

    /// Populate every field with pseudo-random data.
    fn fuzz(&mut self, fuzzer: &mut Fuzzer);

    /// The unstructured form the pruner operates on.
    fn to_value(&self) -> Result<Value, serde_json::Error>;

    fn type_name(&self) -> &'static str;

    /// The kind this object stands for, when the object knows it.
    fn kind(&self) -> Option<&GroupVersionKind> {
        None
    }
}

impl<T: Object> DynObject for T {
    fn deep_copy(&self) -> Box<dyn DynObject> {
        Box::new(self.clone())
    }

    fn fuzz(&mut self, fuzzer: &mut Fuzzer) {
        fuzzer.fill(self);
    }

    fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

type Constructor = Arc<dyn Fn() -> Box<dyn DynObject> + Send + Sync>;

#[derive(Default, Clone)]
pub struct Scheme {
    kinds: BTreeMap<GroupVersionKind, Constructor>,
}

impl Scheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `gvk`; new instances start from `T::default()`.
    pub fn register<T: Object>(&mut self, gvk: GroupVersionKind) -> Result<(), SchemeError> {
        self.register_with(gvk, || Box::new(T::default()) as Box<dyn DynObject>)
    }

    /// Register a constructor under `gvk`.
    pub fn register_with<F>(&mut self, gvk: GroupVersionKind, constructor: F) -> Result<(), SchemeError>
    where
        F: Fn() -> Box<dyn DynObject> + Send + Sync + 'static,
    {
        if self.kinds.contains_key(&gvk) {
            return Err(SchemeError::AlreadyRegistered(gvk));
        }
        tracing::debug!(%gvk, "registered kind");
        self.kinds.insert(gvk, Arc::new(constructor));
        Ok(())
    }

    /// A fresh zero-value instance of the type registered under `gvk`.
    pub fn new_object(&self, gvk: &GroupVersionKind) -> Result<Box<dyn DynObject>, SchemeError> {
        self.kinds
            .get(gvk)
            .map(|constructor| constructor())
            .ok_or_else(|| SchemeError::NotRegistered(gvk.clone()))
    }

    pub fn is_registered(&self, gvk: &GroupVersionKind) -> bool {
        self.kinds.contains_key(gvk)
    }

    /// Registered kinds in sorted order.
    pub fn known_kinds(&self) -> impl Iterator<Item = &GroupVersionKind> {
        self.kinds.keys()
    }
}

impl fmt::Debug for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheme")
            .field("kinds", &self.kinds.keys().collect::<Vec<_>>())
            .finish()
    }
}
