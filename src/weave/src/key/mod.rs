mod implementation;

use std::any::TypeId;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};

use crate::managed::Managed;
use crate::util::any::AsAny;
use crate::util::hash::DynHash;

pub(crate) use crate::key::implementation::KeyImpl;

/// Identifies a single binding: a target type refined by an optional
/// qualifier.
///
/// `Key` is the dyn-compatible, type-erased face of a key; `TypedKey` is its
/// statically-typed counterpart. Bindings, the registry and the validator all
/// operate on `Box<dyn Key>`, since a single `Config` holds keys of many
/// unrelated target types side by side.
pub trait Key
where
    Self: Debug + Display + AsAny + DynHash + 'static,
{
    /// The `TypeId` of the type this key resolves to.
    fn target_type(&self) -> TypeId;

    fn dyn_clone(&self) -> Box<dyn Key>;
}

impl PartialEq for dyn Key {
    fn eq(&self, other: &Self) -> bool {
        self.dyn_eq(other.as_any())
    }
}

impl Eq for dyn Key {}

impl Hash for dyn Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dyn_hash(state);
    }
}

impl<T: TypedKey> Key for T {
    fn target_type(&self) -> TypeId {
        TypeId::of::<T::Target>()
    }

    fn dyn_clone(&self) -> Box<dyn Key> {
        Box::new(*self)
    }
}

/// The statically-typed view of a key, implemented by [`KeyImpl`] and
/// produced by [`of`], [`named`] and [`qualified`].
pub trait TypedKey: Key + Copy + Eq + Hash {
    type Target: Managed;

    type Qualifier: Copy + Debug + Eq + Hash + 'static;

    fn qualifier(&self) -> Self::Qualifier;
}

/// A key for an unqualified binding of `T`.
pub fn of<T>() -> impl TypedKey<Target = T, Qualifier = ()>
where
    T: Managed,
{
    KeyImpl::new(())
}

/// A key for a binding of `T` qualified by a name, equivalent to `#[named]`.
pub fn named<T>(name: &'static str) -> impl TypedKey<Target = T, Qualifier = &'static str>
where
    T: Managed,
{
    KeyImpl::new(name)
}

/// A key for a binding of `T` qualified by an arbitrary value, equivalent to
/// `#[qualified]`.
pub fn qualified<T, Q>(qualifier: Q) -> impl TypedKey<Target = T, Qualifier = Q>
where
    T: Managed,
    Q: Copy + Debug + Eq + Hash + 'static,
{
    KeyImpl::new(qualifier)
}
