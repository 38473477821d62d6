use std::marker::PhantomData;
use std::rc::Rc;

use crate::context::Injector;
use crate::error::Error;
use crate::key::Key;
use crate::managed::Managed;
use crate::util::any::Downcast;

/// Whether an injection site asked for a value directly or deferred it
/// behind [`Lazy`].
///
/// Only `Direct` edges participate in cycle detection: a `Lazy` edge is a
/// legitimate way to break a cycle, since the dependency isn't actually
/// constructed until the owner chooses to call [`Lazy::get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indirection {
    Direct,
    Lazy,
}

/// A single declared dependency of a binding: a key, and how it was
/// requested.
///
/// Every [`Provider`](crate::provider::Provider) reports its dependencies as
/// a `Vec<Dependency>` so the validator can walk the whole graph without
/// constructing anything.
pub struct Dependency {
    key: Box<dyn Key>,
    indirection: Indirection,
}

impl Dependency {
    pub fn direct(key: Box<dyn Key>) -> Self {
        Self {
            key,
            indirection: Indirection::Direct,
        }
    }

    pub fn lazy(key: Box<dyn Key>) -> Self {
        Self {
            key,
            indirection: Indirection::Lazy,
        }
    }

    pub fn key(&self) -> &dyn Key {
        self.key.as_ref()
    }

    pub fn indirection(&self) -> Indirection {
        self.indirection
    }
}

/// A deferred handle to a dependency, requested with `Lazy<T>` instead of
/// `T` at an injection site.
///
/// Resolving `T` directly would force it to exist before the owner does,
/// which is impossible when `T` (transitively) depends back on the owner.
/// `Lazy<T>` breaks that cycle: it carries everything needed to resolve `T`
/// on demand, and the validator doesn't treat the edge it came from as
/// cycle-forming.
///
/// Calling [`Lazy::get`] is not memoizing on its own — whether repeated
/// calls return the same value is entirely a function of the target's
/// scope.
pub struct Lazy<T> {
    injector: Rc<dyn Injector>,
    key: Box<dyn Key>,
    _marker: PhantomData<T>,
}

impl<T> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self {
            injector: Rc::clone(&self.injector),
            key: self.key.dyn_clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> Lazy<T>
where
    T: Managed,
{
    pub(crate) fn new(injector: Rc<dyn Injector>, key: Box<dyn Key>) -> Self {
        Self {
            injector,
            key,
            _marker: PhantomData,
        }
    }

    pub fn get(&self) -> Result<T, Error> {
        let managed = self.injector.dyn_get(self.key.as_ref())?;
        let managed = managed
            .downcast::<T>()
            .unwrap_or_else(|_| unreachable!("`Lazy<T>` should only ever box a `T`"));
        Ok(*managed)
    }
}
