use std::collections::HashMap;
use std::rc::Rc;

use crate::error::Error;
use crate::key::{Key, TypedKey};
use crate::managed::Managed;
use crate::provider::Provider;
use crate::reference::Lazy;
use crate::util::any::Downcast;

/// The object-safe, type-erased face of a resolved registry: given any key,
/// produce the managed value behind it.
///
/// [`Context`] is the only implementor in this crate; the trait exists so
/// generated `Component` code (and hand-written providers) can depend on
/// "something that resolves keys" without depending on `Context` itself,
/// and so unit tests can exercise a provider in isolation against a
/// `MockInjector` instead of building a whole `Config`.
#[cfg_attr(test, mockall::automock)]
pub trait Injector {
    fn dyn_get(&self, key: &dyn Key) -> Result<Box<dyn Managed>, Error>;

    fn dyn_contains(&self, key: &dyn Key) -> bool;

    /// A cheaply-cloned, type-erased handle to this same injector, used to
    /// build a [`Lazy`] that outlives the borrow `&self` a constructor body
    /// is handed.
    fn dyn_clone_rc(&self) -> Rc<dyn Injector>;
}

/// The statically-typed counterpart of [`Injector`], offering the `get` and
/// `get_lazy` entry points generated `Component` code and user code call.
pub trait TypedInjector: Injector {
    /// Resolves `key`, or `Ok(None)` if nothing is bound for it.
    fn get<K: TypedKey>(&self, key: K) -> Result<Option<K::Target>, Error> {
        match self.dyn_get(&key) {
            Ok(managed) => {
                let managed = managed
                    .downcast::<K::Target>()
                    .unwrap_or_else(|_| unreachable!("a key's provider must produce its own target type"));
                Ok(Some(*managed))
            }
            Err(Error::DependencyNotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Returns a deferred handle to `key`'s binding, or `None` if nothing is
    /// bound for it. Unlike [`TypedInjector::get`], no value is constructed
    /// until [`Lazy::get`] is called.
    fn get_lazy<K: TypedKey>(&self, key: K) -> Option<Lazy<K::Target>> {
        if self.dyn_contains(&key) {
            Some(Lazy::new(self.dyn_clone_rc(), Box::new(key)))
        } else {
            None
        }
    }
}

impl<T: Injector + ?Sized> TypedInjector for T {}

/// An immutable, resolved registry: the product of [`Config::resolve`]
/// (crate::config::Config::resolve).
///
/// `Context` is cheap to clone (an `Rc` handle) and is not `Send`/`Sync` —
/// sharing one across threads is out of scope for this crate, and `Rc`
/// (rather than `Arc`) makes that a compile error rather than a documented
/// caveat.
#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextInner>,
}

struct ContextInner {
    providers: HashMap<Box<dyn Key>, Box<dyn Provider>>,
}

impl Context {
    pub(crate) fn new(providers: HashMap<Box<dyn Key>, Box<dyn Provider>>) -> Self {
        Self {
            inner: Rc::new(ContextInner { providers }),
        }
    }

    /// Resolves `key`, or `Ok(None)` if nothing is bound for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Construction`] if the binding's constructor failed.
    pub fn get<K: TypedKey>(&self, key: K) -> Result<Option<K::Target>, Error> {
        TypedInjector::get(self, key)
    }

    /// Returns a deferred handle to `key`'s binding, or `None` if nothing is
    /// bound for it. Unlike [`Context::get`], no value is constructed until
    /// [`Lazy::get`] is called.
    pub fn get_lazy<K: TypedKey>(&self, key: K) -> Option<Lazy<K::Target>> {
        TypedInjector::get_lazy(self, key)
    }
}

impl Injector for Context {
    fn dyn_get(&self, key: &dyn Key) -> Result<Box<dyn Managed>, Error> {
        match self.inner.providers.get(key) {
            Some(provider) => provider.dyn_produce(self),
            None => Err(Error::DependencyNotFound {
                component: key.dyn_clone(),
                dependency: key.dyn_clone(),
            }),
        }
    }

    fn dyn_contains(&self, key: &dyn Key) -> bool {
        self.inner.providers.contains_key(key)
    }

    fn dyn_clone_rc(&self) -> Rc<dyn Injector> {
        Rc::new(self.clone())
    }
}
