use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::context::Context;
use crate::error::{Error, IllegalComponentReason};
use crate::key::{self, Key};
use crate::managed::Managed;
use crate::provider::component::{Component, ComponentProvider};
use crate::provider::instance::InstanceProvider;
use crate::provider::{Provider, TypedProvider};
use crate::scope::{Scope, Singleton};
use crate::validator;

type ScopeWrap<T> = Box<dyn FnOnce(Box<dyn TypedProvider<Output = T>>) -> Box<dyn TypedProvider<Output = T>>>;

/// The mutable registry a caller populates before calling [`Config::resolve`].
///
/// Bindings register themselves when the `Bound` handle returned by
/// [`Binder::to_instance`] or [`Binder::to_component`] is dropped, which is
/// what lets `.scoped(...)` chain after either of them without a further
/// `.finish()` call. Anything that goes wrong along the way — a scope given
/// both at the type level and at bind time, or a bind-time scope name with no
/// registered factory — is recorded in `errors` and surfaces the first time
/// [`Config::resolve`] is called, mirroring how the eager validator itself
/// only reports the first problem it finds.
pub struct Config {
    providers: HashMap<Box<dyn Key>, Box<dyn Provider>>,
    scopes: HashMap<(&'static str, TypeId), Box<dyn Any>>,
    errors: Vec<Error>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            scopes: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// Starts a binding for `T`. Chain `.named(...)` or `.qualified(...)` to
    /// refine the key, then finish with `.to_instance(...)` or
    /// `.to_component::<C>()`.
    pub fn bind<T>(&mut self) -> Binder<'_, T>
    where
        T: Managed + Clone,
    {
        Binder {
            config: self,
            key: Box::new(key::of::<T>()),
        }
    }

    /// Registers a factory for a user-defined scope named `name`, usable by
    /// any `T`-typed binding whose `.scoped(...)` or `#[component(scope =
    /// "...")]` names it.
    ///
    /// A scope factory is specific to the `(name, T)` pair: binding the same
    /// scope name against a different output type requires its own call to
    /// `scope`.
    pub fn scope<T, S, F>(&mut self, name: &'static str, factory: F)
    where
        T: Managed + Clone,
        S: Scope,
        F: Fn() -> S + 'static,
    {
        let wrap: Box<dyn Fn(Box<dyn TypedProvider<Output = T>>) -> Box<dyn TypedProvider<Output = T>>> =
            Box::new(move |inner| factory().wrap(inner));
        self.scopes.insert((name, TypeId::of::<T>()), Box::new(wrap));
    }

    /// Validates every binding (presence, then cycles) and, if the graph is
    /// sound, hands back a resolved [`Context`].
    ///
    /// # Errors
    ///
    /// Returns the first [`Error`] recorded while binding (a scope conflict
    /// or an unregistered scope name), or the first one the validator finds.
    pub fn resolve(mut self) -> Result<Context, Error> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }
        validator::validate(&self.providers)?;
        Ok(Context::new(self.providers))
    }

    fn apply_named_scope<T>(
        &self,
        name: &'static str,
        provider: Box<dyn TypedProvider<Output = T>>,
    ) -> Result<Box<dyn TypedProvider<Output = T>>, Error>
    where
        T: Managed + Clone,
    {
        if name == Singleton.name() {
            return Ok(Singleton.wrap(provider));
        }

        let factory = self
            .scopes
            .get(&(name, TypeId::of::<T>()))
            .ok_or(Error::IllegalComponent {
                component: None,
                reason: IllegalComponentReason::UnknownScope { scope: name },
            })?;

        let factory = factory
            .downcast_ref::<Box<dyn Fn(Box<dyn TypedProvider<Output = T>>) -> Box<dyn TypedProvider<Output = T>>>>()
            .unwrap_or_else(|| unreachable!("scope factories are keyed by their own registered output type"));

        Ok(factory(provider))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// A binding in progress: the target key is settled, the provider isn't yet.
///
/// Returned by [`Config::bind`]; refine the key with `.named(...)` or
/// `.qualified(...)`, then finish with `.to_instance(...)` or
/// `.to_component::<C>()`.
pub struct Binder<'a, T>
where
    T: Managed + Clone,
{
    config: &'a mut Config,
    key: Box<dyn Key>,
}

impl<'a, T> Binder<'a, T>
where
    T: Managed + Clone,
{
    /// Qualifies this binding by a string name, equivalent to `#[named]` on
    /// an injection site.
    pub fn named(mut self, name: &'static str) -> Self {
        self.key = Box::new(key::named::<T>(name));
        self
    }

    /// Qualifies this binding by an arbitrary value, equivalent to
    /// `#[qualified]` on an injection site.
    pub fn qualified<Q>(mut self, qualifier: Q) -> Self
    where
        Q: Copy + Debug + Eq + Hash + 'static,
    {
        self.key = Box::new(key::qualified::<T, Q>(qualifier));
        self
    }

    /// Binds the key to a single pre-built value, handed back (cloned) on
    /// every request.
    pub fn to_instance(self, instance: T) -> Bound<'a, T> {
        Bound::new(self.config, self.key, Box::new(InstanceProvider::new(instance)), None)
    }

    /// Binds the key to `C`, constructed through the full `Component`
    /// sequence on every request (unless a scope says otherwise).
    pub fn to_component<C>(self) -> Bound<'a, T>
    where
        C: Component<Constructed = T>,
    {
        Bound::new(self.config, self.key, Box::new(ComponentProvider::<C>::new()), C::scope_name())
    }
}

/// A finished binding, still mutable until it goes out of scope.
///
/// Registration happens on `Drop`, which is what lets `.scoped(...)` chain
/// after `.to_instance(...)` / `.to_component::<C>()` without a separate
/// terminal call.
pub struct Bound<'a, T>
where
    T: Managed + Clone,
{
    config: &'a mut Config,
    key: Option<Box<dyn Key>>,
    provider: Option<Box<dyn TypedProvider<Output = T>>>,
    class_scope: Option<&'static str>,
    bind_scope: Option<(&'static str, ScopeWrap<T>)>,
}

impl<'a, T> Bound<'a, T>
where
    T: Managed + Clone,
{
    fn new(
        config: &'a mut Config,
        key: Box<dyn Key>,
        provider: Box<dyn TypedProvider<Output = T>>,
        class_scope: Option<&'static str>,
    ) -> Self {
        Self {
            config,
            key: Some(key),
            provider: Some(provider),
            class_scope,
            bind_scope: None,
        }
    }

    /// Wraps this binding's provider in `scope`. Conflicts with a
    /// `#[component(scope = "...")]` declared on the bound type itself.
    pub fn scoped<S>(mut self, scope: S) -> Self
    where
        S: Scope,
    {
        let name = scope.name();
        self.bind_scope = Some((name, Box::new(move |inner| scope.wrap(inner))));
        self
    }
}

impl<'a, T> Drop for Bound<'a, T>
where
    T: Managed + Clone,
{
    fn drop(&mut self) {
        let Some(key) = self.key.take() else { return };
        let Some(provider) = self.provider.take() else { return };

        let resolved = match (self.class_scope, self.bind_scope.take()) {
            (Some(_), Some(_)) => {
                self.config.errors.push(Error::IllegalComponent {
                    component: None,
                    reason: IllegalComponentReason::ConflictingScope,
                });
                return;
            }
            (Some(name), None) => self.config.apply_named_scope(name, provider),
            (None, Some((_, wrap))) => Ok(wrap(provider)),
            (None, None) => Ok(provider),
        };

        match resolved {
            Ok(provider) => {
                self.config.providers.insert(key, Box::new(provider));
            }
            Err(err) => self.config.errors.push(err),
        }
    }
}
