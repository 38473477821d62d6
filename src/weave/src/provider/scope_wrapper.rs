use std::cell::RefCell;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::context::Context;
use crate::error::Error;
use crate::managed::Managed;
use crate::provider::TypedProvider;
use crate::reference::Dependency;

/// A scope decides how many times a binding's underlying provider actually
/// runs, and wraps that provider accordingly.
///
/// Built-in: transient (the default — no wrapping at all) and
/// [`Singleton`]. A user scope is simply a zero-sized (or configuration-
/// carrying) type implementing this trait; there is no separate runtime
/// registry to populate, since `.scoped(my_scope)` resolves the wrapping
/// through ordinary generic dispatch at bind time.
pub trait Scope: 'static {
    fn wrap<T>(self, inner: Box<dyn TypedProvider<Output = T>>) -> Box<dyn TypedProvider<Output = T>>
    where
        T: Managed + Clone;

    /// The name surfaced in `Error::IllegalComponent` when a type-level and
    /// a bind-time scope conflict.
    fn name(&self) -> &'static str;
}

/// One instance per `Context`, memoized after the first request.
///
/// Memoization uses a plain `RefCell`: this container is single-threaded, so
/// there is no contention to arbitrate. A reentrant `produce` on the same
/// singleton (which would only happen via a direct, non-`Lazy` cycle through
/// this binding) is impossible once the eager validator has accepted the
/// graph.
#[derive(Debug, Clone, Copy)]
pub struct Singleton;

impl Scope for Singleton {
    fn wrap<T>(self, inner: Box<dyn TypedProvider<Output = T>>) -> Box<dyn TypedProvider<Output = T>>
    where
        T: Managed + Clone,
    {
        Box::new(SingletonProvider {
            inner,
            cached: RefCell::new(None),
        })
    }

    fn name(&self) -> &'static str {
        "Singleton"
    }
}

struct SingletonProvider<T> {
    inner: Box<dyn TypedProvider<Output = T>>,
    cached: RefCell<Option<T>>,
}

impl<T> Debug for SingletonProvider<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SingletonProvider<T>").finish_non_exhaustive()
    }
}

impl<T> TypedProvider for SingletonProvider<T>
where
    T: Managed + Clone,
{
    type Output = T;

    fn produce(&self, ctx: &Context) -> Result<Self::Output, Error> {
        if let Some(value) = self.cached.borrow().as_ref() {
            return Ok(value.clone());
        }

        let value = self.inner.produce(ctx)?;
        *self.cached.borrow_mut() = Some(value.clone());
        Ok(value)
    }

    fn dependencies(&self) -> Vec<Dependency> {
        self.inner.dependencies()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::rc::Rc;

    use crate::config::Config;
    use crate::context::TypedInjector;
    use crate::key;
    use crate::provider::component::Component;

    use super::*;

    struct Counted;

    impl Component for Counted {
        type Constructed = Rc<Counted>;
        type Error = Infallible;

        fn construct<I>(_injector: &I) -> Result<Result<Self, Self::Error>, Error>
        where
            I: TypedInjector + ?Sized,
        {
            Ok(Ok(Counted))
        }

        fn post_process(self) -> Self::Constructed {
            Rc::new(self)
        }

        fn dependencies() -> Vec<Dependency> {
            vec![]
        }
    }

    #[test]
    fn singleton_scope_memoizes_the_first_value() {
        let mut config = Config::new();
        config.bind::<Rc<Counted>>().to_component::<Counted>().scoped(Singleton);
        let ctx = config.resolve().unwrap();

        let a = ctx.get(key::of::<Rc<Counted>>()).unwrap().unwrap();
        let b = ctx.get(key::of::<Rc<Counted>>()).unwrap().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn transient_binding_produces_a_fresh_value_each_time() {
        let mut config = Config::new();
        config.bind::<Rc<Counted>>().to_component::<Counted>();
        let ctx = config.resolve().unwrap();

        let a = ctx.get(key::of::<Rc<Counted>>()).unwrap().unwrap();
        let b = ctx.get(key::of::<Rc<Counted>>()).unwrap().unwrap();
        assert!(!Rc::ptr_eq(&a, &b));
    }
}
