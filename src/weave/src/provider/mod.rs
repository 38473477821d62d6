pub mod component;
pub mod instance;
pub mod scope_wrapper;

use std::fmt::Debug;

use crate::context::Context;
use crate::error::Error;
use crate::managed::Managed;
use crate::reference::Dependency;

/// A type-erased factory producing one value per request.
///
/// Usually you don't implement [`Provider`] directly: it has a blanket
/// implementation for every [`TypedProvider`]. It exists so the registry can
/// hold providers of unrelated output types side by side in a single map.
pub trait Provider: Debug + 'static {
    /// Produces a newly constructed, type-erased value. `ctx` is the
    /// resolved [`Context`] this provider was registered into, used to
    /// resolve this provider's own dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Construction`] if the underlying constructor failed.
    /// Missing dependencies are never reported here: the validator that
    /// produced `ctx` already proved every declared dependency is bound.
    fn dyn_produce(&self, ctx: &Context) -> Result<Box<dyn Managed>, Error>;

    /// The dependencies this provider declares, used by the validator before
    /// any instance exists.
    fn dyn_dependencies(&self) -> Vec<Dependency>;
}

/// The statically-typed counterpart of [`Provider`], leveraging static
/// dispatch. Implement this trait for a custom provider; [`Provider`] comes
/// for free.
pub trait TypedProvider: Debug + 'static {
    /// The value this provider produces.
    type Output: Managed;

    fn produce(&self, ctx: &Context) -> Result<Self::Output, Error>;

    fn dependencies(&self) -> Vec<Dependency>;
}

impl<T: TypedProvider> Provider for T {
    fn dyn_produce(&self, ctx: &Context) -> Result<Box<dyn Managed>, Error> {
        self.produce(ctx)
            .map(|obj| -> Box<dyn Managed> { Box::new(obj) })
    }

    fn dyn_dependencies(&self) -> Vec<Dependency> {
        self.dependencies()
    }
}

/// Lets a boxed `TypedProvider` trait object stand in for one: `Config`
/// stores every binding behind one layer of type erasure already (the
/// `Box<dyn Provider>` in its map), and scope wrapping needs to box a
/// provider whose concrete type isn't nameable at the call site.
impl<O: Managed> TypedProvider for Box<dyn TypedProvider<Output = O>> {
    type Output = O;

    fn produce(&self, ctx: &Context) -> Result<Self::Output, Error> {
        (**self).produce(ctx)
    }

    fn dependencies(&self) -> Vec<Dependency> {
        (**self).dependencies()
    }
}
