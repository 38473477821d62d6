use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::context::Context;
use crate::error::Error;
use crate::managed::Managed;
use crate::provider::TypedProvider;
use crate::reference::Dependency;

/// A provider wrapping a single pre-built value, handed back (cloned) on
/// every request. The value itself decides what "cloned" means: a plain
/// value is copied, an `Rc<T>` is a cheap pointer clone shared by every
/// caller.
pub struct InstanceProvider<T>
where
    T: Managed + Clone,
{
    instance: T,
}

impl<T> InstanceProvider<T>
where
    T: Managed + Clone,
{
    pub fn new(instance: T) -> Self {
        Self { instance }
    }
}

impl<T> Debug for InstanceProvider<T>
where
    T: Managed + Clone,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("InstanceProvider<T>").finish_non_exhaustive()
    }
}

impl<T> TypedProvider for InstanceProvider<T>
where
    T: Managed + Clone,
{
    type Output = T;

    fn produce(&self, _ctx: &Context) -> Result<Self::Output, Error> {
        Ok(self.instance.clone())
    }

    fn dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::key;

    #[test]
    fn instance_provider_returns_the_same_value_on_every_request() {
        let mut config = Config::new();
        config.bind::<i32>().to_instance(42);
        let ctx = config.resolve().unwrap();

        assert_eq!(ctx.get(key::of::<i32>()).unwrap(), Some(42));
        assert_eq!(ctx.get(key::of::<i32>()).unwrap(), Some(42));
    }
}
