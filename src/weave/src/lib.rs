#![allow(clippy::new_without_default)]

pub mod config;
pub mod context;
pub mod error;
pub mod key;
pub mod managed;
pub mod provider;
pub mod reference;
pub mod scope;
mod util;
mod validator;

pub use weave_derive::component;

pub mod prelude {
    pub use crate::component;
    pub use crate::config::Config;
    pub use crate::context::{Context, Injector, TypedInjector};
    pub use crate::error::Error;
    pub use crate::key;
    pub use crate::managed::Managed;
    pub use crate::provider::component::Component;
    pub use crate::reference::Lazy;
    pub use crate::scope::{Scope, Singleton};
}
