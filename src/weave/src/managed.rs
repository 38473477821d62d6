use crate::util::any::AsAny;

/// The bound satisfied by every type this container can construct, store or
/// hand back to a caller.
///
/// This mirrors `Any + 'static` with the usual downcasting helpers attached,
/// minus the `Send + Sync` the upstream container required for its
/// multi-threaded resolution: this container is single-threaded, so its
/// managed values never need to cross a thread boundary.
pub trait Managed: AsAny + 'static {}

impl<T> Managed for T where T: AsAny + 'static {}
