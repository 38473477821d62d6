use std::any::{self, TypeId};
use std::borrow::Borrow;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::key::{Key, TypedKey};
use crate::managed::Managed;

pub struct KeyImpl<T, Q>
where
    T: Managed,
    Q: Copy + Debug + Eq + Hash + 'static,
{
    qualifier: Q,
    _marker: PhantomData<T>,
}

impl<T, Q> KeyImpl<T, Q>
where
    T: Managed,
    Q: Copy + Debug + Eq + Hash + 'static,
{
    pub fn new(qualifier: Q) -> Self {
        Self {
            qualifier,
            _marker: PhantomData,
        }
    }
}

impl<T, Q> Clone for KeyImpl<T, Q>
where
    T: Managed,
    Q: Copy + Debug + Eq + Hash + 'static,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, Q> Copy for KeyImpl<T, Q>
where
    T: Managed,
    Q: Copy + Debug + Eq + Hash + 'static,
{
}

impl<T, Q> Debug for KeyImpl<T, Q>
where
    T: Managed,
    Q: Copy + Debug + Eq + Hash + 'static,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(self, f)
    }
}

impl<T, Q> Display for KeyImpl<T, Q>
where
    T: Managed,
    Q: Copy + Debug + Eq + Hash + 'static,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}@{:?}", any::type_name::<T>(), self.qualifier)
    }
}

impl<T, Q> PartialEq for KeyImpl<T, Q>
where
    T: Managed,
    Q: Copy + Debug + Eq + Hash + 'static,
{
    fn eq(&self, other: &Self) -> bool {
        self.qualifier.eq(&other.qualifier)
    }
}

impl<T, Q> Eq for KeyImpl<T, Q>
where
    T: Managed,
    Q: Copy + Debug + Eq + Hash + 'static,
{
}

impl<T, Q> Hash for KeyImpl<T, Q>
where
    T: Managed,
    Q: Copy + Debug + Eq + Hash + 'static,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qualifier.hash(state);
    }
}

impl<T, Q> Borrow<dyn Key> for KeyImpl<T, Q>
where
    T: Managed,
    Q: Copy + Debug + Eq + Hash + 'static,
{
    fn borrow(&self) -> &dyn Key {
        self
    }
}

impl<T, Q> TypedKey for KeyImpl<T, Q>
where
    T: Managed,
    Q: Copy + Debug + Eq + Hash + 'static,
{
    type Target = T;

    type Qualifier = Q;

    fn qualifier(&self) -> Self::Qualifier {
        self.qualifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_impl_target_type_succeeds() {
        let i32_key: Box<dyn Key> = Box::new(KeyImpl::<i32, _>::new(()));
        let i32_name1_key: Box<dyn Key> = Box::new(KeyImpl::<i32, _>::new("name1"));
        let i32_name2_key: Box<dyn Key> = Box::new(KeyImpl::<i32, _>::new("name2"));

        assert_eq!(i32_key.target_type(), TypeId::of::<i32>());
        assert_eq!(i32_name1_key.target_type(), TypeId::of::<i32>());
        assert_eq!(i32_name2_key.target_type(), TypeId::of::<i32>());
    }

    #[test]
    fn key_impl_qualifier_succeeds() {
        let i32_key = KeyImpl::<i32, _>::new(());
        let i32_name1_key = KeyImpl::<i32, _>::new("name1");
        let i32_name2_key = KeyImpl::<i32, _>::new("name2");

        assert_eq!(i32_key.qualifier(), ());
        assert_eq!(i32_name1_key.qualifier(), "name1");
        assert_eq!(i32_name2_key.qualifier(), "name2");
    }

    #[test]
    fn key_impl_eq_succeeds() {
        let i32_key: Box<dyn Key> = Box::new(KeyImpl::<i32, _>::new(()));
        let i32_name1_key: Box<dyn Key> = Box::new(KeyImpl::<i32, _>::new("name1"));
        let i32_name2_key: Box<dyn Key> = Box::new(KeyImpl::<i32, _>::new("name2"));

        assert_ne!(&i32_key, &i32_name1_key);
        assert_ne!(&i32_key, &i32_name2_key);
        assert_ne!(&i32_name1_key, &i32_name2_key);
    }
}
