use std::collections::{HashMap, HashSet};

use crate::error::Error;
use crate::key::Key;
use crate::provider::Provider;
use crate::reference::Indirection;

/// Walks every binding's declared dependencies before a single instance is
/// constructed.
///
/// Two passes: first, every dependency (direct or `Lazy`) must resolve to a
/// bound key. Second, a depth-first walk of the `Direct`-only subgraph must
/// not revisit a key already on the current path — `Lazy` edges are skipped
/// entirely here, since they're a legitimate way to break a cycle.
pub(crate) fn validate(providers: &HashMap<Box<dyn Key>, Box<dyn Provider>>) -> Result<(), Error> {
    check_presence(providers)?;
    check_cycles(providers)?;
    Ok(())
}

fn check_presence(providers: &HashMap<Box<dyn Key>, Box<dyn Provider>>) -> Result<(), Error> {
    for (owner, provider) in providers {
        for dependency in provider.dyn_dependencies() {
            if !providers.contains_key(dependency.key()) {
                return Err(Error::DependencyNotFound {
                    component: owner.dyn_clone(),
                    dependency: dependency.key().dyn_clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_cycles(providers: &HashMap<Box<dyn Key>, Box<dyn Provider>>) -> Result<(), Error> {
    let mut done: HashSet<Box<dyn Key>> = HashSet::new();

    for key in providers.keys() {
        if !done.contains(key.as_ref()) {
            let mut visiting = Vec::new();
            walk(key.as_ref(), providers, &mut visiting, &mut done)?;
        }
    }

    Ok(())
}

fn walk(
    key: &dyn Key,
    providers: &HashMap<Box<dyn Key>, Box<dyn Provider>>,
    visiting: &mut Vec<Box<dyn Key>>,
    done: &mut HashSet<Box<dyn Key>>,
) -> Result<(), Error> {
    if done.contains(key) {
        return Ok(());
    }

    if let Some(pos) = visiting.iter().position(|visited| visited.as_ref() == key) {
        let mut cycle: Vec<Box<dyn Key>> = visiting[pos..].iter().map(|k| k.dyn_clone()).collect();
        cycle.push(key.dyn_clone());
        return Err(Error::CyclicDependenciesFound { components: cycle });
    }

    visiting.push(key.dyn_clone());

    if let Some(provider) = providers.get(key) {
        for dependency in provider.dyn_dependencies() {
            if dependency.indirection() == Indirection::Direct {
                walk(dependency.key(), providers, visiting, done)?;
            }
        }
    }

    visiting.pop();
    done.insert(key.dyn_clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::error::Error;
    use crate::key;

    #[test]
    fn resolve_fails_when_a_dependency_is_missing() {
        #[derive(Clone)]
        struct NeedsI32 {
            #[allow(dead_code)]
            value: i32,
        }

        impl crate::provider::component::Component for NeedsI32 {
            type Constructed = Self;
            type Error = std::convert::Infallible;

            fn construct<I>(injector: &I) -> Result<Result<Self, Self::Error>, Error>
            where
                I: crate::context::TypedInjector + ?Sized,
            {
                let value = injector.get(key::of())?.ok_or_else(|| {
                    unreachable!("validated graphs never reach a missing dependency at construction time")
                });
                Ok(value.map(|value| Self { value }))
            }

            fn post_process(self) -> Self::Constructed {
                self
            }

            fn dependencies() -> Vec<crate::reference::Dependency> {
                vec![crate::reference::Dependency::direct(Box::new(key::of::<i32>()))]
            }
        }

        let mut config = Config::new();
        config.bind::<NeedsI32>().to_component::<NeedsI32>();

        assert!(matches!(
            config.resolve(),
            Err(Error::DependencyNotFound { .. })
        ));
    }

    #[test]
    fn resolve_fails_when_two_components_depend_on_each_other() {
        #[derive(Clone)]
        struct A;
        #[derive(Clone)]
        struct B;

        impl crate::provider::component::Component for A {
            type Constructed = Self;
            type Error = std::convert::Infallible;

            fn construct<I>(_injector: &I) -> Result<Result<Self, Self::Error>, Error>
            where
                I: crate::context::TypedInjector + ?Sized,
            {
                Ok(Ok(A))
            }

            fn post_process(self) -> Self::Constructed {
                self
            }

            fn dependencies() -> Vec<crate::reference::Dependency> {
                vec![crate::reference::Dependency::direct(Box::new(key::of::<B>()))]
            }
        }

        impl crate::provider::component::Component for B {
            type Constructed = Self;
            type Error = std::convert::Infallible;

            fn construct<I>(_injector: &I) -> Result<Result<Self, Self::Error>, Error>
            where
                I: crate::context::TypedInjector + ?Sized,
            {
                Ok(Ok(B))
            }

            fn post_process(self) -> Self::Constructed {
                self
            }

            fn dependencies() -> Vec<crate::reference::Dependency> {
                vec![crate::reference::Dependency::direct(Box::new(key::of::<A>()))]
            }
        }

        let mut config = Config::new();
        config.bind::<A>().to_component::<A>();
        config.bind::<B>().to_component::<B>();

        assert!(matches!(
            config.resolve(),
            Err(Error::CyclicDependenciesFound { .. })
        ));
    }

    #[test]
    fn resolve_succeeds_when_a_cycle_only_passes_through_a_lazy_edge() {
        use crate::reference::Lazy;

        #[derive(Clone)]
        struct A {
            #[allow(dead_code)]
            b: Lazy<std::rc::Rc<B>>,
        }
        struct B;

        impl crate::provider::component::Component for A {
            type Constructed = Self;
            type Error = std::convert::Infallible;

            fn construct<I>(injector: &I) -> Result<Result<Self, Self::Error>, Error>
            where
                I: crate::context::TypedInjector + ?Sized,
            {
                let b = injector
                    .get_lazy(key::of())
                    .expect("validated graphs always have their lazy dependency bound");
                Ok(Ok(A { b }))
            }

            fn post_process(self) -> Self::Constructed {
                self
            }

            fn dependencies() -> Vec<crate::reference::Dependency> {
                vec![crate::reference::Dependency::lazy(Box::new(key::of::<std::rc::Rc<B>>()))]
            }
        }

        impl crate::provider::component::Component for B {
            type Constructed = std::rc::Rc<Self>;
            type Error = std::convert::Infallible;

            fn construct<I>(_injector: &I) -> Result<Result<Self, Self::Error>, Error>
            where
                I: crate::context::TypedInjector + ?Sized,
            {
                Ok(Ok(B))
            }

            fn post_process(self) -> Self::Constructed {
                std::rc::Rc::new(self)
            }

            fn dependencies() -> Vec<crate::reference::Dependency> {
                vec![crate::reference::Dependency::direct(Box::new(key::of::<A>()))]
            }
        }

        let mut config = Config::new();
        config.bind::<A>().to_component::<A>();
        config.bind::<std::rc::Rc<B>>().to_component::<B>();

        assert!(config.resolve().is_ok());
    }

    #[test]
    fn resolve_reports_the_near_pair_for_a_transitively_missing_dependency() {
        #[derive(Clone)]
        struct A;
        #[derive(Clone)]
        struct B;

        impl crate::provider::component::Component for A {
            type Constructed = Self;
            type Error = std::convert::Infallible;

            fn construct<I>(_injector: &I) -> Result<Result<Self, Self::Error>, Error>
            where
                I: crate::context::TypedInjector + ?Sized,
            {
                Ok(Ok(A))
            }

            fn post_process(self) -> Self::Constructed {
                self
            }

            fn dependencies() -> Vec<crate::reference::Dependency> {
                vec![crate::reference::Dependency::direct(Box::new(key::of::<B>()))]
            }
        }

        impl crate::provider::component::Component for B {
            type Constructed = Self;
            type Error = std::convert::Infallible;

            fn construct<I>(_injector: &I) -> Result<Result<Self, Self::Error>, Error>
            where
                I: crate::context::TypedInjector + ?Sized,
            {
                Ok(Ok(B))
            }

            fn post_process(self) -> Self::Constructed {
                self
            }

            fn dependencies() -> Vec<crate::reference::Dependency> {
                vec![crate::reference::Dependency::direct(Box::new(key::of::<i32>()))]
            }
        }

        let mut config = Config::new();
        config.bind::<A>().to_component::<A>();
        config.bind::<B>().to_component::<B>();

        match config.resolve() {
            Err(Error::DependencyNotFound { component, dependency }) => {
                assert_eq!(component.to_string(), key::of::<B>().to_string());
                assert_eq!(dependency.to_string(), key::of::<i32>().to_string());
            }
            other => panic!("expected `DependencyNotFound{{component: B, dependency: i32}}`, got {other:?}"),
        }
    }

    #[test]
    fn resolve_fails_when_three_components_cycle() {
        #[derive(Clone)]
        struct A;
        #[derive(Clone)]
        struct B;
        #[derive(Clone)]
        struct C;

        impl crate::provider::component::Component for A {
            type Constructed = Self;
            type Error = std::convert::Infallible;

            fn construct<I>(_injector: &I) -> Result<Result<Self, Self::Error>, Error>
            where
                I: crate::context::TypedInjector + ?Sized,
            {
                Ok(Ok(A))
            }

            fn post_process(self) -> Self::Constructed {
                self
            }

            fn dependencies() -> Vec<crate::reference::Dependency> {
                vec![crate::reference::Dependency::direct(Box::new(key::of::<B>()))]
            }
        }

        impl crate::provider::component::Component for B {
            type Constructed = Self;
            type Error = std::convert::Infallible;

            fn construct<I>(_injector: &I) -> Result<Result<Self, Self::Error>, Error>
            where
                I: crate::context::TypedInjector + ?Sized,
            {
                Ok(Ok(B))
            }

            fn post_process(self) -> Self::Constructed {
                self
            }

            fn dependencies() -> Vec<crate::reference::Dependency> {
                vec![crate::reference::Dependency::direct(Box::new(key::of::<C>()))]
            }
        }

        impl crate::provider::component::Component for C {
            type Constructed = Self;
            type Error = std::convert::Infallible;

            fn construct<I>(_injector: &I) -> Result<Result<Self, Self::Error>, Error>
            where
                I: crate::context::TypedInjector + ?Sized,
            {
                Ok(Ok(C))
            }

            fn post_process(self) -> Self::Constructed {
                self
            }

            fn dependencies() -> Vec<crate::reference::Dependency> {
                vec![crate::reference::Dependency::direct(Box::new(key::of::<A>()))]
            }
        }

        let mut config = Config::new();
        config.bind::<A>().to_component::<A>();
        config.bind::<B>().to_component::<B>();
        config.bind::<C>().to_component::<C>();

        match config.resolve() {
            Err(Error::CyclicDependenciesFound { components }) => assert_eq!(components.len(), 4),
            other => panic!("expected a 3-node cycle (4 entries closing the loop), got {other:?}"),
        }
    }

    #[test]
    fn two_qualified_bindings_of_the_same_type_referencing_each_other_is_not_a_cycle() {
        #[derive(Clone)]
        struct Wrapper(i32);

        impl crate::provider::component::Component for Wrapper {
            type Constructed = Self;
            type Error = std::convert::Infallible;

            fn construct<I>(injector: &I) -> Result<Result<Self, Self::Error>, Error>
            where
                I: crate::context::TypedInjector + ?Sized,
            {
                let inner = injector.get(key::named::<i32>("inner"))?.unwrap_or(0);
                Ok(Ok(Wrapper(inner)))
            }

            fn post_process(self) -> Self::Constructed {
                self
            }

            fn dependencies() -> Vec<crate::reference::Dependency> {
                vec![crate::reference::Dependency::direct(Box::new(key::named::<i32>("inner")))]
            }
        }

        // Two distinct bindings of `i32`, neither depending on the other:
        // they only *look* related through sharing a target type, and a
        // well-formed graph never confuses one qualifier's key for another's.
        let mut config = Config::new();
        config.bind::<i32>().named("inner").to_instance(7);
        config.bind::<Wrapper>().to_component::<Wrapper>();

        let ctx = config.resolve().unwrap();
        assert_eq!(ctx.get(key::of::<Wrapper>()).unwrap().unwrap().0, 7);
    }
}
