use std::rc::Rc;

use weave::prelude::*;

#[component]
#[derive(Debug, Default)]
pub struct Widget {
    #[inject]
    #[named("label")]
    pub label: Option<&'static str>,
    #[inject]
    pub count: Option<i32>,
}

#[component(fields)]
impl Widget {
    #[inject]
    pub fn new() -> Self {
        Self::default()
    }
}

// `Parent`'s field directly depends on `Child`, and `Child`'s field depends
// right back on `Parent` through a `Lazy` handle: a direct-edge cycle
// through two field-injection sites would deadlock the validator, but the
// `Lazy` half of it isn't walked during cycle detection, so this resolves.
#[component]
#[derive(Default)]
pub struct Parent {
    #[inject]
    pub child: Option<Rc<Child>>,
}

#[component(Rc<Parent>, Rc::new, fields)]
impl Parent {
    #[inject]
    pub fn new() -> Self {
        Self::default()
    }
}

#[component]
#[derive(Default)]
pub struct Child {
    #[inject]
    pub parent: Option<Lazy<Rc<Parent>>>,
}

#[component(Rc<Child>, Rc::new, fields)]
impl Child {
    #[inject]
    pub fn new() -> Self {
        Self::default()
    }
}

fn main() {
    let mut config = Config::new();

    config.bind::<&'static str>().named("label").to_instance("gadget");
    config.bind::<i32>().to_instance(7);
    config.bind::<Widget>().to_component::<Widget>();

    let ctx = config.resolve().expect("widget's field dependencies are all bound");
    let widget = ctx.get(key::of::<Widget>()).unwrap().unwrap();

    assert_eq!(widget.label, Some("gadget"));
    assert_eq!(widget.count, Some(7));

    let mut config = Config::new();
    config.bind::<Rc<Parent>>().to_component::<Parent>().scoped(Singleton);
    config.bind::<Rc<Child>>().to_component::<Child>();

    let ctx = config.resolve().expect("the cycle is broken by a `Lazy` field");
    let parent = ctx.get(key::of::<Rc<Parent>>()).unwrap().unwrap();
    let child = parent.child.as_ref().unwrap();
    let grandparent = child.parent.as_ref().unwrap().get().unwrap();

    assert!(Rc::ptr_eq(&parent, &grandparent));
}
