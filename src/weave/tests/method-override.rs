use std::cell::RefCell;
use std::rc::Rc;

use weave::prelude::*;

pub struct Base {
    pub trace: Rc<RefCell<Vec<&'static str>>>,
}

#[component]
impl Base {
    #[inject]
    pub fn new(trace: Rc<RefCell<Vec<&'static str>>>) -> Self {
        Self { trace }
    }

    #[inject]
    fn setup(&mut self) {
        self.trace.borrow_mut().push("base::setup");
    }

    #[inject]
    fn configure(&mut self) {
        self.trace.borrow_mut().push("base::configure");
    }
}

pub struct Overrider {
    pub base: Base,
}

#[component(extends = Base)]
impl Overrider {
    #[inject]
    pub fn new(base: Base) -> Self {
        Self { base }
    }

    // Re-declares `setup` with `#[inject]`: this replaces `Base::setup` in
    // the call chain rather than running alongside it.
    #[inject]
    fn setup(&mut self) {
        self.base.trace.borrow_mut().push("overrider::setup");
    }

    // Re-declares `configure` without `#[inject]`: this drops it from the
    // chain entirely, at every level, as if neither type ever injected it.
    #[allow(dead_code)]
    fn configure(&mut self) {
        self.base.trace.borrow_mut().push("overrider::configure (never called through injection)");
    }

    #[inject]
    fn finish(&mut self) {
        self.base.trace.borrow_mut().push("overrider::finish");
    }
}

fn main() {
    let mut config = Config::new();
    config.bind::<Rc<RefCell<Vec<&'static str>>>>().to_instance(Rc::new(RefCell::new(Vec::new())));
    config.bind::<Overrider>().to_component::<Overrider>();

    let ctx = config.resolve().expect("the override chain's dependencies are all bound");
    let overrider = ctx.get(key::of::<Overrider>()).unwrap().unwrap();

    assert_eq!(
        *overrider.base.trace.borrow(),
        vec!["overrider::setup", "overrider::finish"],
        "base::setup is superseded by the override (called once, not twice), \
         base::configure is dropped entirely since the override lacks #[inject], \
         and the whole sequence still runs base-first where no override exists",
    );
}
