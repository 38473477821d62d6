use weave::prelude::*;

#[component]
#[derive(Default)]
pub struct Test {
    #[inject]
    pub count: i32,
}

#[component(fields)]
impl Test {
    #[inject]
    pub fn new() -> Self {
        Self::default()
    }
}

fn main() {}
