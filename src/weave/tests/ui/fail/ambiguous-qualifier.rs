use weave::prelude::*;

pub struct Test;

#[component]
impl Test {
    #[inject]
    pub fn new(#[named("a")] #[qualified(1)] value: i32) -> Self {
        let _ = value;
        Self
    }
}

fn main() {}
