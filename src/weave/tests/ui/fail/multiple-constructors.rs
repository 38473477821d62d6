use weave::prelude::*;

pub struct Test;

#[component]
impl Test {
    #[inject]
    pub fn new() -> Self {
        Self
    }

    #[inject]
    pub fn another() -> Self {
        Self
    }
}

fn main() {}
