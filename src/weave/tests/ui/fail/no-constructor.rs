use weave::prelude::*;

pub struct Test;

#[component]
impl Test {
    pub fn new() -> Self {
        Self
    }
}

fn main() {}
