use weave::prelude::*;

pub struct Test;

#[component]
impl Test {
    #[inject]
    pub fn new() -> Self {
        Self
    }

    #[inject]
    fn configure<T>(&mut self, value: T) {
        let _ = value;
    }
}

fn main() {}
