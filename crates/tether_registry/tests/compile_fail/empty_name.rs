#![allow(dead_code, missing_docs)]

use tether_registry::prelude::*;

struct Map;
impl Component for Map {}

#[derive(Consumer)]
struct Minimap {
    #[inject(name = "")]
    map: Inject<Map>,
}

fn main() {}
