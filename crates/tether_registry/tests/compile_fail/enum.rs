#![allow(dead_code, missing_docs)]

use tether_registry::prelude::*;

#[derive(Consumer)]
enum Phase {
    Day,
    Night,
}

fn main() {}
