#![allow(dead_code)]

pub mod harness;
pub mod memory;

pub use harness::{read_json, TestHarness};
pub use memory::{fixture_sales, MemoryStore};
