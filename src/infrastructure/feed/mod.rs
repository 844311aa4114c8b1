//! Feed adapters

mod memory;

pub use memory::InMemoryFeed;
