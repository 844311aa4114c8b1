pub mod feed;

pub use feed::InMemoryFeed;
