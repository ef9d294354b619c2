//! Realtime websocket adapter implementing [`ChangeFeed`](crate::port::ChangeFeed).

pub mod message;
mod stream;

pub use stream::RealtimeFeed;
