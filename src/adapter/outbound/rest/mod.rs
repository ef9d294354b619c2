//! REST adapter implementing the order repository and product catalog ports.

mod client;
pub mod dto;

pub use client::RestClient;
