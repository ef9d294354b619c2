//! Infrastructure configuration modules.

pub mod backend;
pub mod logging;
pub mod newness;
pub mod realtime;
pub mod settings;

pub use settings::Config;
