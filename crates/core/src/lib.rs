// Core protocol types shared by the toolwire server and client crates

pub mod protocol;
pub mod schema;
pub mod template;
pub mod types;

pub use types::*;
