pub mod manifest;
pub mod marker;
pub mod resolve;

pub use resolve::{resolve, Resolution};
