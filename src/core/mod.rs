pub mod composer;
pub mod engine;
pub mod namespace;
pub mod parser;
pub mod plan;
pub mod seed;

pub use crate::domain::model::{Environment, Template};
pub use crate::domain::ports::Storage;
pub use crate::utils::error::Result;
