pub mod errors;
pub mod fs_util;

pub use errors::{EngineError, EngineResult};
