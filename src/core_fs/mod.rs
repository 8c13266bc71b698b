pub mod error;
pub mod scoper;

pub use error::PathError;
pub use scoper::{FsScoper, ResolvedPath};
