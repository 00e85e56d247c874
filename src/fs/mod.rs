pub mod core;
mod file;
mod pager;

pub use self::core::*;
pub use file::*;
pub use pager::*;
