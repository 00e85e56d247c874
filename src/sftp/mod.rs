mod connector;
mod files;

pub use connector::*;
pub use files::*;
