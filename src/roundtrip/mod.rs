mod body;
pub mod core;
mod get;
mod response;
pub mod sniff;

pub use self::core::*;
pub use body::Body;
pub use response::SERVER_NAME;
