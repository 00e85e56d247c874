pub mod credentials;
pub mod host_key;

pub use credentials::*;
pub use host_key::*;
