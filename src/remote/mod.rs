pub mod attr;
pub mod pair;
mod traits;

pub use attr::*;
pub use pair::*;
pub use traits::*;
