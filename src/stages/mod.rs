pub mod link;
pub mod split;

pub use link::*;
pub use split::*;
