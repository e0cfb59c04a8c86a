pub mod identity;
pub mod roster;
pub mod turn;

pub use identity::*;
pub use roster::*;
pub use turn::*;
