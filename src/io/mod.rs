pub mod input;
pub mod output;
pub mod roster;

pub use input::*;
pub use output::*;
pub use roster::*;
