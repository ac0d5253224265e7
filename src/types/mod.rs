//! Type definitions

pub mod contact;
pub mod grid;
pub mod messages;

pub use contact::*;
pub use grid::*;
pub use messages::*;
