pub mod common;
pub mod draw;
pub mod pagination;
pub mod principal;

pub use common::*;
pub use draw::*;
pub use pagination::*;
pub use principal::*;
