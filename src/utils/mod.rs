pub mod jwt;
pub mod phone;
pub mod random;

pub use jwt::*;
pub use phone::*;
pub use random::{RandomSource, SeededRandom, SharedRandom, random_indices};
