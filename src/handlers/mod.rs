pub mod draw;
pub mod health;
pub mod lottery;

pub use draw::draw_config;
pub use health::health_config;
pub use lottery::lottery_config;
