pub mod audit_service;
pub mod candidate_pool;
pub mod company_service;
pub mod draw_executor;
pub mod draw_service;
pub mod lottery_service;
pub mod selection;
pub mod stock_ledger;

pub use audit_service::*;
pub use candidate_pool::*;
pub use company_service::*;
pub use draw_executor::*;
pub use draw_service::*;
pub use lottery_service::*;
pub use stock_ledger::{LevelStock, StockSnapshot};
