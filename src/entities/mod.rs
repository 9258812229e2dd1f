pub mod companies;
pub mod draw_records;
pub mod operation_logs;
pub mod prize_levels;
pub mod prizes;
pub mod users;

pub use companies as company_entity;
pub use draw_records as draw_record_entity;
pub use operation_logs as operation_log_entity;
pub use prize_levels as prize_level_entity;
pub use prizes as prize_entity;
pub use users as user_entity;
