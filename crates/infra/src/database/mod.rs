//! Database adapters

pub mod alarm_repository;
pub mod manager;

pub use alarm_repository::SqliteAlarmRepository;
pub use manager::{DbConnection, DbManager};
