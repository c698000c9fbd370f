pub mod arbitration;
pub mod config;
pub mod sqlite;
pub mod triggers;
