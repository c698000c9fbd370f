pub mod arbitration_log;
pub mod arbitrator;
pub mod blacklist_store;
pub mod cursor_store;
pub mod detection_repository;
pub mod message_source;
pub mod reference_registry;
pub mod rollup_repository;
