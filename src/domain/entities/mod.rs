pub mod arbitration_record;
pub mod blacklist_rule;
pub mod candidate;
pub mod cursor;
pub mod daily_rollup;
pub mod detection;
pub mod message;
pub mod reference_entry;
