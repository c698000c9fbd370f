pub mod confidence;
pub mod context;
pub mod cursor_pointer;
pub mod extraction_method;
pub mod rule_outcome;
pub mod symbol;
