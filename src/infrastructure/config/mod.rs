pub mod arbitration;
pub mod logging;
pub mod settings;
