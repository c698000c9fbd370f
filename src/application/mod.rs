pub mod aggregate;
pub mod arbitration;
pub mod context;
pub mod cross_check;
pub mod disambiguator;
pub mod extractor;
pub mod pipeline;
pub mod process_batch;
pub mod scorer;
pub mod settings;
pub mod snapshot;
