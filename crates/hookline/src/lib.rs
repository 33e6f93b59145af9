pub mod errors;
pub mod illustration;
pub mod models;
pub mod ndjson;
pub mod providers;
pub mod relay;
