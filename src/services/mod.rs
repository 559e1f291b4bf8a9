pub mod api;
pub mod ingest;
pub mod workflow;
