pub mod embedder;
pub mod ingest;
pub mod repository;
pub mod retry;
pub mod search;
