pub mod encoders;
pub mod sqlite;
pub mod weaviate;
