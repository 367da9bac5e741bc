pub mod hashing;
pub mod http;
