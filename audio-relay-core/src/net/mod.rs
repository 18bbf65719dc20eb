pub mod connection;
pub mod retry;
