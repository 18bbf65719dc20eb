pub mod capture_source;
pub mod session_delegate;
