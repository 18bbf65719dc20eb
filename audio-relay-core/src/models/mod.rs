pub mod config;
pub mod diagnostics;
pub mod error;
pub mod format;
pub mod frame;
pub mod grant;
pub mod state;
