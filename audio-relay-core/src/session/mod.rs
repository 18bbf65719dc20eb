pub mod controller;
pub(crate) mod relay;
