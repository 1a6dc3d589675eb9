//! Sample record models and queries

pub mod init;
pub mod models;
pub mod samples;

pub use init::*;
pub use models::*;
pub use samples::*;
