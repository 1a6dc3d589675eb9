//! HTTP handlers for trafficnet-labeler

pub mod gate;
pub mod label;
pub mod pages;
pub mod status;

pub use gate::gate_middleware;
pub use label::{label_page, submit_labels};
pub use pages::{examples_page, home_page};
pub use status::{get_build_info, health_routes, BuildInfo};
