pub mod config;
pub mod error;
pub mod gpx_export;
pub mod planner;
pub mod service;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use planner::Planner;
pub use service::{OrsClient, RoutingService};
