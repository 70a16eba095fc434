// crates/network/src/lib.rs
//! HTTP plumbing for chapter transfers

mod client;
mod error;
mod probe;
mod rate;
mod transfer;

pub use client::{Client, ClientConfig};
pub use error::{NetworkError, NetworkResult};
pub use probe::{SiteProbe, SiteStatus};
pub use rate::RateEstimator;
pub use transfer::{
    ProgressUpdate, TransferComplete, TransferExecutor, MIN_VALID_RESPONSE_BYTES,
};
