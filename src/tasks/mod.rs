//! Background Tasks Module
//!
//! Contains the signed URL refresh job and the timer that drives it.
//!
//! # Tasks
//! - Refresh: renews entries inside their refresh window, then sweeps
//!   expired ones

mod refresh;

pub use refresh::{
    spawn_refresh_task, RefreshConfig, RefreshJob, RefreshResult, DEFAULT_BATCH_SIZE,
    DEFAULT_MINT_TIMEOUT,
};
