//! Ghiblio Art image generation exposed as agent tools.
//!
//! [`Orchestrator`] answers three tool calls: `image_generate` submits a
//! generation, `image_generate_check_task` long-polls a task for a bounded
//! time with a backoff that tightens on every call, and
//! `image_generate_remains` reports the remaining quota. All HTTP traffic
//! goes through the [`RemoteApi`] seam.

pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;

pub use client::{HttpRemoteClient, RemoteApi};
pub use config::GhiblioConfig;
pub use error::{GhiblioError, Result};
pub use models::*;
pub use orchestrator::{Clock, ManualClock, Orchestrator, PollState, SystemClock};
