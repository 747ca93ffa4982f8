//! OneBot Info Image API verification harness
//!
//! Exercises the four endpoints of the rendering service, checks every
//! response against its contract and keeps the decoded images and the
//! request bodies on disk for manual inspection.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 TestRunner (sequential)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  connectivity ─▶ health ─▶ config ─▶ user-info × styles     │
//! │                                   ─▶ admin-list × styles    │
//! │                                   ─▶ summary                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  payload   build_request(kind, options) -> RenderRequest    │
//! │  verifier  verify_*(..) -> Outcome (pass / warn / fail)     │
//! │  contract  EndpointContract { required_keys, validator }    │
//! │  artifact  save_image / save_json under <output>/           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod artifact;
pub mod config;
pub mod contract;
pub mod error;
pub mod payload;
pub mod report;
pub mod runner;
pub mod verifier;

pub use artifact::ArtifactWriter;
pub use config::HarnessConfig;
pub use error::{E2eError, E2eResult};
pub use runner::{RunReport, Suite, TestRunner};
pub use verifier::{Connectivity, EndpointVerifier, Outcome, Verdict};
