//! Browser automation capability consumed by the SoulScript runtime
//!
//! - [`Automation`]: the async trait every script command is expressed in
//! - [`ChromiumAutomation`]: DevTools-protocol backend (launch or attach)
//! - [`RecordingAutomation`]: in-memory backend for dry runs and tests
//! - [`poll_until`]: the polling loop behind explicit waits

mod chromium;
pub mod errors;
mod primitives;
mod recording;
mod waiting;

pub use chromium::{ChromiumAutomation, ChromiumConfig};
pub use errors::*;
pub use primitives::*;
pub use recording::RecordingAutomation;
pub use waiting::*;
