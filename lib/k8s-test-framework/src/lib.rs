//! Kubernetes test framework.
//!
//! Readiness of cluster objects is observed through the Kubernetes API, while
//! tools that ship as images (scanners and the like) are driven through the
//! container runtime CLI, exactly as they would be run by hand. The harness
//! only orchestrates; it never reimplements what those tools do.
//!
//! Test cases are expected to run one at a time, see [`lock`].

#![deny(missing_debug_implementations)]

pub mod container;
pub mod error;
pub mod framework;
pub mod interface;
mod lock;
mod util;
pub mod wait;
pub mod workspace;

pub use error::{Error, Result};
pub use framework::Framework;
pub use interface::Interface;
pub use lock::lock;
pub use util::{render_command, run_command_blocking, run_command_output};
