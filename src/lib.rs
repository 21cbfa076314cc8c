//! `far-e2e` runs the Fence Agents Remediation post-deployment checks from
//! the command line, outside of `cargo test`.

pub mod app;
pub mod cli;
pub mod trace;
