//! An interface into the system.

use std::{env, ffi::OsString, path::PathBuf};

use crate::{Result, container::ContainerTool};

/// An interface between the test framework and the external tools it drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    /// The cluster credential file. Handed to the API client and mounted
    /// into tool containers. When unset the client configuration is inferred
    /// and nothing can be mounted.
    pub kubeconfig: Option<PathBuf>,

    /// A docker-compatible CLI used to run tool images.
    pub container_tool: ContainerTool,
}

impl Interface {
    /// Create a new [`Interface`] instance with the parameters obtained from
    /// the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var_os(key))
    }

    /// Same as [`Interface::from_env`] over an arbitrary variable lookup.
    ///
    /// `KUBECONFIG` may hold a list of paths; only the first one is used.
    /// `CONTAINER_TOOL` overrides runtime detection.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Result<Self> {
        let kubeconfig = lookup("KUBECONFIG")
            .and_then(|paths| env::split_paths(&paths).find(|path| !path.as_os_str().is_empty()));

        let container_tool = match lookup("CONTAINER_TOOL").filter(|tool| !tool.is_empty()) {
            Some(tool) => ContainerTool::from(tool),
            None => ContainerTool::detect()?,
        };

        Ok(Self {
            kubeconfig,
            container_tool,
        })
    }
}
