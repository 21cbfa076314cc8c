use std::{io, path::PathBuf, process::ExitStatus, string::FromUtf8Error, time::Duration};

use snafu::Snafu;

/// Errors raised while talking to the cluster or to external tools.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Unable to load kubeconfig {}: {}", path.display(), source))]
    LoadKubeconfig {
        path: PathBuf,
        source: kube::config::KubeconfigError,
    },

    #[snafu(display("Unable to infer Kubernetes client configuration: {}", source))]
    InferConfig {
        source: kube::config::InferConfigError,
    },

    #[snafu(display("Unable to build Kubernetes client: {}", source))]
    BuildClient { source: kube::Error },

    #[snafu(display("Kubernetes API call failed ({}): {}", operation, source))]
    Api {
        operation: String,
        source: kube::Error,
    },

    #[snafu(display("Deployment {}/{} not found", namespace, name))]
    DeploymentNotFound { namespace: String, name: String },

    #[snafu(display("Timed out after {:?} waiting for {}", timeout, what))]
    Timeout { what: String, timeout: Duration },

    #[snafu(display("Unable to spawn `{}`: {}", command, source))]
    Spawn { command: String, source: io::Error },

    #[snafu(display("`{}` failed with {}: {}", command, status, stderr.trim()))]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[snafu(display("`{}` produced invalid UTF-8 output: {}", command, source))]
    InvalidOutput {
        command: String,
        source: FromUtf8Error,
    },

    #[snafu(display("Filesystem operation on {} failed: {}", path.display(), source))]
    Filesystem { path: PathBuf, source: io::Error },

    #[snafu(display("No container tool could be detected (tried docker and podman)."))]
    NoContainerTool,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
