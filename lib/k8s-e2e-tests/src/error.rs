use std::{io, path::PathBuf};

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(context(false), display("{}", source))]
    Framework { source: k8s_test_framework::Error },

    #[snafu(display("Invalid value {:?} for {}: {}", value, name, reason))]
    InvalidSetting {
        name: String,
        value: String,
        reason: String,
    },

    #[snafu(display("Unable to determine the working directory: {}", source))]
    CurrentDir { source: io::Error },

    #[snafu(display("KUBECONFIG must point to the cluster credential file."))]
    MissingKubeconfig,

    #[snafu(display("Unable to read RapiDAST template {}: {}", path.display(), source))]
    ReadTemplate { path: PathBuf, source: io::Error },

    #[snafu(display("Unable to parse RapiDAST template {}: {}", path.display(), source))]
    ParseTemplate {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[snafu(display("RapiDAST template {} has no `{}` mapping.", path.display(), key))]
    MissingSection { path: PathBuf, key: String },

    #[snafu(display("RapiDAST template path {} has no file name.", path.display()))]
    TemplateFileName { path: PathBuf },

    #[snafu(display("Unable to serialize RapiDAST config: {}", source))]
    SerializeConfig { source: serde_yaml::Error },

    #[snafu(display("Unable to write RapiDAST config {}: {}", path.display(), source))]
    WriteConfig { path: PathBuf, source: io::Error },

    #[snafu(display("Trivy scan report contains blocked severity findings: {}", findings))]
    Findings { findings: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
