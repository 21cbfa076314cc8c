//! RapiDAST: configuration rendering and the container invocation.

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use k8s_test_framework::container::{ContainerTool, RunCommand, Volume};
use serde_yaml::{Mapping, Value};
use snafu::{OptionExt, ResultExt};
use tracing::debug;

use crate::{
    Result,
    error::{
        MissingSectionSnafu, ParseTemplateSnafu, ReadTemplateSnafu, SerializeConfigSnafu,
        TemplateFileNameSnafu, WriteConfigSnafu,
    },
    params,
};

/// The Trivy invocation RapiDAST runs through its `generic_trivy` scanner.
pub fn trivy_inline_command(namespace: &str) -> String {
    format!(
        "trivy k8s --kubeconfig={} -n {} pod --severity=HIGH,CRITICAL --scanners=misconfig --report all --format json",
        params::SCANNER_KUBECONFIG,
        namespace,
    )
}

/// Render the template at `template` into `destination`, pointing the Trivy
/// scanner at `namespace`. The rendered file keeps the template's name.
///
/// Everything but `scanners.generic_trivy.inline` is carried over as is.
pub fn prepare_config(template: &Path, destination: &Path, namespace: &str) -> Result<PathBuf> {
    let contents = fs::read_to_string(template).context(ReadTemplateSnafu { path: template })?;
    let mut document: Mapping =
        serde_yaml::from_str(&contents).context(ParseTemplateSnafu { path: template })?;

    let generic_trivy = section(&mut document, "scanners", template)
        .and_then(|scanners| section(scanners, "generic_trivy", template))?;
    generic_trivy.insert(
        Value::from("inline"),
        Value::from(trivy_inline_command(namespace)),
    );

    let rendered = serde_yaml::to_string(&document).context(SerializeConfigSnafu)?;
    let file_name = template
        .file_name()
        .context(TemplateFileNameSnafu { path: template })?;
    let path = destination.join(file_name);
    fs::write(&path, rendered).context(WriteConfigSnafu { path: &path })?;

    debug!(message = "Rendered RapiDAST config.", path = %path.display(), %namespace);
    Ok(path)
}

fn section<'a>(mapping: &'a mut Mapping, key: &str, template: &Path) -> Result<&'a mut Mapping> {
    mapping
        .get_mut(key)
        .and_then(Value::as_mapping_mut)
        .context(MissingSectionSnafu {
            path: template,
            key,
        })
}

/// Host paths mounted into the scanner container.
#[derive(Debug, Clone, Copy)]
pub struct ScanMounts<'a> {
    pub kubeconfig: &'a Path,
    pub config_dir: &'a Path,
    pub results_dir: &'a Path,
}

/// `<tool> run --rm -v <kubeconfig>:... -v <config dir>:/test:Z -v <results>:... <image> rapidast.py --config /test/<file>`
pub fn scan_command(
    tool: &ContainerTool,
    image: &str,
    mounts: ScanMounts<'_>,
    config_file_name: &str,
    tty: bool,
) -> Command {
    RunCommand::new(tool, image)
        .tty(tty)
        .volume(Volume::new(mounts.kubeconfig, params::SCANNER_KUBECONFIG).relabel())
        .volume(Volume::new(mounts.config_dir, params::SCANNER_CONFIG_DIR).relabel())
        .volume(Volume::new(mounts.results_dir, params::SCANNER_RESULTS_DIR).relabel())
        .args([
            "rapidast.py".to_owned(),
            "--config".to_owned(),
            format!("{}/{}", params::SCANNER_CONFIG_DIR, config_file_name),
        ])
        .build()
}
