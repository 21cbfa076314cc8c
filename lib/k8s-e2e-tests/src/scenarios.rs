//! The FAR post-deployment test cases.

use std::{env, path::Path};

use k8s_test_framework::{
    Framework, container::IS_A_TTY, render_command, run_command_output,
    workspace::ScanWorkspace,
};
use snafu::OptionExt;
use tracing::{debug, error, info};

use crate::{
    Result,
    error::MissingKubeconfigSnafu,
    params,
    rapidast::{self, ScanMounts},
    report::ScanReport,
    settings::Settings,
};

/// Shared setup: the FAR deployment exists and becomes ready.
pub async fn setup(framework: &Framework, settings: &Settings) -> Result<()> {
    info!(
        message = "Getting FAR deployment.",
        namespace = %settings.namespace,
        deployment = %settings.deployment,
    );
    framework
        .pull_deployment(&settings.namespace, &settings.deployment)
        .await?;

    framework
        .wait_for_deployment_ready(&settings.namespace, &settings.deployment, settings.timeout)
        .await?;
    Ok(())
}

/// The operator controller pods are running. Returns their names.
pub async fn verify_operator_pods_running(
    framework: &Framework,
    settings: &Settings,
) -> Result<Vec<String>> {
    info!(
        message = "Verifying operator pods are running.",
        case = params::POD_RUNNING_CASE_ID,
    );
    let pods = framework
        .wait_for_pods_running(
            &settings.namespace,
            &settings.pod_label_selector(),
            settings.timeout,
        )
        .await?;
    Ok(pods)
}

/// The operator namespace passes a Trivy misconfiguration scan run through
/// RapiDAST.
///
/// The scan workspace is removed whatever the outcome. Fails when the
/// scanner exits unsuccessfully or reports a blocked severity.
pub async fn verify_trivy_scan(framework: &Framework, settings: &Settings) -> Result<ScanReport> {
    verify_trivy_scan_in(framework, settings, &env::temp_dir()).await
}

async fn verify_trivy_scan_in(
    framework: &Framework,
    settings: &Settings,
    workspace_parent: &Path,
) -> Result<ScanReport> {
    info!(
        message = "Verifying operator passes Trivy scan.",
        case = params::TRIVY_SCAN_CASE_ID,
    );
    let interface = framework.interface();
    let kubeconfig = interface
        .kubeconfig
        .as_deref()
        .context(MissingKubeconfigSnafu)?;

    let workspace = ScanWorkspace::create_in(
        workspace_parent,
        params::SCAN_WORKSPACE_PREFIX,
        &interface.container_tool,
    )
    .await?;
    let scanned = run_scan(framework, settings, kubeconfig, &workspace).await;
    let closed = workspace.close().await;

    let report = match (scanned, closed) {
        (Ok(report), Ok(())) => report,
        (Ok(_), Err(error)) => return Err(error.into()),
        (Err(error), closed) => {
            if let Err(cleanup_error) = closed {
                error!(message = "Failed to clean up scan workspace.", error = %cleanup_error);
            }
            return Err(error);
        }
    };

    info!(message = "Trivy scan finished.", findings = %report);
    report.check(&settings.blocked_severities)?;
    Ok(report)
}

async fn run_scan(
    framework: &Framework,
    settings: &Settings,
    kubeconfig: &Path,
    workspace: &ScanWorkspace,
) -> Result<ScanReport> {
    let config = rapidast::prepare_config(
        &settings.template_path()?,
        workspace.path(),
        &settings.namespace,
    )?;
    let config_file_name = config
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| settings.template_file.clone());

    let command = rapidast::scan_command(
        &framework.interface().container_tool,
        &settings.rapidast_image,
        ScanMounts {
            kubeconfig,
            config_dir: workspace.path(),
            results_dir: workspace.results_dir(),
        },
        &config_file_name,
        *IS_A_TTY,
    );
    info!(message = "Running RapiDAST.", command = %render_command(&command));

    let output = run_command_output(command).await?;
    debug!(message = "RapiDAST execution output.", %output);
    Ok(ScanReport::from_output(&output))
}
