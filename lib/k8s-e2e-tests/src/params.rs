//! Fixed parameters of the FAR deployment and of the scan tooling.

use std::time::Duration;

/// Namespace the workload availability operators are installed into.
pub const OPERATOR_NAMESPACE: &str = "openshift-workload-availability";

pub const OPERATOR_DEPLOYMENT_NAME: &str = "fence-agents-remediation-controller-manager";

/// Value of the `app.kubernetes.io/name` label on the controller pods.
pub const OPERATOR_CONTROLLER_POD_LABEL: &str = "fence-agents-remediation-operator";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Upper bound accepted for `FAR_TIMEOUT`.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

pub const RAPIDAST_IMAGE: &str = "quay.io/redhatproductsecurity/rapidast:latest";

/// Template folder, relative to the working directory unless absolute.
pub const RAPIDAST_TEMPLATE_FOLDER: &str = "rapidast";

pub const RAPIDAST_TEMPLATE_FILE: &str = "rapidast-config.yaml";

/// Where the kubeconfig is mounted inside the scanner container.
pub const SCANNER_KUBECONFIG: &str = "/home/rapidast/.kube/config";

/// Where the scan workspace (holding the rendered config) is mounted.
pub const SCANNER_CONFIG_DIR: &str = "/test";

pub const SCANNER_RESULTS_DIR: &str = "/opt/rapidast/results";

/// Severities that always fail the scan. Configuration can add to them.
pub const BLOCKED_SEVERITIES: &[&str] = &["HIGH"];

pub const POD_RUNNING_CASE_ID: &str = "66026";

pub const TRIVY_SCAN_CASE_ID: &str = "76877";

/// Prefix of the temporary scan workspace.
pub const SCAN_WORKSPACE_PREFIX: &str = "case76877_";
