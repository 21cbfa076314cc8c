//! Run settings, defaulting to [`crate::params`] and overridable from the
//! environment.

use std::{env, path::PathBuf, time::Duration};

use snafu::ResultExt;

use crate::{
    Result,
    error::{CurrentDirSnafu, InvalidSettingSnafu},
    params,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// `FAR_NAMESPACE`
    pub namespace: String,
    /// `FAR_DEPLOYMENT`
    pub deployment: String,
    /// `FAR_POD_LABEL`
    pub pod_label: String,
    /// `FAR_TIMEOUT`, a human readable duration such as `90s` or `5m`.
    pub timeout: Duration,
    /// `RAPIDAST_IMAGE`
    pub rapidast_image: String,
    /// `RAPIDAST_TEMPLATE_DIR`
    pub template_dir: PathBuf,
    /// `RAPIDAST_TEMPLATE_FILE`
    pub template_file: String,
    /// `RAPIDAST_BLOCKED_SEVERITIES`, comma separated, added to
    /// [`params::BLOCKED_SEVERITIES`].
    pub blocked_severities: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: params::OPERATOR_NAMESPACE.to_owned(),
            deployment: params::OPERATOR_DEPLOYMENT_NAME.to_owned(),
            pod_label: params::OPERATOR_CONTROLLER_POD_LABEL.to_owned(),
            timeout: params::DEFAULT_TIMEOUT,
            rapidast_image: params::RAPIDAST_IMAGE.to_owned(),
            template_dir: PathBuf::from(params::RAPIDAST_TEMPLATE_FOLDER),
            template_file: params::RAPIDAST_TEMPLATE_FILE.to_owned(),
            blocked_severities: params::BLOCKED_SEVERITIES
                .iter()
                .map(|severity| (*severity).to_owned())
                .collect(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup. Unset or empty
    /// variables keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut settings = Self::default();

        if let Some(namespace) = lookup("FAR_NAMESPACE") {
            settings.namespace = namespace;
        }
        if let Some(deployment) = lookup("FAR_DEPLOYMENT") {
            settings.deployment = deployment;
        }
        if let Some(pod_label) = lookup("FAR_POD_LABEL") {
            settings.pod_label = pod_label;
        }
        if let Some(timeout) = lookup("FAR_TIMEOUT") {
            settings.timeout = parse_timeout(&timeout)?;
        }
        if let Some(image) = lookup("RAPIDAST_IMAGE") {
            settings.rapidast_image = image;
        }
        if let Some(dir) = lookup("RAPIDAST_TEMPLATE_DIR") {
            settings.template_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup("RAPIDAST_TEMPLATE_FILE") {
            settings.template_file = file;
        }
        if let Some(severities) = lookup("RAPIDAST_BLOCKED_SEVERITIES") {
            for severity in severities.split(',') {
                let severity = severity.trim().to_ascii_uppercase();
                if !severity.is_empty() && !settings.blocked_severities.contains(&severity) {
                    settings.blocked_severities.push(severity);
                }
            }
        }

        Ok(settings)
    }

    /// Selects the operator controller pods.
    pub fn pod_label_selector(&self) -> String {
        format!("app.kubernetes.io/name={}", self.pod_label)
    }

    /// The RapiDAST config template, resolved against the working directory
    /// when the template folder is relative.
    pub fn template_path(&self) -> Result<PathBuf> {
        let dir = if self.template_dir.is_absolute() {
            self.template_dir.clone()
        } else {
            env::current_dir()
                .context(CurrentDirSnafu)?
                .join(&self.template_dir)
        };
        Ok(dir.join(&self.template_file))
    }
}

fn parse_timeout(value: &str) -> Result<Duration> {
    let timeout = humantime::parse_duration(value)
        .map_err(|error| error.to_string())
        .and_then(|timeout| {
            if timeout.is_zero() {
                Err("must be greater than zero".to_owned())
            } else if timeout > params::MAX_TIMEOUT {
                Err(format!(
                    "must be at most {}",
                    humantime::format_duration(params::MAX_TIMEOUT)
                ))
            } else {
                Ok(timeout)
            }
        });
    timeout.map_err(|reason| {
        InvalidSettingSnafu {
            name: "FAR_TIMEOUT",
            value,
            reason,
        }
        .build()
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::Error;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.namespace, "openshift-workload-availability");
        assert_eq!(
            settings.pod_label_selector(),
            "app.kubernetes.io/name=fence-agents-remediation-operator"
        );
        assert_eq!(settings.timeout, Duration::from_secs(300));
        assert_eq!(settings.blocked_severities, ["HIGH"]);
    }

    #[test]
    fn overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("FAR_NAMESPACE", "far-test"),
            ("FAR_DEPLOYMENT", "far-manager"),
            ("FAR_POD_LABEL", "far"),
            ("FAR_TIMEOUT", "90s"),
            ("RAPIDAST_IMAGE", "localhost/rapidast:dev"),
            ("RAPIDAST_TEMPLATE_DIR", "/etc/rapidast"),
            ("RAPIDAST_TEMPLATE_FILE", "config.yaml"),
            ("RAPIDAST_BLOCKED_SEVERITIES", "high, critical,"),
        ]))
        .unwrap();

        assert_eq!(
            settings,
            Settings {
                namespace: "far-test".to_owned(),
                deployment: "far-manager".to_owned(),
                pod_label: "far".to_owned(),
                timeout: Duration::from_secs(90),
                rapidast_image: "localhost/rapidast:dev".to_owned(),
                template_dir: PathBuf::from("/etc/rapidast"),
                template_file: "config.yaml".to_owned(),
                blocked_severities: vec!["HIGH".to_owned(), "CRITICAL".to_owned()],
            }
        );
        assert_eq!(
            settings.template_path().unwrap(),
            PathBuf::from("/etc/rapidast/config.yaml")
        );
    }

    #[test]
    fn empty_values_keep_defaults() {
        let settings =
            Settings::from_lookup(lookup(&[("FAR_NAMESPACE", " "), ("FAR_TIMEOUT", "")])).unwrap();

        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn invalid_timeout() {
        for value in ["soon", "0s", "25h", "500000000000y"] {
            let error = Settings::from_lookup(lookup(&[("FAR_TIMEOUT", value)])).unwrap_err();
            assert!(
                matches!(error, Error::InvalidSetting { ref name, .. } if name == "FAR_TIMEOUT"),
                "{error}"
            );
        }
    }

    #[test]
    fn longest_timeout_is_accepted() {
        let settings = Settings::from_lookup(lookup(&[("FAR_TIMEOUT", "24h")])).unwrap();

        assert_eq!(settings.timeout, params::MAX_TIMEOUT);
    }

    #[test]
    fn blocked_severities_only_widen() {
        for (value, expected) in [
            ("CRITICAL", &["HIGH", "CRITICAL"][..]),
            (",", &["HIGH"][..]),
            ("high", &["HIGH"][..]),
            ("medium,high,critical", &["HIGH", "MEDIUM", "CRITICAL"][..]),
        ] {
            let settings =
                Settings::from_lookup(lookup(&[("RAPIDAST_BLOCKED_SEVERITIES", value)])).unwrap();
            assert_eq!(settings.blocked_severities, expected, "{value:?}");
        }
    }

    #[test]
    fn high_findings_fail_whatever_the_override() {
        let report = crate::ScanReport::from_output(r#"{ "Severity": "HIGH" }"#);

        for value in ["CRITICAL", ","] {
            let settings =
                Settings::from_lookup(lookup(&[("RAPIDAST_BLOCKED_SEVERITIES", value)])).unwrap();
            assert!(
                matches!(
                    report.check(&settings.blocked_severities),
                    Err(Error::Findings { .. })
                ),
                "{value:?}"
            );
        }
    }

    #[test]
    fn relative_template_dir_uses_working_directory() {
        let settings = Settings::default();

        assert_eq!(
            settings.template_path().unwrap(),
            env::current_dir()
                .unwrap()
                .join("rapidast")
                .join("rapidast-config.yaml")
        );
    }
}
