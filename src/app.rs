use std::{
    env, fmt,
    io::{self, IsTerminal},
};

use exitcode::ExitCode;
use k8s_e2e_tests::{
    Error, Settings, make_framework, setup, verify_operator_pods_running, verify_trivy_scan,
};
use k8s_test_framework::Framework;
use tokio::runtime::{self, Runtime};
use tracing::{error, info};

use crate::{
    cli::{Color, LogFormat, Opts, SubCommand},
    trace,
};

pub struct Application {
    sub_command: SubCommand,
    runtime: Runtime,
}

impl Application {
    pub fn prepare() -> Result<Self, ExitCode> {
        let opts = Opts::get_matches().map_err(|error| {
            // Printing to stdout/stderr can fail; ignore it.
            let _ = error.print();
            if error.use_stderr() {
                exitcode::USAGE
            } else {
                exitcode::OK
            }
        })?;

        Self::prepare_from_opts(opts)
    }

    pub fn prepare_from_opts(opts: Opts) -> Result<Self, ExitCode> {
        let level = env::var("LOG").unwrap_or_else(|_| trace::levels(opts.log_level()));

        let color = match opts.root.color {
            Color::Auto => io::stdout().is_terminal(),
            Color::Always => true,
            Color::Never => false,
        };

        let json = match opts.root.log_format {
            LogFormat::Text => false,
            LogFormat::Json => true,
        };

        trace::init(color, json, &level);

        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                error!(message = "Failed to initialize runtime.", %error);
                exitcode::OSERR
            })?;

        Ok(Self {
            sub_command: opts.sub_command,
            runtime,
        })
    }

    pub fn run(self) -> ExitCode {
        let Self {
            sub_command,
            runtime,
        } = self;

        runtime.block_on(run_checks(sub_command))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    Pods,
    Scan,
}

impl Check {
    fn for_sub_command(sub_command: SubCommand) -> &'static [Check] {
        match sub_command {
            SubCommand::Deployment => &[],
            SubCommand::Pods => &[Check::Pods],
            SubCommand::Scan => &[Check::Scan],
            SubCommand::All => &[Check::Pods, Check::Scan],
        }
    }

    async fn run(self, framework: &Framework, settings: &Settings) -> Result<(), Error> {
        match self {
            Check::Pods => {
                let pods = verify_operator_pods_running(framework, settings).await?;
                info!(message = "Operator pods are running.", ?pods);
            }
            Check::Scan => {
                let report = verify_trivy_scan(framework, settings).await?;
                info!(message = "Trivy scan passed.", findings = %report);
            }
        }
        Ok(())
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Pods => write!(f, "operator pods running (66026)"),
            Check::Scan => write!(f, "trivy scan (76877)"),
        }
    }
}

async fn run_checks(sub_command: SubCommand) -> ExitCode {
    let (settings, framework) = match connect().await {
        Ok(connected) => connected,
        Err(error) => return failed("setup", &error),
    };

    if let Err(error) = setup(&framework, &settings).await {
        return failed("setup", &error);
    }

    let mut code = exitcode::OK;
    for check in Check::for_sub_command(sub_command) {
        match check.run(&framework, &settings).await {
            Ok(()) => info!(message = "Check passed.", %check),
            Err(error) => {
                let failure = failed(&check.to_string(), &error);
                if code == exitcode::OK {
                    code = failure;
                }
            }
        }
    }
    code
}

async fn connect() -> Result<(Settings, Framework), Error> {
    let settings = Settings::from_env()?;
    let framework = make_framework().await?;
    Ok((settings, framework))
}

fn failed(step: &str, error: &Error) -> ExitCode {
    error!(message = "Check failed.", %step, %error);
    exit_code(error)
}

/// Configuration problems map to `CONFIG`, cluster state to `UNAVAILABLE`
/// and everything the scan runs into to `SOFTWARE`.
pub fn exit_code(error: &Error) -> ExitCode {
    use k8s_test_framework::Error as FrameworkError;

    match error {
        Error::InvalidSetting { .. }
        | Error::CurrentDir { .. }
        | Error::MissingKubeconfig
        | Error::ReadTemplate { .. }
        | Error::ParseTemplate { .. }
        | Error::MissingSection { .. }
        | Error::TemplateFileName { .. } => exitcode::CONFIG,
        Error::SerializeConfig { .. } | Error::WriteConfig { .. } | Error::Findings { .. } => {
            exitcode::SOFTWARE
        }
        Error::Framework { source } => match source {
            FrameworkError::LoadKubeconfig { .. }
            | FrameworkError::InferConfig { .. }
            | FrameworkError::BuildClient { .. }
            | FrameworkError::NoContainerTool => exitcode::CONFIG,
            FrameworkError::Api { .. }
            | FrameworkError::DeploymentNotFound { .. }
            | FrameworkError::Timeout { .. } => exitcode::UNAVAILABLE,
            FrameworkError::Spawn { .. }
            | FrameworkError::CommandFailed { .. }
            | FrameworkError::InvalidOutput { .. }
            | FrameworkError::Filesystem { .. } => exitcode::SOFTWARE,
        },
    }
}
