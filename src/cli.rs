use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(rename_all = "kebab-case", version, about)]
pub struct Opts {
    #[command(flatten)]
    pub root: RootOpts,

    #[command(subcommand)]
    pub sub_command: SubCommand,
}

impl Opts {
    pub fn get_matches() -> Result<Self, clap::Error> {
        Opts::try_parse()
    }

    pub const fn log_level(&self) -> &'static str {
        match self.root.quiet {
            0 => match self.root.verbose {
                0 => "info",
                1 => "debug",
                2..=255 => "trace",
            },
            1 => "warn",
            2 => "error",
            3..=255 => "off",
        }
    }
}

#[derive(Parser, Debug)]
#[command(rename_all = "kebab-case")]
pub struct RootOpts {
    /// Enable more detailed internal logging. Repeat to increase level. Overridden by `--quiet`.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Reduce detail of internal logging. Repeat to reduce further. Overrides `--verbose`.
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,

    /// Set the logging format
    #[arg(long, default_value = "text", env = "FAR_E2E_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Control when ANSI terminal formatting is used.
    ///
    /// By default `far-e2e` will try and detect if `stdout` is a terminal, if it is
    /// ANSI will be enabled. Otherwise it will be disabled.
    #[arg(long, default_value = "auto", env = "FAR_E2E_COLOR")]
    pub color: Color,
}

/// Checks to run. Every check waits for the operator deployment first.
///
/// The cluster is reached through `KUBECONFIG` and the scanner through
/// `CONTAINER_TOOL`, see the `k8s-e2e-tests` settings for the rest.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
#[command(rename_all = "kebab-case")]
pub enum SubCommand {
    /// Wait for the operator deployment to be ready, then exit.
    Deployment,

    /// Verify the operator controller pods are running (case 66026).
    Pods,

    /// Run the Trivy scan of the operator namespace through RapiDAST (case 76877).
    Scan,

    /// Run every check. A failing check does not stop the following ones.
    All,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Auto,
    Always,
    Never,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}
