//! Drive a container runtime CLI.

use std::{
    ffi::{OsStr, OsString},
    fmt,
    io::IsTerminal,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::LazyLock,
};

use tracing::debug;

use crate::{Result, error::NoContainerToolSnafu};

/// Whether the harness was started from an interactive terminal. Containers
/// only get a TTY allocated in that case.
pub static IS_A_TTY: LazyLock<bool> = LazyLock::new(|| std::io::stdin().is_terminal());

/// The container runtime used to run tool images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerTool {
    Docker,
    Podman,
    /// Any other docker-compatible CLI.
    Other(OsString),
}

impl ContainerTool {
    /// Pick the first runtime whose `version` subcommand succeeds.
    pub fn detect() -> Result<Self> {
        for tool in [Self::Docker, Self::Podman] {
            let available = Command::new(tool.program())
                .arg("version")
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok_and(|status| status.success());
            if available {
                debug!(message = "Detected container tool.", %tool);
                return Ok(tool);
            }
        }
        NoContainerToolSnafu.fail()
    }

    pub fn program(&self) -> &OsStr {
        match self {
            Self::Docker => OsStr::new("docker"),
            Self::Podman => OsStr::new("podman"),
            Self::Other(program) => program,
        }
    }

    /// Rootless podman maps container UIDs into a user namespace, which is
    /// why volume ownership needs fixing up around a run. A podman given by
    /// path counts too.
    pub fn is_podman(&self) -> bool {
        match self {
            Self::Docker => false,
            Self::Podman => true,
            Self::Other(program) => Path::new(program).file_name() == Some(OsStr::new("podman")),
        }
    }

    pub fn command<I: AsRef<OsStr>>(&self, args: impl IntoIterator<Item = I>) -> Command {
        let mut command = Command::new(self.program());
        command.args(args);
        command
    }
}

impl From<OsString> for ContainerTool {
    fn from(program: OsString) -> Self {
        match program.to_str() {
            Some("docker") => Self::Docker,
            Some("podman") => Self::Podman,
            _ => Self::Other(program),
        }
    }
}

impl From<&str> for ContainerTool {
    fn from(program: &str) -> Self {
        OsString::from(program).into()
    }
}

impl fmt::Display for ContainerTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program().to_string_lossy())
    }
}

/// A bind mount of a host path into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    host: PathBuf,
    container: String,
    relabel: bool,
}

impl Volume {
    pub fn new(host: impl Into<PathBuf>, container: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
            relabel: false,
        }
    }

    /// Ask for a private SELinux label (`:Z`) on the mount.
    pub fn relabel(mut self) -> Self {
        self.relabel = true;
        self
    }

    fn to_arg(&self) -> OsString {
        let mut arg = self.host.clone().into_os_string();
        arg.push(":");
        arg.push(&self.container);
        if self.relabel {
            arg.push(":Z");
        }
        arg
    }
}

/// Builder for `<tool> run --rm ...`.
#[derive(Debug, Clone)]
pub struct RunCommand {
    tool: ContainerTool,
    image: String,
    volumes: Vec<Volume>,
    args: Vec<OsString>,
    tty: bool,
}

impl RunCommand {
    pub fn new(tool: &ContainerTool, image: impl Into<String>) -> Self {
        Self {
            tool: tool.clone(),
            image: image.into(),
            volumes: Vec::new(),
            args: Vec::new(),
            tty: false,
        }
    }

    pub fn volume(mut self, volume: Volume) -> Self {
        self.volumes.push(volume);
        self
    }

    /// Arguments passed to the image entrypoint.
    pub fn args<I: Into<OsString>>(mut self, args: impl IntoIterator<Item = I>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run interactively with a TTY (`-i -t`). Stdin is inherited in that
    /// case, otherwise it is closed.
    pub fn tty(mut self, tty: bool) -> Self {
        self.tty = tty;
        self
    }

    pub fn build(&self) -> Command {
        let mut command = self.tool.command(["run"]);
        if self.tty {
            command.args(["-i", "-t"]);
            command.stdin(Stdio::inherit());
        } else {
            command.stdin(Stdio::null());
        }
        command.arg("--rm");
        for volume in &self.volumes {
            command.arg("-v").arg(volume.to_arg());
        }
        command.arg(&self.image);
        command.args(&self.args);
        command
    }
}
