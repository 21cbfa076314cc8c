use std::process::{Command, Output};

use snafu::ResultExt;

use crate::{
    Result,
    error::{CommandFailedSnafu, InvalidOutputSnafu, SpawnSnafu},
};

/// Render a command the way it would be typed into a shell, for logs and
/// error messages.
pub fn render_command(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `command` to completion and return its stdout.
///
/// A non-zero exit status is an error carrying the captured stderr.
pub async fn run_command_output(command: Command) -> Result<String> {
    let rendered = render_command(&command);
    let output = tokio::process::Command::from(command)
        .output()
        .await
        .context(SpawnSnafu {
            command: rendered.clone(),
        })?;
    check_output(rendered, output)
}

/// Blocking flavour of [`run_command_output`], for use where no runtime is
/// available (cleanup in `Drop`).
pub fn run_command_blocking(mut command: Command) -> Result<String> {
    let rendered = render_command(&command);
    let output = command.output().context(SpawnSnafu {
        command: rendered.clone(),
    })?;
    check_output(rendered, output)
}

fn check_output(command: String, output: Output) -> Result<String> {
    if !output.status.success() {
        return CommandFailedSnafu {
            command,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .fail();
    }
    String::from_utf8(output.stdout).context(InvalidOutputSnafu { command })
}
