use tracing::subscriber::set_global_default;
use tracing_subscriber::FmtSubscriber;

/// Install the global subscriber. `levels` is an env filter directive.
pub fn init(color: bool, json: bool, levels: &str) {
    let builder = FmtSubscriber::builder()
        .with_env_filter(levels)
        .with_writer(std::io::stderr);

    // Ignore errors when setting, since tests can initialize this
    // multiple times.
    let _ = if json {
        set_global_default(builder.json().flatten_event(true).finish())
    } else {
        set_global_default(builder.with_ansi(color).finish())
    };
}

/// Filter directive for the crates of this workspace at `level`.
pub fn levels(level: &str) -> String {
    match level {
        "off" => "off".to_owned(),
        level => ["far_e2e", "k8s_e2e_tests", "k8s_test_framework"]
            .map(|target| format!("{target}={level}"))
            .join(","),
    }
}
