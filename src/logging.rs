use indoc::indoc;
use std::path::PathBuf;
use tempdir::TempDir;

const CONFIG_FILE_NAME: &str = "log4rs.yaml";

pub const DEFAULT_CONFIG: &str = indoc! {r#"
appenders:
  stdout:
    kind: console
    encoder:
      pattern: "{h({d(%Y-%m-%d %H:%M:%S)(utc)} - {l} - {f}:{L} - {m}{n})}"
  file_logger:
    kind: rolling_file
    path: "logs/roi-annotator.log"
    encoder:
      pattern: "{d(%Y-%m-%d %H:%M:%S)(utc)} - {l} - {f}:{L} - {m}{n}"
    policy:
      trigger:
        kind: size
        limit: 1Mb
      roller:
        kind: fixed_window
        base: 1
        count: 3
        pattern: "logs/roi-annotator_{}.log"
root:
  level: info
  appenders:
    - stdout
    - file_logger
"#};

fn config_next_to_executable() -> Option<PathBuf> {
    let mut path = std::env::current_exe().ok()?;
    path.pop();
    path.push(CONFIG_FILE_NAME);
    path.exists().then_some(path)
}

/// Initializes log4rs from `log4rs.yaml` next to the executable, falling
/// back to [`DEFAULT_CONFIG`].
pub fn setup_logging() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(config_path) = config_next_to_executable() {
        log4rs::init_file(config_path, Default::default())?;
        return Ok(());
    }

    // the application directory is not always writable
    let tmp_dir = TempDir::new("roi-annotator")?;
    let tmp_log_config = tmp_dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&tmp_log_config, DEFAULT_CONFIG)?;
    log4rs::init_file(tmp_log_config, Default::default())?;
    Ok(())
}

