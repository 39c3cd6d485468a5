use crate::config::LogSettings;
use env_logger::{Builder, Env, Target};
use std::fs::OpenOptions;

/// Installs the global `env_logger` backend.
///
/// `RUST_LOG` wins over `settings.level`. With `settings.file` set, records are appended
/// to that file instead of stderr. Later calls are no-ops.
pub fn init(settings: &LogSettings) {
    let mut builder = Builder::from_env(Env::default().default_filter_or(settings.level.as_str()));

    if let Some(path) = &settings.file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            // No logger exists yet to report this through.
            Err(e) => eprintln!("Failed to open log file {path:?}: {e}"),
        }
    }

    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_log_file_and_tolerates_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mutations.log");
        let settings = LogSettings {
            level: "debug".to_string(),
            file: Some(path.clone()),
        };

        init(&settings);
        init(&settings);
        init(&LogSettings::default());

        assert!(path.exists());
    }
}
