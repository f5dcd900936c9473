use env_logger::{Env, Target};
use std::fs::{self, OpenOptions};
use std::path::Path;

/// Route `log` output to `path`. Logging to stderr would tear through the
/// alternate screen, so without a writable file nothing is installed.
///
/// The filter comes from `RUST_LOG`, defaulting to `warn`.
pub fn init(path: Option<&Path>) -> bool {
    let Some(path) = path else {
        return false;
    };

    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return false;
        }
    }

    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}
