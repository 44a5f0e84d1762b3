use std::path::PathBuf;
use std::sync::Once;

static CREATE_DIR_WARNED: Once = Once::new();

/// Resolve the offstack home directory.
///
/// Priority:
/// 1) OFFSTACK_HOME
/// 2) HOME/USERPROFILE
/// 3) ./.offstack
pub fn offstack_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("OFFSTACK_HOME") {
        return PathBuf::from(override_path);
    }
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        return PathBuf::from(home).join(".offstack");
    }
    PathBuf::from(".").join(".offstack")
}

fn ensure_home_dir(home: &PathBuf) {
    if let Err(err) = std::fs::create_dir_all(home) {
        CREATE_DIR_WARNED.call_once(|| {
            eprintln!(
                "Warning: failed to create offstack home directory {}: {}. Set OFFSTACK_HOME to a writable location.",
                home.display(),
                err
            );
        });
    }
}

/// Default logs directory: ~/.offstack/logs
pub fn default_logs_dir() -> PathBuf {
    let home = offstack_home();
    ensure_home_dir(&home);
    home.join("logs")
}

/// Default emulator install directory: ~/.offstack/dynamodb
///
/// Overridable per run via OFFSTACK_DYNAMODB_HOME, resolved by the
/// emulator launcher rather than here.
pub fn default_emulator_dir() -> PathBuf {
    let home = offstack_home();
    ensure_home_dir(&home);
    home.join("dynamodb")
}
