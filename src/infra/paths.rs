// src/infra/paths.rs — Config and output path resolution
//
// All paths respect the CODEGEN_BENCH_HOME environment variable for isolation.
// When unset, config lives in ~/.codegen-bench/.

use std::path::PathBuf;

fn bench_home() -> Option<PathBuf> {
    std::env::var_os("CODEGEN_BENCH_HOME").map(PathBuf::from)
}

/// Configuration directory: $CODEGEN_BENCH_HOME/ or ~/.codegen-bench/
///
/// Returns `None` only when no home directory can be determined.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(home) = bench_home() {
        return Some(home);
    }
    directories::BaseDirs::new().map(|b| b.home_dir().join(".codegen-bench"))
}

/// Config file path
pub fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Where `bench --save` writes its exports.
pub fn results_dir() -> Option<PathBuf> {
    config_dir().map(|d| d.join("results"))
}
