// ABOUTME: Configuration for the interpreter's I/O sandbox and module loader

use std::path::PathBuf;

pub const VERSION: &str = "0.1.0";

// ============================================================================
// I/O Sandboxing Configuration
// ============================================================================

/// Filesystem sandbox configuration, consumed by `Sandbox::new`.
#[derive(Debug, Clone)]
pub struct FsConfig {
    pub allowed_paths: Vec<PathBuf>,
    pub max_file_size: usize,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            allowed_paths: vec![
                PathBuf::from("./data"),
                PathBuf::from("./examples"),
                PathBuf::from("./scripts"),
            ],
            // 10MB
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

/// Network sandbox configuration.
#[derive(Debug, Clone, Default)]
pub struct NetConfig {
    pub enabled: bool,
    /// Empty = allow any address once enabled.
    pub allowed_addresses: Vec<String>,
}

/// Combined I/O sandbox configuration.
#[derive(Debug, Clone, Default)]
pub struct IoConfig {
    pub filesystem: FsConfig,
    pub network: NetConfig,
}

/// Module loader configuration: where `import` looks for `.lpy` files.
#[derive(Debug, Clone)]
pub struct ModuleConfig {
    pub load_paths: Vec<PathBuf>,
    pub extension: String,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        ModuleConfig {
            load_paths: vec![PathBuf::from(".")],
            extension: "lpy".to_string(),
        }
    }
}
