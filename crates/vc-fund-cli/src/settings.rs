use serde::Deserialize;
use std::path::PathBuf;

/// CLI settings: an optional `vcf.toml` layered under `VCF_*` environment
/// variables. Command-line flags override both.
#[derive(Debug, Clone, Deserialize)]
pub struct VcfConfig {
    /// Portfolio dataset to load when `--data` is not given
    #[serde(default)]
    pub data_path: Option<PathBuf>,
    /// Fallback tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl VcfConfig {
    /// Dataset to load: the `--data` flag, else the configured `data_path`.
    pub fn resolve_data_path(&self, flag: Option<PathBuf>) -> Option<PathBuf> {
        flag.or_else(|| self.data_path.clone())
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Load configuration. An explicit `path` must exist; the default `vcf.toml`
/// is optional.
pub fn load_config(path: Option<&str>) -> Result<VcfConfig, config::ConfigError> {
    let file = match path {
        Some(p) => config::File::with_name(p).required(true),
        None => config::File::with_name("vcf").required(false),
    };

    config::Config::builder()
        .set_default("log_level", default_log_level())?
        .add_source(file)
        .add_source(config::Environment::with_prefix("VCF"))
        .build()?
        .try_deserialize()
}
