use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Global Map "unknown" marker for numeric attributes.
pub const GLOBAL_MAP_UNKNOWN: f64 = -89999999.0;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub classify: ClassifyConfig,
    pub output: OutputConfig,
    pub style: StyleConfig,
}

/// Property names read from each input record
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub admin_code_field: String,
    pub population_field: String,
    /// Population value meaning "unknown"
    pub unknown_population: f64,
    /// Drop records carrying `unknown_population` before classification
    pub exclude_unknown: bool,
    /// Properties joined into a human-readable label for reports
    pub label_fields: Vec<String>,
}

impl InputConfig {
    /// The sentinel to exclude, if exclusion is enabled
    pub fn unknown_sentinel(&self) -> Option<f64> {
        self.exclude_unknown.then_some(self.unknown_population)
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            admin_code_field: "adm_code".to_string(),
            population_field: "pop".to_string(),
            unknown_population: GLOBAL_MAP_UNKNOWN,
            exclude_unknown: true,
            label_fields: vec!["nam".to_string(), "laa".to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Fan the adjacency scan out over the rayon pool
    pub parallel: bool,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub file_prefix: String,
    /// Region prefixes `01..=region_count` get their own dataset
    pub region_count: u32,
    /// Number of leading code characters forming the region prefix
    pub prefix_len: usize,
}

impl OutputConfig {
    /// Every region number `1..=region_count`, zero-padded, must be exactly
    /// `prefix_len` characters or its dataset can never match a code
    pub fn validate(&self) -> Result<()> {
        ensure!(self.prefix_len > 0, "output.prefix_len must be at least 1");
        let widest = self.region_count.to_string().len();
        ensure!(
            widest <= self.prefix_len,
            "output.region_count {} needs a prefix_len of at least {}, got {}",
            self.region_count,
            widest,
            self.prefix_len
        );
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("out"),
            file_prefix: "tobichi".to_string(),
            region_count: 47,
            prefix_len: 2,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StyleConfig {
    pub palette: Vec<String>,
    pub opacity: f64,
    pub weight: f64,
    pub fill_opacity: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            palette: [
                "#8b1a1a", "#1a4f8b", "#2e6b1f", "#6b1f5e", "#8b5a00", "#1f6b66", "#4b2e8b",
                "#7a2e00", "#00568b", "#5e6b00", "#8b0045", "#2e3f6b", "#006b3c", "#6b3a1f",
                "#3c1f6b", "#8b2e4f",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            opacity: 1.0,
            weight: 3.0,
            fill_opacity: 0.2,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.output.validate()?;
        Ok(config)
    }
}
