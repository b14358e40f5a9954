use crate::core::settings::{DEFAULT_BED_OCCUPANCY_FACTOR, DEFAULT_REQUEST_TIMEOUT_MS};
use crate::domain::model::Tier;
use crate::domain::ports::SettingsProvider;
use crate::domain::severity::{Threshold, Thresholds};
use crate::utils::error::{Result, SignalError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub aggregator: Option<AggregatorConfig>,
    pub thresholds: Option<ThresholdConfig>,
    pub data: Option<DataConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregatorConfig {
    pub request_timeout_ms: Option<u64>,
    pub bed_occupancy_factor: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub trend: Option<Vec<Threshold>>,
    pub trend_floor: Option<Tier>,
    pub capacity: Option<Vec<Threshold>>,
    pub capacity_floor: Option<Tier>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    pub cases_path: Option<String>,
    pub facilities_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
    pub verbose: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SignalError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${DATA_DIR})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(aggregator) = &self.aggregator {
            if let Some(timeout) = aggregator.request_timeout_ms {
                validation::validate_positive_number("aggregator.request_timeout_ms", timeout, 1)?;
            }
            if let Some(factor) = aggregator.bed_occupancy_factor {
                validation::validate_range("aggregator.bed_occupancy_factor", factor, 0.0, 1.0)?;
                if factor == 0.0 {
                    return Err(SignalError::InvalidConfigValueError {
                        field: "aggregator.bed_occupancy_factor".to_string(),
                        value: factor.to_string(),
                        reason: "Value must be greater than 0".to_string(),
                    });
                }
            }
        }

        for (field, table, family) in [
            ("thresholds.trend", self.trend_thresholds(), &Tier::TREND),
            ("thresholds.capacity", self.capacity_thresholds(), &Tier::CAPACITY),
        ] {
            let cutoffs: Vec<f64> = table.cutoffs.iter().map(|t| t.above).collect();
            table
                .check()
                .and_then(|_| table.check_tiers(family))
                .map_err(|reason| SignalError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: format!("{:?}", cutoffs),
                    reason,
                })?;
        }

        if let Some(data) = &self.data {
            let mut files = Vec::new();
            if let Some(path) = &data.cases_path {
                validation::validate_path("data.cases_path", path)?;
                files.push(path.clone());
            }
            if let Some(path) = &data.facilities_path {
                validation::validate_path("data.facilities_path", path)?;
                files.push(path.clone());
            }
            validation::validate_file_extensions("data", &files, &["csv"])?;
        }

        Ok(())
    }

    pub fn cases_path(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.cases_path.as_deref())
    }

    pub fn facilities_path(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.facilities_path.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    fn table(
        cutoffs: Option<&Vec<Threshold>>,
        floor: Option<Tier>,
        default: Thresholds,
    ) -> Thresholds {
        Thresholds {
            cutoffs: cutoffs.cloned().unwrap_or(default.cutoffs),
            floor: floor.unwrap_or(default.floor),
        }
    }
}

impl SettingsProvider for TomlConfig {
    fn request_timeout(&self) -> Duration {
        Duration::from_millis(
            self.aggregator
                .as_ref()
                .and_then(|a| a.request_timeout_ms)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        )
    }

    fn bed_occupancy_factor(&self) -> f64 {
        self.aggregator
            .as_ref()
            .and_then(|a| a.bed_occupancy_factor)
            .unwrap_or(DEFAULT_BED_OCCUPANCY_FACTOR)
    }

    fn trend_thresholds(&self) -> Thresholds {
        let section = self.thresholds.as_ref();
        Self::table(
            section.and_then(|t| t.trend.as_ref()),
            section.and_then(|t| t.trend_floor),
            Thresholds::trend(),
        )
    }

    fn capacity_thresholds(&self) -> Thresholds {
        let section = self.thresholds.as_ref();
        Self::table(
            section.and_then(|t| t.capacity.as_ref()),
            section.and_then(|t| t.capacity_floor),
            Thresholds::capacity(),
        )
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
