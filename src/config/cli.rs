use crate::config::toml_config::{AggregatorConfig, DataConfig, LoggingConfig, TomlConfig};
use crate::domain::model::{CountSide, SortOrder};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "regional-signal")]
#[command(about = "Trend and capacity severity signals across the 47 prefectures")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// CSV of daily case counts (date,region,count)
    #[arg(long)]
    pub cases: Option<String>,

    /// CSV of facility counts (region,count)
    #[arg(long)]
    pub facilities: Option<String>,

    /// Request deadline in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Assumed bed occupancy rate used by the capacity signal
    #[arg(long)]
    pub occupancy_factor: Option<f64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub query: Query,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Query {
    /// Day-over-day trend tier per region
    Trend {
        /// Anchor date (YYYY-MM-DD)
        date: String,
        /// Limit to one region or one area
        #[arg(long)]
        filter: Option<String>,
    },
    /// Bed-capacity tier per region
    Capacity {
        /// Anchor date (YYYY-MM-DD)
        date: String,
    },
    /// Average case count per area and the regions above it
    Areas {
        /// Anchor date (YYYY-MM-DD)
        date: String,
        #[arg(long)]
        area: Option<String>,
    },
    /// Nationwide total, average and the regions above it
    Nation {
        /// Anchor date (YYYY-MM-DD)
        date: String,
    },
    /// Regions whose count is over (or under) a given number
    Select {
        /// Anchor date (YYYY-MM-DD)
        date: String,
        count: u64,
        #[arg(long, help = "Select regions under the count instead of over it")]
        under: bool,
        #[arg(long, help = "Largest counts first")]
        desc: bool,
    },
    /// First day a region's count went over a given number
    FirstDay {
        region: String,
        count: u64,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    /// Case counts of one region over a date range
    History {
        region: String,
        from: String,
        to: String,
    },
}

impl Query {
    pub fn side(under: bool) -> CountSide {
        if under {
            CountSide::Under
        } else {
            CountSide::Over
        }
    }

    pub fn order(desc: bool) -> SortOrder {
        if desc {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }
}

impl CliConfig {
    /// Command-line values take precedence over the file.
    pub fn apply_to(&self, config: &mut TomlConfig) {
        if self.timeout_ms.is_some() || self.occupancy_factor.is_some() {
            let aggregator = config.aggregator.get_or_insert_with(AggregatorConfig::default);
            if let Some(timeout) = self.timeout_ms {
                aggregator.request_timeout_ms = Some(timeout);
            }
            if let Some(factor) = self.occupancy_factor {
                aggregator.bed_occupancy_factor = Some(factor);
            }
        }

        if self.cases.is_some() || self.facilities.is_some() {
            let data = config.data.get_or_insert_with(DataConfig::default);
            if let Some(cases) = &self.cases {
                data.cases_path = Some(cases.clone());
            }
            if let Some(facilities) = &self.facilities {
                data.facilities_path = Some(facilities.clone());
            }
        }

        if self.verbose || self.json_logs {
            let logging = config.logging.get_or_insert_with(LoggingConfig::default);
            if self.verbose {
                logging.verbose = Some(true);
            }
            if self.json_logs {
                logging.json = Some(true);
            }
        }
    }

    pub fn needs_facilities(&self) -> bool {
        matches!(self.query, Query::Capacity { .. })
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(timeout) = self.timeout_ms {
            validation::validate_positive_number("--timeout-ms", timeout, 1)?;
        }
        if let Some(factor) = self.occupancy_factor {
            validation::validate_range("--occupancy-factor", factor, f64::MIN_POSITIVE, 1.0)?;
        }
        match &self.query {
            Query::Trend { date, .. }
            | Query::Capacity { date }
            | Query::Areas { date, .. }
            | Query::Nation { date }
            | Query::Select { date, .. } => validation::validate_non_empty_string("date", date),
            Query::FirstDay { region, .. } => {
                validation::validate_non_empty_string("region", region)
            }
            Query::History { region, from, to } => {
                validation::validate_non_empty_string("region", region)?;
                validation::validate_non_empty_string("from", from)?;
                validation::validate_non_empty_string("to", to)
            }
        }
    }
}
