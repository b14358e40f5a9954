use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Macro-area a prefecture belongs to. Declaration order is the output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Area {
    Hokkaido,
    Tohoku,
    Kanto,
    Chubu,
    Kinki,
    Chugoku,
    Shikoku,
    Kyushu,
}

impl Area {
    pub const ALL: [Area; 8] = [
        Area::Hokkaido,
        Area::Tohoku,
        Area::Kanto,
        Area::Chubu,
        Area::Kinki,
        Area::Chugoku,
        Area::Shikoku,
        Area::Kyushu,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Area::Hokkaido => "Hokkaido",
            Area::Tohoku => "Tohoku",
            Area::Kanto => "Kanto",
            Area::Chubu => "Chubu",
            Area::Kinki => "Kinki",
            Area::Chugoku => "Chugoku",
            Area::Shikoku => "Shikoku",
            Area::Kyushu => "Kyushu",
        }
    }

    pub fn name_jp(&self) -> &'static str {
        match self {
            Area::Hokkaido => "北海道",
            Area::Tohoku => "東北",
            Area::Kanto => "関東",
            Area::Chubu => "中部",
            Area::Kinki => "近畿",
            Area::Chugoku => "中国",
            Area::Shikoku => "四国",
            Area::Kyushu => "九州",
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Area {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        Area::ALL
            .into_iter()
            .find(|area| area.name().eq_ignore_ascii_case(trimmed) || area.name_jp() == trimmed)
            .ok_or(())
    }
}

/// One prefecture. Instances live in the static catalog and are copied around freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    /// JIS prefecture code, 1..=47.
    pub code: u8,
    pub name: &'static str,
    pub name_jp: &'static str,
    pub area: Area,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Which regions a request covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegionFilter {
    #[default]
    All,
    Region(String),
    Area(Area),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseObservation {
    pub date: NaiveDate,
    pub region: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityCount {
    pub region: String,
    pub count: u64,
}

/// Severity label attached to every signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    TooDanger,
    Danger,
    Warning,
    Caution,
    Attention,
    TooDangerArea,
    DangerArea,
    WarningArea,
    CautionArea,
    AttentionArea,
    NoData,
    Error,
    Timeout,
}

impl Tier {
    /// Tiers a trend threshold table may assign.
    pub const TREND: [Tier; 5] = [
        Tier::TooDanger,
        Tier::Danger,
        Tier::Warning,
        Tier::Caution,
        Tier::Attention,
    ];

    /// Tiers a capacity threshold table may assign.
    pub const CAPACITY: [Tier; 5] = [
        Tier::TooDangerArea,
        Tier::DangerArea,
        Tier::WarningArea,
        Tier::CautionArea,
        Tier::AttentionArea,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tier::TooDanger => "TooDanger",
            Tier::Danger => "Danger",
            Tier::Warning => "Warning",
            Tier::Caution => "Caution",
            Tier::Attention => "Attention",
            Tier::TooDangerArea => "TooDangerArea",
            Tier::DangerArea => "DangerArea",
            Tier::WarningArea => "WarningArea",
            Tier::CautionArea => "CautionArea",
            Tier::AttentionArea => "AttentionArea",
            Tier::NoData => "NoData",
            Tier::Error => "Error",
            Tier::Timeout => "Timeout",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Day-over-day trend for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSignal {
    pub region: String,
    pub delta_current: Option<i64>,
    pub delta_previous: Option<i64>,
    pub ratio: Option<f64>,
    pub tier: Tier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RegionSignal {
    pub fn failed(region: &Region, tier: Tier, error: Option<String>) -> Self {
        Self {
            region: region.name.to_string(),
            delta_current: None,
            delta_previous: None,
            ratio: None,
            tier,
            error,
        }
    }
}

/// Bed-capacity utilization for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacitySignal {
    pub region: String,
    pub facility_count: Option<u64>,
    pub case_count: Option<u64>,
    pub utilization: Option<f64>,
    pub tier: Tier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CapacitySignal {
    pub fn failed(region: &Region, tier: Tier, error: Option<String>) -> Self {
        Self {
            region: region.name.to_string(),
            facility_count: None,
            case_count: None,
            utilization: None,
            tier,
            error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountStatus {
    Reported,
    Missing,
    Error,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaEntry {
    pub region: String,
    pub count: Option<u64>,
    pub status: CountStatus,
    pub above_average: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Case counts of one macro-area on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSummary {
    pub area: Area,
    pub date: NaiveDate,
    /// Regions that had an observation for the date.
    pub reporting: usize,
    pub total: u128,
    pub average: Option<f64>,
    pub entries: Vec<AreaEntry>,
}

impl AreaSummary {
    pub fn above_average(&self) -> impl Iterator<Item = &AreaEntry> {
        self.entries.iter().filter(|e| e.above_average)
    }
}

/// Case counts of all 47 prefectures on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalSummary {
    pub date: NaiveDate,
    pub reporting: usize,
    pub total: u128,
    pub average: Option<f64>,
    pub entries: Vec<AreaEntry>,
}

impl NationalSummary {
    pub fn above_average(&self) -> impl Iterator<Item = &AreaEntry> {
        self.entries.iter().filter(|e| e.above_average)
    }

    /// Reported regions strictly over or under `cutoff`, sorted by count.
    /// Equal counts keep catalog order.
    pub fn select(&self, cutoff: u64, side: CountSide, order: SortOrder) -> Vec<AreaEntry> {
        let mut selected: Vec<AreaEntry> = self
            .entries
            .iter()
            .filter(|e| match (e.count, side) {
                (Some(count), CountSide::Over) => count > cutoff,
                (Some(count), CountSide::Under) => count < cutoff,
                (None, _) => false,
            })
            .cloned()
            .collect();

        match order {
            SortOrder::Ascending => selected.sort_by_key(|e| e.count),
            SortOrder::Descending => selected.sort_by(|a, b| b.count.cmp(&a.count)),
        }
        selected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountSide {
    Over,
    Under,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}
