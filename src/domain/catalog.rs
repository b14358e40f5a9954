//! The fixed prefecture catalog.
//!
//! Order follows the JIS prefecture codes and is the output order of every
//! aggregate response.

use crate::domain::model::{Area, Region, RegionFilter};
use crate::utils::error::{Result, SignalError};
use std::collections::HashMap;
use std::sync::OnceLock;

const fn region(code: u8, name: &'static str, name_jp: &'static str, area: Area) -> Region {
    Region {
        code,
        name,
        name_jp,
        area,
    }
}

pub const REGIONS: [Region; 47] = [
    region(1, "Hokkaido", "北海道", Area::Hokkaido),
    region(2, "Aomori", "青森県", Area::Tohoku),
    region(3, "Iwate", "岩手県", Area::Tohoku),
    region(4, "Miyagi", "宮城県", Area::Tohoku),
    region(5, "Akita", "秋田県", Area::Tohoku),
    region(6, "Yamagata", "山形県", Area::Tohoku),
    region(7, "Fukushima", "福島県", Area::Tohoku),
    region(8, "Ibaraki", "茨城県", Area::Kanto),
    region(9, "Tochigi", "栃木県", Area::Kanto),
    region(10, "Gunma", "群馬県", Area::Kanto),
    region(11, "Saitama", "埼玉県", Area::Kanto),
    region(12, "Chiba", "千葉県", Area::Kanto),
    region(13, "Tokyo", "東京都", Area::Kanto),
    region(14, "Kanagawa", "神奈川県", Area::Kanto),
    region(15, "Niigata", "新潟県", Area::Chubu),
    region(16, "Toyama", "富山県", Area::Chubu),
    region(17, "Ishikawa", "石川県", Area::Chubu),
    region(18, "Fukui", "福井県", Area::Chubu),
    region(19, "Yamanashi", "山梨県", Area::Chubu),
    region(20, "Nagano", "長野県", Area::Chubu),
    region(21, "Gifu", "岐阜県", Area::Chubu),
    region(22, "Shizuoka", "静岡県", Area::Chubu),
    region(23, "Aichi", "愛知県", Area::Chubu),
    region(24, "Mie", "三重県", Area::Kinki),
    region(25, "Shiga", "滋賀県", Area::Kinki),
    region(26, "Kyoto", "京都府", Area::Kinki),
    region(27, "Osaka", "大阪府", Area::Kinki),
    region(28, "Hyogo", "兵庫県", Area::Kinki),
    region(29, "Nara", "奈良県", Area::Kinki),
    region(30, "Wakayama", "和歌山県", Area::Kinki),
    region(31, "Tottori", "鳥取県", Area::Chugoku),
    region(32, "Shimane", "島根県", Area::Chugoku),
    region(33, "Okayama", "岡山県", Area::Chugoku),
    region(34, "Hiroshima", "広島県", Area::Chugoku),
    region(35, "Yamaguchi", "山口県", Area::Chugoku),
    region(36, "Tokushima", "徳島県", Area::Shikoku),
    region(37, "Kagawa", "香川県", Area::Shikoku),
    region(38, "Ehime", "愛媛県", Area::Shikoku),
    region(39, "Kochi", "高知県", Area::Shikoku),
    region(40, "Fukuoka", "福岡県", Area::Kyushu),
    region(41, "Saga", "佐賀県", Area::Kyushu),
    region(42, "Nagasaki", "長崎県", Area::Kyushu),
    region(43, "Kumamoto", "熊本県", Area::Kyushu),
    region(44, "Oita", "大分県", Area::Kyushu),
    region(45, "Miyazaki", "宮崎県", Area::Kyushu),
    region(46, "Kagoshima", "鹿児島県", Area::Kyushu),
    region(47, "Okinawa", "沖縄県", Area::Kyushu),
];

/// Lookup tables over [`REGIONS`].
#[derive(Debug)]
pub struct RegionCatalog {
    regions: &'static [Region],
    /// Lowercased romanized name and Japanese name, both mapped to the catalog index.
    by_name: HashMap<String, usize>,
}

impl RegionCatalog {
    pub fn global() -> &'static RegionCatalog {
        static CATALOG: OnceLock<RegionCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| RegionCatalog::new(&REGIONS))
    }

    fn new(regions: &'static [Region]) -> Self {
        let mut by_name = HashMap::with_capacity(regions.len() * 2);
        for (index, region) in regions.iter().enumerate() {
            by_name.insert(region.name.to_ascii_lowercase(), index);
            by_name.insert(region.name_jp.to_string(), index);
        }
        Self { regions, by_name }
    }

    pub fn all(&self) -> &'static [Region] {
        self.regions
    }

    pub fn regions_in_area(&self, area: Area) -> Vec<Region> {
        self.regions
            .iter()
            .filter(|r| r.area == area)
            .copied()
            .collect()
    }

    /// Accepts the romanized name (any case) or the Japanese name.
    pub fn lookup(&self, name: &str) -> Option<Region> {
        let trimmed = name.trim();
        self.by_name
            .get(&trimmed.to_ascii_lowercase())
            .or_else(|| self.by_name.get(trimmed))
            .map(|&index| self.regions[index])
    }

    pub fn area_of(&self, name: &str) -> Result<Area> {
        self.lookup(name)
            .map(|r| r.area)
            .ok_or_else(|| SignalError::invalid_input("region", name, "unknown region"))
    }

    /// Position in catalog order; used to sort joined results.
    pub fn position(&self, region: &Region) -> usize {
        (region.code as usize).saturating_sub(1)
    }

    pub fn resolve(&self, filter: &RegionFilter) -> Result<Vec<Region>> {
        match filter {
            RegionFilter::All => Ok(self.regions.to_vec()),
            RegionFilter::Area(area) => Ok(self.regions_in_area(*area)),
            RegionFilter::Region(name) => self
                .lookup(name)
                .map(|r| vec![r])
                .ok_or_else(|| {
                    SignalError::invalid_input("region", name.as_str(), "unknown region")
                }),
        }
    }

    /// Interprets a free-form filter string: region names take precedence over area names.
    pub fn parse_filter(&self, raw: Option<&str>) -> Result<RegionFilter> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(RegionFilter::All);
        };

        if let Some(region) = self.lookup(raw) {
            return Ok(RegionFilter::Region(region.name.to_string()));
        }
        raw.parse::<Area>().map(RegionFilter::Area).map_err(|_| {
            SignalError::invalid_input("filter", raw, "not a known region or area")
        })
    }
}
