use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const MIN_SPIN_STEPS: usize = 8;
pub const MAX_SPIN_STEPS: usize = 12;
const FIRST_STEP_DELAY_MS: u64 = 180;
const STEP_DELAY_INCREMENT_MS: u64 = 50;
const MAX_STEP_DELAY_MS: u64 = 600;

pub const SPIN_STARTING_MESSAGE: &str = "🎡 轉盤啟動中…";
pub const EMPTY_POOL_MESSAGE: &str = "清單是空的，請先用 /wishlist_show 檢查或用 /spin items 自訂清單。";

pub const DEFAULT_SPIN_CANDIDATES: &[&str] = &[
    "炒飯", "拉麵", "蔥抓餅/蛋餅", "麻油雞麵線", "鍋貼/水餃", "火鍋", "蒙古烤肉", "牛肉麵",
    "燴飯", "小籠包/蒸餃", "泡麵", "烤肉飯", "炒河粉", "綠咖哩雞飯", "石鍋拌飯", "蛋包飯",
    "陽春麵", "雞排", "大阪燒", "麥當勞", "焗烤麵/焗烤飯", "雞腿便當", "涼麵", "叉燒飯",
    "排骨酥麵", "咖喱飯", "丼飯", "水煎包", "熱炒店", "義大利麵", "排骨便當", "鰻魚飯",
    "墨西哥捲餅", "滷肉飯", "大腸包小腸", "沙威瑪", "炒麵麵包", "西班牙燉飯", "控肉飯", "牛排",
    "自助餐", "鐵板燒", "燒肉吃到飽", "辣炒年糕", "鹽酥雞", "海南雞飯", "肯德基", "蚵仔麵線",
    "鴨肉飯", "豆腐煲", "皮蛋瘦肉粥", "飯卷", "麻婆豆腐拌飯", "米苔目", "漢堡王", "健康餐盒",
    "刈包", "米漢堡", "麻辣燙", "總匯三明治", "炒烏龍麵", "臭豆腐", "披薩", "米粉湯",
    "海鮮烏龍麵", "擔仔麵", "IKEA肉丸", "迴轉壽司", "鱔魚意麵", "虱目魚肚粥", "魚丸麵", "牛肉捲餅",
    "甜不辣", "關東煮", "豬血糕", "肉圓", "滷味", "碗粿", "餛飩麵", "韓式炸雞", "印度烤餅",
    "章魚燒", "豬肝炒麵", "港式飲茶", "日本料理店", "炸蝦飯", "雞肉飯", "炒米粉", "蝦仁羹麵",
    "粿仔條", "炭烤串", "肉包", "豬肉餡餅", "御飯糰", "鮭魚飯", "吃到飽餐廳", "北平烤鴨",
    "螺獅粉", "健康沙拉餐", "鬆餅",
];

/// Candidate pool a spin draws from when no explicit items are given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpinSource {
    /// Wishlist when it has entries, otherwise the built-in pool.
    #[default]
    Auto,
    Wishlist,
    Default,
}

impl SpinSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Wishlist => "wishlist",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for SpinSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidSpinSource;

impl fmt::Display for InvalidSpinSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("source 只接受 auto / wishlist / default")
    }
}

impl std::error::Error for InvalidSpinSource {}

impl FromStr for SpinSource {
    type Err = InvalidSpinSource;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "wishlist" => Ok(Self::Wishlist),
            "default" => Ok(Self::Default),
            _ => Err(InvalidSpinSource),
        }
    }
}

/// Pool hint from free text for intent-routed spins.
pub fn detect_spin_source(text: &str) -> SpinSource {
    if ["清單", "待吃", "wishlist"].iter().any(|keyword| text.contains(keyword)) {
        SpinSource::Wishlist
    } else if ["預設", "內建", "default"].iter().any(|keyword| text.contains(keyword)) {
        SpinSource::Default
    } else {
        SpinSource::Auto
    }
}

pub fn default_candidates() -> Vec<String> {
    DEFAULT_SPIN_CANDIDATES.iter().map(|item| (*item).to_string()).collect()
}

/// Comma-separated item list with blanks dropped.
pub fn parse_spin_items(raw: &str) -> Vec<String> {
    raw.split(|ch: char| ch == ',' || ch == '，')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Delay after each reveal step: 180ms, growing by 50ms, capped at 600ms.
pub fn step_delays(steps: usize) -> impl Iterator<Item = Duration> {
    (0..steps as u64).map(|step| {
        let millis = FIRST_STEP_DELAY_MS + STEP_DELAY_INCREMENT_MS * step;
        Duration::from_millis(millis.min(MAX_STEP_DELAY_MS))
    })
}

pub fn rolling_message(choice: &str) -> String {
    format!("🎡 轉盤滾動中… **{choice}**")
}

pub fn result_message(choice: &str) -> String {
    format!("🎯 美食轉盤結果：**{choice}**")
}
