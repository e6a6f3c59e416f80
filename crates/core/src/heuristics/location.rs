use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_CITY: &str = "Tainan";
pub const DEFAULT_LOCATION_LABEL: &str = "國立成功大學";

static STATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([\p{Han}A-Za-z0-9]+(?:火車站|車站|捷運站))").expect("valid station regex")
});
static ENGLISH_PREPOSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:in|near|at|around)\s+([A-Za-z][A-Za-z .,'-]{1,50})")
        .expect("valid preposition regex")
});
static ENGLISH_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z .,'-]{1,50}").expect("valid english regex"));
static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s'-]").expect("valid non-word regex"));

const STATION_CITY_KEYWORDS: &[(&[&str], &str)] = &[
    (
        &[
            "台北", "臺北", "松山", "信義", "大安", "中山", "士林", "內湖", "文山", "北投", "南港",
            "萬華", "中正", "大同",
        ],
        "Taipei",
    ),
    (
        &["新北", "新北市", "板橋", "三重", "新莊", "中和", "永和", "新店", "土城", "蘆洲", "汐止"],
        "New Taipei",
    ),
    (&["桃園", "中壢", "龜山", "蘆竹", "大園", "八德"], "Taoyuan"),
    (&["台中", "臺中"], "Taichung"),
    (&["台南", "臺南", "成大", "成功大學"], "Tainan"),
    (&["高雄"], "Kaohsiung"),
];

const CITY_LABELS: &[(&[&str], &str, &str)] = &[
    (&["台北", "臺北", "台北市"], "Taipei", "台北市"),
    (&["新北", "新北市"], "New Taipei", "新北市"),
    (&["桃園", "桃園市"], "Taoyuan", "桃園市"),
    (&["台中", "臺中", "台中市"], "Taichung", "台中市"),
    (&["高雄", "高雄市"], "Kaohsiung", "高雄市"),
    (&["台南", "臺南", "台南市", "成功大學", "成大"], "Tainan", "國立成功大學"),
];

const COUNTY_NAMES: &[(&str, &str)] = &[
    ("基隆", "Keelung"),
    ("新北", "New Taipei"),
    ("台南", "Tainan"),
    ("臺南", "Tainan"),
    ("台北", "Taipei"),
    ("臺北", "Taipei"),
    ("桃園", "Taoyuan"),
    ("新竹", "Hsinchu"),
    ("苗栗", "Miaoli"),
    ("高雄", "Kaohsiung"),
    ("台中", "Taichung"),
    ("臺中", "Taichung"),
    ("彰化", "Changhua"),
    ("南投", "Nantou"),
    ("雲林", "Yunlin"),
    ("嘉義", "Chiayi"),
    ("屏東", "Pingtung"),
    ("宜蘭", "Yilan"),
    ("花蓮", "Hualien"),
    ("台東", "Taitung"),
    ("臺東", "Taitung"),
    ("澎湖", "Penghu"),
    ("金門", "Kinmen"),
    ("連江", "Lienchiang"),
];

const ENGLISH_STOP_WORDS: &[&str] = &[
    "weather", "forecast", "temperature", "temp", "now", "today", "please", "check", "in", "at",
    "for", "the", "a", "an", "near", "around",
];

const TRAILING_FOOD_WORDS: &[&str] = &[
    "ramen", "sushi", "pizza", "burger", "steak", "noodle", "noodles", "bbq", "coffee", "tea",
    "brunch", "breakfast", "lunch", "dinner", "hotpot",
];

const PLACE_SUFFIXES: &[&str] = &[
    "火車站", "捷運站", "車站", "大學", "高中", "國中", "醫院", "夜市", "市場", "公園", "商圈",
    "百貨", "廣場", "老街", "機場", "站",
];

const LOCALITY_SUFFIXES: &[&str] = &["附近", "周邊", "周圍", "旁邊", "一帶", "這邊", "那邊"];

/// City used for weather fallback and the label used to anchor the place search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocationMatch {
    pub city: String,
    pub label: String,
}

impl LocationMatch {
    fn new(city: impl Into<String>, label: impl Into<String>) -> Self {
        Self { city: city.into(), label: label.into() }
    }

    pub fn fallback() -> Self {
        Self::new(DEFAULT_CITY, DEFAULT_LOCATION_LABEL)
    }
}

/// Station names first, then city keywords, then English place names, then the default pair.
pub fn detect_food_location(text: &str) -> LocationMatch {
    if let Some(station) = STATION.captures(text).and_then(|caps| caps.get(1)) {
        let city = STATION_CITY_KEYWORDS
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|keyword| text.contains(keyword)))
            .map_or(DEFAULT_CITY, |(_, city)| *city);
        return LocationMatch::new(city, station.as_str());
    }

    if let Some((_, city, label)) = CITY_LABELS
        .iter()
        .find(|(keywords, _, _)| keywords.iter().any(|keyword| text.contains(keyword)))
    {
        return LocationMatch::new(*city, *label);
    }

    match extract_english_location(text) {
        Some(place) => LocationMatch::new(place.clone(), place),
        None => LocationMatch::fallback(),
    }
}

/// City name for weather lookups. Never empty.
pub fn extract_city(text: &str) -> String {
    if let Some((_, city)) = COUNTY_NAMES.iter().find(|(name, _)| text.contains(name)) {
        return (*city).to_string();
    }
    extract_english_location(text).unwrap_or_else(|| DEFAULT_CITY.to_string())
}

pub fn extract_english_location(text: &str) -> Option<String> {
    let phrase = ENGLISH_PREPOSITION
        .captures(text)
        .and_then(|caps| caps.get(1))
        .or_else(|| ENGLISH_RUN.find(text))?
        .as_str();

    let cleaned = NON_WORD.replace_all(phrase, " ");
    let mut kept: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|word| !ENGLISH_STOP_WORDS.contains(&word.to_lowercase().as_str()))
        .collect();

    while kept
        .last()
        .is_some_and(|word| TRAILING_FOOD_WORDS.contains(&word.to_lowercase().as_str()))
    {
        kept.pop();
    }

    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}

/// Place name anchored on a place-type suffix word (車站, 大學, 醫院, ...), with
/// trailing locality words such as 附近 removed.
pub fn fallback_location_label(text: &str) -> Option<String> {
    let (suffix_start, suffix) = PLACE_SUFFIXES
        .iter()
        .find_map(|suffix| text.find(suffix).map(|index| (index, *suffix)))?;
    let suffix_end = suffix_start + suffix.len();

    let segment_start = text[..suffix_start]
        .char_indices()
        .rev()
        .find(|(_, ch)| is_delimiter(*ch))
        .map_or(0, |(index, ch)| index + ch.len_utf8());

    let mut label = text[segment_start..suffix_end].trim();
    while let Some(stripped) =
        LOCALITY_SUFFIXES.iter().find_map(|locality| label.strip_suffix(locality))
    {
        label = stripped.trim_end();
    }

    if label.chars().count() <= suffix.chars().count() {
        return None;
    }
    Some(label.to_string())
}

pub(crate) fn is_delimiter(ch: char) -> bool {
    ch.is_whitespace()
        || ch.is_ascii_punctuation()
        || "，。！？、；：「」『』（）【】《》～…".contains(ch)
}
