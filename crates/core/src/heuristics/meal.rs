use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};

use crate::domain::meal::MealPeriod;

const TAIPEI_OFFSET_SECS: i32 = 8 * 3600;

const MEAL_KEYWORDS: &[(MealPeriod, &[&str])] = &[
    (MealPeriod::Breakfast, &["早餐", "早午餐", "brunch", "早安"]),
    (MealPeriod::Lunch, &["午餐", "中午", "午飯", "午餐飯", "午餐吃", "午餐點"]),
    (MealPeriod::TeaTime, &["下午茶", "點心", "甜點", "咖啡廳"]),
    (MealPeriod::Dinner, &["晚餐", "晚飯", "晚點吃", "晚上吃", "晚間"]),
    (MealPeriod::LateNight, &["宵夜", "消夜", "夜宵", "半夜", "凌晨"]),
];

/// First period (in table order) with a keyword present in `text`.
pub fn detect_meal_from_text(text: &str) -> Option<MealPeriod> {
    MEAL_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| text.contains(keyword)))
        .map(|(period, _)| *period)
}

/// Half-open intervals over the local day:
/// [05:00,10:30) [10:30,13:30) [13:30,17:00) [17:00,21:00), everything else is late night.
pub fn infer_meal_by_time<T: Timelike>(time: &T) -> MealPeriod {
    let minutes = time.hour() * 60 + time.minute();
    match minutes {
        300..=629 => MealPeriod::Breakfast,
        630..=809 => MealPeriod::Lunch,
        810..=1019 => MealPeriod::TeaTime,
        1020..=1259 => MealPeriod::Dinner,
        _ => MealPeriod::LateNight,
    }
}

pub fn taipei_offset() -> FixedOffset {
    FixedOffset::east_opt(TAIPEI_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

pub fn taipei_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&taipei_offset())
}
