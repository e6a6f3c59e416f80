use serde::{Deserialize, Serialize};

/// One of the five Taiwanese meal-time buckets used to bias search keywords.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealPeriod {
    Breakfast,
    Lunch,
    TeaTime,
    Dinner,
    LateNight,
}

impl MealPeriod {
    pub const ALL: [MealPeriod; 5] =
        [Self::Breakfast, Self::Lunch, Self::TeaTime, Self::Dinner, Self::LateNight];

    pub fn label(self) -> &'static str {
        match self {
            Self::Breakfast => "早餐",
            Self::Lunch => "午餐",
            Self::TeaTime => "下午茶",
            Self::Dinner => "晚餐",
            Self::LateNight => "宵夜",
        }
    }
}

/// Where the resolved meal period came from; changes prompt wording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealSource {
    FromText,
    FromTime,
}

impl MealSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::FromText => "使用者描述",
            Self::FromTime => "當前時間推測",
        }
    }
}
