use chowbot_core::domain::place::Review;
use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_RECOMMENDED_DISHES: usize = 5;
const SNIPPET_CHARS: usize = 80;

static AFTER_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(推薦|必點|招牌|必吃|超推)\s*([^\s，。.!！?？]{1,10})").expect("valid marker regex")
});
static BEFORE_PRAISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^\s，。.!！?？]{1,10})(好吃|好喝|很推|值得)").expect("valid praise regex")
});

const GENERIC_WORDS: &[&str] =
    &["好吃", "好喝", "很推", "值得", "推薦", "必點", "招牌", "必吃", "超推"];
const EDGE_PUNCTUATION: &[char] = &[
    '：', ':', '，', '。', '.', '!', '！', '?', '？', ' ', '、', '「', '」', '[', ']', '(', ')', '（',
    '）',
];

/// Dish names mentioned in reviews, in review order then pattern order.
/// Scanning stops after the review that brings the total to five.
pub fn extract_recommended_dishes(reviews: &[Review]) -> Vec<String> {
    let mut dishes: Vec<String> = Vec::new();

    for review in reviews {
        let after_marker = AFTER_MARKER
            .captures_iter(&review.text)
            .filter_map(|caps| caps.get(2).map(|m| m.as_str()));
        let before_praise = BEFORE_PRAISE
            .captures_iter(&review.text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()));

        for raw in after_marker.chain(before_praise) {
            let dish = raw.trim_matches(EDGE_PUNCTUATION);
            if dish.is_empty() || GENERIC_WORDS.contains(&dish) {
                continue;
            }
            if !dishes.iter().any(|existing| existing == dish) {
                dishes.push(dish.to_string());
            }
        }

        if dishes.len() >= MAX_RECOMMENDED_DISHES {
            break;
        }
    }

    dishes.truncate(MAX_RECOMMENDED_DISHES);
    dishes
}

/// First non-empty review, cut to 80 characters with an ellipsis.
pub fn top_review_snippet(reviews: &[Review]) -> String {
    let Some(text) = reviews.iter().map(|review| review.text.as_str()).find(|text| !text.is_empty())
    else {
        return String::new();
    };

    if text.chars().count() > SNIPPET_CHARS {
        let cut: String = text.chars().take(SNIPPET_CHARS).collect();
        format!("{cut}…")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chowbot_core::domain::place::Review;

    use super::{extract_recommended_dishes, top_review_snippet};

    fn reviews(texts: &[&str]) -> Vec<Review> {
        texts.iter().map(|text| Review { text: (*text).to_string() }).collect()
    }

    #[test]
    fn marker_dishes_come_before_praise_dishes() {
        let dishes = extract_recommended_dishes(&reviews(&["湯頭好喝，推薦 牛肉麵。"]));
        assert_eq!(dishes, vec!["牛肉麵", "湯頭"]);
    }

    #[test]
    fn generic_words_and_duplicates_are_dropped() {
        let dishes = extract_recommended_dishes(&reviews(&["好吃好吃！", "必點「滷肉飯」", "滷肉飯好吃"]));
        assert_eq!(dishes, vec!["滷肉飯"]);
    }

    #[test]
    fn scanning_stops_once_five_are_collected() {
        let dishes = extract_recommended_dishes(&reviews(&[
            "推薦甲 推薦乙 推薦丙",
            "推薦丁 推薦戊 推薦己",
            "推薦庚",
        ]));
        assert_eq!(dishes, vec!["甲", "乙", "丙", "丁", "戊"]);
    }

    #[test]
    fn snippet_uses_first_non_empty_review() {
        assert_eq!(top_review_snippet(&reviews(&["", "很棒"])), "很棒");
        let long = "好".repeat(81);
        assert_eq!(top_review_snippet(&reviews(&[&long])), format!("{}…", "好".repeat(80)));
        assert_eq!(top_review_snippet(&[]), "");
    }
}
