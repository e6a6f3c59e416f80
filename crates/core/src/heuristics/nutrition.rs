use once_cell::sync::Lazy;
use regex::Regex;

static POLITENESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(請問|請幫我|幫我|想知道|查詢|查|一下|可以|嗎|？|\?)").expect("valid politeness regex")
});
static NUTRIENT_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(營養成分|營養|熱量|卡路里|蛋白質|碳水|脂肪|多少)").expect("valid nutrient regex")
});

/// Food name left after removing request phrasing; the raw text when nothing remains.
pub fn extract_nutrition_target(text: &str) -> String {
    let without_politeness = POLITENESS.replace_all(text, "");
    let cleaned = NUTRIENT_WORDS.replace_all(&without_politeness, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        text.to_string()
    } else {
        cleaned.to_string()
    }
}
