use crate::heuristics::location::is_delimiter;

const STORE_SUFFIXES: &[&str] = &["餐廳", "店"];

/// Rightmost non-empty token directly before a `店`/`餐廳` suffix.
pub fn fallback_dish(text: &str) -> Option<String> {
    let mut anchors: Vec<usize> = STORE_SUFFIXES
        .iter()
        .flat_map(|suffix| text.match_indices(suffix).map(|(index, _)| index))
        .collect();
    anchors.sort_unstable_by(|left, right| right.cmp(left));

    anchors.into_iter().find_map(|anchor| {
        let prefix = &text[..anchor];
        let start = prefix
            .char_indices()
            .rev()
            .find(|(_, ch)| is_delimiter(*ch))
            .map_or(0, |(index, ch)| index + ch.len_utf8());
        let token = prefix[start..].trim();
        (!token.is_empty()).then(|| token.to_string())
    })
}
