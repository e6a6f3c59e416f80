//! Reply text shaping shared by every handler.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub const MAX_MESSAGE_CHARS: usize = 1800;
pub const MAX_RESTAURANT_NAMES: usize = 5;

static MD_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]+)\]\((https?://[^\s)]+)\)").expect("valid markdown link regex")
});
static BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s<>()]+").expect("valid url regex"));
static TRAILING_SPACES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+\n").expect("valid trailing space regex"));
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank regex"));
static NUMBERED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\[?\s*\d+\s*[\]\).、．-]?\s*(.+)$").expect("valid numbered line regex")
});

const URL_TRAILING_PUNCTUATION: &[char] =
    &['。', '！', '？', '!', '?', '，', ',', '；', ';', '：', ':', '）', ')', '」', '』'];
const KEYCAP_SUFFIX: &str = "\u{fe0f}\u{20e3}";

/// Rewrites markdown links to `label：url` and trims punctuation glued to bare
/// URLs so chat clients auto-link them. Also collapses blank-line runs.
pub fn make_urls_clickable(text: &str) -> String {
    let relinked = MD_LINK.replace_all(text, |caps: &Captures<'_>| {
        let label = caps[1].trim();
        let url = &caps[2];
        if label == url {
            url.to_string()
        } else {
            format!("{label}：{url}")
        }
    });

    let mut output = String::with_capacity(relinked.len());
    let mut cursor = 0;
    for found in BARE_URL.find_iter(&relinked) {
        output.push_str(&relinked[cursor..found.start()]);
        let angle_wrapped = relinked[..found.start()].ends_with('<');
        if angle_wrapped {
            output.push_str(found.as_str());
        } else {
            output.push_str(found.as_str().trim_end_matches(URL_TRAILING_PUNCTUATION));
        }
        cursor = found.end();
    }
    output.push_str(&relinked[cursor..]);

    let output = TRAILING_SPACES.replace_all(&output, "\n");
    let output = BLANK_RUN.replace_all(&output, "\n\n");
    output.trim().to_string()
}

/// Splits on character boundaries into pieces of at most `max_chars` characters.
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 {
        return vec![text.to_string()];
    }

    let chars: Vec<char> = text.chars().collect();
    chars.chunks(max_chars).map(|chunk| chunk.iter().collect()).collect()
}

/// Restaurant names from the numbered lines of a recommendation answer.
pub fn extract_restaurant_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for line in text.lines() {
        let normalized = line.replace(KEYCAP_SUFFIX, "");
        let Some(body) = NUMBERED_LINE.captures(&normalized).and_then(|caps| caps.get(1)) else {
            continue;
        };

        let name = body.as_str().trim();
        let name = name.find(|ch: char| ch == '（' || ch == '(').map_or(name, |index| &name[..index]);
        let name = name.trim().trim_matches('*').trim();
        if !name.is_empty() && !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }

    names.truncate(MAX_RESTAURANT_NAMES);
    names
}
