use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

pub fn extract_text(node: ElementRef) -> String {
    node.text().collect::<String>()
}

/// Visible body text split into trimmed non-empty lines, the unit the usage
/// text heuristic operates on.
pub fn visible_text_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

pub fn body_text(document: &Html) -> String {
    let body_selector = Selector::parse("body").unwrap();
    document
        .select(&body_selector)
        .next()
        .map(extract_text)
        .unwrap_or_default()
}

/// The `__NEXT_DATA__` data island, when the page carries one.
pub fn next_data_json(document: &Html) -> Option<Value> {
    let selector = Selector::parse("script#__NEXT_DATA__").unwrap();
    let node = document.select(&selector).next()?;
    serde_json::from_str(&extract_text(node)).ok()
}

/// Every other embedded `<script type="application/json">` island that parses.
pub fn embedded_json_islands(document: &Html) -> Vec<Value> {
    let selector = Selector::parse(r#"script[type="application/json"]"#).unwrap();
    document
        .select(&selector)
        .filter_map(|node| serde_json::from_str(&extract_text(node)).ok())
        .collect()
}

/// Reads one declaration out of an inline `style` attribute. Exact property
/// name match, so `top` does not pick up `margin-top`.
pub fn inline_style_value<'a>(style: &'a str, property: &str) -> Option<&'a str> {
    for declaration in style.split(';') {
        let Some((name, value)) = declaration.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case(property) {
            return Some(value.trim());
        }
    }
    None
}

/// Leading-number parse in the spirit of JS `parseFloat`: "12px" is 12.
pub fn parse_css_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let mut end = 0;
    for (idx, ch) in trimmed.char_indices() {
        if ch.is_ascii_digit() || ch == '.' || (idx == 0 && (ch == '-' || ch == '+')) {
            end = idx + ch.len_utf8();
        } else {
            break;
        }
    }
    trimmed[..end].parse().ok()
}
