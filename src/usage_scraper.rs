use log::debug;
use regex::Regex;
use scraper::Html;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::page_loader::PageSnapshot;
use crate::text_manipulators::{body_text, embedded_json_islands, next_data_json, visible_text_lines};

// Wire labels the account page uses; the JSON form carries no display strings
// of its own.
const GENERIC_USAGE_TITLE: &str = "使用量";
const FALLBACK_ITEM_TITLE: &str = "用量";
const DEFAULT_UNIT: &str = "次";
const DEFAULT_PLAN_TYPE: &str = "专业版套餐";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageKind {
    Plan,
    Package,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageItem {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: UsageKind,
    pub current: f64,
    pub total: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageData {
    pub plan_type: String,
    pub reset_date: String,
    pub days_remaining: u32,
    pub items: Vec<UsageItem>,
}

/// Runs the usage extraction strategies over one page snapshot in confidence
/// order: the `__NEXT_DATA__` island, other embedded JSON islands, any JSON
/// body captured by the loader, and finally the visible-text heuristic.
/// First strategy producing a non-empty item list wins.
pub fn extract_usage(snapshot: &PageSnapshot) -> Option<UsageData> {
    let document = Html::parse_document(&snapshot.html);

    if let Some(json) = next_data_json(&document) {
        if let Some(data) = extract_usage_from_json(&json) {
            return Some(data);
        }
    }
    for json in embedded_json_islands(&document) {
        if let Some(data) = extract_usage_from_json(&json) {
            return Some(data);
        }
    }
    if let Some(json) = &snapshot.captured_json {
        if let Some(data) = extract_usage_from_json(json) {
            return Some(data);
        }
    }

    debug!("usage: no JSON strategy produced items, trying the text heuristic");
    let data = parse_usage_from_html(&document);
    if data.items.is_empty() && data.reset_date.is_empty() {
        return None;
    }
    Some(data)
}

struct Candidate {
    title: String,
    current: f64,
    total: f64,
    kind: UsageKind,
}

/// Structured walk over a JSON blob that may or may not be usage data.
/// Top-level and directly nested objects carrying any of
/// `used`/`limit`/`total`/`current` become candidates; `items` arrays inside
/// such objects are expanded as well. A candidate counts only when both
/// numbers are finite and the total is positive.
pub fn extract_usage_from_json(json: &Value) -> Option<UsageData> {
    let obj = json.as_object()?;
    let mut candidates: Vec<Candidate> = Vec::new();

    if obj.get("limit").is_some_and(Value::is_number) || obj.get("used").is_some_and(Value::is_number) {
        push_candidate(
            &mut candidates,
            GENERIC_USAGE_TITLE,
            obj.get("used"),
            obj.get("limit"),
            UsageKind::Plan,
        );
    }
    if obj.get("total").is_some_and(Value::is_number) || obj.get("current").is_some_and(Value::is_number) {
        push_candidate(
            &mut candidates,
            GENERIC_USAGE_TITLE,
            obj.get("current"),
            obj.get("total"),
            UsageKind::Plan,
        );
    }

    for (key, val) in obj {
        let Some(nested) = val.as_object() else { continue };
        if has_usage_fields(nested) {
            let kind = if key.contains("plan") { UsageKind::Plan } else { UsageKind::Package };
            push_candidate(
                &mut candidates,
                key,
                first_field(nested, &["used", "current"]),
                first_field(nested, &["limit", "total"]),
                kind,
            );
        }
        if let Some(items) = nested.get("items").and_then(Value::as_array) {
            for item in items {
                let Some(io) = item.as_object() else { continue };
                let title = io.get("title").and_then(Value::as_str).unwrap_or(key.as_str());
                let kind = match io.get("type").and_then(Value::as_str) {
                    Some("plan") => UsageKind::Plan,
                    _ => UsageKind::Package,
                };
                push_candidate(
                    &mut candidates,
                    title,
                    first_field(io, &["used", "current"]),
                    first_field(io, &["limit", "total"]),
                    kind,
                );
            }
        }
    }

    if candidates.is_empty() {
        return None;
    }
    let items = candidates
        .into_iter()
        .enumerate()
        .map(|(idx, c)| {
            let title = if c.title.is_empty() { FALLBACK_ITEM_TITLE.to_string() } else { c.title };
            UsageItem {
                id: format!("{title}-{idx}"),
                title,
                kind: c.kind,
                current: c.current,
                total: c.total,
                unit: DEFAULT_UNIT.to_string(),
                tag: None,
                reset_time: None,
                expiry_time: None,
            }
        })
        .collect();
    Some(UsageData {
        plan_type: DEFAULT_PLAN_TYPE.to_string(),
        reset_date: String::new(),
        days_remaining: 0,
        items,
    })
}

fn has_usage_fields(obj: &Map<String, Value>) -> bool {
    ["used", "limit", "total", "current"].iter().any(|k| obj.contains_key(*k))
}

// First key that is present and not null, mirroring `a ?? b` on the wire.
fn first_field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k).filter(|v| !v.is_null()))
}

fn push_candidate(
    candidates: &mut Vec<Candidate>,
    title: &str,
    current: Option<&Value>,
    total: Option<&Value>,
    kind: UsageKind,
) {
    let (Some(current), Some(total)) = (coerce_number(current), coerce_number(total)) else {
        return;
    };
    if total > 0.0 {
        candidates.push(Candidate { title: title.to_string(), current, total, kind });
    }
}

// Numbers sometimes arrive as strings in the data islands.
pub(crate) fn coerce_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

pub fn parse_usage_from_html(document: &Html) -> UsageData {
    let raw = body_text(document);
    let mut data = parse_usage_from_text(&raw);
    if data.plan_type.is_empty() {
        data.plan_type = "—".to_string();
    }
    data
}

/// The last-resort strategy: scan visible text lines for `current/total`
/// ratios and reconstruct each quota line from its neighborhood. Titles are
/// looked up backwards (up to 5 lines), reset/expiry annotations and the
/// consuming tag within a ±3-line window. Capped at 10 items so a degenerate
/// page cannot flood the widget.
pub fn parse_usage_from_text(raw: &str) -> UsageData {
    let ratio_re = Regex::new(r"^(\d+(?:\.\d+)?)\s*/\s*(\d+(?:\.\d+)?)$").unwrap();
    let plan_re = Regex::new(r"(?i)You are on\s+(.+?)\s+plan").unwrap();
    let days_re = Regex::new(r"(?i)Usage reset in\s+(\d+)\s+days").unwrap();
    let reset_en_re = Regex::new(r"on\s+(\d{4}/\d{2}/\d{2}\s+\d{2}:\d{2})").unwrap();
    let reset_cn_re =
        Regex::new(r"使用量将于(\d{4}年\s*\d{1,2}月\s*\d{1,2}日\s*\d{2}:\d{2})重置").unwrap();
    let title_keyword_re = Regex::new(r"(?i)Pro plan|Extra package|计划|套餐|礼包").unwrap();
    let title_reject_re = Regex::new(r"(?i)Left|Expire|Reset").unwrap();
    let digit_re = Regex::new(r"\d").unwrap();
    let reset_at_re = Regex::new(r"(?i)Reset at\s+(.+)").unwrap();
    let expire_at_re = Regex::new(r"(?i)Expire at\s+(.+)").unwrap();
    let plan_title_re = Regex::new(r"(?i)Pro plan|专业计划|计划").unwrap();

    let lines = visible_text_lines(raw);

    let plan_type = plan_re
        .captures(raw)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();
    let days_remaining = days_re
        .captures(raw)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);
    let mut reset_date = reset_en_re
        .captures(raw)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();
    if reset_date.is_empty() {
        if let Some(c) = reset_cn_re.captures(raw) {
            reset_date = c[1].trim().to_string();
        }
    }

    let mut items: Vec<UsageItem> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let Some(m) = ratio_re.captures(line) else { continue };
        let current: f64 = m[1].parse().unwrap_or(0.0);
        let total: f64 = m[2].parse().unwrap_or(0.0);

        let mut title = String::new();
        for k in (i.saturating_sub(5)..i).rev() {
            let t = &lines[k];
            if title_keyword_re.is_match(t) {
                title = t.clone();
                break;
            }
            if !digit_re.is_match(t)
                && !t.is_empty()
                && t.chars().count() <= 60
                && !title_reject_re.is_match(t)
            {
                title = t.clone();
                break;
            }
        }

        let mut reset_time = None;
        let mut expiry_time = None;
        let mut tag = None;
        let window_end = (i + 3).min(lines.len() - 1);
        for t in &lines[i.saturating_sub(3)..=window_end] {
            if reset_time.is_none() {
                if let Some(c) = reset_at_re.captures(t) {
                    reset_time = Some(c[1].trim().to_string());
                }
            }
            if expiry_time.is_none() {
                if let Some(c) = expire_at_re.captures(t) {
                    expiry_time = Some(c[1].trim().to_string());
                }
            }
            if t.to_lowercase().contains("consuming") {
                tag = Some("Consuming".to_string());
            }
            if t.contains("消费") {
                tag = Some("消费".to_string());
            }
        }

        if title.is_empty() {
            title = "Usage".to_string();
        }
        let kind = if plan_title_re.is_match(&title) { UsageKind::Plan } else { UsageKind::Package };
        items.push(UsageItem {
            id: format!("{title}-{i}"),
            title,
            kind,
            current,
            total,
            unit: DEFAULT_UNIT.to_string(),
            tag,
            reset_time,
            expiry_time,
        });
        if items.len() >= 10 {
            break;
        }
    }

    UsageData { plan_type, reset_date, days_remaining, items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(html: &str) -> PageSnapshot {
        PageSnapshot { html: html.to_string(), captured_json: None }
    }

    #[test]
    fn json_walk_reads_nested_used_limit_pair() {
        let json = json!({ "premium": { "used": 3, "limit": 10 } });
        let data = extract_usage_from_json(&json).unwrap();
        assert_eq!(data.items.len(), 1);
        let item = &data.items[0];
        assert_eq!(item.title, "premium");
        assert_eq!(item.current, 3.0);
        assert_eq!(item.total, 10.0);
        assert_eq!(item.kind, UsageKind::Package);
        assert_eq!(data.plan_type, DEFAULT_PLAN_TYPE);
        assert_eq!(data.reset_date, "");
    }

    #[test]
    fn json_walk_marks_plan_keys_as_plans() {
        let json = json!({ "pro_plan": { "current": 5, "total": 600 } });
        let data = extract_usage_from_json(&json).unwrap();
        assert_eq!(data.items[0].kind, UsageKind::Plan);
    }

    #[test]
    fn json_walk_rejects_zero_totals_and_misses() {
        assert!(extract_usage_from_json(&json!({ "a": { "used": 1, "limit": 0 } })).is_none());
        assert!(extract_usage_from_json(&json!({ "a": { "used": 1 } })).is_none());
        assert!(extract_usage_from_json(&json!({ "unrelated": { "foo": 1 } })).is_none());
        assert!(extract_usage_from_json(&json!([1, 2, 3])).is_none());
    }

    #[test]
    fn json_walk_expands_items_arrays() {
        let json = json!({
            "quota": {
                "used": 1,
                "limit": 4,
                "items": [
                    { "title": "Fast requests", "type": "plan", "used": 2, "limit": 500 },
                    { "current": "7", "total": "20" }
                ]
            }
        });
        let data = extract_usage_from_json(&json).unwrap();
        assert_eq!(data.items.len(), 3);
        assert_eq!(data.items[1].title, "Fast requests");
        assert_eq!(data.items[1].kind, UsageKind::Plan);
        // untitled item falls back to its parent key, string numbers coerce
        assert_eq!(data.items[2].title, "quota");
        assert_eq!(data.items[2].current, 7.0);
        assert_eq!(data.items[2].total, 20.0);
    }

    #[test]
    fn json_walk_reads_top_level_numbers() {
        let data = extract_usage_from_json(&json!({ "used": 5, "limit": 20 })).unwrap();
        assert_eq!(data.items.len(), 1);
        assert_eq!(data.items[0].title, GENERIC_USAGE_TITLE);
        assert_eq!(data.items[0].kind, UsageKind::Plan);
        assert_eq!(data.items[0].current, 5.0);
        assert_eq!(data.items[0].total, 20.0);
    }

    #[test]
    fn text_heuristic_pairs_ratio_with_preceding_title() {
        let raw = "Extra package\n12.50/100";
        let data = parse_usage_from_text(raw);
        assert_eq!(data.items.len(), 1);
        let item = &data.items[0];
        assert_eq!(item.title, "Extra package");
        assert_eq!(item.kind, UsageKind::Package);
        assert_eq!(item.current, 12.5);
        assert_eq!(item.total, 100.0);
    }

    #[test]
    fn text_heuristic_without_matches_is_empty_not_absent() {
        let data = parse_usage_from_text("nothing to see here");
        assert!(data.items.is_empty());
        assert_eq!(data.reset_date, "");
    }

    #[test]
    fn text_heuristic_reads_page_level_fields() {
        let raw = "You are on Pro plan\nUsage reset in 12 days on 2025/09/01 00:00\nPro plan\n41/600";
        let data = parse_usage_from_text(raw);
        assert_eq!(data.plan_type, "Pro");
        assert_eq!(data.days_remaining, 12);
        assert_eq!(data.reset_date, "2025/09/01 00:00");
        assert_eq!(data.items.len(), 1);
        assert_eq!(data.items[0].kind, UsageKind::Plan);
    }

    #[test]
    fn text_heuristic_reads_chinese_reset_header() {
        let data = parse_usage_from_text("使用量将于2025年 9月 1日 00:00重置");
        assert_eq!(data.reset_date, "2025年 9月 1日 00:00");
    }

    #[test]
    fn text_heuristic_picks_up_annotations_near_the_ratio() {
        let raw = "Extra package\n3/50\nReset at 2025/09/01\nConsuming";
        let item = &parse_usage_from_text(raw).items[0];
        assert_eq!(item.reset_time.as_deref(), Some("2025/09/01"));
        assert_eq!(item.tag.as_deref(), Some("Consuming"));
        assert_eq!(item.expiry_time, None);
    }

    #[test]
    fn text_heuristic_skips_annotation_lines_when_titling() {
        // "Left ..." lines sit between the title and the ratio on the real page
        let raw = "Extra package\nLeft this month\n3/50";
        let item = &parse_usage_from_text(raw).items[0];
        assert_eq!(item.title, "Extra package");
    }

    #[test]
    fn text_heuristic_caps_at_ten_items() {
        let raw = (0..15).map(|i| format!("{i}/100")).collect::<Vec<_>>().join("\n");
        let data = parse_usage_from_text(&raw);
        assert_eq!(data.items.len(), 10);
    }

    #[test]
    fn snapshot_prefers_next_data_island_over_text() {
        let html = r#"<html><body>
            <script id="__NEXT_DATA__" type="application/json">{"quota":{"used":9,"limit":600}}</script>
            <div>Extra package</div>
            <div>1/50</div>
        </body></html>"#;
        let data = extract_usage(&snapshot(html)).unwrap();
        assert_eq!(data.items.len(), 1);
        assert_eq!(data.items[0].title, "quota");
    }

    #[test]
    fn snapshot_falls_back_to_captured_json_then_text() {
        let html = "<html><body>\n<div>Extra package</div>\n<div>1/50</div>\n</body></html>";
        let mut snap = snapshot(html);
        snap.captured_json = Some(json!({ "usage_plan": { "used": 2, "limit": 30 } }));
        let data = extract_usage(&snap).unwrap();
        assert_eq!(data.items[0].title, "usage_plan");

        let data = extract_usage(&snapshot(html)).unwrap();
        assert_eq!(data.items[0].title, "Extra package");
    }

    #[test]
    fn snapshot_with_nothing_extractable_is_none() {
        assert!(extract_usage(&snapshot("<html><body><p>login required</p></body></html>")).is_none());
    }

    #[test]
    fn items_serialize_with_wire_field_names() {
        let json = json!({ "plan_quota": { "used": 1, "limit": 2 } });
        let data = extract_usage_from_json(&json).unwrap();
        let wire = serde_json::to_value(&data).unwrap();
        assert_eq!(wire["planType"], DEFAULT_PLAN_TYPE);
        assert_eq!(wire["daysRemaining"], 0);
        assert_eq!(wire["items"][0]["type"], "plan");
        assert!(wire["items"][0].get("tag").is_none());
    }
}
