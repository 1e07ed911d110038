use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, TimeZone};
use log::debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::page_loader::PageSnapshot;
use crate::text_manipulators::{
    embedded_json_islands, extract_text, inline_style_value, next_data_json, parse_css_number,
};

const BOARD_TITLE: &str = "活跃看板";

// Column step assumed when a row's cells don't reveal their spacing.
const DEFAULT_COLUMN_STEP: f64 = 16.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveDayCell {
    pub date: String,
    pub level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveDaysData {
    pub title: String,
    pub months: Vec<String>,
    pub cells: Vec<ActiveDayCell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_html: Option<String>,
}

/// Runs the activity extraction strategies over one snapshot of the profile
/// page: JSON data islands, a document-wide SVG rect scan, the grid DOM
/// attribute scan, the geometric row/column reconstruction, and finally the
/// raw grid markup. `today` anchors the geometric fallback's date math.
pub fn extract_active_days(snapshot: &PageSnapshot, today: NaiveDate) -> Option<ActiveDaysData> {
    let document = Html::parse_document(&snapshot.html);

    if let Some(json) = next_data_json(&document) {
        let sketches = sketches_from_json(&json);
        if !sketches.is_empty() {
            return Some(board(merged(sketches), None));
        }
    }
    for json in embedded_json_islands(&document) {
        let sketches = sketches_from_json(&json);
        if !sketches.is_empty() {
            return Some(board(merged(sketches), None));
        }
    }

    let mut map = HashMap::new();
    scan_rects(&document, &mut map);
    if !map.is_empty() {
        return Some(board(sorted_cells(map), None));
    }

    debug!("active days: no data island or dated rect, scanning the grid DOM");
    let container = find_grid_container(&document)?;
    scan_grid_attributes(container, &mut map);
    if map.is_empty() {
        reconstruct_from_layout(container, today, &mut map);
    }
    if !map.is_empty() {
        return Some(board(sorted_cells(map), grid_markup(&document)));
    }

    // Structured extraction failed outright; hand the presentation layer the
    // raw grid markup so it can at least render something.
    match grid_markup(&document) {
        Some(html) if !html.is_empty() => Some(board(Vec::new(), Some(html))),
        _ => None,
    }
}

fn board(cells: Vec<ActiveDayCell>, grid_html: Option<String>) -> ActiveDaysData {
    ActiveDaysData { title: BOARD_TITLE.to_string(), months: Vec::new(), cells, grid_html }
}

/// One element's worth of evidence about a day, before merging. `None` means
/// the source had no finite value, which must never clobber one that did.
struct CellSketch {
    date: String,
    level: Option<u8>,
    count: Option<u64>,
}

fn merge_cell(map: &mut HashMap<String, ActiveDayCell>, date: &str, level: Option<u8>, count: Option<u64>) {
    match map.get_mut(date) {
        None => {
            map.insert(
                date.to_string(),
                ActiveDayCell { date: date.to_string(), level: level.unwrap_or(0), count },
            );
        }
        Some(cell) => {
            if let Some(level) = level {
                cell.level = level;
            }
            if let Some(count) = count {
                cell.count = Some(count);
            }
        }
    }
}

fn merged(sketches: Vec<CellSketch>) -> Vec<ActiveDayCell> {
    let mut map = HashMap::new();
    for sketch in sketches {
        merge_cell(&mut map, &sketch.date, sketch.level, sketch.count);
    }
    sorted_cells(map)
}

fn sorted_cells(map: HashMap<String, ActiveDayCell>) -> Vec<ActiveDayCell> {
    let mut cells: Vec<ActiveDayCell> = map.into_values().collect();
    cells.sort_by(|a, b| a.date.cmp(&b.date));
    cells
}

/// Recursive walk over an embedded JSON tree. Any object pairing a date-like
/// field with a level-like or count-like one becomes a cell; two-element
/// `[date, number]` arrays are taken as `[date, count]`.
pub fn extract_active_cells_from_json(json: &Value) -> Vec<ActiveDayCell> {
    sketches_from_json(json)
        .into_iter()
        .map(|s| ActiveDayCell { date: s.date, level: s.level.unwrap_or(0), count: s.count })
        .collect()
}

fn sketches_from_json(json: &Value) -> Vec<CellSketch> {
    let mut out = Vec::new();
    walk_json(json, &mut out);
    out
}

fn walk_json(value: &Value, out: &mut Vec<CellSketch>) {
    match value {
        Value::Array(arr) => {
            if arr.len() == 2
                && !arr[0].is_object()
                && !arr[0].is_array()
                && !arr[0].is_null()
                && arr[1].is_number()
            {
                push_sketch(out, &arr[0], None, Some(&arr[1]));
                return;
            }
            for v in arr {
                walk_json(v, out);
            }
        }
        Value::Object(obj) => {
            let field = |keys: &[&str]| keys.iter().find_map(|k| obj.get(*k).filter(|v| !v.is_null()));
            let date = field(&["date", "day", "dt", "timestamp", "createdAt"]);
            let level = field(&["level", "intensity", "value"]);
            let count = field(&["count", "times", "frequency"]);
            if let Some(date) = date {
                if level.is_some() || count.is_some() {
                    push_sketch(out, date, level, count);
                }
            }
            for v in obj.values() {
                walk_json(v, out);
            }
        }
        _ => {}
    }
}

fn push_sketch(out: &mut Vec<CellSketch>, date: &Value, level: Option<&Value>, count: Option<&Value>) {
    let date = normalize_json_date(date);
    if date.is_empty() {
        return;
    }
    let level = crate::usage_scraper::coerce_number(level).map(clamp_level);
    let count = crate::usage_scraper::coerce_number(count).map(|c| c.max(0.0) as u64);
    if level.is_some() || count.is_some() {
        out.push(CellSketch { date, level, count });
    }
}

/// Numeric dates are unix timestamps, seconds below the 1e12 mark and
/// milliseconds above it. String dates pass through `to_date_key` when they
/// match a known shape, verbatim otherwise.
fn normalize_json_date(value: &Value) -> String {
    match value {
        Value::Number(n) => {
            let Some(v) = n.as_f64().filter(|v| v.is_finite()) else { return String::new() };
            let ms = if v > 1e12 { v } else { v * 1000.0 };
            match chrono::Local.timestamp_millis_opt(ms as i64) {
                chrono::LocalResult::Single(dt) => dt.date_naive().format("%Y-%m-%d").to_string(),
                _ => String::new(),
            }
        }
        Value::String(s) => to_date_key(s).unwrap_or_else(|| s.clone()),
        _ => String::new(),
    }
}

/// Normalizes the date strings the grid exposes: ISO-like `YYYY-MM-DD` with
/// `-`, `/` or no separator, or `D Mon YYYY`.
pub fn to_date_key(raw: &str) -> Option<String> {
    let iso_re = Regex::new(r"(\d{4})[-/]?(\d{2})[-/]?(\d{2})").unwrap();
    if let Some(c) = iso_re.captures(raw) {
        return Some(format!("{}-{}-{}", &c[1], &c[2], &c[3]));
    }
    let named_re = Regex::new(
        r"(?i)(\d{1,2})\s+(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+(\d{4})",
    )
    .unwrap();
    let c = named_re.captures(raw)?;
    let months = [
        ("jan", "01"), ("feb", "02"), ("mar", "03"), ("apr", "04"),
        ("may", "05"), ("jun", "06"), ("jul", "07"), ("aug", "08"),
        ("sep", "09"), ("oct", "10"), ("nov", "11"), ("dec", "12"),
    ];
    let month_key = c[2].to_lowercase();
    let mm = months
        .iter()
        .find(|(name, _)| *name == month_key)
        .map(|(_, num)| *num)
        .unwrap_or("01");
    Some(format!("{}-{}-{:0>2}", &c[3], mm, &c[1]))
}

pub(crate) fn level_for_luminance(v: f64) -> u8 {
    if v < 40.0 {
        0
    } else if v < 80.0 {
        1
    } else if v < 120.0 {
        2
    } else if v < 160.0 {
        3
    } else {
        4
    }
}

fn clamp_level(v: f64) -> u8 {
    v.clamp(0.0, 4.0) as u8
}

// Brightest channel of a `#rrggbb` or `rgb(r, g, b)` color.
fn color_max_channel(color: &str) -> Option<f64> {
    let hex_re = Regex::new(r"#([0-9a-fA-F]{6})").unwrap();
    if let Some(c) = hex_re.captures(color) {
        let hex = &c[1];
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        return Some(r.max(g).max(b) as f64);
    }
    let rgb_re = Regex::new(r"(?i)rgb\s*\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*\)").unwrap();
    let c = rgb_re.captures(color)?;
    let r: u32 = c[1].parse().ok()?;
    let g: u32 = c[2].parse().ok()?;
    let b: u32 = c[3].parse().ok()?;
    Some(r.max(g).max(b) as f64)
}

/// Document-wide scan of `<rect>` elements carrying a date attribute; the
/// calendar is SVG-rendered on some page revisions. No merging subtleties
/// here beyond the shared date-keyed map.
fn scan_rects(document: &Html, map: &mut HashMap<String, ActiveDayCell>) {
    let rect_selector = Selector::parse("rect").unwrap();
    for rect in document.select(&rect_selector) {
        let raw_date = rect
            .value()
            .attr("data-date")
            .or_else(|| rect.value().attr("aria-label"))
            .or_else(|| rect.value().attr("title"))
            .unwrap_or("")
            .trim();
        let Some(date) = to_date_key(raw_date) else { continue };

        let mut level = rect
            .value()
            .attr("data-level")
            .and_then(|s| s.trim().parse::<f64>().ok())
            .map(clamp_level);
        if level.is_none() {
            if let Some(fill) = rect.value().attr("fill") {
                level = color_max_channel(fill).map(level_for_luminance);
            }
        }
        let count = rect
            .value()
            .attr("data-count")
            .and_then(|s| s.trim().parse::<u64>().ok());

        if level.is_some() || count.is_some() {
            merge_cell(map, &date, level, count);
        }
    }
}

/// Attribute scan of the best-guess grid container: every element with a
/// date in `data-date`/`title`/`aria-label` becomes a cell; level and count
/// fall through their respective heuristic chains. Later elements back-fill
/// missing values but never replace a finite one with a miss.
fn scan_grid_attributes(container: ElementRef, map: &mut HashMap<String, ActiveDayCell>) {
    let candidate_selector = Selector::parse(
        r#"[data-date],[aria-label],[title],rect,[role="gridcell"],div,span"#,
    )
    .unwrap();
    for el in container.select(&candidate_selector) {
        let raw_date = el
            .value()
            .attr("data-date")
            .or_else(|| el.value().attr("title"))
            .or_else(|| el.value().attr("aria-label"))
            .unwrap_or("")
            .trim();
        let Some(date) = to_date_key(raw_date) else { continue };
        merge_cell(map, &date, level_from(el), count_from(el));
    }
}

/// Level heuristic chain: `data-level`, a `level-N` class suffix, an inline
/// background color, then an embedded SVG rect fill.
fn level_from(el: ElementRef) -> Option<u8> {
    if let Some(dl) = el.value().attr("data-level").and_then(|s| s.trim().parse::<f64>().ok()) {
        return Some(clamp_level(dl));
    }
    if let Some(class) = el.value().attr("class") {
        let class_re = Regex::new(r"(?i)level[-_\s]?(\d)").unwrap();
        if let Some(c) = class_re.captures(class) {
            return c[1].parse::<f64>().ok().map(clamp_level);
        }
    }
    if let Some(bg) = el
        .value()
        .attr("style")
        .and_then(|style| inline_style_value(style, "background-color"))
    {
        if let Some(v) = color_max_channel(bg) {
            return Some(level_for_luminance(v));
        }
    }
    svg_rect_level(el)
}

fn count_from(el: ElementRef) -> Option<u64> {
    if let Some(dc) = el.value().attr("data-count") {
        if !dc.is_empty() && dc.bytes().all(|b| b.is_ascii_digit()) {
            return dc.parse().ok();
        }
    }
    let aria = el.value().attr("aria-label")?;
    let count_re = Regex::new(r"(?i)(\d+)\s*(activity|次|条|events?)").unwrap();
    count_re.captures(aria).and_then(|c| c[1].parse().ok())
}

// Fill color of an embedded SVG day icon, scaled by its opacity.
fn svg_rect_level(el: ElementRef) -> Option<u8> {
    let rect_selector = Selector::parse("svg rect").unwrap();
    let rect = el.select(&rect_selector).next()?;
    let fill = rect.value().attr("fill").unwrap_or("");
    let opacity = rect
        .value()
        .attr("fill-opacity")
        .or_else(|| rect.value().attr("opacity"))
        .and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(1.0);
    let v = color_max_channel(fill)? * opacity;
    Some(level_for_luminance(v))
}

/// Last structured resort: no element carries a date, so rows are grouped by
/// their inline `top` offset and columns snapped from `left` offsets, then
/// dates are back-computed from `today` with the bottom row as the current
/// Monday-based week.
fn reconstruct_from_layout(
    container: ElementRef,
    today: NaiveDate,
    map: &mut HashMap<String, ActiveDayCell>,
) {
    let row_selector = Selector::parse(r#"[class*="weekRow"],[style*="top:"]"#).unwrap();
    let cell_selector = Selector::parse(r#"[class*="calendarDay"],div,span"#).unwrap();

    let mut rows: Vec<(ElementRef, f64)> = container
        .select(&row_selector)
        .map(|el| (el, style_offset(el, "top")))
        .collect();
    rows.sort_by(|a, b| a.1.total_cmp(&b.1));

    let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    let row_count = rows.len();
    for (ri, (row_el, _)) in rows.iter().enumerate() {
        let cells: Vec<ElementRef> = row_el.select(&cell_selector).collect();
        let mut lefts: Vec<f64> = cells.iter().map(|c| style_offset(*c, "left")).collect();
        lefts.sort_by(|a, b| a.total_cmp(b));
        let mut step = DEFAULT_COLUMN_STEP;
        if lefts.len() > 1 {
            let min_gap = lefts.windows(2).map(|w| w[1] - w[0]).fold(f64::INFINITY, f64::min);
            if min_gap.is_finite() && min_gap > 0.0 {
                step = min_gap;
            }
        }
        for cell in &cells {
            let col = (style_offset(*cell, "left") / step).round() as i64;
            let weeks_back = (row_count - 1 - ri) as i64;
            let date = monday + Duration::days(col - 7 * weeks_back);
            let key = date.format("%Y-%m-%d").to_string();
            merge_cell(map, &key, svg_rect_level(*cell), None);
        }
    }
}

fn style_offset(el: ElementRef, property: &str) -> f64 {
    el.value()
        .attr("style")
        .and_then(|style| inline_style_value(style, property))
        .and_then(parse_css_number)
        .unwrap_or(0.0)
}

fn find_grid_container(document: &Html) -> Option<ElementRef<'_>> {
    for css in ["#calendarGrid", r#"[id*="calendarGrid"],[class*="calendarGrid"],[role="grid"]"#] {
        let selector = Selector::parse(css).unwrap();
        if let Some(el) = document.select(&selector).next() {
            return Some(el);
        }
    }
    if let Some(el) = heading_proximity_container(document) {
        return Some(el);
    }
    let body_selector = Selector::parse("body").unwrap();
    document.select(&body_selector).next()
}

// The grid rarely advertises itself; walk up from the board's heading until
// an ancestor with real content shows up.
fn heading_proximity_container(document: &Html) -> Option<ElementRef<'_>> {
    let title_selector = Selector::parse("h1,h2,h3,div,span").unwrap();
    let title_re = Regex::new(r"(?i)Active\s*Days|活跃日|活跃看板").unwrap();
    let content_selector = Selector::parse("div,section").unwrap();

    let title_node = document
        .select(&title_selector)
        .find(|el| title_re.is_match(&extract_text(*el)))?;
    let mut parent = title_node.parent().and_then(ElementRef::wrap);
    for _ in 0..5 {
        let p = parent?;
        if p.select(&content_selector).next().is_some() {
            return Some(p);
        }
        parent = p.parent().and_then(ElementRef::wrap);
    }
    None
}

fn grid_markup(document: &Html) -> Option<String> {
    for css in [
        ".section-SqHrr3",
        ".calendarGrid-CKzXol",
        "#calendarGrid",
        r#"[class*="calendarGrid"],[role="grid"]"#,
    ] {
        let selector = Selector::parse(css).unwrap();
        if let Some(el) = document.select(&selector).next() {
            return Some(el.html());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(html: &str) -> PageSnapshot {
        PageSnapshot { html: html.to_string(), captured_json: None }
    }

    fn a_thursday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 7).unwrap()
    }

    #[test]
    fn date_key_normalizes_all_three_iso_shapes() {
        assert_eq!(to_date_key("2024/03/05").as_deref(), Some("2024-03-05"));
        assert_eq!(to_date_key("2024-03-05").as_deref(), Some("2024-03-05"));
        assert_eq!(to_date_key("20240305").as_deref(), Some("2024-03-05"));
        assert_eq!(to_date_key("5 Mar 2024").as_deref(), Some("2024-03-05"));
        assert_eq!(to_date_key("5 March 2024").as_deref(), Some("2024-03-05"));
        assert_eq!(to_date_key("today"), None);
    }

    #[test]
    fn luminance_levels_are_monotonic() {
        assert_eq!(level_for_luminance(35.0), 0);
        assert_eq!(level_for_luminance(45.0), 1);
        assert_eq!(level_for_luminance(90.0), 2);
        assert_eq!(level_for_luminance(130.0), 3);
        assert_eq!(level_for_luminance(200.0), 4);
    }

    #[test]
    fn json_walk_pairs_dates_with_levels_and_counts() {
        let json = json!({
            "board": [
                { "date": "2024-03-01", "level": 2 },
                { "day": "2024/03/02", "value": "3", "times": 7 },
                { "created": "ignored, no level or count", "date": "2024-03-03" }
            ]
        });
        let cells = extract_active_cells_from_json(&json);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0], ActiveDayCell { date: "2024-03-01".into(), level: 2, count: None });
        assert_eq!(cells[1], ActiveDayCell { date: "2024-03-02".into(), level: 3, count: Some(7) });
    }

    #[test]
    fn json_walk_reads_unix_timestamps_at_both_magnitudes() {
        // 2024-03-05T12:00:00Z, once in seconds and once in milliseconds
        let json = json!([
            { "timestamp": 1709640000, "level": 1 },
            { "timestamp": 1709640000000i64, "level": 4 }
        ]);
        let cells = extract_active_cells_from_json(&json);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].date, cells[1].date);
        assert_eq!(cells[0].date, "2024-03-05");
    }

    #[test]
    fn json_walk_takes_two_element_arrays_as_date_count() {
        let json = json!({ "series": [["2024-03-01", 5], ["2024-03-02", 2]] });
        let cells = extract_active_cells_from_json(&json);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].count, Some(5));
        assert_eq!(cells[0].level, 0);
    }

    #[test]
    fn dom_scan_merges_asymmetrically() {
        let html = r#"<html><body><div id="calendarGrid">
            <span data-date="2024-03-05" data-level="3"></span>
            <span data-date="2024/03/05" data-count="7"></span>
            <span data-date="2024-03-05"></span>
            <span title="20240306" style="background-color: rgb(150,150,150)"></span>
            <span aria-label="6 Mar 2024, 2 events"></span>
        </div></body></html>"#;
        let data = extract_active_days(&snapshot(html), a_thursday()).unwrap();
        assert_eq!(data.cells.len(), 2);
        // the count-only and attribute-less elements back-filled but never
        // clobbered the level found first
        assert_eq!(data.cells[0], ActiveDayCell { date: "2024-03-05".into(), level: 3, count: Some(7) });
        assert_eq!(data.cells[1], ActiveDayCell { date: "2024-03-06".into(), level: 3, count: Some(2) });
        assert!(data.grid_html.is_some());
    }

    #[test]
    fn dom_scan_is_idempotent() {
        let html = r#"<html><body><div role="grid">
            <div data-date="2024-03-05" class="day level-2"></div>
            <div data-date="2024-03-06" data-level="4" data-count="9"></div>
        </div></body></html>"#;
        let first = extract_active_days(&snapshot(html), a_thursday()).unwrap();
        let second = extract_active_days(&snapshot(html), a_thursday()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.cells.len(), 2);
        assert_eq!(first.cells[0].level, 2);
    }

    #[test]
    fn rect_scan_prefers_data_level_over_fill() {
        let html = r##"<html><body><svg>
            <rect data-date="2024-03-05" data-level="1" fill="#c8c8c8"/>
            <rect data-date="2024-03-06" fill="#c8c8c8"/>
            <rect data-date="2024-03-07" fill="rgb(100, 100, 100)"/>
            <rect data-date="2024-03-08"/>
        </svg></body></html>"##;
        let data = extract_active_days(&snapshot(html), a_thursday()).unwrap();
        assert_eq!(data.cells.len(), 3);
        assert_eq!(data.cells[0].level, 1);
        assert_eq!(data.cells[1].level, 4);
        assert_eq!(data.cells[2].level, 2);
        assert!(data.grid_html.is_none());
    }

    #[test]
    fn geometric_fallback_back_computes_dates_from_today() {
        let html = r##"<html><body><div id="calendarGrid">
            <div style="top: 0px">
                <span style="left: 0px"><svg><rect fill="#c8c8c8"/></svg></span>
                <span style="left: 16px"><svg><rect fill="#202020"/></svg></span>
            </div>
            <div style="top: 20px">
                <span style="left: 16px"><svg><rect fill="rgb(100,100,100)" fill-opacity="0.5"/></svg></span>
            </div>
        </div></body></html>"##;
        // today 2025-08-07 (Thu) -> current week starts Monday 2025-08-04
        let data = extract_active_days(&snapshot(html), a_thursday()).unwrap();
        let dates: Vec<&str> = data.cells.iter().map(|c| c.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-07-28", "2025-07-29", "2025-08-05"]);
        assert_eq!(data.cells[0].level, 4);
        assert_eq!(data.cells[1].level, 0);
        // rgb(100,..) at half opacity lands in the 40..80 band
        assert_eq!(data.cells[2].level, 1);
    }

    #[test]
    fn raw_markup_fallback_when_nothing_is_structured() {
        let html = r#"<html><body>
            <div class="calendarGrid-CKzXol"><i>opaque markup</i></div>
        </body></html>"#;
        let data = extract_active_days(&snapshot(html), a_thursday()).unwrap();
        assert!(data.cells.is_empty());
        let grid = data.grid_html.unwrap();
        assert!(grid.contains("opaque markup"));
        assert!(grid.starts_with("<div"));
    }

    #[test]
    fn nothing_extractable_is_none() {
        let html = "<html><body><p>profile page without a board</p></body></html>";
        assert!(extract_active_days(&snapshot(html), a_thursday()).is_none());
    }

    #[test]
    fn data_island_wins_over_dom_cells() {
        let html = r#"<html><body>
            <script id="__NEXT_DATA__" type="application/json">{"days":[{"date":"2024-01-01","level":4}]}</script>
            <div id="calendarGrid"><span data-date="2024-02-02" data-level="1"></span></div>
        </body></html>"#;
        let data = extract_active_days(&snapshot(html), a_thursday()).unwrap();
        assert_eq!(data.cells.len(), 1);
        assert_eq!(data.cells[0].date, "2024-01-01");
    }

    #[test]
    fn heading_proximity_finds_an_unmarked_grid() {
        let html = r#"<html><body>
            <section>
                <h2>Active Days</h2>
                <div>
                    <span data-date="2024-03-05" data-level="2"></span>
                </div>
            </section>
        </body></html>"#;
        let data = extract_active_days(&snapshot(html), a_thursday()).unwrap();
        assert_eq!(data.cells.len(), 1);
        assert_eq!(data.cells[0].level, 2);
    }
}
