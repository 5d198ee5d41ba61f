//! Effect text reflow: fits a card description into a fixed box.
//!
//! # Pipeline
//! 1. `format_card_desc` normalizes the raw text once (fullwidth ASCII, newlines,
//!    editorial notes, list-marker spacing).
//! 2. For each candidate font size, from `DEFAULT_FONT_SIZE_PT` down to
//!    `MIN_FONT_SIZE_PT` in `FONT_SIZE_STEP_PT` steps:
//!    - `split_text_to_lines` greedy-wraps every paragraph to the box width,
//!    - `apply_list_tail_rule` moves list markers stranded at a line end down to
//!      their content,
//!    - `apply_leading_punctuation_rule` pulls punctuation stranded at a line
//!      start back up.
//! 3. The first size whose `lines × size` fits the box height wins. If none does,
//!    the floor size is returned with overflowing lines.
//!
//! # Reflow invariant
//! Both rules re-derive every affected line by feeding text back through the
//! wrapper. Each wrapped line remembers whether it ended a paragraph
//! (`hard_break`) or was a width-driven wrap; rejoining uses `'\n'` only for the
//! former, so a previous pass never freezes a soft wrap into a hard newline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::font_metrics::{TextMeasure, MM_PER_POINT};

pub const DEFAULT_FONT_SIZE_PT: f32 = 8.0;
pub const MIN_FONT_SIZE_PT: f32 = 4.0;
pub const FONT_SIZE_STEP_PT: f32 = 0.25;
/// Total horizontal padding inside a text box, split evenly left and right.
pub const TEXT_HORIZONTAL_PADDING_MM: f32 = 1.0;
/// Baseline offset from the line top, as a fraction of the font size.
pub const ASCENT_RATIO: f32 = 0.8;

/// Glyphs that introduce an enumerated effect clause.
const LIST_MARKERS: [char; 11] = ['●', '①', '②', '③', '④', '⑤', '⑥', '⑦', '⑧', '⑨', '⑩'];
const CIRCLED_NUMBERS: [char; 10] = ['①', '②', '③', '④', '⑤', '⑥', '⑦', '⑧', '⑨', '⑩'];
const BULLET: char = '●';
const PUNCTUATION: [char; 14] = [
    '，', '。', '．', '、', '！', '？', '：', '；', ',', '.', '!', '?', ':', ';',
];
const FULL_STOP: char = '。';
const EDITORIAL_NOTE_OPEN: &str = "（注：";

const PENDULUM_SECTION: &str = "【灵摆效果】";
const MONSTER_SECTION: &str = "【怪兽效果】";

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Output of the font-size search. `lines` keeps paragraph order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrapResult {
    pub lines: Vec<String>,
    pub font_size: f32,
}

impl WrapResult {
    pub fn height_mm(&self) -> f32 {
        self.lines.len() as f32 * self.font_size * MM_PER_POINT
    }
}

/// One wrapped line plus how it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedLine {
    pub text: String,
    /// True when the line ends a paragraph rather than being wrapped for width.
    pub hard_break: bool,
}

impl WrappedLine {
    fn soft(text: String) -> Self {
        Self {
            text,
            hard_break: false,
        }
    }

    fn hard(text: String) -> Self {
        Self {
            text,
            hard_break: true,
        }
    }
}

/// Box geometry and font size shared by every wrapping stage of one attempt.
pub struct WrapContext<'a> {
    pub measure: &'a dyn TextMeasure,
    pub max_width_mm: f32,
    pub font_size_pt: f32,
}

impl WrapContext<'_> {
    fn width(&self, text: &str) -> f32 {
        self.measure.text_width_mm(text, self.font_size_pt)
    }
}

/// The two independently laid-out halves of a pendulum card's description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendulumSections {
    pub pendulum: String,
    pub monster: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("text box must have positive size, got {width_mm}mm × {height_mm}mm")]
pub struct InvalidTextBox {
    pub width_mm: f32,
    pub height_mm: f32,
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Lays out `raw` inside a `width_mm × height_mm` box at the largest font size that fits.
///
/// Normalization runs once; wrapping and both typographic rules rerun from scratch
/// for every candidate size. Overflow at the floor size is not an error.
pub fn layout_text_with_constraints(
    measure: &dyn TextMeasure,
    raw: &str,
    width_mm: f32,
    height_mm: f32,
) -> Result<WrapResult, InvalidTextBox> {
    let max_width_mm = width_mm - TEXT_HORIZONTAL_PADDING_MM;
    if !(max_width_mm > 0.0 && height_mm > 0.0) {
        return Err(InvalidTextBox {
            width_mm,
            height_mm,
        });
    }

    let desc = format_card_desc(raw);
    let mut font_size_pt = DEFAULT_FONT_SIZE_PT;

    loop {
        let ctx = WrapContext {
            measure,
            max_width_mm,
            font_size_pt,
        };
        let result = WrapResult {
            lines: wrap_with_rules(&ctx, &desc)
                .into_iter()
                .map(|l| l.text)
                .collect(),
            font_size: font_size_pt,
        };

        if result.height_mm() <= height_mm || font_size_pt - FONT_SIZE_STEP_PT < MIN_FONT_SIZE_PT {
            return Ok(result);
        }
        font_size_pt -= FONT_SIZE_STEP_PT;
    }
}

/// Wraps already-normalized text and applies both typographic rules.
pub fn wrap_with_rules(ctx: &WrapContext<'_>, desc: &str) -> Vec<WrappedLine> {
    let lines = split_text_to_lines(ctx, desc);
    let lines = apply_list_tail_rule(ctx, lines);
    apply_leading_punctuation_rule(ctx, lines)
}

// ────────────────────────────────────────────────────────────────────────────
// Normalization
// ────────────────────────────────────────────────────────────────────────────

/// Cleans raw card text before layout.
///
/// - printable ASCII (`!`..`~`) becomes its fullwidth form
/// - katakana middle dot `・` becomes the interpunct `·`
/// - CRLF becomes LF
/// - editorial notes `（注：…` are dropped up to and including the next whitespace run
/// - whitespace between `。` and a circled number is removed
/// - whitespace before `●` is removed when the bullet's line contains a later `。`
pub fn format_card_desc(raw: &str) -> String {
    let widened: String = raw
        .chars()
        .map(|c| match c {
            '!'..='~' => char::from_u32(c as u32 + 0xFEE0).unwrap_or(c),
            '・' => '·',
            _ => c,
        })
        .collect();

    let desc = widened.replace("\r\n", "\n");
    let desc = strip_editorial_notes(&desc);
    let desc = collapse_space_before_circled_number(&desc);
    collapse_space_before_bullet(&desc)
}

fn strip_editorial_notes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let open: Vec<char> = EDITORIAL_NOTE_OPEN.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i..].starts_with(&open) {
            let mut j = i + open.len();
            while j < chars.len() && !chars[j].is_whitespace() {
                j += 1;
            }
            let space_start = j;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            // A note that never reaches whitespace is left untouched.
            if j > space_start {
                i = j;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn collapse_space_before_circled_number(text: &str) -> String {
    remove_whitespace_runs(text, |chars, start, end| {
        start > 0
            && chars[start - 1] == FULL_STOP
            && chars.get(end).is_some_and(|c| CIRCLED_NUMBERS.contains(c))
    })
}

fn collapse_space_before_bullet(text: &str) -> String {
    remove_whitespace_runs(text, |chars, _start, end| {
        if chars.get(end) != Some(&BULLET) {
            return false;
        }
        chars[end + 1..]
            .iter()
            .take_while(|c| !is_line_terminator(**c))
            .any(|c| *c == FULL_STOP)
    })
}

/// Drops every maximal whitespace run `chars[start..end]` for which `should_remove` holds.
fn remove_whitespace_runs<F>(text: &str, should_remove: F) -> String
where
    F: Fn(&[char], usize, usize) -> bool,
{
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_whitespace() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if !should_remove(&chars, start, i) {
            out.extend(&chars[start..i]);
        }
    }
    out
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

// ────────────────────────────────────────────────────────────────────────────
// Greedy wrap
// ────────────────────────────────────────────────────────────────────────────

/// Greedy character-level wrap of newline-delimited paragraphs.
///
/// A blank paragraph becomes an empty line. Punctuation that would overflow is
/// kept on the current line and the break moves to the next non-punctuation
/// character, so closing punctuation never opens a line.
pub fn split_text_to_lines(ctx: &WrapContext<'_>, text: &str) -> Vec<WrappedLine> {
    let mut lines = Vec::new();

    for segment in text.split('\n') {
        if segment.trim().is_empty() {
            lines.push(WrappedLine::hard(String::new()));
            continue;
        }

        let mut line = String::new();
        for ch in segment.chars() {
            let mut next = line.clone();
            next.push(ch);

            if line.is_empty() || is_punctuation(ch) || ctx.width(&next) <= ctx.max_width_mm {
                line = next;
            } else {
                lines.push(WrappedLine::soft(std::mem::take(&mut line)));
                line.push(ch);
            }
        }
        lines.push(WrappedLine::hard(line));
    }
    lines
}

/// Rebuilds wrapper input from wrapped lines: soft wraps rejoin directly,
/// paragraph ends rejoin with `'\n'`.
pub fn join_lines(lines: &[WrappedLine]) -> String {
    let mut text = String::new();
    for (i, line) in lines.iter().enumerate() {
        text.push_str(&line.text);
        if i + 1 < lines.len() && line.hard_break {
            text.push('\n');
        }
    }
    text
}

// ────────────────────────────────────────────────────────────────────────────
// Typographic rules
// ────────────────────────────────────────────────────────────────────────────

/// No line may end with a list marker, alone or followed by a colon.
///
/// The first offending line is split into its marker-free prefix (kept, ending the
/// paragraph there) and a tail of marker + every following line, which is rewrapped.
/// Repeats until clean, bounded by twice the initial line count.
pub fn apply_list_tail_rule(ctx: &WrapContext<'_>, lines: Vec<WrappedLine>) -> Vec<WrappedLine> {
    let mut result = lines;
    let max_iterations = result.len() * 2;

    for _ in 0..max_iterations {
        let Some((i, suffix_start)) = result
            .iter()
            .enumerate()
            .find_map(|(i, line)| list_tail_start(&line.text).map(|s| (i, s)))
        else {
            break;
        };

        let offending = &result[i];
        let trimmed: Vec<char> = offending.text.trim_end().chars().collect();
        let prefix: String = trimmed[..suffix_start].iter().collect();
        let prefix = prefix.trim_end().to_string();
        let mut tail_text: String = trimmed[suffix_start..].iter().collect();

        let rest = join_lines(&result[i + 1..]);
        if !rest.is_empty() {
            if offending.hard_break {
                tail_text.push('\n');
            }
            tail_text.push_str(&rest);
        }

        let tail_lines = split_text_to_lines(ctx, &tail_text);
        let mut next: Vec<WrappedLine> = result[..i].to_vec();
        if !prefix.is_empty() {
            next.push(WrappedLine::hard(prefix));
        }
        next.extend(tail_lines);
        result = next;
    }
    result
}

/// No line after the first may start with punctuation (list markers exempt).
///
/// The first offending line and its predecessor are rejoined with everything
/// after them and rewrapped. Same iteration bound as the list-tail rule.
pub fn apply_leading_punctuation_rule(
    ctx: &WrapContext<'_>,
    lines: Vec<WrappedLine>,
) -> Vec<WrappedLine> {
    let mut result = lines;
    let max_iterations = result.len() * 2;

    for _ in 0..max_iterations {
        let Some(i) = (1..result.len()).find(|&i| starts_with_punctuation(&result[i].text)) else {
            break;
        };

        let merged = join_lines(&result[i - 1..]);
        let mut next: Vec<WrappedLine> = result[..i - 1].to_vec();
        next.extend(split_text_to_lines(ctx, &merged));
        result = next;
    }
    result
}

/// Char index where the trailing run of list markers (plus an optional colon) begins,
/// ignoring trailing whitespace. Adjacent markers such as `①③` move together.
fn list_tail_start(line: &str) -> Option<usize> {
    let chars: Vec<char> = line.trim_end().chars().collect();
    let mut end = chars.len();
    if matches!(chars.last(), Some(':' | '：')) {
        end -= 1;
    }

    let mut start = end;
    while start > 0 && is_list_marker(chars[start - 1]) {
        start -= 1;
    }
    (start < end).then_some(start)
}

fn starts_with_punctuation(line: &str) -> bool {
    match line.chars().find(|c| !c.is_whitespace()) {
        Some(c) => !is_list_marker(c) && is_punctuation(c),
        None => false,
    }
}

pub fn is_list_marker(c: char) -> bool {
    LIST_MARKERS.contains(&c)
}

pub fn is_punctuation(c: char) -> bool {
    PUNCTUATION.contains(&c)
}

// ────────────────────────────────────────────────────────────────────────────
// Pendulum split
// ────────────────────────────────────────────────────────────────────────────

/// Splits a pendulum description into its `【灵摆效果】` and `【怪兽效果】` sections.
///
/// The pendulum section runs from its marker to the next monster marker (or the
/// end); the monster section runs from the first monster marker to the end. With
/// neither marker, the whole text is the monster section.
pub fn split_pendulum_desc(desc: &str) -> PendulumSections {
    let normalized = desc.replace("\r\n", "\n");

    let pendulum = normalized
        .find(PENDULUM_SECTION)
        .map(|start| {
            let body = &normalized[start + PENDULUM_SECTION.len()..];
            let end = body.find(MONSTER_SECTION).unwrap_or(body.len());
            body[..end].trim().to_string()
        })
        .unwrap_or_default();

    let monster = normalized
        .find(MONSTER_SECTION)
        .map(|start| normalized[start + MONSTER_SECTION.len()..].trim().to_string())
        .unwrap_or_default();

    if pendulum.is_empty() && monster.is_empty() {
        return PendulumSections {
            pendulum: String::new(),
            monster: normalized.trim().to_string(),
        };
    }
    PendulumSections { pendulum, monster }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::effect_area::{TextBoxRatios, MONSTER_TEXT_BOX};
    use crate::layout::font_metrics::FontMetricTable;
    use crate::layout::grid::{CARD_HEIGHT_MM, CARD_WIDTH_MM};

    const ALBAZ_FUSION: &str = "「阿不思的落胤」＋光·暗属性怪兽＋效果怪兽\r\n这个卡名的①③的效果1回合各能使用1次。\r\n①：这张卡特殊召唤的场合才能发动。自己·对方的墓地·除外状态的卡合计最多2张回到卡组。\r\n②：只要自己或对方的场上或墓地有「艾克莉西娅」怪兽存在，这张卡攻击力上升500，不受这张卡以外的效果影响。\r\n③：这张卡被送去墓地的回合的结束阶段才能发动。从卡组把1张「教导」、「铁兽」卡加入手卡。";
    const FIVE_HEADED: &str =
        "龙族怪兽×5\r\n这张卡不用融合召唤不能特殊召唤。\r\n①：这张卡不会被和暗·地·水·炎·风属性怪兽的战斗破坏。";
    const RAI_OH: &str = "只要这张卡在自己场上表侧表示存在，双方不能用抽卡以外的方法从卡组把卡加入手卡。此外，可以把自己场上表侧表示存在的这张卡送去墓地，让1只对方怪兽的特殊召唤无效并破坏。";

    fn metrics() -> FontMetricTable {
        FontMetricTable::cjk_default()
    }

    fn monster_box() -> (f32, f32) {
        let TextBoxRatios { width, height, .. } = MONSTER_TEXT_BOX;
        (CARD_WIDTH_MM * width, CARD_HEIGHT_MM * height)
    }

    fn ctx(m: &FontMetricTable, max_width_mm: f32, font_size_pt: f32) -> WrapContext<'_> {
        WrapContext {
            measure: m,
            max_width_mm,
            font_size_pt,
        }
    }

    /// Box wide enough for exactly `chars` fullwidth glyphs at 8pt.
    fn width_for(chars: usize) -> f32 {
        chars as f32 * DEFAULT_FONT_SIZE_PT * MM_PER_POINT + 0.01
    }

    fn soft(s: &str) -> WrappedLine {
        WrappedLine::soft(s.to_string())
    }

    fn hard(s: &str) -> WrappedLine {
        WrappedLine::hard(s.to_string())
    }

    fn texts(lines: &[WrappedLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    fn assert_rules(lines: &[String]) {
        for (i, line) in lines.iter().enumerate() {
            assert!(
                list_tail_start(line).is_none(),
                "line {i} ends with a list marker: {line:?} in {lines:?}"
            );
            if i > 0 {
                assert!(
                    !starts_with_punctuation(line),
                    "line {i} starts with punctuation: {line:?} in {lines:?}"
                );
            }
        }
    }

    fn assert_widths(m: &FontMetricTable, result: &WrapResult, width_mm: f32) {
        let max = width_mm - TEXT_HORIZONTAL_PADDING_MM;
        for line in &result.lines {
            // A single overflowing punctuation glyph may hang past the edge.
            let body: String = line.trim_end_matches(is_punctuation).to_string();
            let w = m.text_width_mm(&body, result.font_size);
            assert!(w <= max + 0.1, "line {line:?} is {w}mm wide (max {max})");
        }
    }

    // ── format_card_desc ────────────────────────────────────────────────────

    #[test]
    fn test_format_widens_ascii_and_keeps_space() {
        assert_eq!(format_card_desc("ATK 1500!"), "ＡＴＫ １５００！");
    }

    #[test]
    fn test_format_normalizes_crlf_and_middle_dot() {
        assert_eq!(format_card_desc("光・暗\r\n风"), "光·暗\n风");
    }

    #[test]
    fn test_format_strips_editorial_note() {
        let raw = "效果文本。（注：这是注释）\n下一段";
        assert_eq!(format_card_desc(raw), "效果文本。下一段");
    }

    #[test]
    fn test_format_keeps_unterminated_editorial_note() {
        let raw = "效果（注：没有结尾";
        assert_eq!(format_card_desc(raw), raw);
    }

    #[test]
    fn test_format_joins_circled_number_after_full_stop() {
        assert_eq!(format_card_desc("发动。\n①：效果"), "发动。①：效果");
        // No full stop before the break → kept
        assert_eq!(format_card_desc("发动\n①：效果"), "发动\n①：效果");
    }

    #[test]
    fn test_format_joins_bullet_only_when_line_has_full_stop() {
        assert_eq!(format_card_desc("效果\n●这个效果。"), "效果●这个效果。");
        assert_eq!(format_card_desc("效果\n●这个效果\n结束。"), "效果\n●这个效果\n结束。");
    }

    #[test]
    fn test_format_is_idempotent_on_card_text() {
        let once = format_card_desc(ALBAZ_FUSION);
        assert_eq!(format_card_desc(&once), once);
    }

    // ── split_text_to_lines ─────────────────────────────────────────────────

    #[test]
    fn test_split_blank_paragraph_becomes_empty_line() {
        let m = metrics();
        let lines = split_text_to_lines(&ctx(&m, width_for(10), 8.0), "一\n \n二");
        assert_eq!(lines, vec![hard("一"), hard(""), hard("二")]);
    }

    #[test]
    fn test_split_wraps_at_width() {
        let m = metrics();
        let lines = split_text_to_lines(&ctx(&m, width_for(3), 8.0), "一二三四五六七");
        assert_eq!(lines, vec![soft("一二三"), soft("四五六"), hard("七")]);
    }

    #[test]
    fn test_split_keeps_overflowing_punctuation_on_line() {
        let m = metrics();
        let lines = split_text_to_lines(&ctx(&m, width_for(3), 8.0), "一二三。！四五");
        assert_eq!(lines, vec![soft("一二三。！"), hard("四五")]);
    }

    #[test]
    fn test_split_places_oversized_glyph_alone() {
        let m = metrics();
        let lines = split_text_to_lines(&ctx(&m, 1.0, 8.0), "一二");
        assert_eq!(lines, vec![soft("一"), hard("二")]);
    }

    #[test]
    fn test_join_lines_round_trips_paragraphs() {
        let lines = vec![soft("一二三"), hard("四"), hard(""), hard("五")];
        assert_eq!(join_lines(&lines), "一二三四\n\n五");
    }

    // ── list-tail rule ──────────────────────────────────────────────────────

    #[test]
    fn test_list_tail_start_detection() {
        assert_eq!(list_tail_start("效果①"), Some(2));
        assert_eq!(list_tail_start("效果②："), Some(2));
        assert_eq!(list_tail_start("效果●:  "), Some(2));
        assert_eq!(list_tail_start("卡名的①③"), Some(3));
        assert_eq!(list_tail_start("效果："), None);
        assert_eq!(list_tail_start(""), None);
    }

    #[test]
    fn test_list_tail_moves_marker_to_content() {
        let m = metrics();
        let c = ctx(&m, width_for(4), 8.0);
        let lines = vec![soft("发动。①："), soft("这张卡"), hard("破坏。")];
        let result = apply_list_tail_rule(&c, lines);
        assert_eq!(texts(&result), vec!["发动。", "①：这张", "卡破坏。"]);
        assert!(result[0].hard_break);
    }

    #[test]
    fn test_list_tail_reflow_heals_stale_fragment() {
        // A previous pass left "击力" stranded by a forced break; rewrapping must heal it.
        let m = metrics();
        let c = ctx(&m, width_for(8), 8.0);
        let lines = vec![
            soft("自己场上的怪兽②"),
            soft("：这张卡攻"),
            soft("击力"),
            hard("上升５００。"),
        ];
        let result = apply_list_tail_rule(&c, lines);
        assert_eq!(texts(&result), vec!["自己场上的怪兽", "②：这张卡攻击力", "上升５００。"]);
        assert!(!texts(&result).contains(&"击力"));
    }

    #[test]
    fn test_list_tail_marker_only_line_has_no_prefix() {
        let m = metrics();
        let c = ctx(&m, width_for(6), 8.0);
        let result = apply_list_tail_rule(&c, vec![soft("①"), hard("效果。")]);
        assert_eq!(texts(&result), vec!["①效果。"]);
    }

    // ── leading punctuation rule ────────────────────────────────────────────

    #[test]
    fn test_leading_punctuation_pulled_up() {
        let m = metrics();
        let c = ctx(&m, width_for(4), 8.0);
        let lines = vec![soft("一二"), soft("三四五六"), hard("，七八")];
        let result = apply_leading_punctuation_rule(&c, lines);
        assert_eq!(texts(&result), vec!["一二", "三四五六，", "七八"]);
    }

    #[test]
    fn test_leading_list_marker_is_allowed() {
        let m = metrics();
        let c = ctx(&m, width_for(4), 8.0);
        let lines = vec![hard("一二"), hard("①：三")];
        assert_eq!(apply_leading_punctuation_rule(&c, lines.clone()), lines);
    }

    #[test]
    fn test_rules_terminate_on_unfixable_input() {
        // A paragraph that itself opens with punctuation cannot be fixed; the bound stops the loop.
        let m = metrics();
        let c = ctx(&m, width_for(4), 8.0);
        let lines = vec![hard("一二"), hard("，三")];
        assert_eq!(apply_leading_punctuation_rule(&c, lines.clone()), lines);
    }

    // ── layout_text_with_constraints ────────────────────────────────────────

    #[test]
    fn test_layout_rejects_degenerate_box() {
        let m = metrics();
        assert!(layout_text_with_constraints(&m, "文本", 0.5, 10.0).is_err());
        assert!(layout_text_with_constraints(&m, "文本", 40.0, 0.0).is_err());
    }

    #[test]
    fn test_layout_short_text_keeps_default_size() {
        let m = metrics();
        let result = layout_text_with_constraints(&m, "通常怪兽。", 40.0, 60.0).unwrap();
        assert_eq!(result.font_size, DEFAULT_FONT_SIZE_PT);
        assert_eq!(result.lines, vec!["通常怪兽。"]);
    }

    #[test]
    fn test_layout_list_text_obeys_rules() {
        let m = metrics();
        let raw = "\n①：这是第一条效果，用来测试行尾的 ① 不会单独挂在行末。\n这行是接着①的描述，用来制造较长的一段文本，迫使其在框内发生换行。\n②：这是第二条效果，同样包含较长的描述文本，用来测试多次换行的情况。\n●这是一个使用 ● bullet 的条目，用来验证 bullet 不会出现在行末。\n攻击力 1500 以下的灵摆怪兽可以被加入手卡。\n";
        let result = layout_text_with_constraints(&m, raw, 40.0, 60.0).unwrap();
        assert!(result.lines.len() > 1);
        assert_widths(&m, &result, 40.0);
        assert_rules(&result.lines);
    }

    #[test]
    fn test_layout_fits_monster_box() {
        let m = metrics();
        let (w, h) = monster_box();
        for raw in [FIVE_HEADED, RAI_OH] {
            let result = layout_text_with_constraints(&m, raw, w, h).unwrap();
            assert!(!result.lines.is_empty());
            assert_widths(&m, &result, w);
            assert_rules(&result.lines);
            assert!(result.height_mm() <= h + 0.1, "{raw} overflowed at {}", result.font_size);
        }
    }

    #[test]
    fn test_layout_long_text_stops_at_floor() {
        let m = metrics();
        let raw = "很长的效果文本。".repeat(60);
        let result = layout_text_with_constraints(&m, &raw, 20.0, 5.0).unwrap();
        assert_eq!(result.font_size, MIN_FONT_SIZE_PT);
        assert!(result.height_mm() > 5.0);
    }

    #[test]
    fn test_layout_albaz_has_no_stray_fragment() {
        let m = metrics();
        let (w, h) = monster_box();
        let result = layout_text_with_constraints(&m, ALBAZ_FUSION, w, h).unwrap();
        assert_widths(&m, &result, w);
        assert_rules(&result.lines);
        assert!(!result.lines.iter().any(|l| l == "击力"));
        assert!(result.font_size >= MIN_FONT_SIZE_PT);
    }

    #[test]
    fn test_rewrap_of_compliant_lines_is_stable() {
        let m = metrics();
        let (w, _) = monster_box();
        let c = ctx(&m, w - TEXT_HORIZONTAL_PADDING_MM, 6.0);
        let desc = format_card_desc(ALBAZ_FUSION);
        let first = wrap_with_rules(&c, &desc);
        let second = wrap_with_rules(&c, &join_lines(&first));
        let second_texts: Vec<String> = second.iter().map(|l| l.text.clone()).collect();
        assert_rules(&second_texts);
        assert_eq!(first, second);
    }

    // ── split_pendulum_desc ─────────────────────────────────────────────────

    #[test]
    fn test_pendulum_split_both_sections() {
        let desc = "←4 【灵摆】 4→\r\n【灵摆效果】\r\n①：灵摆效果。\r\n【怪兽效果】\r\n①：怪兽效果。";
        let sections = split_pendulum_desc(desc);
        assert_eq!(sections.pendulum, "①：灵摆效果。");
        assert_eq!(sections.monster, "①：怪兽效果。");
    }

    #[test]
    fn test_pendulum_split_without_markers_is_all_monster() {
        let sections = split_pendulum_desc("  普通的效果文本。 ");
        assert_eq!(sections.pendulum, "");
        assert_eq!(sections.monster, "普通的效果文本。");
    }

    #[test]
    fn test_pendulum_split_only_pendulum_marker() {
        let sections = split_pendulum_desc("【灵摆效果】只有灵摆。");
        assert_eq!(sections.pendulum, "只有灵摆。");
        assert_eq!(sections.monster, "");
    }
}
