//! Best-effort recovery of [`BatchItem`]s from free-form model output.
//!
//! Models are asked for a JSON array but regularly wrap it in prose or code
//! fences, leave trailing commas, truncate the output, or ignore the format
//! altogether. [`parse_batch_response`] runs four strategies in order and
//! returns the first non-empty result:
//!
//! 1. [`parse_strict`]: the whole text is a JSON array of valid items.
//! 2. [`parse_first_array`]: the first `[...]` substring, trailing commas
//!    removed, keeping the valid elements.
//! 3. [`parse_objects`]: every standalone `{...}` object, keeping the valid
//!    ones.
//! 4. [`parse_lines`]: `Question:` / `Estimates:` line heuristics.
//!
//! None of the strategies fail; malformed fragments are dropped silently.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::item::{BatchItem, Estimates};

static ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[\s\S]*?\]").expect("invalid array regex"));
static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*\]").expect("invalid trailing comma regex"));
static PRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Press the lever: ?(\d{1,3}%)").expect("invalid press regex")
});
static NOTHING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Do nothing: ?(\d{1,3}%)").expect("invalid nothing regex"));

/// Which strategy produced a parse result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Strict,
    FirstArray,
    Objects,
    Lines,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Strict => "strict",
            Strategy::FirstArray => "first-array",
            Strategy::Objects => "objects",
            Strategy::Lines => "lines",
        };
        f.write_str(name)
    }
}

/// Items recovered from a response, with the strategy that found them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedBatch {
    pub items: Vec<BatchItem>,
    /// `None` when every strategy came up empty.
    pub strategy: Option<Strategy>,
}

/// Parse raw model output into as many valid items as can be recovered.
pub fn parse_batch_response(text: &str) -> Vec<BatchItem> {
    parse_batch_detailed(text).items
}

/// Like [`parse_batch_response`], also reporting which strategy succeeded.
pub fn parse_batch_detailed(text: &str) -> ParsedBatch {
    let stages: [(Strategy, fn(&str) -> Vec<BatchItem>); 4] = [
        (Strategy::Strict, parse_strict),
        (Strategy::FirstArray, parse_first_array),
        (Strategy::Objects, parse_objects),
        (Strategy::Lines, parse_lines),
    ];

    for (strategy, stage) in stages {
        let items = stage(text);
        if !items.is_empty() {
            debug!(%strategy, count = items.len(), "parsed trolley batch");
            return ParsedBatch {
                items,
                strategy: Some(strategy),
            };
        }
    }

    debug!(bytes = text.len(), "no trolley problems recovered");
    ParsedBatch::default()
}

/// Convert a JSON value into an item if it has the required string fields.
///
/// Only objects qualify. Extra fields are ignored; wrong types reject the
/// element.
fn well_typed(value: Value) -> Option<BatchItem> {
    // Derived `Deserialize` also accepts a sequence in field order.
    if !value.is_object() || !value.get("estimates").is_some_and(Value::is_object) {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Strategy 1: the entire text is a JSON array whose every element is valid.
pub fn parse_strict(text: &str) -> Vec<BatchItem> {
    let Ok(Value::Array(values)) = serde_json::from_str::<Value>(text.trim()) else {
        return Vec::new();
    };
    values
        .into_iter()
        .map(well_typed)
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default()
}

/// Strategy 2: the first `[` up to the next `]`, with trailing commas removed.
pub fn parse_first_array(text: &str) -> Vec<BatchItem> {
    let Some(m) = ARRAY_RE.find(text) else {
        return Vec::new();
    };
    let cleaned = TRAILING_COMMA_RE.replace_all(m.as_str(), "]");
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Array(values)) => values.into_iter().filter_map(well_typed).collect(),
        _ => Vec::new(),
    }
}

/// Strategy 3: every standalone JSON object in the text, parsed independently.
///
/// Objects are located by brace matching that skips over string literals, so
/// items with a nested `estimates` object are found. After a valid item the
/// scan resumes past its closing brace; otherwise it resumes at the next `{`.
pub fn parse_objects(text: &str) -> Vec<BatchItem> {
    let mut items = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text.get(pos..).and_then(|rest| rest.find('{')) {
        let start = pos + offset;
        let candidate = text
            .get(start..)
            .and_then(balanced_object_len)
            .and_then(|len| text.get(start..start + len));

        let parsed = candidate.and_then(|c| {
            serde_json::from_str::<Value>(c)
                .ok()
                .and_then(well_typed)
                .map(|item| (item, c.len()))
        });

        match parsed {
            Some((item, len)) => {
                items.push(item);
                pos = start + len;
            }
            None => pos = start + 1,
        }
    }

    items
}

/// Byte length of the `{...}` object starting at the beginning of `s`, or
/// `None` if the braces never balance.
fn balanced_object_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in s.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strategy 4: `Question:` lines followed by one or more `Estimates:` lines.
pub fn parse_lines(text: &str) -> Vec<BatchItem> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut items = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let Some(question) = strip_prefix_ignore_case(lines[i], "question:") else {
            i += 1;
            continue;
        };
        let question = question.trim();
        let mut press = None;
        let mut nothing = None;
        i += 1;

        while let Some(est) = lines
            .get(i)
            .and_then(|l| strip_prefix_ignore_case(l, "estimates:"))
        {
            if let Some(c) = PRESS_RE.captures(est) {
                press = Some(c[1].to_string());
            }
            if let Some(c) = NOTHING_RE.captures(est) {
                nothing = Some(c[1].to_string());
            }
            i += 1;
        }

        if let (false, Some(press), Some(nothing)) = (question.is_empty(), press, nothing) {
            items.push(BatchItem::new(question, Estimates::new(press, nothing)));
        }
    }
    items
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        line.get(prefix.len()..)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ITEMS: &str = r#"[
  {
    "question": "If nothing is done, five clowns are flattened. If the lever is pulled, one mime is.",
    "estimates": { "Press the lever": "71%", "Do nothing": "29%" }
  },
  {
    "question": "If nothing is done, the trolley eats your lunch. If the lever is pulled, it eats your boss's.",
    "estimates": { "Press the lever": "88%", "Do nothing": "12%" }
  }
]"#;

    fn questions(items: &[BatchItem]) -> Vec<&str> {
        items.iter().map(|i| i.question.as_str()).collect()
    }

    #[test]
    fn strict_json_array_is_returned_in_order() {
        let parsed = parse_batch_detailed(TWO_ITEMS);
        assert_eq!(parsed.strategy, Some(Strategy::Strict));
        assert_eq!(parsed.items.len(), 2);
        assert!(parsed.items[0].question.contains("clowns"));
        assert!(parsed.items[1].question.contains("lunch"));
        assert_eq!(parsed.items[1].estimates.press_lever, "88%");
    }

    #[test]
    fn strict_rejects_array_with_any_invalid_element() {
        let text = r#"[
            {"question": "q1", "estimates": {"Press the lever": "60%", "Do nothing": "40%"}},
            {"question": 7, "estimates": {"Press the lever": "60%", "Do nothing": "40%"}}
        ]"#;
        assert!(parse_strict(text).is_empty());
        // Falls through to a later stage that keeps the valid element.
        assert_eq!(questions(&parse_batch_response(text)), vec!["q1"]);
    }

    #[test]
    fn strict_ignores_extra_fields() {
        let text = r#"[{"question": "q", "id": 3, "estimates": {"Press the lever": "1%", "Do nothing": "99%", "Shrug": "0%"}}]"#;
        assert_eq!(parse_strict(text).len(), 1);
    }

    #[test]
    fn array_inside_prose_with_trailing_comma() {
        let text = r#"Sure! Here are your problems:
```json
[
  {"question": "If nothing is done, a goose wins. If the lever is pulled, a swan does.", "estimates": {"Press the lever": "40%", "Do nothing": "60%"}},
]
```
Enjoy!"#;
        let parsed = parse_batch_detailed(text);
        assert_eq!(parsed.strategy, Some(Strategy::FirstArray));
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].estimates.do_nothing, "60%");
    }

    #[test]
    fn first_array_filters_bad_elements() {
        let text = r#"noise [{"question": "ok", "estimates": {"Press the lever": "50%", "Do nothing": "50%"}}, {"question": "no estimates"}, 4] tail"#;
        assert_eq!(questions(&parse_first_array(text)), vec!["ok"]);
    }

    #[test]
    fn array_shaped_elements_are_not_items() {
        let text = r#"[["q", ["67%", "33%"]]]"#;
        assert!(parse_strict(text).is_empty());
        assert!(parse_first_array(&format!("Here: {text} done")).is_empty());
        assert!(parse_batch_detailed(text).strategy.is_none());

        let text = r#"{"question": "q", "estimates": ["67%", "33%"]}"#;
        assert!(parse_objects(text).is_empty());
    }

    #[test]
    fn standalone_objects_are_recovered_and_malformed_ignored() {
        let text = r#"Problem one:
{"question": "If nothing is done, A. If the lever is pulled, B.", "estimates": {"Press the lever": "67%", "Do nothing": "33%"}}
Problem two (broken):
{"question": "missing brace", "estimates": {"Press the lever": "10%"
Problem three:
{"question": "If nothing is done, C. If the lever is pulled, D.", "estimates": {"Press the lever": "5%", "Do nothing": "95%"}}"#;
        let parsed = parse_batch_detailed(text);
        assert_eq!(parsed.strategy, Some(Strategy::Objects));
        assert_eq!(
            questions(&parsed.items),
            vec![
                "If nothing is done, A. If the lever is pulled, B.",
                "If nothing is done, C. If the lever is pulled, D."
            ]
        );
    }

    #[test]
    fn objects_with_braces_inside_strings() {
        let text = r#"{"question": "Is {this} a } trap?", "estimates": {"Press the lever": "20%", "Do nothing": "80%"}}"#;
        assert_eq!(questions(&parse_objects(text)), vec!["Is {this} a } trap?"]);
    }

    #[test]
    fn line_oriented_text_is_reconstructed() {
        let text = "Here you go.\n\nQuestion: If nothing is done, the cake falls. If the lever is pulled, the pie does.\nEstimates: Press the lever: 67% (roughly)\nEstimates: Do nothing: 33%\n";
        let parsed = parse_batch_detailed(text);
        assert_eq!(parsed.strategy, Some(Strategy::Lines));
        assert_eq!(parsed.items.len(), 1);
        let item = &parsed.items[0];
        assert_eq!(
            item.question,
            "If nothing is done, the cake falls. If the lever is pulled, the pie does."
        );
        assert_eq!(item.estimates, Estimates::new("67%", "33%"));
    }

    #[test]
    fn line_heuristic_is_case_insensitive_and_accepts_one_line() {
        let text = "QUESTION: q1\nestimates: press the lever:45%, do nothing: 55%\nquestion: q2\nEstimates: Press the lever: 10%";
        let items = parse_lines(text);
        // q2 lacks a "Do nothing" estimate and is dropped.
        assert_eq!(questions(&items), vec!["q1"]);
        assert_eq!(items[0].estimates, Estimates::new("45%", "55%"));
    }

    #[test]
    fn line_heuristic_skips_empty_questions() {
        let text = "Question:\nEstimates: Press the lever: 10%, Do nothing: 90%";
        assert!(parse_lines(text).is_empty());
    }

    #[test]
    fn garbage_yields_nothing() {
        let parsed = parse_batch_detailed("I'm sorry, I can't help with trolleys today.");
        assert!(parsed.items.is_empty());
        assert_eq!(parsed.strategy, None);
        assert!(parse_batch_response("").is_empty());
        assert!(parse_batch_response("[}{]").is_empty());
    }

    #[test]
    fn balanced_object_len_handles_escapes() {
        assert_eq!(balanced_object_len(r#"{"a": "\"}"} tail"#), Some(12));
        assert_eq!(balanced_object_len("{ never closed"), None);
    }
}
