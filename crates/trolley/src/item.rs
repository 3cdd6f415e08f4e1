//! Trolley-problem items and their vote estimates.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// JSON key and button label for pulling the lever.
pub const PRESS_THE_LEVER: &str = "Press the lever";
/// JSON key and button label for doing nothing.
pub const DO_NOTHING: &str = "Do nothing";

static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3})%").expect("invalid percent regex"));

// ── Choice ────────────────────────────────────────────────────────────

/// One of the two answers the user can give.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    #[serde(rename = "Press the lever")]
    PressLever,
    #[serde(rename = "Do nothing")]
    DoNothing,
}

impl Choice {
    /// Both choices, in the order the buttons are shown.
    pub const ALL: [Choice; 2] = [Choice::DoNothing, Choice::PressLever];

    pub fn label(self) -> &'static str {
        match self {
            Choice::PressLever => PRESS_THE_LEVER,
            Choice::DoNothing => DO_NOTHING,
        }
    }

    /// Match a label case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Items ─────────────────────────────────────────────────────────────

/// Model-estimated share of people agreeing with each choice.
///
/// Values are kept as the raw strings the model produced (normally `"67%"`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimates {
    #[serde(rename = "Press the lever")]
    pub press_lever: String,
    #[serde(rename = "Do nothing")]
    pub do_nothing: String,
}

impl Estimates {
    pub fn new(press_lever: impl Into<String>, do_nothing: impl Into<String>) -> Self {
        Self {
            press_lever: press_lever.into(),
            do_nothing: do_nothing.into(),
        }
    }

    /// The estimate string for a given choice.
    pub fn for_choice(&self, choice: Choice) -> &str {
        match choice {
            Choice::PressLever => &self.press_lever,
            Choice::DoNothing => &self.do_nothing,
        }
    }
}

/// A single trolley problem with its vote estimates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub question: String,
    pub estimates: Estimates,
}

impl BatchItem {
    pub fn new(question: impl Into<String>, estimates: Estimates) -> Self {
        Self {
            question: question.into(),
            estimates,
        }
    }

    /// What to show after the user picked `choice`.
    pub fn agreement(&self, choice: Choice) -> Agreement {
        Agreement::from_estimate(self.estimates.for_choice(choice))
    }
}

// ── Agreement ─────────────────────────────────────────────────────────

/// Extract the first `NN%` value from an estimate string.
///
/// Returns `None` when the string has no percent pattern.
pub fn extract_percent(estimate: &str) -> Option<u32> {
    PERCENT_RE
        .captures(estimate)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Agreement display for a chosen answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Agreement {
    /// `agree`% of people picked the same answer, `disagree`% did not.
    Percent { agree: u32, disagree: u32 },
    /// The estimate had no usable percentage; show it verbatim.
    Raw(String),
}

impl Agreement {
    pub fn from_estimate(estimate: &str) -> Self {
        match extract_percent(estimate) {
            Some(agree) => Agreement::Percent {
                agree,
                disagree: 100u32.saturating_sub(agree),
            },
            None => Agreement::Raw(estimate.to_string()),
        }
    }
}

impl fmt::Display for Agreement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Agreement::Percent { agree, disagree } => write!(
                f,
                "AI says {agree}% of people agree with you, while {disagree}% disagree"
            ),
            Agreement::Raw(raw) => f.write_str(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(press: &str, nothing: &str) -> BatchItem {
        BatchItem::new(
            "If nothing is done, five toasters melt. If the lever is pulled, one kettle does.",
            Estimates::new(press, nothing),
        )
    }

    #[test]
    fn extract_percent_reads_first_match() {
        assert_eq!(extract_percent("67%"), Some(67));
        assert_eq!(extract_percent("about 12% maybe 40%"), Some(12));
        assert_eq!(extract_percent("100%"), Some(100));
    }

    #[test]
    fn extract_percent_requires_percent_sign() {
        assert_eq!(extract_percent("67"), None);
        assert_eq!(extract_percent("most people"), None);
        assert_eq!(extract_percent(""), None);
    }

    #[test]
    fn agreement_computes_complement() {
        let it = item("67%", "33%");
        assert_eq!(
            it.agreement(Choice::PressLever),
            Agreement::Percent {
                agree: 67,
                disagree: 33
            }
        );
        assert_eq!(
            it.agreement(Choice::DoNothing),
            Agreement::Percent {
                agree: 33,
                disagree: 67
            }
        );
    }

    #[test]
    fn agreement_falls_back_to_raw_string() {
        let it = item("a clear majority", "33%");
        let agreement = it.agreement(Choice::PressLever);
        assert_eq!(agreement, Agreement::Raw("a clear majority".into()));
        assert_eq!(agreement.to_string(), "a clear majority");
    }

    #[test]
    fn agreement_saturates_above_one_hundred() {
        assert_eq!(
            Agreement::from_estimate("120%"),
            Agreement::Percent {
                agree: 120,
                disagree: 0
            }
        );
    }

    #[test]
    fn item_serializes_with_label_keys() {
        let json = serde_json::to_value(item("67%", "33%")).unwrap();
        assert_eq!(json["estimates"]["Press the lever"], "67%");
        assert_eq!(json["estimates"]["Do nothing"], "33%");
    }

    #[test]
    fn choice_labels_round_trip() {
        for choice in Choice::ALL {
            assert_eq!(Choice::from_label(choice.label()), Some(choice));
        }
        assert_eq!(Choice::from_label("do NOTHING"), Some(Choice::DoNothing));
        assert_eq!(Choice::from_label("run away"), None);
    }
}
