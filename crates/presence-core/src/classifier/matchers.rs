//! The individual classification strategies, in cascade order.

use std::sync::LazyLock;

use presence_config::schema::ClassifierRule;
use regex::Regex;
use serde_json::{Number, Value};

use super::{Evidence, Matcher};

const COUNT_FIELDS: [&str; 3] = ["targets", "targetCount", "count"];
const FLAG_FIELDS: [&str; 2] = ["presence", "occupied"];
const KEYWORDS: [&str; 5] = ["person", "human", "target", "presence", "occupied"];

static KEY_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(targets?|count)\s*=\s*(\d+)")
        .expect("classifier: static regex pattern must compile")
});

/// True when a run of ASCII digits denotes a value above zero. Works for
/// counts of any length.
pub(crate) fn digits_positive(digits: &str) -> bool {
    digits.bytes().any(|b| b != b'0')
}

fn number_positive(n: &Number) -> bool {
    if let Some(u) = n.as_u64() {
        u > 0
    } else if let Some(i) = n.as_i64() {
        i > 0
    } else {
        n.as_f64().is_some_and(|f| f > 0.0)
    }
}

/// `{"targets": 2}`, `{"targetCount": 0}`, `{"count": 1}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredCountMatcher;

impl Matcher for StructuredCountMatcher {
    fn rule(&self) -> ClassifierRule {
        ClassifierRule::StructuredCount
    }

    fn try_classify(&self, evidence: &Evidence<'_>) -> Option<bool> {
        let record = evidence.record()?;
        COUNT_FIELDS.iter().find_map(|key| match record.get(*key) {
            Some(Value::Number(n)) => Some(number_positive(n)),
            _ => None,
        })
    }
}

/// `{"presence": true}`, `{"occupied": false}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredFlagMatcher;

impl Matcher for StructuredFlagMatcher {
    fn rule(&self) -> ClassifierRule {
        ClassifierRule::StructuredFlag
    }

    fn try_classify(&self, evidence: &Evidence<'_>) -> Option<bool> {
        let record = evidence.record()?;
        FLAG_FIELDS.iter().find_map(|key| match record.get(*key) {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        })
    }
}

/// `targets=2`, `Count = 0`, `target=1` anywhere in the line.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueMatcher;

impl Matcher for KeyValueMatcher {
    fn rule(&self) -> ClassifierRule {
        ClassifierRule::KeyValue
    }

    fn try_classify(&self, evidence: &Evidence<'_>) -> Option<bool> {
        let caps = KEY_VALUE_RE.captures(evidence.line())?;
        caps.get(2).map(|m| digits_positive(m.as_str()))
    }
}

/// `sensor1,2,...` or `zone;0` where the second field is a count.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvMatcher;

impl Matcher for CsvMatcher {
    fn rule(&self) -> ClassifierRule {
        ClassifierRule::Csv
    }

    fn try_classify(&self, evidence: &Evidence<'_>) -> Option<bool> {
        let mut fields = evidence.line().split([',', ';']).map(str::trim);
        let _first = fields.next()?;
        let second = fields.next()?;
        if !second.is_empty() && second.bytes().all(|b| b.is_ascii_digit()) {
            Some(digits_positive(second))
        } else {
            None
        }
    }
}

/// Last resort: the line mentions a person or a target.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordMatcher;

impl Matcher for KeywordMatcher {
    fn rule(&self) -> ClassifierRule {
        ClassifierRule::Keyword
    }

    fn try_classify(&self, evidence: &Evidence<'_>) -> Option<bool> {
        let lowered = evidence.line().to_lowercase();
        KEYWORDS
            .iter()
            .any(|kw| lowered.contains(kw))
            .then_some(true)
    }
}
