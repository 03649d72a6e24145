//! Presence classification: one raw sensor line in, one occupancy guess out.
//!
//! Sensors in the field speak plain tokens, JSON and CSV. Rather than reject
//! unknown formats the classifier runs an ordered cascade of [`Matcher`]s and
//! takes the first one that recognises the line. Lines nobody recognises are
//! "not present".

mod matchers;


use presence_config::schema::{ClassifierConfig, ClassifierRule};
use serde_json::{Map, Value};

pub use matchers::{
    CsvMatcher, KeyValueMatcher, KeywordMatcher, StructuredCountMatcher, StructuredFlagMatcher,
};

/// A trimmed line plus its structured form, parsed once per classification.
#[derive(Debug)]
pub struct Evidence<'a> {
    line: &'a str,
    record: Option<Map<String, Value>>,
}

impl<'a> Evidence<'a> {
    /// Build evidence for `line`. When `parse` is false no JSON parse is
    /// attempted and [`Evidence::record`] is always `None`.
    pub fn new(line: &'a str, parse: bool) -> Self {
        let record = if parse {
            match serde_json::from_str::<Value>(line) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            }
        } else {
            None
        };
        Self { line, record }
    }

    pub fn line(&self) -> &str {
        self.line
    }

    /// The line as a JSON object, if it is one.
    pub fn record(&self) -> Option<&Map<String, Value>> {
        self.record.as_ref()
    }
}

/// One strategy in the classification cascade.
///
/// Returns `None` when the strategy does not recognise the line, letting the
/// next matcher try.
pub trait Matcher: Send + Sync {
    fn rule(&self) -> ClassifierRule;

    fn try_classify(&self, evidence: &Evidence<'_>) -> Option<bool>;
}

/// Ordered cascade of matchers.
pub struct Classifier {
    matchers: Vec<Box<dyn Matcher>>,
    needs_record: bool,
}

impl Classifier {
    /// Build a cascade from a rule list. Rules run in cascade order no matter
    /// how `rules` is ordered.
    pub fn from_rules(rules: &[ClassifierRule]) -> Self {
        let mut rules = rules.to_vec();
        rules.sort();
        rules.dedup();

        let matchers: Vec<Box<dyn Matcher>> = rules
            .into_iter()
            .map(|rule| -> Box<dyn Matcher> {
                match rule {
                    ClassifierRule::StructuredCount => Box::new(StructuredCountMatcher),
                    ClassifierRule::StructuredFlag => Box::new(StructuredFlagMatcher),
                    ClassifierRule::KeyValue => Box::new(KeyValueMatcher),
                    ClassifierRule::Csv => Box::new(CsvMatcher),
                    ClassifierRule::Keyword => Box::new(KeywordMatcher),
                }
            })
            .collect();

        let needs_record = matchers.iter().any(|m| {
            matches!(
                m.rule(),
                ClassifierRule::StructuredCount | ClassifierRule::StructuredFlag
            )
        });

        Self {
            matchers,
            needs_record,
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::from_rules(&config.effective_rules())
    }

    /// Every rule, the default.
    pub fn full() -> Self {
        Self::from_rules(&ClassifierRule::ALL)
    }

    pub fn rules(&self) -> Vec<ClassifierRule> {
        self.matchers.iter().map(|m| m.rule()).collect()
    }

    /// Guess occupancy from one raw line. Never fails.
    pub fn classify(&self, raw: &str) -> bool {
        let line = raw.trim();
        if line.is_empty() {
            return false;
        }

        let evidence = Evidence::new(line, self.needs_record);
        for matcher in &self.matchers {
            if let Some(present) = matcher.try_classify(&evidence) {
                tracing::trace!(rule = ?matcher.rule(), present, "classified line");
                return present;
            }
        }
        false
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::full()
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("rules", &self.rules())
            .finish()
    }
}
