//! Presence classifier rule selection.

use serde::{Deserialize, Serialize};

/// One step of the classification cascade.
///
/// Rules always run in the declaration order of this enum, whatever order
/// they are listed in the config file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierRule {
    /// JSON object with numeric `targets` / `targetCount` / `count`.
    StructuredCount,
    /// JSON object with boolean `presence` / `occupied`.
    StructuredFlag,
    /// `targets=2`, `count = 0`, ...
    KeyValue,
    /// Second comma/semicolon separated field is a count.
    Csv,
    /// Any of the presence keywords appears in the line.
    Keyword,
}

impl ClassifierRule {
    pub const ALL: [ClassifierRule; 5] = [
        ClassifierRule::StructuredCount,
        ClassifierRule::StructuredFlag,
        ClassifierRule::KeyValue,
        ClassifierRule::Csv,
        ClassifierRule::Keyword,
    ];
}

/// Named rule sets matching the sensor firmware variants seen in the field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum ClassifierPreset {
    /// Full structured cascade.
    #[default]
    Full,
    /// Keyword match only.
    Keyword,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClassifierConfig {
    pub preset: ClassifierPreset,
    /// Explicit rule list. Overrides `preset` when present.
    pub rules: Option<Vec<ClassifierRule>>,
}

impl ClassifierConfig {
    /// Rules to run, sorted into cascade order.
    pub fn effective_rules(&self) -> Vec<ClassifierRule> {
        let mut rules = match (&self.rules, self.preset) {
            (Some(rules), _) => rules.clone(),
            (None, ClassifierPreset::Full) => ClassifierRule::ALL.to_vec(),
            (None, ClassifierPreset::Keyword) => vec![ClassifierRule::Keyword],
        };
        rules.sort();
        rules.dedup();
        rules
    }
}
