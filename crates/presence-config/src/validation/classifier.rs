use std::collections::HashSet;

use crate::schema::RelayConfig;

pub(crate) fn validate_classifier(errors: &mut Vec<String>, config: &RelayConfig) {
    let Some(rules) = &config.classifier.rules else {
        return;
    };
    if rules.is_empty() {
        errors.push("classifier.rules must list at least one rule".into());
        return;
    }
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(rule) {
            errors.push(format!("classifier.rules lists {rule:?} more than once"));
        }
    }
}
