/*!
 * Ignore rules deciding which devices are not surfaced.
 */
use tracing::info;

use hapbridge_core::config::IgnoreRule;

/// Evaluates the configured ignore rules
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    rules: Vec<IgnoreRule>,
}

impl FilterEngine {
    /// Create an engine evaluating `rules` in order
    pub fn new(rules: Vec<IgnoreRule>) -> Self {
        Self { rules }
    }

    /// The rules, in evaluation order
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// The first rule matching the device, if any
    pub fn matching_rule(&self, name: &str, address: &str) -> Option<&IgnoreRule> {
        self.rules
            .iter()
            .find(|rule| rule_matches(rule, name, address))
    }

    /// Whether the device is excluded by at least one rule
    pub fn should_ignore(&self, name: &str, address: &str) -> bool {
        match self.matching_rule(name, address) {
            Some(rule) => {
                info!("Ignoring device {} [{}] because of rule {}", name, address, rule);
                true
            }
            None => false,
        }
    }
}

/// Every non-empty predicate of the rule must hold
fn rule_matches(rule: &IgnoreRule, name: &str, address: &str) -> bool {
    (rule.name_contains.is_empty() || name.contains(rule.name_contains.as_str()))
        && (rule.last_address_digit.is_empty()
            || address.ends_with(rule.last_address_digit.as_str()))
        && (rule.address.is_empty() || address == rule.address)
}
