//! Targeting filters — the predicate structure agents evaluate locally
//! to decide whether a broadcast request applies to them.
//!
//! A [`Filter`] carries five named category lists. The "empty filter"
//! (all lists empty) matches every agent on the collective. Compound
//! entries form a recursive boolean tree of [`FilterExpr`] nodes whose
//! leaves query data plugins.

use serde::{Deserialize, Serialize};

/// A single fact criterion: `fact operator value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactCriterion {
    /// Name of the fact being compared.
    pub fact: String,
    /// Comparison operator ("==", "=~", "<=", ...).
    #[serde(default = "default_operator")]
    pub operator: String,
    /// Value the fact is compared against.
    pub value: String,
}

fn default_operator() -> String {
    "==".to_string()
}

/// A leaf node in a compound filter: a query against a data plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fstatement {
    /// Name of the data plugin to query.
    pub name: String,
    /// The plugin output value being tested.
    pub value: String,
    /// Optional query parameter handed to the plugin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<String>,
}

/// A node in the compound filter tree.
///
/// Serializes externally tagged, so a leaf reads as
/// `{"fstatement": {"name": ..., "value": ...}}` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpr {
    /// A data plugin query leaf.
    Fstatement(Fstatement),
    /// All children must match.
    And(Vec<FilterExpr>),
    /// At least one child must match.
    Or(Vec<FilterExpr>),
}

/// A complete targeting filter with all category lists.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    /// Fact criteria.
    pub fact: Vec<FactCriterion>,
    /// Configuration class names.
    #[serde(rename = "cf_class")]
    pub class: Vec<String>,
    /// Agent names the target must host.
    pub agent: Vec<String>,
    /// Exact node identities.
    pub identity: Vec<String>,
    /// Compound boolean expressions.
    pub compound: Vec<FilterExpr>,
}

impl Filter {
    /// The empty filter: every category present, every list empty.
    /// Matches all agents on the collective.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An empty filter with a single agent criterion — the targeting
    /// shape used for directly addressed requests.
    pub fn for_agent(agent: &str) -> Self {
        let mut filter = Self::empty();
        filter.agent.push(agent.to_string());
        filter
    }

    /// Returns true when no category carries any criterion.
    pub fn is_empty(&self) -> bool {
        self.fact.is_empty()
            && self.class.is_empty()
            && self.agent.is_empty()
            && self.identity.is_empty()
            && self.compound.is_empty()
    }

    /// Add an agent criterion, skipping duplicates.
    pub fn add_agent(&mut self, agent: &str) {
        if !self.agent.iter().any(|a| a == agent) {
            self.agent.push(agent.to_string());
        }
    }

    /// Add a class criterion, skipping duplicates.
    pub fn add_class(&mut self, class: &str) {
        if !self.class.iter().any(|c| c == class) {
            self.class.push(class.to_string());
        }
    }

    /// Add an identity criterion, skipping duplicates.
    pub fn add_identity(&mut self, identity: &str) {
        if !self.identity.iter().any(|i| i == identity) {
            self.identity.push(identity.to_string());
        }
    }

    /// Add a fact criterion.
    pub fn add_fact(&mut self, criterion: FactCriterion) {
        self.fact.push(criterion);
    }

    /// Add a compound expression.
    pub fn add_compound(&mut self, expr: FilterExpr) {
        self.compound.push(expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_is_empty() {
        let filter = Filter::empty();
        assert!(filter.is_empty());
        assert!(filter.fact.is_empty());
        assert!(filter.class.is_empty());
        assert!(filter.agent.is_empty());
        assert!(filter.identity.is_empty());
        assert!(filter.compound.is_empty());
    }

    #[test]
    fn test_for_agent_carries_single_criterion() {
        let filter = Filter::for_agent("rpcutil");
        assert_eq!(filter.agent, vec!["rpcutil".to_string()]);
        assert!(filter.fact.is_empty());
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_add_agent_deduplicates() {
        let mut filter = Filter::empty();
        filter.add_agent("puppet");
        filter.add_agent("puppet");
        assert_eq!(filter.agent.len(), 1);
    }

    #[test]
    fn test_cf_class_wire_name() {
        let mut filter = Filter::empty();
        filter.add_class("webserver");
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["cf_class"][0], "webserver");
    }

    #[test]
    fn test_fstatement_externally_tagged() {
        let expr = FilterExpr::Fstatement(Fstatement {
            name: "sysctl".to_string(),
            value: "net.ipv4.ip_forward".to_string(),
            params: None,
        });
        let json = serde_json::to_value(&expr).unwrap();
        assert!(json.get("fstatement").is_some());
        assert_eq!(json["fstatement"]["name"], "sysctl");

        let back: FilterExpr = serde_json::from_value(json).unwrap();
        assert_eq!(back, expr);
    }

    #[test]
    fn test_nested_compound_tree() {
        let tree = FilterExpr::And(vec![
            FilterExpr::Fstatement(Fstatement {
                name: "fstat".to_string(),
                value: "size".to_string(),
                params: Some("/etc/hosts".to_string()),
            }),
            FilterExpr::Or(vec![FilterExpr::Fstatement(Fstatement {
                name: "puppet".to_string(),
                value: "enabled".to_string(),
                params: None,
            })]),
        ]);
        let json = serde_json::to_string(&tree).unwrap();
        let back: FilterExpr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }
}
