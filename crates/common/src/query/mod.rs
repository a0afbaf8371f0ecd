use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

mod plan;

pub use plan::{
    OfferFilter, OfferJoin, SortDirection, SortField, SortKey, Stage, TokenBound, TokenMatch,
    TokenQuery, TokenQueryPlan, TokenQueryPlanner,
};

pub const DEFAULT_FROM_TOKEN: u128 = 0;
pub const DEFAULT_TO_TOKEN: u128 = 20;

/// How the tokens of a product correlate with its offers.
///
/// Decided once per query by the contract's `diamond` flag; the two paths
/// are never mixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum JoinContext {
    /// Tokens reference an offer's `diamondRangeIndex` through `offer`.
    Diamond { offer_indexes: BTreeSet<i64> },
    /// Tokens reference the pool's `marketplaceCatalogIndex` through
    /// `offerPool` and the offer's `offerIndex` through `offer`.
    Pool { pool_index: i64 },
}

/// Raw listing parameters as they arrive on the query string.
///
/// Values stay strings until planning so that an empty value and an absent
/// one can be told apart the way clients send them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenQueryParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub for_sale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_resale: Option<String>,
    /// JSON object mapping a trait name to its accepted values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_filters: Option<String>,
}

/// Trait name → accepted values. A token matches when ANY listed trait has
/// one of its accepted values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilters(BTreeMap<String, Vec<String>>);

impl MetadataFilters {
    pub fn parse(raw: &str) -> Result<Self, MetadataFilterError> {
        let parsed: BTreeMap<String, serde_json::Value> = serde_json::from_str(raw)?;

        let mut filters = BTreeMap::new();
        for (trait_type, accepted) in parsed {
            let serde_json::Value::Array(values) = accepted else {
                return Err(MetadataFilterError::NotAList(trait_type));
            };
            let values = values
                .into_iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect();
            filters.insert(trait_type, values);
        }

        Ok(Self(filters))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// Evaluate the filter against a list of `(trait_type, value)` pairs.
    pub fn matches<'a>(&self, attributes: impl IntoIterator<Item = (&'a str, String)>) -> bool {
        attributes.into_iter().any(|(trait_type, value)| {
            self.0
                .get(trait_type)
                .is_some_and(|accepted| accepted.contains(&value))
        })
    }
}

impl FromIterator<(String, Vec<String>)> for MetadataFilters {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataFilterError {
    #[error("metadata filters are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("accepted values for trait '{0}' must be a list")]
    NotAList(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueryParamError {
    #[error("{field} must be a non-negative integer, got '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{field} must be 1 or -1, got '{value}'")]
    InvalidSortDirection { field: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metadata_filters() {
        let filters = MetadataFilters::parse(r#"{"Color":["Red","Blue"],"Level":[5]}"#).unwrap();
        let collected: Vec<_> = filters.iter().collect();
        assert_eq!(collected.len(), 2);
        assert_eq!(
            collected[0],
            (&"Color".to_string(), &vec!["Red".to_string(), "Blue".to_string()])
        );
        assert_eq!(collected[1], (&"Level".to_string(), &vec!["5".to_string()]));
    }

    #[test]
    fn test_malformed_metadata_filters() {
        assert!(MetadataFilters::parse("not json").is_err());
        assert!(MetadataFilters::parse(r#"["Color"]"#).is_err());
        assert!(matches!(
            MetadataFilters::parse(r#"{"Color":"Red"}"#),
            Err(MetadataFilterError::NotAList(_))
        ));
    }

    #[test]
    fn test_metadata_filters_match_any_trait() {
        let filters = MetadataFilters::parse(r#"{"Color":["Red","Blue"],"Eyes":["Laser"]}"#)
            .unwrap();

        assert!(filters.matches([("Color", "Red".to_string())]));
        assert!(filters.matches([
            ("Color", "Green".to_string()),
            ("Eyes", "Laser".to_string())
        ]));
        assert!(!filters.matches([("Color", "Green".to_string())]));
        assert!(!filters.matches([("Hat", "Red".to_string())]));
    }

    #[test]
    fn test_join_context_serializes_mode() {
        let ctx = JoinContext::Pool { pool_index: 3 };
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["mode"], "pool");
        assert_eq!(json["pool_index"], 3);
    }
}
