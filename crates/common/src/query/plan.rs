use crate::models::ServerSetting;

use super::{
    JoinContext, MetadataFilters, QueryParamError, TokenQueryParams, DEFAULT_FROM_TOKEN,
    DEFAULT_TO_TOKEN,
};

/// Bound on the `token` field of the base match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenBound {
    Any,
    /// `token >= n` under numeric collation
    AtLeast(String),
    Exactly(String),
}

/// Base match: tokens of one contract correlated with one product's offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    pub contract: String,
    pub token: TokenBound,
    pub join: JoinContext,
}

/// Correlation keys used to attach each token to its offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferJoin {
    /// `offer.diamondRangeIndex == token.offer`
    DiamondRange,
    /// `offer.offerPool == token.offerPool AND offer.offerIndex == token.offer`
    PoolOffer,
}

impl From<&JoinContext> for OfferJoin {
    fn from(join: &JoinContext) -> Self {
        match join {
            JoinContext::Diamond { .. } => OfferJoin::DiamondRange,
            JoinContext::Pool { .. } => OfferJoin::PoolOffer,
        }
    }
}

/// Filters evaluated after the offer join.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferFilter {
    /// Inclusive lower bound on `offer.price`
    pub price_from: Option<String>,
    /// Inclusive upper bound on `offer.price`
    pub price_to: Option<String>,
    pub minted: Option<bool>,
}

impl OfferFilter {
    pub fn is_empty(&self) -> bool {
        self.price_from.is_none() && self.price_to.is_none() && self.minted.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    OfferPrice,
    Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn parse(field: &'static str, value: &str) -> Result<Self, QueryParamError> {
        match value.trim() {
            "1" => Ok(SortDirection::Ascending),
            "-1" => Ok(SortDirection::Descending),
            _ => Err(QueryParamError::InvalidSortDirection {
                field,
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

/// One step of a token query. Later stages filter the output of earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Match(TokenMatch),
    JoinOffer(OfferJoin),
    FilterOffer(OfferFilter),
    /// Keep tokens with an active resale listing and attach the first one
    ActiveResale,
    MetadataAny(MetadataFilters),
    Sort(Vec<SortKey>),
    Limit(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenQueryPlan {
    stages: Vec<Stage>,
}

impl TokenQueryPlan {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn base_match(&self) -> Option<&TokenMatch> {
        self.stages.iter().find_map(|stage| match stage {
            Stage::Match(m) => Some(m),
            _ => None,
        })
    }

    pub fn limit(&self) -> Option<u64> {
        self.stages.iter().find_map(|stage| match stage {
            Stage::Limit(n) => Some(*n),
            _ => None,
        })
    }

    pub fn joins_resale(&self) -> bool {
        self.stages.contains(&Stage::ActiveResale)
    }
}

/// The two plans a listing request runs: the paged, sorted view and the
/// unbounded count over the same filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenQuery {
    pub page: TokenQueryPlan,
    pub count: TokenQueryPlan,
}

/// Builds token query plans for one product of one contract.
#[derive(Debug, Clone)]
pub struct TokenQueryPlanner<'a> {
    contract: &'a str,
    join: &'a JoinContext,
    settings: ServerSetting,
}

impl<'a> TokenQueryPlanner<'a> {
    pub fn new(contract: &'a str, join: &'a JoinContext, settings: ServerSetting) -> Self {
        Self {
            contract,
            join,
            settings,
        }
    }

    fn base_match(&self, token: TokenBound) -> Stage {
        Stage::Match(TokenMatch {
            contract: self.contract.to_string(),
            token,
            join: self.join.clone(),
        })
    }

    /// Plan the product listing.
    pub fn plan(&self, params: &TokenQueryParams) -> Result<TokenQuery, QueryParamError> {
        let from_token =
            parse_index("fromToken", params.from_token.as_deref(), DEFAULT_FROM_TOKEN)?;
        let to_token = parse_index("toToken", params.to_token.as_deref(), DEFAULT_TO_TOKEN)?;

        // fromToken is 1-based
        let first_token = from_token.saturating_sub(1);
        let token_limit = match first_token.saturating_add(to_token) {
            0 => 1,
            n => n.min(i64::MAX as u128) as u64,
        };

        let mut prefix = vec![
            self.base_match(TokenBound::AtLeast(first_token.to_string())),
            Stage::JoinOffer(OfferJoin::from(self.join)),
            Stage::FilterOffer(self.offer_filter(params)?),
        ];

        if params.on_resale.as_deref() == Some("true") {
            prefix.push(Stage::ActiveResale);
        }

        if let Some(raw) = non_empty(params.metadata_filters.as_deref()) {
            match MetadataFilters::parse(raw) {
                Ok(filters) if filters.is_empty() => {
                    tracing::debug!("empty metadata filters, skipping stage");
                }
                Ok(filters) => prefix.push(Stage::MetadataAny(filters)),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring malformed metadata filters");
                }
            }
        }

        let mut count = prefix.clone();
        count[0] = self.base_match(TokenBound::Any);

        let mut page = prefix;
        let sort = sort_keys(params)?;
        if !sort.is_empty() {
            page.push(Stage::Sort(sort));
        }
        page.push(Stage::Limit(token_limit));

        Ok(TokenQuery {
            page: TokenQueryPlan::new(page),
            count: TokenQueryPlan::new(count),
        })
    }

    /// Every token number of the product, ascending.
    pub fn token_numbers(&self) -> TokenQueryPlan {
        TokenQueryPlan::new(vec![
            self.base_match(TokenBound::Any),
            Stage::Sort(vec![SortKey {
                field: SortField::Token,
                direction: SortDirection::Ascending,
            }]),
        ])
    }

    /// A single token of the product joined with its offer.
    pub fn single_token(&self, token: &str) -> TokenQueryPlan {
        TokenQueryPlan::new(vec![
            self.base_match(TokenBound::Exactly(token.to_string())),
            Stage::JoinOffer(OfferJoin::from(self.join)),
            Stage::Limit(1),
        ])
    }

    fn offer_filter(&self, params: &TokenQueryParams) -> Result<OfferFilter, QueryParamError> {
        let price_from = non_empty(params.price_from.as_deref())
            .map(|v| parse_index("priceFrom", Some(v), 0).map(|_| v.trim().to_string()))
            .transpose()?;
        let price_to = non_empty(params.price_to.as_deref())
            .map(|v| parse_index("priceTo", Some(v), 0).map(|_| v.trim().to_string()))
            .transpose()?;

        let minted = if self.settings.only_minted_tokens_result {
            Some(true)
        } else {
            non_empty(params.for_sale.as_deref()).map(|v| v != "true")
        };

        Ok(OfferFilter {
            price_from,
            price_to,
            minted,
        })
    }
}

fn sort_keys(params: &TokenQueryParams) -> Result<Vec<SortKey>, QueryParamError> {
    let mut keys = Vec::new();

    if let Some(v) = non_empty(params.sort_by_price.as_deref()) {
        keys.push(SortKey {
            field: SortField::OfferPrice,
            direction: SortDirection::parse("sortByPrice", v)?,
        });
    }

    let token_direction = match params.sort_by_token.as_deref() {
        None => Some(SortDirection::Ascending),
        Some(v) if v.is_empty() => None,
        Some(v) => Some(SortDirection::parse("sortByToken", v)?),
    };
    if let Some(direction) = token_direction {
        keys.push(SortKey {
            field: SortField::Token,
            direction,
        });
    }

    Ok(keys)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_index(
    field: &'static str,
    value: Option<&str>,
    default: u128,
) -> Result<u128, QueryParamError> {
    match non_empty(value) {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse::<u128>()
            .map_err(|_| QueryParamError::InvalidNumber {
                field,
                value: v.to_string(),
            }),
    }
}
