//! Runs the two plans of a listing request and post-processes the page.

use common::prelude::{count_attributes, ProductToken, TokenQuery, TokenQueryPlan};
use serde::{Deserialize, Serialize};

use crate::database::{Database, TokenQueryError};

/// Where token plans are executed.
#[async_trait::async_trait]
pub trait TokenStore {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn count_tokens(&self, plan: &TokenQueryPlan) -> Result<u64, Self::Error>;

    async fn fetch_tokens(&self, plan: &TokenQueryPlan) -> Result<Vec<ProductToken>, Self::Error>;
}

#[async_trait::async_trait]
impl TokenStore for Database {
    type Error = TokenQueryError;

    async fn count_tokens(&self, plan: &TokenQueryPlan) -> Result<u64, Self::Error> {
        Database::count_tokens(self, plan).await
    }

    async fn fetch_tokens(&self, plan: &TokenQueryPlan) -> Result<Vec<ProductToken>, Self::Error> {
        Database::fetch_tokens(self, plan).await
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPage {
    pub total_count: u64,
    pub tokens: Vec<ProductToken>,
}

/// Count first, then fetch the page and annotate its attributes.
///
/// The two statements run without a shared transaction, so a concurrent
/// write can make `total_count` disagree with the page.
pub async fn execute_token_query<S>(store: &S, query: &TokenQuery) -> Result<TokenPage, S::Error>
where
    S: TokenStore + Sync,
{
    let total_count = store.count_tokens(&query.count).await?;
    let tokens = store.fetch_tokens(&query.page).await?;
    tracing::debug!(total_count, page = tokens.len(), "token query executed");

    Ok(TokenPage {
        total_count,
        tokens: count_attributes(tokens),
    })
}
