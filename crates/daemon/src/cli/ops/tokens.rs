use clap::Args;

use common::prelude::TokenQueryParams;
use marketplace_daemon::http_server::api::client::ApiError;
use marketplace_daemon::http_server::api::v0::product::tokens::{
    ListTokensRequest, ListTokensResponse,
};

/// List the tokens of a product through a running daemon
#[derive(Args, Debug, Clone)]
pub struct Tokens {
    /// Contract id
    #[arg(long)]
    pub contract: String,

    /// Product index inside the contract
    #[arg(long)]
    pub product: i64,

    /// First token to return (1-based)
    #[arg(long)]
    pub from_token: Option<String>,

    /// Absolute position limit, not a page size. At most
    /// `from_token - 1 + to_token` tokens are returned, starting at `from_token`.
    #[arg(long)]
    pub to_token: Option<String>,

    /// Sort by offer price: 1 or -1
    #[arg(long, allow_hyphen_values = true)]
    pub sort_by_price: Option<String>,

    /// Sort by token number: 1 or -1
    #[arg(long, allow_hyphen_values = true)]
    pub sort_by_token: Option<String>,

    #[arg(long)]
    pub price_from: Option<String>,

    #[arg(long)]
    pub price_to: Option<String>,

    /// Only unminted tokens (true) or only minted tokens (false)
    #[arg(long)]
    pub for_sale: Option<String>,

    /// Only tokens with an active resale listing
    #[arg(long)]
    pub on_resale: bool,

    /// JSON object of trait name to accepted values
    #[arg(long)]
    pub metadata_filters: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokensError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Tokens {
    type Error = TokensError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        let request = ListTokensRequest {
            contract_id: self.contract.clone(),
            product: self.product,
            params: TokenQueryParams {
                from_token: self.from_token.clone(),
                to_token: self.to_token.clone(),
                sort_by_token: self.sort_by_token.clone(),
                sort_by_price: self.sort_by_price.clone(),
                price_from: self.price_from.clone(),
                price_to: self.price_to.clone(),
                for_sale: self.for_sale.clone(),
                on_resale: self.on_resale.then(|| "true".to_string()),
                metadata_filters: self.metadata_filters.clone(),
            },
        };

        let response: ListTokensResponse = client.call(request).await?;
        let page = response.result;

        let mut lines = vec![format!("total: {}", page.total_count)];
        lines.extend(page.tokens.iter().map(|token| {
            let resale = token
                .resale_data
                .as_ref()
                .map(|r| format!(" resale {}", r.price))
                .unwrap_or_default();
            format!(
                "#{} {} [{} @ {}]{}{}",
                token.minted.token,
                token.minted.metadata.name,
                token.offer.offer_name,
                token.offer.price,
                if token.minted.is_minted { " minted" } else { "" },
                resale
            )
        }));

        Ok(lines.join("\n"))
    }
}
