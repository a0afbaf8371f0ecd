use clap::Args;

use marketplace_daemon::http_server::api::client::ApiError;
use marketplace_daemon::http_server::api::v0::product::token_numbers::{
    TokenNumbersRequest, TokenNumbersResponse,
};

/// Print every token number of a product, one per line
#[derive(Args, Debug, Clone)]
pub struct TokenNumbers {
    /// Contract id
    #[arg(long)]
    pub contract: String,

    /// Product index inside the contract
    #[arg(long)]
    pub product: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenNumbersError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for TokenNumbers {
    type Error = TokenNumbersError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();

        let request = TokenNumbersRequest {
            contract_id: self.contract.clone(),
            product: self.product,
        };
        let response: TokenNumbersResponse = client.call(request).await?;

        if response.tokens.is_empty() {
            return Ok("no tokens".to_string());
        }
        Ok(response.tokens.join("\n"))
    }
}
