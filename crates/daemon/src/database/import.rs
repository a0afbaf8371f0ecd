use common::prelude::{
    Contract, File, MintedToken, Offer, OfferPool, Product, ResaleTokenOffer, ServerSetting,
    Unlock,
};
use serde::{Deserialize, Serialize};

use super::Database;

/// A batch of marketplace documents, as written by the indexer that feeds
/// this service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportBundle {
    pub contracts: Vec<Contract>,
    pub products: Vec<Product>,
    pub offers: Vec<Offer>,
    pub offer_pools: Vec<OfferPool>,
    pub minted_tokens: Vec<MintedToken>,
    pub resale_token_offers: Vec<ResaleTokenOffer>,
    pub files: Vec<File>,
    pub unlocks: Vec<Unlock>,
    pub server_setting: Option<ServerSetting>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub contracts: usize,
    pub products: usize,
    pub offers: usize,
    pub offer_pools: usize,
    pub minted_tokens: usize,
    pub resale_token_offers: usize,
    pub files: usize,
    pub unlocks: usize,
}

impl std::fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "imported {} contracts, {} products, {} offers, {} offer pools, {} tokens, \
             {} resale offers, {} files, {} unlocks",
            self.contracts,
            self.products,
            self.offers,
            self.offer_pools,
            self.minted_tokens,
            self.resale_token_offers,
            self.files,
            self.unlocks
        )
    }
}

impl Database {
    /// Insert every document of the bundle. Stops at the first failing row;
    /// rows written before it stay.
    pub async fn import_bundle(&self, bundle: &ImportBundle) -> Result<ImportSummary, sqlx::Error> {
        for contract in &bundle.contracts {
            self.insert_contract(contract).await?;
        }
        for product in &bundle.products {
            self.insert_product(product).await?;
        }
        for offer in &bundle.offers {
            self.insert_offer(offer).await?;
        }
        for pool in &bundle.offer_pools {
            self.insert_offer_pool(pool).await?;
        }
        for token in &bundle.minted_tokens {
            self.insert_minted_token(token).await?;
        }
        for resale in &bundle.resale_token_offers {
            self.insert_resale_offer(resale).await?;
        }
        for file in &bundle.files {
            self.insert_file(file).await?;
        }
        for unlock in &bundle.unlocks {
            self.insert_unlock(unlock).await?;
        }
        if let Some(setting) = bundle.server_setting {
            self.set_server_setting(setting).await?;
        }

        let summary = ImportSummary {
            contracts: bundle.contracts.len(),
            products: bundle.products.len(),
            offers: bundle.offers.len(),
            offer_pools: bundle.offer_pools.len(),
            minted_tokens: bundle.minted_tokens.len(),
            resale_token_offers: bundle.resale_token_offers.len(),
            files: bundle.files.len(),
            unlocks: bundle.unlocks.len(),
        };
        tracing::info!(%summary, "bundle imported");

        Ok(summary)
    }
}
