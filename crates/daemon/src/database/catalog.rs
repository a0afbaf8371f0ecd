use std::collections::BTreeSet;

use common::prelude::{Contract, JoinContext, Offer, OfferPool, Product};
use sqlx::FromRow;

use super::Database;

#[derive(Debug, Clone, FromRow)]
struct ContractRow {
    id: String,
    blockchain: String,
    contract_address: String,
    diamond: bool,
    user_address: String,
}

impl From<ContractRow> for Contract {
    fn from(row: ContractRow) -> Self {
        Self {
            id: row.id,
            blockchain: row.blockchain,
            contract_address: row.contract_address,
            diamond: row.diamond,
            user: row.user_address,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct ProductRow {
    contract_id: String,
    collection_index_in_contract: i64,
    name: String,
    copies: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            contract: row.contract_id,
            collection_index_in_contract: row.collection_index_in_contract,
            name: row.name,
            copies: row.copies,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub(super) struct OfferRow {
    pub id: String,
    pub contract_id: String,
    pub product: i64,
    pub offer_pool: Option<i64>,
    pub offer_index: Option<i64>,
    pub diamond_range_index: Option<i64>,
    pub range_start: String,
    pub range_end: String,
    pub price: String,
    pub offer_name: String,
    pub copies: i64,
    pub locked_copies: i64,
}

impl From<OfferRow> for Offer {
    fn from(row: OfferRow) -> Self {
        Self {
            id: row.id,
            contract: row.contract_id,
            product: row.product,
            offer_pool: row.offer_pool,
            offer_index: row.offer_index,
            diamond_range_index: row.diamond_range_index,
            range: [row.range_start, row.range_end],
            price: row.price,
            offer_name: row.offer_name,
            copies: row.copies,
            locked_copies: row.locked_copies,
        }
    }
}

pub(super) const OFFER_COLUMNS: &str = "id, contract_id, product, offer_pool, offer_index, \
     diamond_range_index, range_start, range_end, price, offer_name, copies, locked_copies";

impl Database {
    pub async fn get_contract(&self, contract_id: &str) -> Result<Option<Contract>, sqlx::Error> {
        let row = sqlx::query_as::<_, ContractRow>(
            r#"
            SELECT id, blockchain, contract_address, diamond, user_address
            FROM contracts
            WHERE id = ?1
            "#,
        )
        .bind(contract_id)
        .fetch_optional(&**self)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn get_product(
        &self,
        contract_id: &str,
        product: i64,
    ) -> Result<Option<Product>, sqlx::Error> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT contract_id, collection_index_in_contract, name, copies
            FROM products
            WHERE contract_id = ?1 AND collection_index_in_contract = ?2
            "#,
        )
        .bind(contract_id)
        .bind(product)
        .fetch_optional(&**self)
        .await?;

        Ok(row.map(Into::into))
    }

    /// All offers of a product in insertion order.
    pub async fn product_offers(
        &self,
        contract_id: &str,
        product: i64,
    ) -> Result<Vec<Offer>, sqlx::Error> {
        let rows = sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {OFFER_COLUMNS} FROM offers \
             WHERE contract_id = ?1 AND product = ?2 ORDER BY rowid"
        ))
        .bind(contract_id)
        .bind(product)
        .fetch_all(&**self)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Offers of a product that hold back at least one locked copy.
    pub async fn locked_offers(
        &self,
        contract_id: &str,
        product: i64,
    ) -> Result<Vec<Offer>, sqlx::Error> {
        let rows = sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {OFFER_COLUMNS} FROM offers \
             WHERE contract_id = ?1 AND product = ?2 AND locked_copies > 0 ORDER BY rowid"
        ))
        .bind(contract_id)
        .bind(product)
        .fetch_all(&**self)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_offer_pool(
        &self,
        contract_id: &str,
        product: i64,
    ) -> Result<Option<OfferPool>, sqlx::Error> {
        let row: Option<(String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT contract_id, product, marketplace_catalog_index
            FROM offer_pools
            WHERE contract_id = ?1 AND product = ?2
            "#,
        )
        .bind(contract_id)
        .bind(product)
        .fetch_optional(&**self)
        .await?;

        Ok(row.map(|(contract, product, marketplace_catalog_index)| OfferPool {
            contract,
            product,
            marketplace_catalog_index,
        }))
    }

    /// Decide how tokens of `(contract, product)` correlate with offers.
    pub async fn resolve_join_context(
        &self,
        contract: &Contract,
        product: i64,
    ) -> Result<JoinContext, ResolveError> {
        if contract.diamond {
            let indexes: Vec<i64> = sqlx::query_scalar(
                r#"
                SELECT DISTINCT diamond_range_index
                FROM offers
                WHERE contract_id = ?1 AND product = ?2 AND diamond_range_index IS NOT NULL
                "#,
            )
            .bind(&contract.id)
            .bind(product)
            .fetch_all(&**self)
            .await?;

            if indexes.is_empty() {
                return Err(ResolveError::OffersNotFound);
            }

            return Ok(JoinContext::Diamond {
                offer_indexes: indexes.into_iter().collect::<BTreeSet<_>>(),
            });
        }

        let pool = self
            .get_offer_pool(&contract.id, product)
            .await?
            .ok_or(ResolveError::OfferPoolNotFound)?;

        Ok(JoinContext::Pool {
            pool_index: pool.marketplace_catalog_index,
        })
    }

    pub async fn insert_contract(&self, contract: &Contract) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO contracts (id, blockchain, contract_address, diamond, user_address)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&contract.id)
        .bind(&contract.blockchain)
        .bind(&contract.contract_address)
        .bind(contract.diamond)
        .bind(&contract.user)
        .execute(&**self)
        .await?;

        Ok(())
    }

    pub async fn insert_product(&self, product: &Product) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO products (contract_id, collection_index_in_contract, name, copies)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&product.contract)
        .bind(product.collection_index_in_contract)
        .bind(&product.name)
        .bind(product.copies)
        .execute(&**self)
        .await?;

        Ok(())
    }

    pub async fn insert_offer(&self, offer: &Offer) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO offers (
                id, contract_id, product, offer_pool, offer_index, diamond_range_index,
                range_start, range_end, price, offer_name, copies, locked_copies
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&offer.id)
        .bind(&offer.contract)
        .bind(offer.product)
        .bind(offer.offer_pool)
        .bind(offer.offer_index)
        .bind(offer.diamond_range_index)
        .bind(&offer.range[0])
        .bind(&offer.range[1])
        .bind(&offer.price)
        .bind(&offer.offer_name)
        .bind(offer.copies)
        .bind(offer.locked_copies)
        .execute(&**self)
        .await?;

        Ok(())
    }

    pub async fn insert_offer_pool(&self, pool: &OfferPool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO offer_pools (contract_id, product, marketplace_catalog_index)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&pool.contract)
        .bind(pool.product)
        .bind(pool.marketplace_catalog_index)
        .execute(&**self)
        .await?;

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Offers not found.")]
    OffersNotFound,
    #[error("OfferPools not found.")]
    OfferPoolNotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
