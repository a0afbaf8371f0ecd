//! Compiles token query plans into SQLite statements.
//!
//! Every stage of a [`TokenQueryPlan`] maps onto one clause of a single
//! `SELECT` over `minted_tokens t`, with the offer joined as `o` and the
//! active resale listing as `r`. Token and price comparisons run under the
//! `numeric` collation registered on each connection.

use common::prelude::{
    JoinContext, MintedToken, NftMetadata, Offer, ProductToken, ResaleTokenOffer, TokenQueryPlan,
    NUMERIC_COLLATION,
};
use common::query::{OfferJoin, SortDirection, SortField, Stage, TokenBound};
use sqlx::types::Json;
use sqlx::{FromRow, QueryBuilder, Sqlite};

use super::Database;

/// One row of a page query: the token, its offer and optional resale listing.
#[derive(Debug, Clone, FromRow)]
struct ProductTokenRow {
    t_id: String,
    t_contract_id: String,
    t_token: String,
    t_unique_index_in_contract: String,
    t_is_minted: bool,
    t_owner_address: Option<String>,
    t_offer: i64,
    t_offer_pool: Option<i64>,
    t_metadata: Json<NftMetadata>,
    o_id: String,
    o_contract_id: String,
    o_product: i64,
    o_offer_pool: Option<i64>,
    o_offer_index: Option<i64>,
    o_diamond_range_index: Option<i64>,
    o_range_start: String,
    o_range_end: String,
    o_price: String,
    o_offer_name: String,
    o_copies: i64,
    o_locked_copies: i64,
    r_id: Option<String>,
    r_contract_id: Option<String>,
    r_token_index: Option<String>,
    r_price: Option<String>,
    r_seller: Option<String>,
    r_buyer: Option<String>,
}

impl From<ProductTokenRow> for ProductToken {
    fn from(row: ProductTokenRow) -> Self {
        let resale_data = match (row.r_id, row.r_contract_id, row.r_token_index, row.r_seller) {
            (Some(id), Some(contract), Some(token_index), Some(seller)) => Some(ResaleTokenOffer {
                id,
                contract,
                token_index,
                price: row.r_price.unwrap_or_default(),
                seller,
                buyer: row.r_buyer,
            }),
            _ => None,
        };

        Self {
            minted: MintedToken {
                id: row.t_id,
                contract: row.t_contract_id,
                token: row.t_token,
                unique_index_in_contract: row.t_unique_index_in_contract,
                is_minted: row.t_is_minted,
                owner_address: row.t_owner_address,
                offer: row.t_offer,
                offer_pool: row.t_offer_pool,
                metadata: row.t_metadata.0,
            },
            offer: Offer {
                id: row.o_id,
                contract: row.o_contract_id,
                product: row.o_product,
                offer_pool: row.o_offer_pool,
                offer_index: row.o_offer_index,
                diamond_range_index: row.o_diamond_range_index,
                range: [row.o_range_start, row.o_range_end],
                price: row.o_price,
                offer_name: row.o_offer_name,
                copies: row.o_copies,
                locked_copies: row.o_locked_copies,
            },
            resale_data,
        }
    }
}

const TOKEN_COLUMNS: &str = "t.id AS t_id, t.contract_id AS t_contract_id, t.token AS t_token, \
     t.unique_index_in_contract AS t_unique_index_in_contract, t.is_minted AS t_is_minted, \
     t.owner_address AS t_owner_address, t.offer AS t_offer, t.offer_pool AS t_offer_pool, \
     t.metadata AS t_metadata";

const OFFER_COLUMNS: &str = "o.id AS o_id, o.contract_id AS o_contract_id, o.product AS o_product, \
     o.offer_pool AS o_offer_pool, o.offer_index AS o_offer_index, \
     o.diamond_range_index AS o_diamond_range_index, o.range_start AS o_range_start, \
     o.range_end AS o_range_end, o.price AS o_price, o.offer_name AS o_offer_name, \
     o.copies AS o_copies, o.locked_copies AS o_locked_copies";

const RESALE_COLUMNS: &str = "r.id AS r_id, r.contract_id AS r_contract_id, \
     r.token_index AS r_token_index, r.price AS r_price, r.seller AS r_seller, r.buyer AS r_buyer";

const NO_RESALE_COLUMNS: &str = "NULL AS r_id, NULL AS r_contract_id, NULL AS r_token_index, \
     NULL AS r_price, NULL AS r_seller, NULL AS r_buyer";

/// First active listing for the token, in listing order.
const ACTIVE_RESALE_JOIN: &str = " JOIN resale_token_offers r ON r.rowid = (\
     SELECT r2.rowid FROM resale_token_offers r2 \
     WHERE r2.contract_id = t.contract_id \
     AND r2.token_index = t.unique_index_in_contract \
     AND r2.buyer IS NULL \
     ORDER BY r2.rowid LIMIT 1)";

/// Attribute value as text, matching how filters and counters stringify it.
const ATTRIBUTE_VALUE_TEXT: &str = "(CASE json_type(a.value, '$.value') \
     WHEN 'true' THEN 'true' WHEN 'false' THEN 'false' \
     ELSE CAST(json_extract(a.value, '$.value') AS TEXT) END)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Projection {
    Rows,
    Count,
    TokenNumbers,
    Metadata,
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("plan has no base match stage")]
    MissingMatch,
    #[error("plan filters or returns offer fields without joining offers")]
    MissingOfferJoin,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenQueryError {
    #[error("invalid token query plan: {0}")]
    Compile(#[from] CompileError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn compile(
    plan: &TokenQueryPlan,
    projection: Projection,
) -> Result<QueryBuilder<'static, Sqlite>, CompileError> {
    let stages = plan.stages();
    if plan.base_match().is_none() {
        return Err(CompileError::MissingMatch);
    }

    let offer_join = stages.iter().find_map(|stage| match stage {
        Stage::JoinOffer(join) => Some(*join),
        _ => None,
    });
    let filters_offer = stages.iter().any(|stage| match stage {
        Stage::FilterOffer(f) => f.price_from.is_some() || f.price_to.is_some(),
        Stage::Sort(keys) => keys.iter().any(|k| k.field == SortField::OfferPrice),
        _ => false,
    });
    if offer_join.is_none() && (filters_offer || projection == Projection::Rows) {
        return Err(CompileError::MissingOfferJoin);
    }
    let resale = plan.joins_resale();

    let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
    match projection {
        Projection::Rows => {
            qb.push(TOKEN_COLUMNS).push(", ").push(OFFER_COLUMNS).push(", ");
            qb.push(if resale { RESALE_COLUMNS } else { NO_RESALE_COLUMNS });
        }
        Projection::Count => {
            qb.push("COUNT(*)");
        }
        Projection::TokenNumbers => {
            qb.push("DISTINCT t.token");
        }
        Projection::Metadata => {
            qb.push("t.metadata");
        }
    }
    qb.push(" FROM minted_tokens t");

    match offer_join {
        Some(OfferJoin::DiamondRange) => {
            qb.push(
                " JOIN offers o ON o.contract_id = t.contract_id \
                 AND o.diamond_range_index = t.offer",
            );
        }
        Some(OfferJoin::PoolOffer) => {
            qb.push(
                " JOIN offers o ON o.contract_id = t.contract_id \
                 AND o.offer_pool = t.offer_pool AND o.offer_index = t.offer",
            );
        }
        None => {}
    }
    if resale {
        qb.push(ACTIVE_RESALE_JOIN);
    }

    qb.push(" WHERE 1");
    for stage in stages {
        match stage {
            Stage::Match(base) => {
                qb.push(" AND t.contract_id = ").push_bind(base.contract.clone());
                match &base.token {
                    TokenBound::Any => {}
                    TokenBound::AtLeast(first) => {
                        qb.push(format!(" AND t.token COLLATE {NUMERIC_COLLATION} >= "))
                            .push_bind(first.clone());
                    }
                    TokenBound::Exactly(token) => {
                        qb.push(format!(" AND t.token COLLATE {NUMERIC_COLLATION} = "))
                            .push_bind(token.clone());
                    }
                }
                match &base.join {
                    JoinContext::Diamond { offer_indexes } if offer_indexes.is_empty() => {
                        qb.push(" AND 0");
                    }
                    JoinContext::Diamond { offer_indexes } => {
                        qb.push(" AND t.offer IN (");
                        let mut list = qb.separated(", ");
                        for index in offer_indexes {
                            list.push_bind(*index);
                        }
                        list.push_unseparated(")");
                    }
                    JoinContext::Pool { pool_index } => {
                        qb.push(" AND t.offer_pool = ").push_bind(*pool_index);
                    }
                }
            }
            Stage::FilterOffer(filter) => {
                if let Some(from) = &filter.price_from {
                    qb.push(format!(" AND o.price COLLATE {NUMERIC_COLLATION} >= "))
                        .push_bind(from.clone());
                }
                if let Some(to) = &filter.price_to {
                    qb.push(format!(" AND o.price COLLATE {NUMERIC_COLLATION} <= "))
                        .push_bind(to.clone());
                }
                if let Some(minted) = filter.minted {
                    qb.push(" AND t.is_minted = ").push_bind(minted);
                }
            }
            Stage::MetadataAny(filters) => {
                qb.push(
                    " AND EXISTS (SELECT 1 FROM json_each(t.metadata, '$.attributes') a WHERE 0",
                );
                for (trait_type, accepted) in filters.iter() {
                    if accepted.is_empty() {
                        continue;
                    }
                    qb.push(" OR (json_extract(a.value, '$.trait_type') = ")
                        .push_bind(trait_type.clone())
                        .push(" AND ")
                        .push(ATTRIBUTE_VALUE_TEXT)
                        .push(" IN (");
                    let mut list = qb.separated(", ");
                    for value in accepted {
                        list.push_bind(value.clone());
                    }
                    list.push_unseparated("))");
                }
                qb.push(")");
            }
            Stage::JoinOffer(_) | Stage::ActiveResale | Stage::Sort(_) | Stage::Limit(_) => {}
        }
    }

    if projection == Projection::Count {
        return Ok(qb);
    }

    let sort = stages.iter().find_map(|stage| match stage {
        Stage::Sort(keys) => Some(keys),
        _ => None,
    });
    if let Some(keys) = sort.filter(|keys| !keys.is_empty()) {
        let mut order = qb.separated(", ");
        order.push_unseparated(" ORDER BY ");
        for key in keys {
            let column = match key.field {
                SortField::OfferPrice => "o.price",
                SortField::Token => "t.token",
            };
            let direction = match key.direction {
                SortDirection::Ascending => "ASC",
                SortDirection::Descending => "DESC",
            };
            order.push(format!("{column} COLLATE {NUMERIC_COLLATION} {direction}"));
        }
    }

    if let Some(limit) = plan.limit() {
        qb.push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }

    Ok(qb)
}

impl Database {
    /// Rows matched by a plan, ignoring any sort or limit stage.
    pub async fn count_tokens(&self, plan: &TokenQueryPlan) -> Result<u64, TokenQueryError> {
        let mut qb = compile(plan, Projection::Count)?;
        let count: i64 = qb.build_query_scalar().fetch_one(&**self).await?;
        Ok(count.max(0) as u64)
    }

    pub async fn fetch_tokens(
        &self,
        plan: &TokenQueryPlan,
    ) -> Result<Vec<ProductToken>, TokenQueryError> {
        let mut qb = compile(plan, Projection::Rows)?;
        let rows: Vec<ProductTokenRow> = qb.build_query_as().fetch_all(&**self).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Distinct token numbers matched by a plan, in the plan's sort order.
    pub async fn token_numbers(
        &self,
        plan: &TokenQueryPlan,
    ) -> Result<Vec<String>, TokenQueryError> {
        let mut qb = compile(plan, Projection::TokenNumbers)?;
        let tokens: Vec<String> = qb.build_query_scalar().fetch_all(&**self).await?;
        Ok(tokens)
    }

    /// Metadata of every token matched by a plan.
    pub async fn token_metadata(
        &self,
        plan: &TokenQueryPlan,
    ) -> Result<Vec<NftMetadata>, TokenQueryError> {
        let mut qb = compile(plan, Projection::Metadata)?;
        let rows: Vec<Json<NftMetadata>> = qb.build_query_scalar().fetch_all(&**self).await?;
        Ok(rows.into_iter().map(|Json(metadata)| metadata).collect())
    }

    pub async fn insert_minted_token(&self, token: &MintedToken) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO minted_tokens (
                id, contract_id, token, unique_index_in_contract, is_minted,
                owner_address, offer, offer_pool, metadata
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&token.id)
        .bind(&token.contract)
        .bind(&token.token)
        .bind(&token.unique_index_in_contract)
        .bind(token.is_minted)
        .bind(&token.owner_address)
        .bind(token.offer)
        .bind(token.offer_pool)
        .bind(Json(&token.metadata))
        .execute(&**self)
        .await?;

        Ok(())
    }

    pub async fn insert_resale_offer(&self, resale: &ResaleTokenOffer) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO resale_token_offers (id, contract_id, token_index, price, seller, buyer)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&resale.id)
        .bind(&resale.contract)
        .bind(&resale.token_index)
        .bind(&resale.price)
        .bind(&resale.seller)
        .bind(&resale.buyer)
        .execute(&**self)
        .await?;

        Ok(())
    }
}
