use std::cmp::Ordering;
use std::collections::HashMap;

use common::prelude::{numeric_cmp, File, Unlock};
use sqlx::{FromRow, QueryBuilder, Sqlite};

use super::Database;
use crate::access::{FileCandidate, UnlockOwnership};

#[derive(Debug, Clone, FromRow)]
struct FileRow {
    id: String,
    title: String,
    file_type: String,
    hidden: bool,
    storage_key: Option<String>,
    encryption_type: Option<String>,
    total_encrypted_files: Option<i64>,
    extension: Option<String>,
}

impl From<FileRow> for File {
    fn from(row: FileRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            file_type: row.file_type,
            hidden: row.hidden,
            key: row.storage_key,
            encryption_type: row.encryption_type,
            total_encrypted_files: row.total_encrypted_files,
            extension: row.extension,
        }
    }
}

const FILE_COLUMNS: &str = "f.id, f.title, f.file_type, f.hidden, f.storage_key, \
     f.encryption_type, f.total_encrypted_files, f.extension";

impl Database {
    /// Visible files unlocked by any offer of the product, one entry per
    /// unlock, sorted by title.
    pub async fn product_file_candidates(
        &self,
        contract_id: &str,
        product: i64,
    ) -> Result<Vec<FileCandidate>, sqlx::Error> {
        let rows = sqlx::query_as::<_, FileRow>(&format!(
            r#"
            SELECT {FILE_COLUMNS}
            FROM files f
            JOIN unlocks u ON u.file_id = f.id
            WHERE f.hidden = 0
              AND EXISTS (
                SELECT 1 FROM unlock_offers uo
                JOIN offers o ON o.id = uo.offer_id
                WHERE uo.unlock_id = u.id AND o.contract_id = ?1 AND o.product = ?2
              )
            ORDER BY f.title, u.id
            "#
        ))
        .bind(contract_id)
        .bind(product)
        .fetch_all(&**self)
        .await?;

        self.with_unlock_offers(rows).await
    }

    /// Files whose unlock covers every offer of the product whose range
    /// strictly contains `token`.
    pub async fn token_file_candidates(
        &self,
        contract_id: &str,
        product: i64,
        token: &str,
    ) -> Result<Vec<FileCandidate>, sqlx::Error> {
        let offer_ids: Vec<String> = self
            .product_offers(contract_id, product)
            .await?
            .into_iter()
            .filter(|offer| {
                numeric_cmp(&offer.range[0], token) == Ordering::Less
                    && numeric_cmp(&offer.range[1], token) == Ordering::Greater
            })
            .map(|offer| offer.id)
            .collect();

        if offer_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {FILE_COLUMNS} FROM unlocks u JOIN files f ON f.id = u.file_id \
             WHERE (SELECT COUNT(DISTINCT uo.offer_id) FROM unlock_offers uo \
             WHERE uo.unlock_id = u.id AND uo.offer_id IN ("
        ));
        let mut list = qb.separated(", ");
        for id in &offer_ids {
            list.push_bind(id.clone());
        }
        list.push_unseparated(")) = ");
        qb.push_bind(offer_ids.len() as i64);
        qb.push(" ORDER BY u.id");

        let rows: Vec<FileRow> = qb.build_query_as().fetch_all(&**self).await?;
        self.with_unlock_offers(rows).await
    }

    /// Offers of every unlock attached to a file.
    pub async fn file_unlock_offers(&self, file_id: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT DISTINCT uo.offer_id
            FROM unlocks u
            JOIN unlock_offers uo ON uo.unlock_id = u.id
            WHERE u.file_id = ?1
            ORDER BY uo.offer_id
            "#,
        )
        .bind(file_id)
        .fetch_all(&**self)
        .await
    }

    async fn with_unlock_offers(
        &self,
        rows: Vec<FileRow>,
    ) -> Result<Vec<FileCandidate>, sqlx::Error> {
        let mut offers_by_file: HashMap<String, Vec<String>> = HashMap::new();
        let mut candidates = Vec::with_capacity(rows.len());

        for row in rows {
            let offers = match offers_by_file.get(&row.id) {
                Some(offers) => offers.clone(),
                None => {
                    let offers = self.file_unlock_offers(&row.id).await?;
                    offers_by_file.insert(row.id.clone(), offers.clone());
                    offers
                }
            };
            candidates.push(FileCandidate {
                file: row.into(),
                offers,
            });
        }

        Ok(candidates)
    }

    pub async fn insert_file(&self, file: &File) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO files (
                id, title, file_type, hidden, storage_key,
                encryption_type, total_encrypted_files, extension
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&file.id)
        .bind(&file.title)
        .bind(&file.file_type)
        .bind(file.hidden)
        .bind(&file.key)
        .bind(&file.encryption_type)
        .bind(file.total_encrypted_files)
        .bind(&file.extension)
        .execute(&**self)
        .await?;

        Ok(())
    }

    pub async fn insert_unlock(&self, unlock: &Unlock) -> Result<(), sqlx::Error> {
        let mut tx = self.begin().await?;

        let unlock_id: i64 =
            sqlx::query_scalar("INSERT INTO unlocks (file_id) VALUES (?1) RETURNING id")
                .bind(&unlock.file)
                .fetch_one(&mut *tx)
                .await?;

        for offer_id in &unlock.offers {
            sqlx::query(
                "INSERT OR IGNORE INTO unlock_offers (unlock_id, offer_id) VALUES (?1, ?2)",
            )
            .bind(unlock_id)
            .bind(offer_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }
}

#[async_trait::async_trait]
impl UnlockOwnership for Database {
    type Error = sqlx::Error;

    async fn user_owns_token_unlocking(
        &self,
        user: &str,
        offer_ids: &[String],
    ) -> Result<bool, Self::Error> {
        if offer_ids.is_empty() {
            return Ok(false);
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT EXISTS (SELECT 1 FROM offers o \
             JOIN contracts c ON c.id = o.contract_id \
             JOIN minted_tokens t ON t.contract_id = o.contract_id AND ( \
               (c.diamond = 1 AND t.offer = o.diamond_range_index) \
               OR (c.diamond = 0 AND t.offer_pool = o.offer_pool AND t.offer = o.offer_index)) \
             WHERE t.is_minted = 1 AND LOWER(t.owner_address) = LOWER(",
        );
        qb.push_bind(user.to_string());
        qb.push(") AND o.id IN (");
        let mut list = qb.separated(", ");
        for id in offer_ids {
            list.push_bind(id.clone());
        }
        list.push_unseparated("))");

        let owns: bool = qb.build_query_scalar().fetch_one(&**self).await?;
        Ok(owns)
    }
}
