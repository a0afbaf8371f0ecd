use common::prelude::{AttributeSummary, ProductAttributes, ServerSetting};
use sqlx::types::Json;

use super::Database;

impl Database {
    pub async fn server_setting(&self) -> Result<ServerSetting, sqlx::Error> {
        let only_minted: Option<bool> = sqlx::query_scalar(
            "SELECT only_minted_tokens_result FROM server_settings WHERE id = 1",
        )
        .fetch_optional(&**self)
        .await?;

        Ok(ServerSetting {
            only_minted_tokens_result: only_minted.unwrap_or_default(),
        })
    }

    pub async fn set_server_setting(&self, setting: ServerSetting) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO server_settings (id, only_minted_tokens_result)
            VALUES (1, ?1)
            ON CONFLICT (id) DO UPDATE SET only_minted_tokens_result = excluded.only_minted_tokens_result
            "#,
        )
        .bind(setting.only_minted_tokens_result)
        .execute(&**self)
        .await?;

        Ok(())
    }

    /// Cached attribute catalog of a product, if one was stored.
    pub async fn product_attributes(
        &self,
        contract_id: &str,
        product: i64,
    ) -> Result<Option<ProductAttributes>, sqlx::Error> {
        let attributes: Option<Json<Vec<AttributeSummary>>> = sqlx::query_scalar(
            r#"
            SELECT attributes
            FROM product_attributes
            WHERE contract_id = ?1 AND product = ?2
            "#,
        )
        .bind(contract_id)
        .bind(product)
        .fetch_optional(&**self)
        .await?;

        Ok(attributes.map(|Json(attributes)| ProductAttributes {
            contract: contract_id.to_string(),
            product,
            attributes,
        }))
    }

    pub async fn store_product_attributes(
        &self,
        catalog: &ProductAttributes,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO product_attributes (contract_id, product, attributes)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (contract_id, product) DO UPDATE SET attributes = excluded.attributes
            "#,
        )
        .bind(&catalog.contract)
        .bind(catalog.product)
        .bind(Json(&catalog.attributes))
        .execute(&**self)
        .await?;

        Ok(())
    }
}
