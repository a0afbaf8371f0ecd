use serde::{Deserialize, Serialize};

/// A deployed token contract.
///
/// `diamond` selects the offer model: diamond contracts identify offers by
/// range index, classic contracts by an offer pool plus offer index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    pub blockchain: String,
    pub contract_address: String,
    pub diamond: bool,
    /// Address of the user that deployed the contract
    pub user: String,
}

/// A collection inside a contract, addressed by its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub contract: String,
    pub collection_index_in_contract: i64,
    pub name: String,
    pub copies: i64,
}

/// A priced range of token indexes inside a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    pub contract: String,
    pub product: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_pool: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diamond_range_index: Option<i64>,
    /// `[start, end]` token indexes
    pub range: [String; 2],
    pub price: String,
    pub offer_name: String,
    pub copies: i64,
    pub locked_copies: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferPool {
    pub contract: String,
    pub product: i64,
    pub marketplace_catalog_index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAttribute {
    pub trait_type: String,
    pub value: serde_json::Value,
    /// Tokens on the same result page carrying this trait/value pair
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

impl TokenAttribute {
    pub fn new(trait_type: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
            count: None,
            percentage: None,
        }
    }

    /// The value as it is matched against metadata filters.
    pub fn value_text(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NftMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub attributes: Vec<TokenAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintedToken {
    pub id: String,
    pub contract: String,
    /// Token index inside the product, compared numerically
    pub token: String,
    pub unique_index_in_contract: String,
    pub is_minted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_address: Option<String>,
    /// Range index (diamond) or offer index inside the pool (classic)
    pub offer: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_pool: Option<i64>,
    pub metadata: NftMetadata,
}

/// A secondary-market listing. Active while no buyer is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResaleTokenOffer {
    pub id: String,
    pub contract: String,
    pub token_index: String,
    pub price: String,
    pub seller: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer: Option<String>,
}

impl ResaleTokenOffer {
    pub fn is_active(&self) -> bool {
        self.buyer.is_none()
    }
}

/// A token joined with its offer, and its active resale listing when the
/// query asked for tokens on resale.
///
/// On the wire the joined offer document takes the place of the token's
/// offer index under `offer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProductTokenWire", into = "ProductTokenWire")]
pub struct ProductToken {
    pub minted: MintedToken,
    pub offer: Offer,
    pub resale_data: Option<ResaleTokenOffer>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductTokenWire {
    id: String,
    contract: String,
    token: String,
    unique_index_in_contract: String,
    is_minted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    offer_pool: Option<i64>,
    metadata: NftMetadata,
    offer: Offer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resale_data: Option<ResaleTokenOffer>,
}

impl From<ProductToken> for ProductTokenWire {
    fn from(token: ProductToken) -> Self {
        let ProductToken {
            minted,
            offer,
            resale_data,
        } = token;
        Self {
            id: minted.id,
            contract: minted.contract,
            token: minted.token,
            unique_index_in_contract: minted.unique_index_in_contract,
            is_minted: minted.is_minted,
            owner_address: minted.owner_address,
            offer_pool: minted.offer_pool,
            metadata: minted.metadata,
            offer,
            resale_data,
        }
    }
}

impl From<ProductTokenWire> for ProductToken {
    fn from(wire: ProductTokenWire) -> Self {
        // pool offers are addressed by offer index, diamond offers by range index
        let offer_ref = match wire.offer_pool {
            Some(_) => wire.offer.offer_index,
            None => wire.offer.diamond_range_index,
        };
        Self {
            minted: MintedToken {
                id: wire.id,
                contract: wire.contract,
                token: wire.token,
                unique_index_in_contract: wire.unique_index_in_contract,
                is_minted: wire.is_minted,
                owner_address: wire.owner_address,
                offer: offer_ref.unwrap_or_default(),
                offer_pool: wire.offer_pool,
                metadata: wire.metadata,
            },
            offer: wire.offer,
            resale_data: wire.resale_data,
        }
    }
}

/// An unlockable file. Storage fields are never sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub hidden: bool,
    #[serde(skip_serializing, default)]
    pub key: Option<String>,
    #[serde(skip_serializing, default)]
    pub encryption_type: Option<String>,
    #[serde(skip_serializing, default)]
    pub total_encrypted_files: Option<i64>,
    #[serde(skip_serializing, default)]
    pub extension: Option<String>,
}

/// Links a file to the offers whose tokens unlock it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unlock {
    pub file: String,
    pub offers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibleFile {
    #[serde(flatten)]
    pub file: File,
    pub is_unlocked: bool,
}

/// Global server configuration, read fresh for every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSetting {
    /// Restrict every token listing to minted tokens
    pub only_minted_tokens_result: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValueCount {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSummary {
    pub name: String,
    pub values: Vec<AttributeValueCount>,
}

/// Cached attribute catalog of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttributes {
    pub contract: String,
    pub product: i64,
    pub attributes: Vec<AttributeSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_hides_storage_fields() {
        let file = File {
            id: "f1".to_string(),
            title: "Soundtrack".to_string(),
            file_type: "audio".to_string(),
            hidden: false,
            key: Some("secret".to_string()),
            encryption_type: Some("aes".to_string()),
            total_encrypted_files: Some(3),
            extension: Some("mp3".to_string()),
        };

        let json = serde_json::to_value(AccessibleFile {
            file,
            is_unlocked: true,
        })
        .unwrap();

        assert_eq!(json["title"], "Soundtrack");
        assert_eq!(json["type"], "audio");
        assert_eq!(json["isUnlocked"], true);
        assert!(json.get("key").is_none());
        assert!(json.get("encryptionType").is_none());
        assert!(json.get("extension").is_none());
    }

    #[test]
    fn test_product_token_wire_shape() {
        let token = ProductToken {
            minted: MintedToken {
                id: "t7".to_string(),
                contract: "c1".to_string(),
                token: "7".to_string(),
                unique_index_in_contract: "107".to_string(),
                is_minted: false,
                owner_address: None,
                offer: 2,
                offer_pool: None,
                metadata: NftMetadata::default(),
            },
            offer: Offer {
                id: "o2".to_string(),
                contract: "c1".to_string(),
                product: 0,
                offer_pool: None,
                offer_index: None,
                diamond_range_index: Some(2),
                range: ["5".to_string(), "9".to_string()],
                price: "250".to_string(),
                offer_name: "Rare".to_string(),
                copies: 5,
                locked_copies: 0,
            },
            resale_data: None,
        };

        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["token"], "7");
        assert_eq!(json["uniqueIndexInContract"], "107");
        assert_eq!(json["offer"]["id"], "o2");
        assert_eq!(json["offer"]["price"], "250");
        assert!(json.get("resaleData").is_none());

        let back: ProductToken = serde_json::from_value(json).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn test_attribute_value_text() {
        assert_eq!(TokenAttribute::new("Color", "Red").value_text(), "Red");
        assert_eq!(TokenAttribute::new("Level", 5).value_text(), "5");
    }
}
