/**
 * Numeric-ordering string collation.
 *  Token indices and prices are stored as strings
 *  but must compare by numeric value.
 */
pub mod collation;
/**
 * Marketplace documents this service reads:
 *  contracts, products, offers, offer pools,
 *  minted tokens, resale listings and unlockable files.
 */
pub mod models;
/**
 * Token listing query planning.
 *  Resolves the contract-type join context into an
 *  ordered, inspectable list of filter/join/sort stages.
 */
pub mod query;
/**
 * Attribute tallies over token metadata,
 *  used for client-side faceting and the
 *  per-product attribute catalog.
 */
pub mod attributes;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::attributes::{classify_attributes, count_attributes};
    pub use crate::collation::{numeric_cmp, NUMERIC_COLLATION};
    pub use crate::models::{
        AccessibleFile, AttributeSummary, AttributeValueCount, Contract, File, MintedToken,
        NftMetadata, Offer, OfferPool, Product, ProductAttributes, ProductToken,
        ResaleTokenOffer, ServerSetting, TokenAttribute, Unlock,
    };
    pub use crate::query::{
        JoinContext, MetadataFilters, QueryParamError, TokenQuery, TokenQueryParams,
        TokenQueryPlan, TokenQueryPlanner,
    };
    pub use crate::version::build_info;
}
