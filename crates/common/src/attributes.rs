use std::collections::{BTreeMap, HashMap};

use crate::collation::numeric_cmp;
use crate::models::{AttributeSummary, AttributeValueCount, NftMetadata, ProductToken};

/// Annotate every attribute on the page with how many tokens of the page
/// share its trait/value pair, and that share as a percentage.
pub fn count_attributes(mut tokens: Vec<ProductToken>) -> Vec<ProductToken> {
    if tokens.is_empty() {
        return tokens;
    }

    let mut counts: HashMap<(String, String), u64> = HashMap::new();
    for token in &tokens {
        for attribute in &token.minted.metadata.attributes {
            *counts
                .entry((attribute.trait_type.clone(), attribute.value_text()))
                .or_default() += 1;
        }
    }

    let total = tokens.len() as f64;
    for token in &mut tokens {
        for attribute in &mut token.minted.metadata.attributes {
            let key = (attribute.trait_type.clone(), attribute.value_text());
            let count = counts.get(&key).copied().unwrap_or(0);
            attribute.count = Some(count);
            attribute.percentage = Some(((count as f64 / total) * 10_000.0).round() / 100.0);
        }
    }

    tokens
}

/// Build the attribute catalog of a product from its tokens' metadata:
/// every trait name with each distinct value and how many tokens carry it.
pub fn classify_attributes<'a>(
    metadata: impl IntoIterator<Item = &'a NftMetadata>,
) -> Vec<AttributeSummary> {
    let mut traits: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();

    for meta in metadata {
        for attribute in &meta.attributes {
            *traits
                .entry(attribute.trait_type.clone())
                .or_default()
                .entry(attribute.value_text())
                .or_default() += 1;
        }
    }

    traits
        .into_iter()
        .map(|(name, values)| {
            let mut values: Vec<AttributeValueCount> = values
                .into_iter()
                .map(|(value, count)| AttributeValueCount { value, count })
                .collect();
            values.sort_by(|a, b| numeric_cmp(&a.value, &b.value));
            AttributeSummary { name, values }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MintedToken, Offer, TokenAttribute};

    fn token(n: &str, attributes: Vec<TokenAttribute>) -> ProductToken {
        ProductToken {
            minted: MintedToken {
                id: format!("t{n}"),
                contract: "c1".to_string(),
                token: n.to_string(),
                unique_index_in_contract: n.to_string(),
                is_minted: true,
                owner_address: None,
                offer: 0,
                offer_pool: None,
                metadata: NftMetadata {
                    attributes,
                    ..Default::default()
                },
            },
            offer: Offer {
                id: "o1".to_string(),
                contract: "c1".to_string(),
                product: 0,
                offer_pool: None,
                offer_index: None,
                diamond_range_index: Some(0),
                range: ["0".to_string(), "9".to_string()],
                price: "100".to_string(),
                offer_name: "Common".to_string(),
                copies: 10,
                locked_copies: 0,
            },
            resale_data: None,
        }
    }

    #[test]
    fn test_count_attributes() {
        let tokens = vec![
            token("1", vec![TokenAttribute::new("Color", "Red")]),
            token("2", vec![TokenAttribute::new("Color", "Red")]),
            token(
                "3",
                vec![
                    TokenAttribute::new("Color", "Blue"),
                    TokenAttribute::new("Hat", "Cap"),
                ],
            ),
        ];

        let tokens = count_attributes(tokens);

        let red = &tokens[0].minted.metadata.attributes[0];
        assert_eq!(red.count, Some(2));
        assert_eq!(red.percentage, Some(66.67));

        let blue = &tokens[2].minted.metadata.attributes[0];
        assert_eq!(blue.count, Some(1));
        assert_eq!(blue.percentage, Some(33.33));
    }

    #[test]
    fn test_count_attributes_empty_page() {
        assert!(count_attributes(Vec::new()).is_empty());
    }

    #[test]
    fn test_classify_attributes() {
        let metadata = vec![
            NftMetadata {
                attributes: vec![
                    TokenAttribute::new("Level", 10),
                    TokenAttribute::new("Color", "Red"),
                ],
                ..Default::default()
            },
            NftMetadata {
                attributes: vec![
                    TokenAttribute::new("Level", 9),
                    TokenAttribute::new("Color", "Red"),
                ],
                ..Default::default()
            },
        ];

        let catalog = classify_attributes(&metadata);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].name, "Color");
        assert_eq!(
            catalog[0].values,
            vec![AttributeValueCount {
                value: "Red".to_string(),
                count: 2
            }]
        );
        assert_eq!(catalog[1].name, "Level");
        let levels: Vec<&str> = catalog[1].values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(levels, vec!["9", "10"]);
    }
}
