use crate::error::MrlError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const PRODUCTS_JSON: &str = include_str!("../../../../catalog/products.json");

/// A product that limits are looked up for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    /// EU product classification code, e.g. "0130010".
    pub code: String,
    /// Product id used by the MRL lookup.
    pub product_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCatalog {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    pub products: Vec<Product>,
}

impl ProductCatalog {
    /// Find a product by EU code or by name, ignoring case.
    pub fn find(&self, query: &str) -> Option<&Product> {
        let query = query.trim();
        self.products
            .iter()
            .find(|p| p.code == query)
            .or_else(|| {
                self.products
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(query))
            })
    }

    /// Product code to look limits up for. An explicit code or name wins and
    /// is passed through unchanged when the catalog does not know it; the
    /// product named on the report is only used when it is in the catalog.
    pub fn resolve_code(&self, explicit: Option<&str>, reported: Option<&str>) -> Option<String> {
        if let Some(query) = explicit.map(str::trim).filter(|q| !q.is_empty()) {
            return match self.find(query) {
                Some(product) => Some(product.code.clone()),
                None => {
                    tracing::warn!(product = query, "product not in catalog; using as given");
                    Some(query.to_string())
                }
            };
        }
        let product = self.find(reported?)?;
        tracing::debug!(
            product = %product.name,
            code = %product.code,
            "product taken from report"
        );
        Some(product.code.clone())
    }
}

/// Load the built-in product catalog.
pub fn load_builtin() -> Result<ProductCatalog, MrlError> {
    let catalog: ProductCatalog = serde_json::from_str(PRODUCTS_JSON)?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

pub fn validate_catalog(catalog: &ProductCatalog) -> Result<(), MrlError> {
    if catalog.products.is_empty() {
        return Err(MrlError::CatalogInvalid("products must not be empty".into()));
    }

    let mut codes = HashSet::new();
    for product in &catalog.products {
        if product.name.trim().is_empty() {
            return Err(MrlError::CatalogInvalid(format!(
                "product with code '{}' has no name",
                product.code
            )));
        }
        if !codes.insert(product.code.as_str()) {
            return Err(MrlError::CatalogInvalid(format!(
                "duplicate product code '{}'",
                product.code
            )));
        }
    }

    Ok(())
}
