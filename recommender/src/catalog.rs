use crate::error::{RecommendError, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A purchasable variant of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Catalog record; read-only for a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub handle: String,
    pub price: f64,
    pub currency: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Product {
    pub fn new(id: impl Into<String>, title: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            handle: String::new(),
            price,
            currency: "USD".to_string(),
            description: String::new(),
            variants: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Snapshot of the product catalog, indexed by id.
///
/// Iteration order is id ascending.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: BTreeMap<String, Product>,
}

impl Catalog {
    /// Build a catalog, rejecting blank and duplicate ids
    pub fn new(products: Vec<Product>) -> Result<Self> {
        let mut by_id = BTreeMap::new();
        for product in products {
            if product.id.trim().is_empty() {
                return Err(RecommendError::InvalidCatalog(format!(
                    "product '{}' has an empty id",
                    product.title
                )));
            }
            if by_id.contains_key(&product.id) {
                return Err(RecommendError::InvalidCatalog(format!(
                    "duplicate product id {}",
                    product.id
                )));
            }
            by_id.insert(product.id.clone(), product);
        }
        Ok(Self { products: by_id })
    }

    /// Load a JSON array of products
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let products: Vec<Product> = serde_json::from_str(&content)?;
        let catalog = Self::new(products)?;
        info!("Loaded {} products from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let products: Vec<&Product> = self.products.values().collect();
        fs::write(path, serde_json::to_string_pretty(&products)?)?;
        Ok(())
    }

    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.products.get(product_id)
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.products.contains_key(product_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.products.keys().map(String::as_str)
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = Catalog::new(vec![
            Product::new("A", "Boots", 120.0),
            Product::new("A", "Boots again", 99.0),
        ]);
        assert!(matches!(result, Err(RecommendError::InvalidCatalog(_))));
    }

    #[test]
    fn test_blank_id_rejected() {
        let result = Catalog::new(vec![Product::new("", "Nameless", 1.0)]);
        assert!(matches!(result, Err(RecommendError::InvalidCatalog(_))));
    }

    #[test]
    fn test_ids_sorted() {
        let catalog = Catalog::new(vec![
            Product::new("C", "Cap", 20.0),
            Product::new("A", "Anorak", 180.0),
            Product::new("B", "Beanie", 15.0),
        ])
        .expect("valid catalog");

        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert!(catalog.contains("B"));
        assert_eq!(catalog.get("C").map(|p| p.title.as_str()), Some("Cap"));
    }

    #[test]
    fn test_load_minimal_records() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("products.json");
        fs::write(
            &path,
            r#"[{"id": "1", "title": "Snowboard", "price": 629.95, "currency": "USD"}]"#,
        )
        .expect("Failed to write");

        let catalog = Catalog::load(&path).expect("Failed to load");
        let product = catalog.get("1").expect("product present");

        assert_eq!(product.description, "");
        assert!(product.variants.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("data").join("products.json");
        let catalog = Catalog::new(vec![
            Product::new("A", "Anorak", 180.0).with_description("Waterproof shell"),
            Product::new("B", "Beanie", 15.0),
        ])
        .expect("valid catalog");

        catalog.save(&path).expect("Failed to save");
        let loaded = Catalog::load(&path).expect("Failed to load");

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("A"), catalog.get("A"));
    }
}
