use crate::domain::product::Product;

/// Supplies the products the chatbot may talk about.
pub trait CatalogSource: Send + Sync {
    fn products(&self) -> Vec<Product>;
}

#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    products: Vec<Product>,
}

impl StaticCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

impl CatalogSource for StaticCatalog {
    fn products(&self) -> Vec<Product> {
        self.products.clone()
    }
}
