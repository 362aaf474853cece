//! Standalone product table, independent of any sale draft
use super::error::StoreError;
use super::types::Product;

/// Field-wise patch for [`ProductStore::update_product`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub product_name: Option<String>,
    pub product_units: Option<u32>,
    pub product_price: Option<String>,
    pub product_image: Option<String>,
    pub product_tag: Option<String>,
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ProductStore {
    products: Vec<Product>,
}

impl ProductUpdate {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_name(mut self, name: &str) -> Self {
        self.product_name = Some(name.to_string());
        self
    }
    pub fn set_units(mut self, units: u32) -> Self {
        self.product_units = Some(units);
        self
    }
    pub fn set_price(mut self, price: &str) -> Self {
        self.product_price = Some(price.to_string());
        self
    }
    pub fn set_image(mut self, image: &str) -> Self {
        self.product_image = Some(image.to_string());
        self
    }
    pub fn set_tag(mut self, tag: &str) -> Self {
        self.product_tag = Some(tag.to_string());
        self
    }
}

impl ProductStore {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn add_product(&mut self, product: Product) {
        self.products.push(product);
    }
    pub fn remove_product(&mut self, product_id: &str) -> Option<Product> {
        let index = self
            .products
            .iter()
            .position(|p| p.product_id == product_id)?;
        Some(self.products.remove(index))
    }
    /// Merges the `Some` fields of `update` onto the first product with `product_id`.
    pub fn update_product(
        &mut self,
        product_id: &str,
        update: ProductUpdate,
    ) -> Result<&Product, StoreError> {
        let product = self
            .products
            .iter_mut()
            .find(|p| p.product_id == product_id)
            .ok_or_else(|| StoreError::ProductNotFound(product_id.to_string()))?;

        if let Some(name) = update.product_name {
            product.product_name = name;
        }
        if let Some(units) = update.product_units {
            product.product_units = units;
        }
        if let Some(price) = update.product_price {
            product.product_price = price;
        }
        if let Some(image) = update.product_image {
            product.product_image = image;
        }
        if let Some(tag) = update.product_tag {
            product.product_tag = tag;
        }

        Ok(product)
    }
    pub fn empty_products(&mut self) {
        self.products.clear();
    }
    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.product_id == product_id)
    }
    pub fn products(&self) -> &[Product] {
        &self.products
    }
    pub fn len(&self) -> usize {
        self.products.len()
    }
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
