//! Mock product catalogue, farmer product management and order log.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use harvest_core::{
    Ack, OrderRequest, OrderResult, OrderStatus, Product, ProductId, ProductPayload,
};

use crate::error::{ClientError, ClientResult};

/// Owner of the seeded products (the registry's farmer account).
pub const SEED_FARMER_ID: u64 = 2;

/// An order accepted by the mock, kept for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub request: OrderRequest,
    pub result: OrderResult,
    /// Caller's user id when the request carried a valid token.
    pub user_id: Option<u64>,
}

struct CatalogState {
    products: Vec<Product>,
    next_product_id: ProductId,
    orders: Vec<PlacedOrder>,
    next_order_id: u64,
}

/// In-memory catalogue and order book.
pub struct MockCatalog {
    state: Mutex<CatalogState>,
}

fn seed_product(product_id: ProductId, name: &str, price: f64, category: &str) -> Product {
    Product {
        product_id,
        name: name.to_string(),
        price,
        category: category.to_string(),
        image: format!("/category-{}.jpg", category.to_lowercase()),
        quantity: None,
        freshness: None,
        date_of_harvest: None,
        farmer_id: Some(SEED_FARMER_ID),
    }
}

impl MockCatalog {
    /// Catalogue with the six demo products.
    pub fn seeded() -> Self {
        let products = vec![
            seed_product(1, "Organic Tomatoes", 99.0, "Vegetables"),
            seed_product(2, "Fresh Strawberries", 149.0, "Fruits"),
            seed_product(3, "Farm Milk 1L", 79.0, "Dairy"),
            seed_product(4, "Kale Bunch", 69.0, "Vegetables"),
            seed_product(5, "Bananas (6)", 59.0, "Fruits"),
            seed_product(6, "Greek Yogurt", 119.0, "Dairy"),
        ];

        MockCatalog {
            state: Mutex::new(CatalogState {
                next_product_id: products.len() as ProductId + 1,
                products,
                orders: Vec::new(),
                next_order_id: 1,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // =========================================================================
    // Storefront
    // =========================================================================

    pub fn products(&self) -> Vec<Product> {
        self.lock().products.clone()
    }

    pub fn product(&self, id: ProductId) -> ClientResult<Product> {
        self.lock()
            .products
            .iter()
            .find(|product| product.product_id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound("Product not found".to_string()))
    }

    // =========================================================================
    // Farmer
    // =========================================================================

    pub fn farmer_products(&self, farmer_id: u64) -> Vec<Product> {
        self.lock()
            .products
            .iter()
            .filter(|product| product.farmer_id == Some(farmer_id))
            .cloned()
            .collect()
    }

    pub fn create_product(&self, farmer_id: u64, payload: &ProductPayload) -> Product {
        let mut state = self.lock();
        let product_id = state.next_product_id;
        state.next_product_id += 1;

        let mut product = Product {
            product_id,
            name: String::new(),
            price: 0.0,
            category: String::new(),
            image: String::new(),
            quantity: None,
            freshness: None,
            date_of_harvest: None,
            farmer_id: Some(farmer_id),
        };
        apply_payload(&mut product, payload);
        state.products.push(product.clone());

        debug!(product_id, farmer_id, "Mock product created");
        product
    }

    /// Updates a product owned by `farmer_id`; anything else is a miss.
    pub fn update_product(
        &self,
        farmer_id: u64,
        id: ProductId,
        payload: &ProductPayload,
    ) -> ClientResult<Product> {
        let mut state = self.lock();
        let product = state
            .products
            .iter_mut()
            .find(|product| product.product_id == id && product.farmer_id == Some(farmer_id))
            .ok_or_else(not_owned)?;

        apply_payload(product, payload);
        Ok(product.clone())
    }

    pub fn delete_product(&self, farmer_id: u64, id: ProductId) -> ClientResult<Ack> {
        let mut state = self.lock();
        let index = state
            .products
            .iter()
            .position(|product| product.product_id == id && product.farmer_id == Some(farmer_id))
            .ok_or_else(not_owned)?;

        state.products.remove(index);
        debug!(product_id = id, farmer_id, "Mock product deleted");
        Ok(Ack {
            success: true,
            message: Some("Product deleted successfully".to_string()),
        })
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Accepts an order as `PENDING` with `totalAmount = Σ price × quantity`.
    pub fn create_order(&self, request: &OrderRequest, user_id: Option<u64>) -> OrderResult {
        let mut state = self.lock();
        let order_id = state.next_order_id;
        state.next_order_id += 1;

        let result = OrderResult {
            order_id,
            total_amount: request.items_total(),
            status: OrderStatus::Pending,
        };
        state.orders.push(PlacedOrder {
            request: request.clone(),
            result: result.clone(),
            user_id,
        });

        info!(
            order_id,
            payment_method = %request.payment_method,
            total = result.total_amount,
            "Mock order placed"
        );
        result
    }

    /// Every order accepted so far, oldest first.
    pub fn orders(&self) -> Vec<PlacedOrder> {
        self.lock().orders.clone()
    }
}

fn not_owned() -> ClientError {
    ClientError::NotFound("Product not found or you don't have permission".to_string())
}

fn apply_payload(product: &mut Product, payload: &ProductPayload) {
    product.name = payload.name.trim().to_string();
    product.category = payload.category.trim().to_string();
    product.price = payload.price;
    product.quantity = payload.quantity;
    product.freshness = payload.freshness;
    product.date_of_harvest = payload.date_of_harvest.clone();
    if let Some(image) = &payload.image {
        product.image = image.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::{OrderItemRequest, PaymentMethod};

    fn payload(name: &str, price: f64) -> ProductPayload {
        ProductPayload {
            name: name.to_string(),
            category: "Vegetables".to_string(),
            price,
            quantity: Some(20),
            image: None,
            freshness: None,
            date_of_harvest: None,
        }
    }

    #[test]
    fn test_seeded_catalogue() {
        let catalog = MockCatalog::seeded();
        let products = catalog.products();
        assert_eq!(products.len(), 6);
        assert_eq!(products[0].name, "Organic Tomatoes");
        assert_eq!(products[5].price, 119.0);
        assert_eq!(catalog.farmer_products(SEED_FARMER_ID).len(), 6);
    }

    #[test]
    fn test_product_lookup_miss() {
        let catalog = MockCatalog::seeded();
        assert_eq!(catalog.product(4).unwrap().name, "Kale Bunch");
        assert!(matches!(catalog.product(99), Err(ClientError::NotFound(_))));
    }

    #[test]
    fn test_farmer_can_only_touch_own_products() {
        let catalog = MockCatalog::seeded();
        let created = catalog.create_product(7, &payload("Carrots", 40.0));
        assert_eq!(created.product_id, 7);
        assert_eq!(catalog.farmer_products(7).len(), 1);

        // Seeded products belong to another farmer
        assert!(catalog.update_product(7, 1, &payload("Mine now", 1.0)).is_err());
        assert!(catalog.delete_product(7, 1).is_err());

        let updated = catalog.update_product(7, 7, &payload("Baby Carrots", 45.0)).unwrap();
        assert_eq!(updated.name, "Baby Carrots");

        catalog.delete_product(7, 7).unwrap();
        assert!(catalog.farmer_products(7).is_empty());
    }

    #[test]
    fn test_order_total_and_log() {
        let catalog = MockCatalog::seeded();
        let request = OrderRequest {
            address: "Indiranagar, Bangalore".to_string(),
            payment_method: PaymentMethod::Cod,
            items: vec![
                OrderItemRequest {
                    product_id: 1,
                    quantity: 2,
                    price: 99.0,
                },
                OrderItemRequest {
                    product_id: 2,
                    quantity: 1,
                    price: 149.0,
                },
            ],
        };

        let result = catalog.create_order(&request, Some(1));
        assert_eq!(result.total_amount, 347.0);
        assert_eq!(result.status, OrderStatus::Pending);

        let orders = catalog.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].request, request);
    }
}
