//! One customer's storefront session.

use casemandu_core::Price;

use crate::cart::CartStore;
use crate::checkout::{CheckoutError, CheckoutForm, CheckoutSession, PlacedOrder, grand_total};
use crate::client::ApiClient;
use crate::config::StorefrontConfig;
use crate::designs::ComposedItem;
use crate::storage::{FileStore, KeyValueStore, StorageError};

/// Everything a front end needs: configuration, the API client, the cart,
/// and the checkout guard.
///
/// Created once at start and passed explicitly to whatever drives the UI.
#[derive(Debug)]
pub struct Storefront<S> {
    config: StorefrontConfig,
    client: ApiClient,
    cart: CartStore<S>,
    checkout: CheckoutSession,
}

impl Storefront<FileStore> {
    /// Open a session whose cart lives in `config.state_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be created.
    pub fn open(config: StorefrontConfig) -> Result<Self, StorageError> {
        let storage = FileStore::open(&config.state_dir)?;
        Ok(Self::with_storage(config, storage))
    }
}

impl<S: KeyValueStore> Storefront<S> {
    /// Open a session over an explicit storage backend.
    pub fn with_storage(config: StorefrontConfig, storage: S) -> Self {
        let client = ApiClient::new(&config);
        let checkout = CheckoutSession::new(client.clone(), config.storefront_url.clone());

        Self {
            cart: CartStore::load(storage),
            config,
            client,
            checkout,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore<S> {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartStore<S> {
        &mut self.cart
    }

    /// Put a composed design or phone case in the cart with its artwork.
    pub fn add_to_cart(&mut self, composed: ComposedItem) {
        self.cart.add_item(
            composed.item,
            Some(composed.artwork),
            Some(composed.placement),
        );
    }

    /// Cart subtotal plus delivery.
    #[must_use]
    pub fn grand_total(&self) -> Price {
        grand_total(self.cart.list())
    }

    /// Place an order for the current cart and empty the cart on success.
    ///
    /// # Errors
    ///
    /// See [`CheckoutSession::place_order`]. The cart is left untouched on
    /// failure so the customer can retry.
    pub async fn place_order(&mut self, form: CheckoutForm) -> Result<PlacedOrder, CheckoutError> {
        let placed = self
            .checkout
            .place_order(self.cart.list(), self.cart.assets(), form)
            .await?;
        self.cart.clear();
        Ok(placed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::assets::Upload;
    use crate::designs::{compose_design_item, find_design};
    use crate::order::OrderError;
    use crate::storage::MemoryStore;

    fn offline_config() -> StorefrontConfig {
        StorefrontConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            ..StorefrontConfig::default()
        }
    }

    #[test]
    fn test_add_to_cart_binds_artwork() {
        let mut storefront = Storefront::with_storage(offline_config(), MemoryStore::new());
        let composed = compose_design_item(
            find_design("airpods").unwrap(),
            None,
            Some(Upload::new("art.png", vec![1])),
        )
        .unwrap();
        let id = composed.item.id.clone();

        storefront.add_to_cart(composed);

        assert_eq!(storefront.cart().len(), 1);
        assert!(storefront.cart().assets().custom_image(&id).is_some());
        assert_eq!(storefront.grand_total(), Price::from_units(1149));
    }

    #[test]
    fn test_open_uses_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorefrontConfig {
            state_dir: dir.path().join("state"),
            ..offline_config()
        };

        let storefront = Storefront::open(config).unwrap();
        assert!(storefront.cart().is_empty());
        assert!(dir.path().join("state").is_dir());
    }

    #[tokio::test]
    async fn test_failed_order_keeps_cart() {
        let mut storefront = Storefront::with_storage(offline_config(), MemoryStore::new());
        let composed = compose_design_item(
            find_design("popsockets").unwrap(),
            None,
            Some(Upload::new("art.png", vec![1])),
        )
        .unwrap();
        storefront.add_to_cart(composed);

        let form = CheckoutForm {
            payment_method: "Khalti".to_string(),
            payment_proof: Some(Upload::new("proof.jpg", vec![1])),
            ..CheckoutForm::default()
        };
        let err = storefront.place_order(form).await.unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Order(OrderError::TransportFailure(_))
        ));
        assert_eq!(storefront.cart().len(), 1);
    }
}
