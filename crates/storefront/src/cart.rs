//! Cart store: the single source of truth for the cart.
//!
//! Line items are kept in insertion order and written to durable storage after
//! every mutation. Uploaded artwork stays in the owned [`AssetStore`]; only
//! placements are persisted next to the items.
//!
//! Mutations take `&mut self`, so callers serialize them the way a UI thread
//! serializes event handlers.

use std::time::{Duration, Instant};

use casemandu_core::{ItemId, LineItem, Placement, Price};
use thiserror::Error;

use crate::assets::{AssetStore, Upload};
use crate::error::add_breadcrumb;
use crate::storage::{KeyValueStore, StorageError, keys};

/// How long a removal prompt stays actionable before it dismisses itself.
pub const REMOVAL_CONFIRMATION_WINDOW: Duration = Duration::from_secs(5);

/// Errors from confirming a removal prompt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RemovalError {
    /// The prompt auto-dismissed before it was confirmed.
    #[error("Removal prompt expired")]
    Expired,

    /// No entry with this ID is in the cart.
    #[error("Item not found in cart: {0}")]
    NotFound(ItemId),
}

/// An outstanding "remove this item?" prompt.
///
/// Nothing changes until the prompt is passed to
/// [`CartStore::confirm_removal`]. Dropping or cancelling it, or letting it
/// expire, leaves the cart untouched.
#[derive(Debug)]
#[must_use = "the item is only removed once the prompt is confirmed"]
pub struct PendingRemoval {
    item_id: ItemId,
    item_name: String,
    expires_at: Instant,
}

impl PendingRemoval {
    /// Prompt text shown to the user.
    pub const MESSAGE: &'static str = "Are you sure you want to remove this item from the cart?";

    #[must_use]
    pub const fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    #[must_use]
    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    #[must_use]
    pub const fn expires_at(&self) -> Instant {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Ordered cart entries plus their bound artwork, persisted to `S`.
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    items: Vec<LineItem>,
    assets: AssetStore,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Load the cart from `storage`.
    ///
    /// A missing or corrupt record is treated as an empty cart, and entries
    /// that do not decode are skipped. Persisted placements are re-bound for
    /// entries that are still in the cart; artwork from a previous session is
    /// not restored.
    pub fn load(storage: S) -> Self {
        let items = read_items(&storage);
        let placements: Vec<(ItemId, Placement)> =
            read_record(&storage, keys::CUSTOM_COORDINATES).unwrap_or_default();

        let mut assets = AssetStore::new();
        for (item_id, placement) in placements {
            if items.iter().any(|item| item.id == item_id) {
                assets.bind(&item_id, None, Some(placement));
            }
        }

        tracing::debug!(items = items.len(), "Cart loaded");

        Self {
            storage,
            items,
            assets,
        }
    }

    /// Append `item` to the cart, binding any artwork and placement to it.
    ///
    /// No validation happens here; invalid entries are filtered out when the
    /// order is built.
    pub fn add_item(&mut self, item: LineItem, binary: Option<Upload>, placement: Option<Placement>) {
        self.assets.bind(&item.id, binary, placement);
        add_breadcrumb("cart", "Added item", Some(&[("item_id", item.id.as_str())]));
        tracing::info!(item_id = %item.id, product_type = %item.product_type, "Item added to cart");
        self.items.push(item);
        self.persist();
    }

    /// Bind artwork to an entry already in the cart, e.g. after a reload
    /// dropped the previous session's uploads.
    ///
    /// # Errors
    ///
    /// Returns [`RemovalError::NotFound`] if no entry has this ID.
    pub fn attach_artwork(&mut self, id: &ItemId, binary: Upload) -> Result<(), RemovalError> {
        if self.get(id).is_none() {
            return Err(RemovalError::NotFound(id.clone()));
        }
        self.assets.bind(id, Some(binary), None);
        tracing::debug!(item_id = %id, "Artwork attached");
        Ok(())
    }

    /// Ask to remove the entry with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RemovalError::NotFound`] if no entry has this ID.
    pub fn remove_item(&self, id: &ItemId) -> Result<PendingRemoval, RemovalError> {
        let item = self
            .get(id)
            .ok_or_else(|| RemovalError::NotFound(id.clone()))?;

        Ok(PendingRemoval {
            item_id: id.clone(),
            item_name: item.display_name().unwrap_or("item").to_string(),
            expires_at: Instant::now() + REMOVAL_CONFIRMATION_WINDOW,
        })
    }

    /// Confirm a removal prompt, removing the entry and its artwork.
    ///
    /// # Errors
    ///
    /// Returns [`RemovalError::Expired`] if the prompt has timed out, or
    /// [`RemovalError::NotFound`] if the entry is already gone.
    pub fn confirm_removal(&mut self, prompt: PendingRemoval) -> Result<LineItem, RemovalError> {
        self.confirm_removal_at(prompt, Instant::now())
    }

    fn confirm_removal_at(
        &mut self,
        prompt: PendingRemoval,
        now: Instant,
    ) -> Result<LineItem, RemovalError> {
        if prompt.is_expired_at(now) {
            tracing::debug!(item_id = %prompt.item_id, "Removal prompt expired");
            return Err(RemovalError::Expired);
        }

        let position = self
            .items
            .iter()
            .position(|item| item.id == prompt.item_id)
            .ok_or_else(|| RemovalError::NotFound(prompt.item_id.clone()))?;

        let removed = self.items.remove(position);
        self.assets.unbind(&removed.id);
        add_breadcrumb("cart", "Removed item", Some(&[("item_id", removed.id.as_str())]));
        tracing::info!(item_id = %removed.id, "Item removed from cart");
        self.persist();
        Ok(removed)
    }

    /// Dismiss a removal prompt without changing the cart.
    pub fn cancel_removal(&self, prompt: PendingRemoval) {
        tracing::debug!(item_id = %prompt.item_id, "Removal cancelled");
    }

    /// Empty the cart and drop all bound artwork.
    pub fn clear(&mut self) {
        self.items.clear();
        self.assets.clear();
        add_breadcrumb("cart", "Cleared cart", None);
        tracing::info!("Cart cleared");
        self.persist();
    }

    /// The cart entries in display order.
    #[must_use]
    pub fn list(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Read-only view of the bound artwork.
    #[must_use]
    pub const fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// Artwork bound to the entry with `id`, if uploaded this session.
    #[must_use]
    pub fn custom_image(&self, id: &ItemId) -> Option<&Upload> {
        self.assets.custom_image(id)
    }

    /// Placement of the entry with `id`, or the default placement.
    #[must_use]
    pub fn placement(&self, id: &ItemId) -> Placement {
        self.assets.placement_or_default(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of `unit price * qty` over entries with a valid price. Entries
    /// that would overflow the total are skipped.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        Price::total(self.items.iter().filter_map(LineItem::line_total))
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Tear the store down, handing back the storage backend.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Write the cart to storage. Failures are logged; the in-memory cart
    /// stays authoritative for the session.
    fn persist(&mut self) {
        if let Err(e) = self.write_records() {
            tracing::error!(error = %e, "Failed to persist cart");
        }
    }

    fn write_records(&mut self) -> Result<(), StorageError> {
        let items = serde_json::to_string(&self.items)?;
        let placements = serde_json::to_string(&self.assets.placements())?;
        self.storage.set(keys::CART_ITEMS, items)?;
        self.storage.set(keys::CUSTOM_COORDINATES, placements)
    }
}

/// Decode the stored entries one by one so a single bad entry does not cost
/// the rest of the cart.
fn read_items(storage: &impl KeyValueStore) -> Vec<LineItem> {
    let raw: Vec<serde_json::Value> = read_record(storage, keys::CART_ITEMS).unwrap_or_default();
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            serde_json::from_value(entry)
                .map_err(|e| tracing::warn!(index, error = %e, "Skipping undecodable cart entry"))
                .ok()
        })
        .collect()
}

/// Read and decode a JSON record, treating any failure as absent.
fn read_record<T: serde::de::DeserializeOwned>(
    storage: &impl KeyValueStore,
    key: &str,
) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read stored record");
            return None;
        }
    };

    serde_json::from_str(&raw)
        .map_err(|e| tracing::warn!(key, error = %e, "Stored record is corrupt, ignoring"))
        .ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use casemandu_core::LoosePrice;

    use super::*;
    use crate::storage::{FileStore, MemoryStore};

    fn design(name: &str, price: u32) -> LineItem {
        LineItem::new(name, "Custom Design", Price::from_units(price), name)
    }

    fn artwork() -> Upload {
        Upload::new("art.png", vec![0xAB; 16])
    }

    #[test]
    fn test_add_appends_in_order() {
        let mut cart = CartStore::load(MemoryStore::new());
        let first = design("airpods", 999);
        let second = design("mousepads", 1150);

        cart.add_item(first.clone(), None, None);
        cart.add_item(second.clone(), None, None);

        assert_eq!(cart.list(), &[first, second]);
    }

    #[test]
    fn test_add_forwards_artwork_and_placement() {
        let mut cart = CartStore::load(MemoryStore::new());
        let item = design("popsockets", 150);
        let placement = Placement {
            rotation: 90.0,
            ..Placement::default()
        };

        cart.add_item(item.clone(), Some(artwork()), Some(placement));

        let (binary, bound) = cart.assets().get(&item.id);
        assert_eq!(binary, Some(&artwork()));
        assert_eq!(bound, Some(placement));
    }

    #[test]
    fn test_reload_reproduces_items_and_placements_but_not_artwork() {
        let mut cart = CartStore::load(MemoryStore::new());
        let a = design("airpods", 999);
        let b = design("laptopsleeves", 1150).with_qty(2);
        let placement = Placement {
            x: 3.0,
            y: -2.5,
            scale: 1.25,
            rotation: 15.0,
        };
        cart.add_item(a.clone(), Some(artwork()), Some(placement));
        cart.add_item(b.clone(), None, None);

        let reloaded = CartStore::load(cart.into_storage());

        assert_eq!(reloaded.list(), &[a.clone(), b.clone()]);
        assert_eq!(reloaded.assets().get(&a.id), (None, Some(placement)));
        assert_eq!(reloaded.custom_image(&a.id), None);
        assert_eq!(reloaded.placement(&b.id), Placement::default());
    }

    #[test]
    fn test_reload_from_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let item = design("airpods", 999);

        let mut cart = CartStore::load(FileStore::open(dir.path()).unwrap());
        cart.add_item(item.clone(), None, Some(Placement::default()));
        drop(cart);

        let reloaded = CartStore::load(FileStore::open(dir.path()).unwrap());
        assert_eq!(reloaded.list(), &[item]);
    }

    #[test]
    fn test_corrupt_record_loads_as_empty_cart() {
        let mut storage = MemoryStore::new();
        storage.set(keys::CART_ITEMS, "{oops".to_string()).unwrap();
        storage
            .set(keys::CUSTOM_COORDINATES, "not json".to_string())
            .unwrap();

        let cart = CartStore::load(storage);
        assert!(cart.is_empty());
        assert!(cart.assets().is_empty());
    }

    #[test]
    fn test_bad_entry_does_not_drop_the_cart() {
        let mut storage = MemoryStore::new();
        storage
            .set(
                keys::CART_ITEMS,
                r#"[
                    {"id": "a", "name": "airpods", "qty": 1, "price": 999,
                     "variant": "Custom Design", "productType": "airpods"},
                    {"id": "b", "name": "mousepads", "qty": "2", "price": 1150,
                     "productType": null},
                    {"name": "no id"},
                    "garbage"
                ]"#
                .to_string(),
            )
            .unwrap();

        let mut cart = CartStore::load(storage);
        let ids: Vec<&str> = cart.list().iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(cart.subtotal(), Price::from_units(3299));

        cart.add_item(design("popsockets", 150), None, None);
        assert_eq!(CartStore::load(cart.into_storage()).len(), 3);
    }

    #[test]
    fn test_stale_placements_are_not_restored() {
        let mut storage = MemoryStore::new();
        storage.set(keys::CART_ITEMS, "[]".to_string()).unwrap();
        storage
            .set(
                keys::CUSTOM_COORDINATES,
                r#"[["gone", {"x": 1, "y": 1, "scale": 1, "rotation": 0}]]"#.to_string(),
            )
            .unwrap();

        let cart = CartStore::load(storage);
        assert!(cart.assets().is_empty());
    }

    #[test]
    fn test_removal_requires_confirmation() {
        let mut cart = CartStore::load(MemoryStore::new());
        let item = design("airpods", 999);
        cart.add_item(item.clone(), Some(artwork()), None);

        let prompt = cart.remove_item(&item.id).unwrap();
        assert_eq!(prompt.item_name(), "airpods");
        cart.cancel_removal(prompt);
        assert_eq!(cart.len(), 1);

        let prompt = cart.remove_item(&item.id).unwrap();
        let removed = cart.confirm_removal(prompt).unwrap();
        assert_eq!(removed, item);
        assert!(cart.is_empty());
        assert_eq!(cart.assets().custom_image(&item.id), None);
    }

    #[test]
    fn test_confirm_removes_only_matching_entry() {
        let mut cart = CartStore::load(MemoryStore::new());
        let keep = design("airpods", 999);
        let drop_me = design("mousepads", 1150);
        cart.add_item(keep.clone(), Some(artwork()), None);
        cart.add_item(drop_me.clone(), Some(artwork()), None);

        let prompt = cart.remove_item(&drop_me.id).unwrap();
        cart.confirm_removal(prompt).unwrap();

        assert_eq!(cart.list(), &[keep.clone()]);
        assert!(cart.assets().custom_image(&keep.id).is_some());
    }

    #[test]
    fn test_expired_prompt_leaves_cart_unchanged() {
        let mut cart = CartStore::load(MemoryStore::new());
        let item = design("airpods", 999);
        cart.add_item(item.clone(), None, None);

        let prompt = cart.remove_item(&item.id).unwrap();
        let later = prompt.expires_at() + Duration::from_millis(1);

        assert_eq!(
            cart.confirm_removal_at(prompt, later),
            Err(RemovalError::Expired)
        );
        assert_eq!(cart.list(), &[item]);
    }

    #[test]
    fn test_attach_artwork_after_reload() {
        let mut cart = CartStore::load(MemoryStore::new());
        let item = design("mousepads", 1150);
        let placement = Placement {
            x: 4.0,
            ..Placement::default()
        };
        cart.add_item(item.clone(), Some(artwork()), Some(placement));

        let mut reloaded = CartStore::load(cart.into_storage());
        assert_eq!(reloaded.assets().custom_image(&item.id), None);

        reloaded.attach_artwork(&item.id, artwork()).unwrap();
        assert_eq!(reloaded.assets().get(&item.id), (Some(&artwork()), Some(placement)));
        assert!(
            reloaded
                .attach_artwork(&ItemId::new("nope"), artwork())
                .is_err()
        );
    }

    #[test]
    fn test_remove_unknown_item() {
        let cart = CartStore::load(MemoryStore::new());
        let id = ItemId::new("nope");
        assert_eq!(
            cart.remove_item(&id).unwrap_err(),
            RemovalError::NotFound(id)
        );
    }

    #[test]
    fn test_removal_is_persisted() {
        let mut cart = CartStore::load(MemoryStore::new());
        let item = design("airpods", 999);
        cart.add_item(item.clone(), None, Some(Placement::default()));

        let prompt = cart.remove_item(&item.id).unwrap();
        cart.confirm_removal(prompt).unwrap();

        let reloaded = CartStore::load(cart.into_storage());
        assert!(reloaded.is_empty());
        assert!(reloaded.assets().is_empty());
    }

    #[test]
    fn test_clear_empties_items_and_assets() {
        let mut cart = CartStore::load(MemoryStore::new());
        cart.add_item(design("airpods", 999), Some(artwork()), Some(Placement::default()));
        cart.add_item(design("popsockets", 150), Some(artwork()), None);

        cart.clear();

        assert!(cart.is_empty());
        assert!(cart.assets().is_empty());
        assert!(CartStore::load(cart.into_storage()).is_empty());
    }

    #[test]
    fn test_subtotal_skips_invalid_prices() {
        let mut cart = CartStore::load(MemoryStore::new());
        cart.add_item(design("airpods", 999), None, None);
        cart.add_item(design("popsockets", 150).with_qty(2), None, None);

        let mut broken = design("mousepads", 1150);
        broken.price = Some(LoosePrice::Text("abc".to_string()));
        cart.add_item(broken, None, None);

        assert_eq!(cart.subtotal(), Price::from_units(1299));
    }

    #[test]
    fn test_subtotal_survives_overflowing_entry() {
        let mut cart = CartStore::load(MemoryStore::new());
        let mut huge = design("mousepads", 0).with_qty(2);
        huge.price = Some(LoosePrice::Text("5e28".to_string()));
        cart.add_item(huge, None, None);
        cart.add_item(design("airpods", 999), None, None);

        assert_eq!(cart.subtotal(), Price::from_units(999));
    }
}
