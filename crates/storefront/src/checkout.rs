//! Checkout: payment proof, grand total, and one submission at a time.

use std::sync::atomic::{AtomicBool, Ordering};

use casemandu_core::{LineItem, OrderId, Price};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::assets::{AssetStore, Upload};
use crate::client::ApiClient;
use crate::order::{CustomerDetails, DELIVERY_CHARGE, OrderError, OrderRequest, build_order};
use crate::promo::PromoCode;

/// Errors from placing an order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Please upload the payment screenshot")]
    MissingPaymentProof,

    #[error("Please choose a payment method")]
    MissingPaymentMethod,

    /// Another submission from this session has not finished yet.
    #[error("Your order is already being placed")]
    SubmissionInFlight,

    #[error(transparent)]
    Order(#[from] OrderError),
}

/// What the customer filled in at checkout.
#[derive(Debug, Clone, Default)]
pub struct CheckoutForm {
    pub customer: CustomerDetails,
    /// Label of the payment channel, e.g. `"Khalti"`.
    pub payment_method: String,
    /// A promo code previously confirmed with
    /// [`ApiClient::verify_promo`].
    pub promo: Option<PromoCode>,
    /// Screenshot of the payment.
    pub payment_proof: Option<Upload>,
}

/// A successfully placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    /// Where to send the customer next.
    pub confirmation_url: String,
}

/// Cart subtotal plus the flat delivery charge.
///
/// Entries whose line total is invalid or would overflow are left out.
#[must_use]
pub fn grand_total(items: &[LineItem]) -> Price {
    let line_totals = items.iter().filter_map(LineItem::line_total);
    Price::total(core::iter::once(DELIVERY_CHARGE).chain(line_totals))
}

/// Places orders, refusing to start a second one while the first is in
/// flight.
#[derive(Debug)]
pub struct CheckoutSession {
    client: ApiClient,
    storefront_url: String,
    busy: AtomicBool,
}

impl CheckoutSession {
    /// `storefront_url` is the base of order confirmation links.
    #[must_use]
    pub fn new(client: ApiClient, storefront_url: impl Into<String>) -> Self {
        Self {
            client,
            storefront_url: storefront_url.into().trim_end_matches('/').to_string(),
            busy: AtomicBool::new(false),
        }
    }

    /// Whether a submission is currently in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Validate the form, build the order from `items` and submit it.
    ///
    /// Clearing the cart afterwards is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::SubmissionInFlight`] without sending anything
    /// if another call has not finished, a missing-input error if the form is
    /// incomplete, or the [`OrderError`] from building or submitting.
    #[instrument(skip_all, fields(items = items.len()))]
    pub async fn place_order(
        &self,
        items: &[LineItem],
        assets: &AssetStore,
        form: CheckoutForm,
    ) -> Result<PlacedOrder, CheckoutError> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            warn!("Order submission already in flight");
            return Err(CheckoutError::SubmissionInFlight);
        };

        let payment_proof = form.payment_proof.ok_or(CheckoutError::MissingPaymentProof)?;
        if form.payment_method.trim().is_empty() {
            return Err(CheckoutError::MissingPaymentMethod);
        }

        let request = OrderRequest {
            customer: form.customer,
            payment_method: form.payment_method,
            promo_code: form.promo.map(|promo| promo.code),
            total: grand_total(items),
        };

        let submission = build_order(items, assets, &request, payment_proof)?;
        let order_id = self.client.submit_order(submission).await?;

        info!(order_id = %order_id, total = %request.total, "Order placed");
        Ok(PlacedOrder {
            confirmation_url: format!("{}/order/{order_id}", self.storefront_url),
            order_id,
        })
    }
}

/// Holds the busy flag; released on drop, whatever the exit path.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use casemandu_core::LoosePrice;

    use super::*;

    fn session() -> CheckoutSession {
        CheckoutSession::new(ApiClient::with_base_url("http://127.0.0.1:9"), "https://casemandu.com.np/")
    }

    fn form() -> CheckoutForm {
        CheckoutForm {
            payment_method: "Khalti".to_string(),
            payment_proof: Some(Upload::new("proof.jpg", vec![1])),
            ..CheckoutForm::default()
        }
    }

    fn airpods() -> LineItem {
        LineItem::new("airpods", "Custom Design", Price::from_units(999), "airpods")
    }

    #[test]
    fn test_grand_total_adds_delivery() {
        let mut broken = airpods();
        broken.price = Some(LoosePrice::Text("abc".to_string()));
        let items = [airpods().with_qty(2), broken];

        assert_eq!(grand_total(&items), Price::from_units(2148));
        assert_eq!(grand_total(&[]), DELIVERY_CHARGE);
    }

    #[test]
    fn test_grand_total_skips_overflowing_entry() {
        let mut huge = airpods();
        huge.price = Some(LoosePrice::Text("79228162514264337593543950335".to_string()));
        let items = [huge, airpods()];

        assert_eq!(grand_total(&items), Price::from_units(1149));
    }

    #[test]
    fn test_busy_guard_releases_on_drop() {
        let flag = AtomicBool::new(false);
        let guard = BusyGuard::acquire(&flag).unwrap();
        assert!(BusyGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(BusyGuard::acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn test_missing_payment_proof() {
        let session = session();
        let form = CheckoutForm {
            payment_proof: None,
            ..form()
        };

        let err = session
            .place_order(&[airpods()], &AssetStore::new(), form)
            .await
            .unwrap_err();
        assert_eq!(err, CheckoutError::MissingPaymentProof);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_missing_payment_method() {
        let form = CheckoutForm {
            payment_method: " ".to_string(),
            ..form()
        };
        let err = session()
            .place_order(&[airpods()], &AssetStore::new(), form)
            .await
            .unwrap_err();
        assert_eq!(err, CheckoutError::MissingPaymentMethod);
    }

    #[tokio::test]
    async fn test_empty_cart_fails_before_network() {
        let session = session();
        let err = session
            .place_order(&[], &AssetStore::new(), form())
            .await
            .unwrap_err();
        assert_eq!(err, CheckoutError::Order(OrderError::EmptyCart));
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_transport_failure_releases_busy_flag() {
        let session = session();
        let err = session
            .place_order(&[airpods()], &AssetStore::new(), form())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Order(OrderError::TransportFailure(_))
        ));
        assert!(!session.is_busy());
    }
}
