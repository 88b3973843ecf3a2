//! Promo lookup and checkout commands.

use std::path::PathBuf;

use casemandu_core::ItemId;
use casemandu_storefront::assets::Upload;
use casemandu_storefront::checkout::CheckoutForm;
use casemandu_storefront::order::CustomerDetails;
use casemandu_storefront::storage::KeyValueStore;
use casemandu_storefront::{ApiClient, Storefront};

use super::CliError;

/// Checkout input gathered from the command line.
pub struct CheckoutOrder {
    pub customer: CustomerDetails,
    pub payment_method: String,
    pub payment_proof: PathBuf,
    pub promo: Option<String>,
    pub artwork: Vec<(ItemId, PathBuf)>,
}

/// Parse an `<item-id>=<path>` artwork binding.
///
/// # Errors
///
/// Returns a message for clap if either side is missing.
pub fn parse_artwork_binding(value: &str) -> Result<(ItemId, PathBuf), String> {
    match value.split_once('=') {
        Some((id, path)) if !id.trim().is_empty() && !path.trim().is_empty() => {
            Ok((ItemId::new(id.trim()), PathBuf::from(path.trim())))
        }
        _ => Err(format!("expected <item-id>=<path>, got '{value}'")),
    }
}

/// Report whether `code` is a known promo code.
pub async fn promo(client: &ApiClient, code: &str) {
    let found = client.verify_promo(code).await;

    #[allow(clippy::print_stdout)]
    {
        match found {
            Some(promo) => println!("Promo code {} applied", promo.code),
            None => println!("Invalid promo code"),
        }
    }
}

/// Place an order for the current cart.
///
/// # Errors
///
/// Returns an error if a file cannot be read, the promo code is unknown, or
/// the order is refused.
pub async fn checkout<S: KeyValueStore>(
    storefront: &mut Storefront<S>,
    order: CheckoutOrder,
) -> Result<(), CliError> {
    for (item_id, path) in &order.artwork {
        let upload = Upload::from_path(path).await?;
        storefront.cart_mut().attach_artwork(item_id, upload)?;
    }

    let promo = match order.promo {
        Some(code) => Some(
            storefront
                .client()
                .verify_promo(&code)
                .await
                .ok_or_else(|| CliError::not_found("promo code", code))?,
        ),
        None => None,
    };

    let form = CheckoutForm {
        customer: order.customer,
        payment_method: order.payment_method,
        promo,
        payment_proof: Some(Upload::from_path(&order.payment_proof).await?),
    };

    let total = storefront.grand_total();
    let placed = storefront.place_order(form).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("Order placed successfully! ({total})");
        println!("Order ID: {}", placed.order_id);
        println!("{}", placed.confirmation_url);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_artwork_binding() {
        let (id, path) = parse_artwork_binding("1700000000000-abc=art/front.png").unwrap();
        assert_eq!(id, ItemId::new("1700000000000-abc"));
        assert_eq!(path, PathBuf::from("art/front.png"));
    }

    #[test]
    fn test_parse_artwork_binding_rejects_partial() {
        assert!(parse_artwork_binding("art.png").is_err());
        assert!(parse_artwork_binding("=art.png").is_err());
        assert!(parse_artwork_binding("abc=").is_err());
    }
}
