//! Cart commands.

use std::path::Path;

use casemandu_core::{ItemId, LooseText};
use casemandu_storefront::Storefront;
use casemandu_storefront::assets::Upload;
use casemandu_storefront::cart::PendingRemoval;
use casemandu_storefront::catalog::CatalogSelection;
use casemandu_storefront::designs::{
    LaptopSize, compose_design_item, compose_phone_case_item, find_design,
};
use casemandu_storefront::order::DELIVERY_CHARGE;
use casemandu_storefront::storage::KeyValueStore;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::CliError;
use super::catalog::{find_brand, find_model};

/// Print the cart with totals.
pub fn list<S: KeyValueStore>(storefront: &Storefront<S>) {
    let cart = storefront.cart();

    #[allow(clippy::print_stdout)]
    {
        if cart.is_empty() {
            println!("Your cart is empty");
            return;
        }

        for item in cart.list() {
            let variant = item
                .variant
                .as_ref()
                .and_then(LooseText::resolve)
                .unwrap_or("-");
            let total = item
                .line_total()
                .map_or_else(|| "invalid price".to_string(), |p| p.to_string());
            let artwork = if cart.custom_image(&item.id).is_some() {
                ""
            } else {
                " (no artwork)"
            };
            println!(
                "{}\t{} x{}\t{variant}\t{total}{artwork}",
                item.id,
                item.display_name().unwrap_or("-"),
                item.qty,
            );
        }

        println!();
        println!("Subtotal:  {}", cart.subtotal());
        println!("Delivery:  {DELIVERY_CHARGE}");
        println!("Total:     {}", storefront.grand_total());
    }
}

/// Add a design with artwork read from `artwork`.
///
/// # Errors
///
/// Returns an error if the design is unknown, the artwork cannot be read, or
/// a laptop sleeve is missing its size.
pub async fn add_design<S: KeyValueStore>(
    storefront: &mut Storefront<S>,
    design: &str,
    artwork: &Path,
    height: Option<f64>,
    width: Option<f64>,
) -> Result<(), CliError> {
    let design = find_design(design).ok_or_else(|| CliError::not_found("design", design.to_string()))?;
    let upload = Upload::from_path(artwork).await?;
    let laptop_size = height
        .zip(width)
        .map(|(height, width)| LaptopSize { height, width });

    let composed = compose_design_item(design, laptop_size, Some(upload))?;
    let id = composed.item.id.clone();
    storefront.add_to_cart(composed);

    #[allow(clippy::print_stdout)]
    {
        println!("Added {} ({id})", design.title);
    }
    Ok(())
}

/// Add a phone case, walking brand, model and case type in order.
///
/// # Errors
///
/// Returns an error if any selection matches nothing, or the artwork cannot
/// be read.
pub async fn add_case<S: KeyValueStore>(
    storefront: &mut Storefront<S>,
    brand: &str,
    model: &str,
    case_type: Option<&str>,
    artwork: &Path,
) -> Result<(), CliError> {
    let client = storefront.client().clone();
    let brand = find_brand(&client, brand).await?;

    let mut selection = CatalogSelection::new();
    let ticket = selection.select_brand(brand.id.clone());
    selection.apply_models(ticket, client.list_models_for_brand(&brand.id).await);

    let model_id = find_model(selection.models(), model)?.id.clone();
    let Some((ticket, selected)) = selection.select_model(&model_id) else {
        return Err(CliError::not_found("model", model.to_string()));
    };
    selection.apply_case_types(ticket, client.resolve_case_types(&selected).await);

    if let Some(query) = case_type {
        let id = selection
            .case_types()
            .iter()
            .find(|ct| ct.id.as_str() == query || ct.name.eq_ignore_ascii_case(query))
            .map(|ct| ct.id.clone())
            .ok_or_else(|| CliError::not_found("case type", query.to_string()))?;
        selection.select_case_type(&id);
    }

    let upload = Upload::from_path(artwork).await?;
    let composed = compose_phone_case_item(
        Some(&brand),
        &selected,
        selection.selected_case_type(),
        Some(upload),
    )?;
    let id = composed.item.id.clone();
    storefront.add_to_cart(composed);

    #[allow(clippy::print_stdout)]
    {
        println!("Added {} {} ({id})", brand.name, selected.name);
    }
    Ok(())
}

/// Remove an item after the customer confirms.
///
/// # Errors
///
/// Returns an error if the item is not in the cart, or the prompt expired
/// before it was answered.
pub async fn remove<S: KeyValueStore>(
    storefront: &mut Storefront<S>,
    id: &ItemId,
    skip_prompt: bool,
) -> Result<(), CliError> {
    let prompt = storefront.cart().remove_item(id)?;

    if !skip_prompt && !confirm(&prompt).await {
        storefront.cart().cancel_removal(prompt);
        #[allow(clippy::print_stdout)]
        {
            println!("Kept item in cart");
        }
        return Ok(());
    }

    let removed = storefront.cart_mut().confirm_removal(prompt)?;
    #[allow(clippy::print_stdout)]
    {
        println!("Removed {}", removed.display_name().unwrap_or("item"));
    }
    Ok(())
}

/// Ask the question on `prompt` and wait for an answer until it expires.
async fn confirm(prompt: &PendingRemoval) -> bool {
    #[allow(clippy::print_stdout)]
    {
        println!("{} ({}) [y/N]", PendingRemoval::MESSAGE, prompt.item_name());
    }

    let remaining = prompt
        .expires_at()
        .saturating_duration_since(std::time::Instant::now());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    match tokio::time::timeout(remaining, lines.next_line()).await {
        Ok(Ok(Some(answer))) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Ok(Ok(None)) => false,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Failed to read confirmation");
            false
        }
        Err(_) => {
            tracing::info!(item_id = %prompt.item_id(), "Removal prompt expired");
            false
        }
    }
}

/// Empty the cart.
pub fn clear<S: KeyValueStore>(storefront: &mut Storefront<S>) {
    storefront.cart_mut().clear();
    #[allow(clippy::print_stdout)]
    {
        println!("Cart cleared");
    }
}
