//! Catalog browsing commands.

use casemandu_storefront::ApiClient;
use casemandu_storefront::catalog::{Brand, PhoneModel};
use casemandu_storefront::designs::DESIGNS;

use super::CliError;

/// Print every brand.
pub async fn brands(client: &ApiClient) {
    let brands = client.list_brands().await;

    #[allow(clippy::print_stdout)]
    {
        if brands.is_empty() {
            println!("No brands available");
        }
        for brand in brands {
            println!("{}\t{}", brand.id, brand.name);
        }
    }
}

/// Print the active models of `brand`.
///
/// # Errors
///
/// Returns an error if no brand matches `brand`.
pub async fn models(client: &ApiClient, brand: &str) -> Result<(), CliError> {
    let brand = find_brand(client, brand).await?;
    let models = client.list_models_for_brand(&brand.id).await;

    #[allow(clippy::print_stdout)]
    {
        if models.is_empty() {
            println!("No models available for {}", brand.name);
        }
        for model in models {
            println!("{}\t{}\t{}", model.id, model.name, model.base_price());
        }
    }
    Ok(())
}

/// Print the case types offered for `model`.
///
/// # Errors
///
/// Returns an error if no brand or model matches.
pub async fn case_types(client: &ApiClient, brand: &str, model: &str) -> Result<(), CliError> {
    let brand = find_brand(client, brand).await?;
    let models = client.list_models_for_brand(&brand.id).await;
    let model = find_model(&models, model)?;
    let case_types = client.resolve_case_types(model).await;

    #[allow(clippy::print_stdout)]
    {
        if case_types.is_empty() {
            println!("No case types available for {}", model.name);
        }
        for case_type in case_types {
            let price = case_type
                .price
                .as_ref()
                .and_then(|p| p.resolve().ok())
                .map_or_else(|| "-".to_string(), |p| p.to_string());
            println!("{}\t{}\t{price}", case_type.id, case_type.name);
        }
    }
    Ok(())
}

/// Print the design catalog.
pub fn designs() {
    #[allow(clippy::print_stdout)]
    {
        for design in &DESIGNS {
            let (width, height) = design.aspect;
            println!("{}\t{}\t{width}:{height}", design.title, design.price);
            if let Some(description) = design.description {
                println!("  {description}");
            }
        }
    }
}

/// Find a brand by ID, or by name ignoring case.
pub async fn find_brand(client: &ApiClient, query: &str) -> Result<Brand, CliError> {
    client
        .list_brands()
        .await
        .into_iter()
        .find(|brand| brand.id.as_str() == query || brand.name.eq_ignore_ascii_case(query))
        .ok_or_else(|| CliError::not_found("brand", query.to_string()))
}

/// Find a model by ID, or by name ignoring case.
pub fn find_model<'a>(models: &'a [PhoneModel], query: &str) -> Result<&'a PhoneModel, CliError> {
    models
        .iter()
        .find(|model| model.id.as_str() == query || model.name.eq_ignore_ascii_case(query))
        .ok_or_else(|| CliError::not_found("model", query.to_string()))
}
