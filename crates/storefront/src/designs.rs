//! Product designs and line-item composition.
//!
//! A cart entry is composed from either a free-form design (airpods case,
//! mousepad, ..) or a phone model + case type picked from the catalog. Both
//! paths need uploaded artwork; the entry starts at the default placement.

use casemandu_core::{LineItem, Placement, Price};
use thiserror::Error;

use crate::assets::Upload;
use crate::catalog::{Brand, CaseType, PhoneModel};

/// Product type tag for phone cases.
pub const PHONE_CASE_PRODUCT_TYPE: &str = "phonecase";

/// Variant label for designs without configurable options.
pub const CUSTOM_DESIGN_VARIANT: &str = "Custom Design";

/// Design title that needs laptop dimensions.
pub const LAPTOP_SLEEVES: &str = "laptopsleeves";

/// A non-phone product that takes custom artwork.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Design {
    /// URL slug and product type tag.
    pub title: &'static str,
    /// Template image shown behind the artwork.
    pub image: &'static str,
    /// Template aspect ratio (width, height).
    pub aspect: (f64, f64),
    pub price: Price,
    pub description: Option<&'static str>,
}

/// Every design the storefront sells.
pub const DESIGNS: [Design; 5] = [
    Design {
        title: "airpods",
        image: "https://i.ibb.co/9n8Yckw/airpods.png",
        aspect: (1.0, 1.0),
        price: Price::from_units(999),
        description: Some(
            "Compatible for Apple AirPods 2nd 1st charging case. 0.25mm see-through thin wall \
             allows you to check the indicator status any time. Precise cutouts for easy access \
             to all functions without any interference",
        ),
    },
    Design {
        title: "mousepads",
        image: "https://i.ibb.co/p1td84k/mousepad.png",
        aspect: (1.0, 0.43),
        price: Price::from_units(1150),
        description: None,
    },
    Design {
        title: LAPTOP_SLEEVES,
        image: "https://i.ibb.co/PrnPTW3/laptop-Sleeves.png",
        aspect: (1.0, 1.0),
        price: Price::from_units(1150),
        description: None,
    },
    Design {
        title: "popsockets",
        image: "https://i.ibb.co/bNjYR0z/popsocket.png",
        aspect: (1.0, 1.0),
        price: Price::from_units(150),
        description: None,
    },
    Design {
        title: "phonecases",
        image: "https://i.ibb.co/tYZn2VV/template.png",
        aspect: (0.52, 1.0),
        price: Price::from_units(550),
        description: None,
    },
];

/// Look up a design by title.
#[must_use]
pub fn find_design(title: &str) -> Option<&'static Design> {
    DESIGNS.iter().find(|d| d.title == title)
}

/// Laptop dimensions in inches, required for laptop sleeves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaptopSize {
    pub height: f64,
    pub width: f64,
}

impl LaptopSize {
    fn is_valid(self) -> bool {
        self.height > 0.0 && self.width > 0.0
    }
}

/// Why a selection could not become a cart entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComposeError {
    #[error("Please upload an image")]
    MissingArtwork,

    #[error("Please enter the size of your laptop")]
    MissingLaptopSize,

    #[error("Please select a case type")]
    MissingCaseType,
}

/// A composed cart entry with the artwork and placement to bind to it.
#[derive(Debug, Clone)]
pub struct ComposedItem {
    pub item: LineItem,
    pub artwork: Upload,
    pub placement: Placement,
}

/// Compose a cart entry for a design.
///
/// # Errors
///
/// Returns an error if no artwork was uploaded, or if a laptop sleeve is
/// missing a positive height and width.
pub fn compose_design_item(
    design: &Design,
    laptop_size: Option<LaptopSize>,
    artwork: Option<Upload>,
) -> Result<ComposedItem, ComposeError> {
    let artwork = artwork.ok_or(ComposeError::MissingArtwork)?;

    let variant = if design.title == LAPTOP_SLEEVES {
        let size = laptop_size
            .filter(|s| s.is_valid())
            .ok_or(ComposeError::MissingLaptopSize)?;
        format!(
            "Height : {} , Width : {} (In Inches)",
            size.height, size.width
        )
    } else {
        CUSTOM_DESIGN_VARIANT.to_string()
    };

    let item = LineItem::new(design.title, variant, design.price, design.title)
        .with_image(design.image);

    Ok(ComposedItem {
        item,
        artwork,
        placement: Placement::default(),
    })
}

/// Compose a cart entry for a phone case.
///
/// The case type's own price is used as-is; it is validated when the order
/// is built, not here.
///
/// # Errors
///
/// Returns an error if no artwork was uploaded or no case type is selected.
pub fn compose_phone_case_item(
    brand: Option<&Brand>,
    model: &PhoneModel,
    case_type: Option<&CaseType>,
    artwork: Option<Upload>,
) -> Result<ComposedItem, ComposeError> {
    let artwork = artwork.ok_or(ComposeError::MissingArtwork)?;
    let case_type = case_type.ok_or(ComposeError::MissingCaseType)?;

    let mut item = LineItem::new(
        model.name.clone(),
        case_type.name.clone(),
        Price::ZERO,
        PHONE_CASE_PRODUCT_TYPE,
    )
    .with_device(
        model.id.clone(),
        String::new(),
        model.name.clone(),
        case_type.name.clone(),
    );
    item.price.clone_from(&case_type.price);
    item.brand_name = brand.map(|b| b.name.clone());

    Ok(ComposedItem {
        item,
        artwork,
        placement: Placement::default(),
    })
}
