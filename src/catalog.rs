//! Product catalog collaborator
//!
//! Supplies product records to the planner: a built-in catalog for the CLI,
//! JSON file loading, and the pre-planning catalog validation. Brand and
//! type filtering happens here, before the planner ever sees the list.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::Path;

use crate::error::{FuelRsError, Result, ValidationError};
use crate::models::{Product, ProductType, Texture};

/// The built-in product catalog used when no file is supplied
pub fn builtin_catalog() -> Vec<Product> {
    vec![
        product("Energy Gel", ProductType::Gel, dec!(25), dec!(50), dec!(60), Texture::Gel, Some("Energy")),
        product("Light Gel", ProductType::Gel, dec!(20), dec!(30), dec!(50), Texture::LightGel, Some("Energy")),
        product("Isotonic Gel", ProductType::Gel, dec!(30), dec!(60), dec!(120), Texture::Gel, Some("Isotonic")),
        caffeinated("Espresso Gel", ProductType::Gel, dec!(25), dec!(50), dec!(60), dec!(75), Texture::Gel),
        product("Dual-Carb Mix", ProductType::Drink, dec!(45), dec!(300), dec!(500), Texture::Drink, Some("Energy")),
        product("Isotonic Sports Drink", ProductType::Drink, dec!(32), dec!(450), dec!(500), Texture::Drink, Some("Isotonic")),
        product("Electrolyte Drink", ProductType::Drink, dec!(18), dec!(500), dec!(500), Texture::Drink, Some("Electrolyte")),
        product("Soft Flask Mix", ProductType::Drink, dec!(18), dec!(120), dec!(150), Texture::Drink, Some("Energy")),
        product("Oat Energy Bar", ProductType::Bar, dec!(40), dec!(150), Decimal::ZERO, Texture::Bake, None),
        product("Fruit Chews", ProductType::Chew, dec!(24), dec!(40), Decimal::ZERO, Texture::Chew, None),
        product("Recovery Shake", ProductType::Recovery, dec!(35), dec!(200), dec!(400), Texture::Drink, Some("Recovery")),
    ]
}

/// Load a product catalog from a JSON file and validate it
pub fn load_catalog(path: &Path) -> Result<Vec<Product>> {
    let raw = std::fs::read_to_string(path)?;
    let products: Vec<Product> =
        serde_json::from_str(&raw).map_err(|e| FuelRsError::Catalog(e.to_string()))?;
    validate_catalog(&products)?;
    Ok(products)
}

/// Pre-planning catalog validation
///
/// The planner refuses to start on an empty catalog, a catalog without a
/// gel, negative nutrient values, zero-volume drinks, or inconsistent
/// caffeine fields.
pub fn validate_catalog(products: &[Product]) -> std::result::Result<(), ValidationError> {
    if products.is_empty() {
        return Err(ValidationError::EmptyCatalog);
    }

    if !products.iter().any(|p| p.product_type == ProductType::Gel) {
        return Err(ValidationError::MissingGel);
    }

    for p in products {
        for (value, field) in [
            (p.carbs_g, "carbs"),
            (p.sodium_mg, "sodium"),
            (p.volume_ml, "volume"),
            (p.caffeine_mg, "caffeine"),
        ] {
            if value < Decimal::ZERO {
                return Err(ValidationError::NegativeNutrient {
                    product: p.name.clone(),
                    field: field.to_string(),
                });
            }
        }

        if p.texture == Texture::Drink && p.volume_ml == Decimal::ZERO {
            return Err(ValidationError::ZeroVolumeDrink {
                product: p.name.clone(),
            });
        }

        let caffeine_consistent = p.has_caffeine == (p.caffeine_mg > Decimal::ZERO);
        if !caffeine_consistent {
            return Err(ValidationError::CaffeineFlagMismatch {
                product: p.name.clone(),
            });
        }
    }

    Ok(())
}

/// Collaborator-side filter: drop excluded product types before planning
pub fn exclude_types(products: &[Product], excluded: &[ProductType]) -> Vec<Product> {
    products
        .iter()
        .filter(|p| !excluded.contains(&p.product_type))
        .cloned()
        .collect()
}

fn product(
    name: &str,
    product_type: ProductType,
    carbs_g: Decimal,
    sodium_mg: Decimal,
    volume_ml: Decimal,
    texture: Texture,
    category: Option<&str>,
) -> Product {
    Product {
        name: name.to_string(),
        product_type,
        carbs_g,
        sodium_mg,
        volume_ml,
        has_caffeine: false,
        caffeine_mg: Decimal::ZERO,
        texture,
        category: category.map(|c| c.to_string()),
    }
}

#[allow(clippy::too_many_arguments)]
fn caffeinated(
    name: &str,
    product_type: ProductType,
    carbs_g: Decimal,
    sodium_mg: Decimal,
    volume_ml: Decimal,
    caffeine_mg: Decimal,
    texture: Texture,
) -> Product {
    Product {
        name: name.to_string(),
        product_type,
        carbs_g,
        sodium_mg,
        volume_ml,
        has_caffeine: true,
        caffeine_mg,
        texture,
        category: Some("Energy".to_string()),
    }
}
