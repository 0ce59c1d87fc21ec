//! Response normalization
//!
//! Every field alias the backend has been observed to use is listed here,
//! once, in preference order. Call sites never guess at field names.
//! Dotted names (`crop.id`) address nested objects.

use super::{parse_timestamp, CropRecord, CropStatus, EntityId, HarvestRecord, ProductRecord};
use crate::error::{ClientError, Result};
use serde_json::Value;
use tracing::warn;

// =============================================================================
// Collections
// =============================================================================

/// Wrapper fields that may hold a list, for any entity
pub const LIST_FIELDS: &[&str] = &["content", "items", "data"];

pub const HARVEST_LIST_FIELDS: &[&str] = &["harvests", "cosechas"];
pub const CROP_LIST_FIELDS: &[&str] = &["crops", "cultivos"];
pub const PRODUCT_LIST_FIELDS: &[&str] = &["products", "productos"];

// =============================================================================
// Harvests
// =============================================================================

pub const HARVEST_ID: &[&str] = &["id", "harvestId", "cosechaId", "_id"];
pub const HARVEST_CROP_ID: &[&str] = &["cropId", "crop_id", "cultivoId", "crop.id", "crop.cropId", "cultivo.id"];
pub const HARVEST_CROP_NAME: &[&str] = &[
    "cropName",
    "cultivoNombre",
    "crop_name",
    "crop.name",
    "crop.title",
    "cultivo.name",
    "cultivo.nombre",
];
pub const HARVEST_QUANTITY: &[&str] = &["quantityHarvested", "quantity", "qty", "amount", "cantidad"];
pub const HARVEST_UNIT: &[&str] = &["unitOfMeasure", "unidadMedida", "unidad"];
pub const HARVEST_QUALITY: &[&str] = &["qualityNotes", "quality", "qualityNote", "calidad"];
pub const HARVEST_DATE: &[&str] = &["harvestDate", "fechaCosecha", "date", "fecha", "createdAt"];
pub const HARVEST_PRODUCT_ID: &[&str] = &["productId", "product_id", "product.id"];

// =============================================================================
// Crops
// =============================================================================

pub const CROP_ID: &[&str] = &["id", "cropId", "cultivoId", "_id"];
pub const CROP_NAME: &[&str] = &["name", "nombre", "title"];
pub const CROP_PLANTING_DATE: &[&str] = &["plantingDate", "fechaSiembra", "createdAt", "date"];
pub const CROP_STATUS: &[&str] = &["status", "estado"];
pub const CROP_HARVESTED_AT: &[&str] = &["harvestDate", "fechaCosecha", "harvestedAt", "fecha_cosecha", "fecha"];
pub const CROP_AREA: &[&str] = &["cultivatedArea", "areaCultivada", "area", "plantingArea"];

// =============================================================================
// Products
// =============================================================================

pub const PRODUCT_ID: &[&str] = &["id", "productId", "productoId", "_id"];
pub const PRODUCT_NAME: &[&str] = &["name", "nombre", "title"];
pub const PRODUCT_DESCRIPTION: &[&str] = &["description", "descripcion"];
pub const PRODUCT_PRICE: &[&str] = &["pricePerUnit", "precioPorUnidad", "price", "precio"];
pub const PRODUCT_UNIT: &[&str] = &["unitOfMeasure", "unidadMedida", "unidad"];
pub const PRODUCT_STOCK: &[&str] = &["availableStock", "stockDisponible", "stock"];
pub const PRODUCT_OWNER: &[&str] = &["farmer.email", "agricultor.email", "farmerEmail", "ownerEmail"];

// =============================================================================
// Counts
// =============================================================================

pub const COUNT: &[&str] = &["count", "total", "unreadCount", "totalSalesCount", "value"];

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.get(segment))
        .filter(|v| !v.is_null())
}

fn first<'a>(value: &'a Value, fields: &[&str]) -> Option<&'a Value> {
    fields.iter().find_map(|field| lookup(value, field))
}

fn first_id(value: &Value, fields: &[&str]) -> Option<EntityId> {
    fields
        .iter()
        .filter_map(|field| lookup(value, field))
        .find_map(EntityId::from_json)
}

fn first_str(value: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|field| lookup(value, field))
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

fn first_f64(value: &Value, fields: &[&str]) -> Option<f64> {
    fields
        .iter()
        .filter_map(|field| lookup(value, field))
        .find_map(as_f64)
}

/// Pull the list of raw items out of a list response.
///
/// Accepts a bare array, an object whose wrapper field (generic first, then
/// `entity_fields`) is an array, or failing that any array-valued field.
/// Objects without any array are an empty list.
pub fn extract_items<'a>(body: &'a Value, entity_fields: &[&str]) -> Result<&'a [Value]> {
    match body {
        Value::Array(items) => Ok(items.as_slice()),
        Value::Object(map) => {
            let named = LIST_FIELDS
                .iter()
                .chain(entity_fields.iter())
                .find_map(|field| map.get(*field).and_then(Value::as_array));
            let items = named.or_else(|| map.values().find_map(Value::as_array));
            Ok(items.map(Vec::as_slice).unwrap_or(&[]))
        }
        other => Err(ClientError::MalformedResponse(format!(
            "expected a list, got {}",
            kind_of(other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Normalize every item of a list response, skipping items that do not
/// normalize
pub fn normalize_list<T>(
    body: &Value,
    entity_fields: &[&str],
    normalize: impl Fn(&Value) -> Result<T>,
) -> Result<Vec<T>> {
    let items = extract_items(body, entity_fields)?;
    Ok(items
        .iter()
        .filter_map(|item| match normalize(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Skipping item that did not normalize");
                None
            }
        })
        .collect())
}

pub fn normalize_harvest(raw: &Value) -> Result<HarvestRecord> {
    let id = first_id(raw, HARVEST_ID)
        .ok_or_else(|| ClientError::MalformedResponse("harvest without an id".to_string()))?;

    Ok(HarvestRecord {
        id,
        crop_id: first_id(raw, HARVEST_CROP_ID),
        crop_name: first_str(raw, HARVEST_CROP_NAME),
        quantity_harvested: first_f64(raw, HARVEST_QUANTITY).unwrap_or(0.0),
        unit_of_measure: first_str(raw, HARVEST_UNIT).unwrap_or_else(|| "kg".to_string()),
        quality_notes: first_str(raw, HARVEST_QUALITY).unwrap_or_default(),
        harvest_date: first_str(raw, HARVEST_DATE).unwrap_or_default(),
        product_id: first_id(raw, HARVEST_PRODUCT_ID),
    })
}

pub fn normalize_crop(raw: &Value) -> Result<CropRecord> {
    let id = first_id(raw, CROP_ID)
        .ok_or_else(|| ClientError::MalformedResponse("crop without an id".to_string()))?;

    let status = first_str(raw, CROP_STATUS)
        .map(|s| CropStatus::parse(&s))
        .unwrap_or_default();

    Ok(CropRecord {
        id,
        name: first_str(raw, CROP_NAME).unwrap_or_else(|| "Unnamed".to_string()),
        planting_date: first_str(raw, CROP_PLANTING_DATE).and_then(|s| parse_timestamp(&s)),
        status,
        harvested_at: first_str(raw, CROP_HARVESTED_AT).and_then(|s| parse_timestamp(&s)),
        cultivated_area: first_f64(raw, CROP_AREA),
    })
}

pub fn normalize_product(raw: &Value) -> Result<ProductRecord> {
    let id = first_id(raw, PRODUCT_ID)
        .ok_or_else(|| ClientError::MalformedResponse("product without an id".to_string()))?;

    let available_stock = first(raw, PRODUCT_STOCK)
        .and_then(as_f64)
        .map(|stock| stock.max(0.0).floor().min(u32::MAX as f64) as u32);

    Ok(ProductRecord {
        id,
        name: first_str(raw, PRODUCT_NAME).unwrap_or_else(|| "Unnamed".to_string()),
        description: first_str(raw, PRODUCT_DESCRIPTION).unwrap_or_default(),
        price_per_unit: first_f64(raw, PRODUCT_PRICE).unwrap_or(0.0),
        unit_of_measure: first_str(raw, PRODUCT_UNIT).unwrap_or_else(|| "kg".to_string()),
        available_stock,
        owner_contact: first_str(raw, PRODUCT_OWNER),
    })
}

/// A count returned bare or wrapped in an object
pub fn normalize_count(body: &Value) -> Result<u64> {
    let value = match body {
        Value::Object(_) => first(body, COUNT),
        other => Some(other),
    };
    value
        .and_then(as_f64)
        .filter(|n| *n >= 0.0)
        .map(|n| n as u64)
        .ok_or_else(|| ClientError::MalformedResponse(format!("expected a count, got {}", body)))
}
