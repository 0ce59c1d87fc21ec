//! Harvest records

use super::EntityId;
use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};

/// A harvest as shown to the farmer and as persisted in the local cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestRecord {
    pub id: EntityId,
    #[serde(default)]
    pub crop_id: Option<EntityId>,
    #[serde(default)]
    pub crop_name: Option<String>,
    #[serde(default)]
    pub quantity_harvested: f64,
    #[serde(default = "default_unit")]
    pub unit_of_measure: String,
    #[serde(default)]
    pub quality_notes: String,
    #[serde(default)]
    pub harvest_date: String,
    #[serde(default)]
    pub product_id: Option<EntityId>,
}

fn default_unit() -> String {
    "kg".to_string()
}

/// Payload for registering a harvest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHarvest {
    pub crop_id: EntityId,
    pub harvest_date: String,
    pub quantity_harvested: f64,
    pub unit_of_measure: String,
    pub quality_notes: String,
    pub product_id: Option<EntityId>,
}

impl NewHarvest {
    /// Reject payloads the backend would refuse anyway
    pub fn validate(&self) -> Result<()> {
        if self.crop_id.as_str().is_empty() {
            return Err(ClientError::ValidationFailed("a crop is required".to_string()));
        }
        if !self.quantity_harvested.is_finite() || self.quantity_harvested <= 0.0 {
            return Err(ClientError::ValidationFailed(
                "harvested quantity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The record to keep locally when the server does not echo one back
    pub fn into_record(self, id: EntityId) -> HarvestRecord {
        HarvestRecord {
            id,
            crop_id: Some(self.crop_id),
            crop_name: None,
            quantity_harvested: self.quantity_harvested,
            unit_of_measure: if self.unit_of_measure.is_empty() {
                default_unit()
            } else {
                self.unit_of_measure
            },
            quality_notes: self.quality_notes,
            harvest_date: self.harvest_date,
            product_id: self.product_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(quantity: f64) -> NewHarvest {
        NewHarvest {
            crop_id: EntityId::from(3),
            harvest_date: "2024-06-01".into(),
            quantity_harvested: quantity,
            unit_of_measure: String::new(),
            quality_notes: "MEDIA".into(),
            product_id: None,
        }
    }

    #[test]
    fn test_validate_quantity() {
        assert!(payload(12.5).validate().is_ok());
        assert!(payload(0.0).validate().is_err());
        assert!(payload(-1.0).validate().is_err());
        assert!(payload(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_into_record_defaults_unit() {
        let record = payload(4.0).into_record(EntityId::from(99));
        assert_eq!(record.unit_of_measure, "kg");
        assert_eq!(record.crop_id, Some(EntityId::from(3)));
    }

    #[test]
    fn test_persisted_shape_is_camel_case() {
        let record = payload(4.0).into_record(EntityId::from(99));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["quantityHarvested"], 4.0);
        assert_eq!(value["id"], 99);
    }
}
