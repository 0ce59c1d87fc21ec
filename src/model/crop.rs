//! Crop records

use super::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a crop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CropStatus {
    Growing,
    /// Terminal state; the elapsed-time counter stops here
    Harvested,
    Other(String),
}

impl CropStatus {
    /// Parse the backend's status label, case-insensitively
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "" | "EN_CRECIMIENTO" | "GROWING" => Self::Growing,
            "COSECHADO" | "HARVESTED" => Self::Harvested,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    /// Label the backend expects on status updates
    pub fn as_label(&self) -> &str {
        match self {
            Self::Growing => "EN_CRECIMIENTO",
            Self::Harvested => "COSECHADO",
            Self::Other(label) => label,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Harvested)
    }
}

impl Default for CropStatus {
    fn default() -> Self {
        Self::Growing
    }
}

/// A crop and the timestamps its elapsed-time counter is computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecord {
    pub id: EntityId,
    pub name: String,
    pub planting_date: Option<DateTime<Utc>>,
    pub status: CropStatus,
    /// Authoritative harvest time reported by the server
    pub harvested_at: Option<DateTime<Utc>>,
    pub cultivated_area: Option<f64>,
}

impl CropRecord {
    /// Server-confirmed terminal timestamp, only meaningful once harvested
    pub fn authoritative_stop(&self) -> Option<DateTime<Utc>> {
        if self.status.is_terminal() {
            self.harvested_at
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(CropStatus::parse("COSECHADO"), CropStatus::Harvested);
        assert_eq!(CropStatus::parse("Cosechado"), CropStatus::Harvested);
        assert_eq!(CropStatus::parse("EN_CRECIMIENTO"), CropStatus::Growing);
        assert_eq!(CropStatus::parse(""), CropStatus::Growing);
        assert_eq!(
            CropStatus::parse("PERDIDO"),
            CropStatus::Other("PERDIDO".to_string())
        );
    }

    #[test]
    fn test_authoritative_stop_requires_terminal_status() {
        let now = Utc::now();
        let mut crop = CropRecord {
            id: EntityId::from(1),
            name: "Maize".into(),
            planting_date: None,
            status: CropStatus::Growing,
            harvested_at: Some(now),
            cultivated_area: None,
        };
        assert_eq!(crop.authoritative_stop(), None);
        crop.status = CropStatus::Harvested;
        assert_eq!(crop.authoritative_stop(), Some(now));
    }
}
