//! Inference-time vehicle records
//!
//! `VehicleRecord` is the typed request shape, with field names matching the
//! public JSON contract. `RawVehicleRecord` mirrors one row of the sales
//! dataset and normalizes into a `VehicleRecord` with the same cell parsers
//! the training pipeline uses.

use crate::error::{CarPriceError, Result};
use crate::preprocessing::normalize::{parse_engine_volume, parse_levy, parse_mileage};
use serde::{Deserialize, Serialize};

/// One vehicle to price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    #[serde(rename = "Levy")]
    pub levy: i64,
    #[serde(rename = "Manufacturer")]
    pub manufacturer: String,
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Prod_year")]
    pub prod_year: i64,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Leather_interior")]
    pub leather_interior: String,
    #[serde(rename = "Fuel_type")]
    pub fuel_type: String,
    #[serde(rename = "Engine_volume")]
    pub engine_volume: f64,
    #[serde(rename = "Mileage")]
    pub mileage: i64,
    #[serde(rename = "Cylinders")]
    pub cylinders: f64,
    #[serde(rename = "Gear_box_type")]
    pub gear_box_type: String,
    #[serde(rename = "Drive_wheels")]
    pub drive_wheels: String,
    #[serde(rename = "Wheel")]
    pub wheel: String,
    #[serde(rename = "Color")]
    pub color: String,
    #[serde(rename = "Airbags")]
    pub airbags: i64,
}

fn check_non_negative_int(field: &str, value: i64) -> Result<()> {
    if value < 0 {
        return Err(CarPriceError::Validation(format!(
            "{} must be greater than or equal to 0, got {}",
            field, value
        )));
    }
    Ok(())
}

fn check_non_negative_float(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CarPriceError::Validation(format!(
            "{} must be a finite number greater than or equal to 0, got {}",
            field, value
        )));
    }
    Ok(())
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(CarPriceError::Validation(format!(
            "{} must be between {} and {} characters, got {}",
            field, min, max, len
        )));
    }
    Ok(())
}

impl VehicleRecord {
    /// Enforce the per-field constraints of the request contract
    pub fn validate(&self) -> Result<()> {
        check_non_negative_int("Levy", self.levy)?;
        check_length("Manufacturer", &self.manufacturer, 2, 35)?;
        check_length("Model", &self.model, 2, 35)?;
        check_length("Category", &self.category, 2, 25)?;
        check_length("Leather_interior", &self.leather_interior, 2, 3)?;
        check_length("Fuel_type", &self.fuel_type, 2, 25)?;
        check_non_negative_float("Engine_volume", self.engine_volume)?;
        check_non_negative_int("Mileage", self.mileage)?;
        check_non_negative_float("Cylinders", self.cylinders)?;
        check_length("Gear_box_type", &self.gear_box_type, 2, 25)?;
        check_length("Drive_wheels", &self.drive_wheels, 2, 25)?;
        check_length("Wheel", &self.wheel, 2, 25)?;
        check_length("Color", &self.color, 2, 25)?;
        check_non_negative_int("Airbags", self.airbags)?;
        Ok(())
    }
}

/// One row of the sales dataset, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawVehicleRecord {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "Price", default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(rename = "Levy")]
    pub levy: String,
    #[serde(rename = "Manufacturer")]
    pub manufacturer: String,
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Prod. year")]
    pub prod_year: i64,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Leather interior")]
    pub leather_interior: String,
    #[serde(rename = "Fuel type")]
    pub fuel_type: String,
    #[serde(rename = "Engine volume")]
    pub engine_volume: String,
    #[serde(rename = "Mileage")]
    pub mileage: String,
    #[serde(rename = "Cylinders")]
    pub cylinders: f64,
    #[serde(rename = "Gear box type")]
    pub gear_box_type: String,
    #[serde(rename = "Drive wheels")]
    pub drive_wheels: String,
    #[serde(rename = "Doors", default, skip_serializing_if = "Option::is_none")]
    pub doors: Option<String>,
    #[serde(rename = "Wheel")]
    pub wheel: String,
    #[serde(rename = "Color")]
    pub color: String,
    #[serde(rename = "Airbags")]
    pub airbags: i64,
}

impl RawVehicleRecord {
    /// Parse the string-encoded numerics. Price, ID and doors are dropped.
    pub fn normalize(&self) -> Result<VehicleRecord> {
        Ok(VehicleRecord {
            levy: parse_levy(&self.levy)?,
            manufacturer: self.manufacturer.clone(),
            model: self.model.clone(),
            prod_year: self.prod_year,
            category: self.category.clone(),
            leather_interior: self.leather_interior.clone(),
            fuel_type: self.fuel_type.clone(),
            engine_volume: parse_engine_volume(&self.engine_volume)?,
            mileage: parse_mileage(&self.mileage)?,
            cylinders: self.cylinders,
            gear_box_type: self.gear_box_type.clone(),
            drive_wheels: self.drive_wheels.clone(),
            wheel: self.wheel.clone(),
            color: self.color.clone(),
            airbags: self.airbags,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnyRecord {
    Typed(VehicleRecord),
    Raw(RawVehicleRecord),
}

/// Parse a JSON record in either the request shape or the dataset shape
pub fn parse_record_json(json: &str) -> Result<VehicleRecord> {
    let record = match serde_json::from_str::<AnyRecord>(json) {
        Ok(AnyRecord::Typed(record)) => record,
        Ok(AnyRecord::Raw(raw)) => raw.normalize()?,
        Err(_) => {
            return Err(CarPriceError::Validation(
                "record matches neither the request shape nor the dataset shape".to_string(),
            ))
        }
    };
    record.validate()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camry() -> VehicleRecord {
        VehicleRecord {
            levy: 0,
            manufacturer: "TOYOTA".into(),
            model: "Camry".into(),
            prod_year: 2015,
            category: "Sedan".into(),
            leather_interior: "Yes".into(),
            fuel_type: "Petrol".into(),
            engine_volume: 2.0,
            mileage: 80000,
            cylinders: 4.0,
            gear_box_type: "Automatic".into(),
            drive_wheels: "Front".into(),
            wheel: "Left wheel".into(),
            color: "Black".into(),
            airbags: 6,
        }
    }

    #[test]
    fn test_valid_record() {
        assert!(camry().validate().is_ok());
    }

    #[test]
    fn test_constraint_violations() {
        let mut record = camry();
        record.levy = -1;
        assert!(matches!(record.validate(), Err(CarPriceError::Validation(_))));

        let mut record = camry();
        record.manufacturer = "T".into();
        assert!(record.validate().is_err());

        let mut record = camry();
        record.leather_interior = "Maybe".into();
        assert!(record.validate().is_err());

        let mut record = camry();
        record.engine_volume = f64::NAN;
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_request_json_field_names() {
        let json = serde_json::to_value(camry()).unwrap();
        assert_eq!(json["Prod_year"], 2015);
        assert_eq!(json["Gear_box_type"], "Automatic");
    }

    #[test]
    fn test_raw_record_normalizes() {
        let json = r#"{
            "ID": 45654403, "Price": 13328, "Levy": "-", "Manufacturer": "TOYOTA",
            "Model": "Camry", "Prod. year": 2015, "Category": "Sedan",
            "Leather interior": "Yes", "Fuel type": "Petrol", "Engine volume": "2.0",
            "Mileage": "80000 km", "Cylinders": 4.0, "Gear box type": "Automatic",
            "Drive wheels": "Front", "Doors": "04-May", "Wheel": "Left wheel",
            "Color": "Black", "Airbags": 6
        }"#;
        assert_eq!(parse_record_json(json).unwrap(), camry());
    }

    #[test]
    fn test_typed_record_json() {
        let json = serde_json::to_string(&camry()).unwrap();
        assert_eq!(parse_record_json(&json).unwrap(), camry());
        assert!(parse_record_json("{\"Levy\": 1}").is_err());
    }
}
