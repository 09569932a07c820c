//! Encoding replay
//!
//! Rebuilds, for a single record, the exact transformation the training
//! table went through before the model was fitted. The record passes
//! through a working row of named cells so every step addresses columns by
//! their training-time names.

use crate::error::{CarPriceError, Result};
use crate::preprocessing::normalize::parse_leather_interior;
use crate::preprocessing::transforms::vehicle_age;
use crate::preprocessing::{columns, LabelEncoders, OneHotEncoder, Scaler};
use crate::record::VehicleRecord;
use tracing::debug;

use super::schema::FeatureRow;

/// Request field name -> training column name
pub const FIELD_RENAMES: [(&str, &str); 5] = [
    ("Leather_interior", columns::LEATHER_INTERIOR),
    ("Gear_box_type", columns::GEAR_BOX_TYPE),
    ("Drive_wheels", columns::DRIVE_WHEELS),
    ("Engine_volume", columns::ENGINE_VOLUME),
    ("Fuel_type", columns::FUEL_TYPE),
];

/// Numeric columns kept as-is, ahead of the one-hot block, in model order
const BASE_LAYOUT: [&str; 11] = [
    columns::LEVY,
    columns::MANUFACTURER,
    columns::MODEL,
    columns::CATEGORY,
    columns::LEATHER_INTERIOR,
    columns::ENGINE_VOLUME,
    columns::MILEAGE,
    columns::CYLINDERS,
    columns::COLOR,
    columns::AIRBAGS,
    columns::AGE,
];

/// Column order the replay produces for a given one-hot encoder
pub fn feature_layout(one_hot: &OneHotEncoder) -> Vec<String> {
    BASE_LAYOUT
        .iter()
        .map(|c| c.to_string())
        .chain(one_hot.feature_names_out())
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
}

/// Ordered named cells of the record being encoded
#[derive(Debug, Clone, Default)]
struct WorkingRow {
    cells: Vec<(String, Cell)>,
}

impl WorkingRow {
    fn push(&mut self, name: &str, cell: Cell) {
        self.cells.push((name.to_string(), cell));
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.cells
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| CarPriceError::MissingColumn(name.to_string()))
    }

    fn text(&self, name: &str) -> Result<&str> {
        match &self.cells[self.position(name)?].1 {
            Cell::Text(s) => Ok(s.as_str()),
            Cell::Number(v) => Err(CarPriceError::parse(name, v.to_string())),
        }
    }

    fn number(&self, name: &str) -> Result<f64> {
        match &self.cells[self.position(name)?].1 {
            Cell::Number(v) => Ok(*v),
            Cell::Text(s) => Err(CarPriceError::parse(name, s.as_str())),
        }
    }

    fn set(&mut self, name: &str, cell: Cell) -> Result<()> {
        let idx = self.position(name)?;
        self.cells[idx].1 = cell;
        Ok(())
    }

    fn remove(&mut self, name: &str) {
        self.cells.retain(|(n, _)| n != name);
    }

    fn rename(&mut self, from: &str, to: &str) {
        if let Some((n, _)) = self.cells.iter_mut().find(|(n, _)| n == from) {
            *n = to.to_string();
        }
    }

    fn into_feature_row(self) -> Result<FeatureRow> {
        let mut row = FeatureRow::new();
        for (name, cell) in self.cells {
            match cell {
                Cell::Number(v) => row.push(name, v),
                Cell::Text(_) => {
                    return Err(CarPriceError::SchemaMismatch {
                        expected: format!("numeric value for '{}'", name),
                        actual: "unencoded text".to_string(),
                    })
                }
            }
        }
        Ok(row)
    }
}

/// Encoded record plus the age it was computed with
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    pub row: FeatureRow,
    pub age: i64,
}

/// Applies the fitted encoders and scaler to one record
#[derive(Debug, Clone, Copy)]
pub struct EncodingReplay<'a> {
    one_hot: &'a OneHotEncoder,
    label_encoders: &'a LabelEncoders,
    scaler: &'a Scaler,
    reference_year: i32,
}

impl<'a> EncodingReplay<'a> {
    pub fn new(
        one_hot: &'a OneHotEncoder,
        label_encoders: &'a LabelEncoders,
        scaler: &'a Scaler,
        reference_year: i32,
    ) -> Self {
        Self {
            one_hot,
            label_encoders,
            scaler,
            reference_year,
        }
    }

    /// Encode one record into a model-ready row
    pub fn replay(&self, record: &VehicleRecord) -> Result<EncodedRecord> {
        let mut row = request_row(record);

        // 1. age, then drop the production year
        let age = vehicle_age(self.reference_year, record.prod_year);
        row.push(columns::AGE, Cell::Number(age as f64));
        row.remove("Prod_year");
        row.remove(columns::DOORS);

        // 2. training-time column names
        for (from, to) in FIELD_RENAMES {
            row.rename(from, to);
        }

        // 3. one-hot block appended, sources dropped
        let sources = self
            .one_hot
            .columns()
            .iter()
            .map(|c| row.text(c))
            .collect::<Result<Vec<&str>>>()?;
        let indicators = self.one_hot.transform_values(&sources)?;
        for (name, value) in self.one_hot.feature_names_out().iter().zip(indicators) {
            row.push(name, Cell::Number(value));
        }
        for column in self.one_hot.columns() {
            row.remove(column);
        }

        // 4. label codes
        for column in columns::LABEL {
            let code = self.label_encoders.encode(column, row.text(column)?)?;
            row.set(column, Cell::Number(code as f64))?;
        }

        // 5. joint scaling
        let raw = self
            .scaler
            .columns()
            .iter()
            .map(|c| row.number(c))
            .collect::<Result<Vec<f64>>>()?;
        let scaled = self.scaler.transform_values(&raw)?;
        for (column, value) in self.scaler.columns().iter().zip(scaled) {
            row.set(column, Cell::Number(value))?;
        }

        // 6. leather flag
        let leather = row.text(columns::LEATHER_INTERIOR)?;
        let flag = parse_leather_interior(leather)
            .ok_or_else(|| CarPriceError::parse(columns::LEATHER_INTERIOR, leather))?;
        row.set(columns::LEATHER_INTERIOR, Cell::Number(flag as f64))?;

        let row = row.into_feature_row()?;
        debug!(features = row.len(), age, "Replayed encoding");
        Ok(EncodedRecord { row, age })
    }
}

// cells in request field order
fn request_row(record: &VehicleRecord) -> WorkingRow {
    let mut row = WorkingRow::default();
    row.push(columns::LEVY, Cell::Number(record.levy as f64));
    row.push(columns::MANUFACTURER, Cell::Text(record.manufacturer.clone()));
    row.push(columns::MODEL, Cell::Text(record.model.clone()));
    row.push("Prod_year", Cell::Number(record.prod_year as f64));
    row.push(columns::CATEGORY, Cell::Text(record.category.clone()));
    row.push("Leather_interior", Cell::Text(record.leather_interior.clone()));
    row.push("Fuel_type", Cell::Text(record.fuel_type.clone()));
    row.push("Engine_volume", Cell::Number(record.engine_volume));
    row.push(columns::MILEAGE, Cell::Number(record.mileage as f64));
    row.push(columns::CYLINDERS, Cell::Number(record.cylinders));
    row.push("Gear_box_type", Cell::Text(record.gear_box_type.clone()));
    row.push("Drive_wheels", Cell::Text(record.drive_wheels.clone()));
    row.push(columns::WHEEL, Cell::Text(record.wheel.clone()));
    row.push(columns::COLOR, Cell::Text(record.color.clone()));
    row.push(columns::AIRBAGS, Cell::Number(record.airbags as f64));
    row
}
