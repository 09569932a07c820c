//! Shared fixtures: a small raw sales table and a bundle fitted on it

#![allow(dead_code)]

use carprice::inference::{feature_layout, ForestRegressor, ModelBundle, TreeNode};
use carprice::preprocessing::{PreprocessingConfig, TrainingPipeline};
use carprice::record::VehicleRecord;
use polars::prelude::*;

pub const REFERENCE_YEAR: i32 = 2024;

pub fn raw_sales() -> DataFrame {
    df!(
        "ID" => &[1i64, 2, 3, 4, 5, 6, 7, 8],
        "Price" => &[10000i64, 11000, 12000, 13000, 14000, 15000, 16000, 17000],
        "Levy" => &["500", "600", "-", "800", "900", "1000", "1100", "1200"],
        "Manufacturer" => &["TOYOTA", "TOYOTA", "TOYOTA", "TOYOTA", "HONDA", "HONDA", "HONDA", "HONDA"],
        "Model" => &["Camry", "Prius", "Camry", "Prius", "FIT", "Civic", "FIT", "Civic"],
        "Prod. year" => &[2010i64, 2011, 2012, 2013, 2014, 2015, 2016, 2017],
        "Category" => &["Sedan", "Hatchback", "Sedan", "Hatchback", "Hatchback", "Sedan", "Hatchback", "Sedan"],
        "Leather interior" => &["Yes", "No", "Yes", "No", "No", "Yes", "No", "Yes"],
        "Fuel type" => &["Petrol", "Hybrid", "Petrol", "Hybrid", "Petrol", "Petrol", "Hybrid", "Petrol"],
        "Engine volume" => &["1.5", "1.6", "1.7", "1.8 Turbo", "1.9", "2.0", "2.1", "2.2"],
        "Mileage" => &["100000 km", "110000 km", "120000 km", "130000 km", "140000 km", "150000 km", "160000 km", "170000 km"],
        "Cylinders" => &[4.0, 4.0, 4.0, 4.0, 4.0, 4.0, 4.0, 6.0],
        "Gear box type" => &["Automatic", "Automatic", "Tiptronic", "Automatic", "Manual", "Automatic", "Tiptronic", "Manual"],
        "Drive wheels" => &["Front", "Front", "Front", "4x4", "Front", "Front", "Rear", "Front"],
        "Doors" => &["04-May", "04-May", "04-May", "04-May", "04-May", "04-May", "02-Mar", "04-May"],
        "Wheel" => &["Left wheel", "Left wheel", "Left wheel", "Right-hand drive", "Left wheel", "Left wheel", "Left wheel", "Left wheel"],
        "Color" => &["Black", "White", "Silver", "Black", "White", "Silver", "Black", "White"],
        "Airbags" => &[6i64, 8, 10, 12, 4, 6, 8, 12]
    )
    .unwrap()
}

pub fn pipeline() -> TrainingPipeline {
    TrainingPipeline::new(PreprocessingConfig::default().with_reference_year(REFERENCE_YEAR))
}

/// Bundle fitted on `raw_sales` with a two-tree forest: the first tree
/// splits on the scaled age, the second is a constant.
pub fn fitted_bundle() -> ModelBundle {
    let pipeline = pipeline();
    let cleaned = pipeline.run(&raw_sales()).unwrap().frame;
    let fitted = pipeline.fit_artifacts(&cleaned).unwrap();

    let names = feature_layout(&fitted.one_hot);
    let age_idx = names.iter().position(|n| n == "Age").unwrap();
    let forest = ForestRegressor::new(
        names,
        vec![
            TreeNode::split(age_idx, 0.0, TreeNode::leaf(16000.0), TreeNode::leaf(11000.0)),
            TreeNode::leaf(13000.0),
        ],
    );

    ModelBundle::from_parts(
        fitted.one_hot,
        fitted.label_encoders,
        fitted.scaler,
        forest,
        fitted.manufacturer_models,
    )
    .unwrap()
}

pub fn camry() -> VehicleRecord {
    VehicleRecord {
        levy: 700,
        manufacturer: "TOYOTA".into(),
        model: "Camry".into(),
        prod_year: 2015,
        category: "Sedan".into(),
        leather_interior: "Yes".into(),
        fuel_type: "Petrol".into(),
        engine_volume: 2.0,
        mileage: 120000,
        cylinders: 4.0,
        gear_box_type: "Automatic".into(),
        drive_wheels: "Front".into(),
        wheel: "Left wheel".into(),
        color: "Black".into(),
        airbags: 8,
    }
}
