//! Integration test: record -> encoding replay -> schema -> forest

mod common;

use std::sync::Arc;

use carprice::inference::bundle::{
    write_json, LABEL_ENCODERS_FILE, MANUFACTURER_MAP_FILE, MODEL_FILE, ONE_HOT_FILE, SCALER_FILE,
};
use carprice::inference::{ModelBundle, PricePredictor};
use carprice::record::parse_record_json;
use carprice::CarPriceError;
use common::{camry, fitted_bundle, REFERENCE_YEAR};

fn predictor() -> PricePredictor {
    PricePredictor::new(Arc::new(fitted_bundle())).with_reference_year(REFERENCE_YEAR)
}

#[test]
fn test_schema_layout_of_fitted_bundle() {
    let bundle = fitted_bundle();
    let names = bundle.schema().names();

    // 11 base columns, then 3 + 3 + 2 + 2 one-hot indicators
    assert_eq!(names.len(), 21);
    assert_eq!(&names[..3], &["Levy", "Manufacturer", "Model"]);
    assert_eq!(names[10], "Age");
    assert_eq!(names[11], "Gear box type_Automatic");
    assert_eq!(names[20], "Fuel type_Petrol");
}

#[test]
fn test_dataset_shaped_record_end_to_end() {
    let json = r#"{
        "ID": 45654403,
        "Price": 13328,
        "Levy": "1399",
        "Manufacturer": "TOYOTA",
        "Model": "Camry",
        "Prod. year": 2015,
        "Category": "Sedan",
        "Leather interior": "Yes",
        "Fuel type": "Petrol",
        "Engine volume": "2.0 Turbo",
        "Mileage": "186005 km",
        "Cylinders": 4.0,
        "Gear box type": "Automatic",
        "Drive wheels": "Front",
        "Doors": "04-May",
        "Wheel": "Left wheel",
        "Color": "Black",
        "Airbags": 12
    }"#;
    let record = parse_record_json(json).unwrap();
    assert_eq!(record.levy, 1399);
    assert_eq!(record.mileage, 186005);

    let predictor = predictor();
    let (x, age) = predictor.encode(&record).unwrap();
    assert_eq!(age, 9);
    assert_eq!(x.shape(), &[1, 21]);

    let prediction = predictor.predict(&record).unwrap();
    assert!(prediction.price.is_finite() && prediction.price >= 0.0);
    assert_eq!(prediction.price, 14500.0);
    assert_eq!(prediction.reference_year, REFERENCE_YEAR);
}

#[test]
fn test_older_vehicle_takes_other_branch() {
    let mut record = camry();
    record.prod_year = 2010;
    let prediction = predictor().predict(&record).unwrap();
    assert_eq!(prediction.age, 14);
    assert_eq!(prediction.price, 12000.0);
}

#[test]
fn test_prediction_is_deterministic() {
    let predictor = predictor();
    let first = predictor.encode(&camry()).unwrap().0;
    let second = predictor.encode(&camry()).unwrap().0;
    let bits = |x: &ndarray::Array2<f64>| x.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&first), bits(&second));
}

#[test]
fn test_unknown_categories_are_client_errors() {
    let predictor = predictor();

    let mut record = camry();
    record.manufacturer = "LADA".into();
    let err = predictor.predict(&record).unwrap_err();
    assert!(matches!(err, CarPriceError::UnknownCategory { .. }));
    assert!(err.is_client_error());

    let mut record = camry();
    record.fuel_type = "Hydrogen".into();
    assert!(matches!(
        predictor.predict(&record),
        Err(CarPriceError::UnknownCategory { .. })
    ));
}

#[test]
fn test_invalid_record_is_rejected_before_replay() {
    let mut record = camry();
    record.airbags = -1;
    assert!(matches!(
        predictor().predict(&record),
        Err(CarPriceError::Validation(_))
    ));
}

#[test]
fn test_bundle_loads_from_directory() {
    let bundle = fitted_bundle();
    let dir = tempfile::tempdir().unwrap();
    write_json(&dir.path().join(ONE_HOT_FILE), bundle.one_hot()).unwrap();
    write_json(&dir.path().join(LABEL_ENCODERS_FILE), bundle.label_encoders()).unwrap();
    write_json(&dir.path().join(SCALER_FILE), bundle.scaler()).unwrap();
    write_json(&dir.path().join(MODEL_FILE), bundle.forest()).unwrap();
    write_json(&dir.path().join(MANUFACTURER_MAP_FILE), &{
        let mut map = carprice::inference::ManufacturerModels::new();
        map.insert("TOYOTA".into(), vec!["Camry".into(), "Prius".into()]);
        map
    })
    .unwrap();

    let loaded = ModelBundle::load(dir.path()).unwrap();
    assert_eq!(loaded.schema(), bundle.schema());
    assert_eq!(loaded.models_for("TOYOTA"), &["Camry", "Prius"]);

    let price = PricePredictor::new(Arc::new(loaded))
        .with_reference_year(REFERENCE_YEAR)
        .predict(&camry())
        .unwrap()
        .price;
    assert_eq!(price, 14500.0);
}
