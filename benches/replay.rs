use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use carprice::inference::{feature_layout, ForestRegressor, ModelBundle, PricePredictor, TreeNode};
use carprice::preprocessing::{PreprocessingConfig, TrainingPipeline};
use carprice::record::VehicleRecord;
use polars::prelude::*;
use std::sync::Arc;

const MAKES: [(&str, &str); 4] = [
    ("TOYOTA", "Camry"),
    ("TOYOTA", "Prius"),
    ("HONDA", "FIT"),
    ("HONDA", "Civic"),
];

fn create_sales_data(n_rows: usize) -> DataFrame {
    let pick = |values: &[&str], i: usize| values[i % values.len()].to_string();

    let columns: Vec<Column> = vec![
        Column::new("ID".into(), (0..n_rows as i64).collect::<Vec<_>>()),
        Column::new(
            "Price".into(),
            (0..n_rows).map(|i| 8000 + (i % 50) as i64 * 200).collect::<Vec<_>>(),
        ),
        Column::new(
            "Levy".into(),
            (0..n_rows)
                .map(|i| if i % 7 == 0 { "-".to_string() } else { (400 + (i % 40) * 20).to_string() })
                .collect::<Vec<_>>(),
        ),
        Column::new("Manufacturer".into(), (0..n_rows).map(|i| MAKES[i % 4].0.to_string()).collect::<Vec<_>>()),
        Column::new("Model".into(), (0..n_rows).map(|i| MAKES[i % 4].1.to_string()).collect::<Vec<_>>()),
        Column::new(
            "Prod. year".into(),
            (0..n_rows).map(|i| 2000 + (i % 19) as i64).collect::<Vec<_>>(),
        ),
        Column::new("Category".into(), (0..n_rows).map(|i| pick(&["Sedan", "Hatchback", "Jeep"], i)).collect::<Vec<_>>()),
        Column::new("Leather interior".into(), (0..n_rows).map(|i| pick(&["Yes", "No"], i)).collect::<Vec<_>>()),
        Column::new("Fuel type".into(), (0..n_rows).map(|i| pick(&["Petrol", "Hybrid", "Diesel"], i)).collect::<Vec<_>>()),
        Column::new(
            "Engine volume".into(),
            (0..n_rows)
                .map(|i| format!("{:.1}{}", 1.3 + (i % 12) as f64 * 0.1, if i % 9 == 0 { " Turbo" } else { "" }))
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "Mileage".into(),
            (0..n_rows).map(|i| format!("{} km", 50000 + (i % 60) * 2500)).collect::<Vec<_>>(),
        ),
        Column::new("Cylinders".into(), vec![4.0f64; n_rows]),
        Column::new("Gear box type".into(), (0..n_rows).map(|i| pick(&["Automatic", "Tiptronic", "Manual"], i)).collect::<Vec<_>>()),
        Column::new("Drive wheels".into(), (0..n_rows).map(|i| pick(&["Front", "4x4", "Rear"], i)).collect::<Vec<_>>()),
        Column::new("Doors".into(), vec!["04-May".to_string(); n_rows]),
        Column::new("Wheel".into(), (0..n_rows).map(|i| pick(&["Left wheel", "Right-hand drive"], i)).collect::<Vec<_>>()),
        Column::new("Color".into(), (0..n_rows).map(|i| pick(&["Black", "White", "Silver", "Grey"], i)).collect::<Vec<_>>()),
        Column::new("Airbags".into(), (0..n_rows).map(|i| (i % 13) as i64).collect::<Vec<_>>()),
    ];

    DataFrame::new(columns).unwrap()
}

fn fitted_predictor() -> PricePredictor {
    let pipeline = TrainingPipeline::new(PreprocessingConfig::default().with_reference_year(2024));
    let cleaned = pipeline.run(&create_sales_data(2000)).unwrap().frame;
    let fitted = pipeline.fit_artifacts(&cleaned).unwrap();

    let names = feature_layout(&fitted.one_hot);
    let trees = (0..100)
        .map(|t| {
            let idx = t % names.len();
            TreeNode::split(
                idx,
                0.0,
                TreeNode::split((idx + 1) % names.len(), 0.5, TreeNode::leaf(9000.0), TreeNode::leaf(11000.0)),
                TreeNode::leaf(14000.0),
            )
        })
        .collect();
    let forest = ForestRegressor::new(names, trees);

    let bundle = ModelBundle::from_parts(
        fitted.one_hot,
        fitted.label_encoders,
        fitted.scaler,
        forest,
        fitted.manufacturer_models,
    )
    .unwrap();
    PricePredictor::new(Arc::new(bundle)).with_reference_year(2024)
}

fn record() -> VehicleRecord {
    VehicleRecord {
        levy: 700,
        manufacturer: "TOYOTA".into(),
        model: "Camry".into(),
        prod_year: 2012,
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

fn bench_predict(c: &mut Criterion) {
    let predictor = fitted_predictor();
    let record = record();

    c.bench_function("encode", |b| b.iter(|| predictor.encode(black_box(&record)).unwrap()));
    c.bench_function("predict", |b| b.iter(|| predictor.predict(black_box(&record)).unwrap()));
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    for n_rows in [1000, 10000].iter() {
        let df = create_sales_data(*n_rows);
        let pipeline = TrainingPipeline::new(PreprocessingConfig::default().with_reference_year(2024));

        group.bench_with_input(BenchmarkId::new("run", n_rows), &df, |b, df| {
            b.iter(|| pipeline.run(black_box(df)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_predict, bench_pipeline);
criterion_main!(benches);
