//! Full train → persist → serve flow over a small synthetic dataset.

use homeval::artifacts::{ArtifactStore, BEST_MODEL_FILE, RESULTS_FILE};
use homeval::data::RawTable;
use homeval::error::ServeError;
use homeval::serve::PredictionService;
use homeval::train::run_full_training;
use std::path::Path;

fn write_training_csv(path: &Path, rows: usize) {
    let mut csv = String::from(
        "Id,MSZoning,LotFrontage,TotalBsmtSF,FirstFlrSF,SecondFlrSF,FullBath,HalfBath,\
         BsmtFullBath,BsmtHalfBath,YrSold,YearBuilt,YearRemodAdd,SalePrice\n",
    );
    for i in 0..rows {
        let zoning = ["RL", "RM", "FV"][i % 3];
        let frontage = if i % 7 == 0 {
            "NA".to_string()
        } else {
            (60 + (i % 5) * 5).to_string()
        };
        let bsmt = 700 + (i % 6) * 50;
        let first = 850 + (i % 8) * 40;
        let second = if i % 2 == 0 { 0 } else { 600 + (i % 4) * 60 };
        let built = 1950 + (i % 10) * 5;
        let remod = built + (i % 3) * 10;
        let price = 100_000 + bsmt * 40 + first * 50 + second * 45 + (built - 1900) * 300;
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},0,{},{},{},{}\n",
            i + 1,
            zoning,
            frontage,
            bsmt,
            first,
            second,
            1 + i % 2,
            i % 2,
            i % 2,
            2006 + i % 4,
            built,
            remod,
            price,
        ));
    }
    std::fs::write(path, csv).unwrap();
}

fn write_test_csv(path: &Path) {
    // No SalePrice column; first row carries a zoning class never seen
    // in training.
    let csv = "Id,MSZoning,LotFrontage,TotalBsmtSF,FirstFlrSF,SecondFlrSF,FullBath,HalfBath,\
               BsmtFullBath,BsmtHalfBath,YrSold,YearBuilt,YearRemodAdd\n\
               1001,C (all),NA,800,900,0,2,0,1,0,2008,1995,1995\n\
               1002,RL,70,850,950,650,2,1,0,0,2007,1980,1990\n";
    std::fs::write(path, csv).unwrap();
}

#[test]
fn train_persist_and_serve() {
    let dir = tempfile::tempdir().unwrap();
    let train_path = dir.path().join("train.csv");
    let test_path = dir.path().join("test.csv");
    let out_dir = dir.path().join("models");
    write_training_csv(&train_path, 24);
    write_test_csv(&test_path);

    let run = run_full_training(&train_path, Some(&test_path), &out_dir).unwrap();
    assert!(!run.candidates.is_empty());
    assert!(out_dir.join(BEST_MODEL_FILE).exists());
    assert!(out_dir.join(RESULTS_FILE).exists());

    // The persisted summary agrees with the in-memory run.
    let store = ArtifactStore::new(&out_dir);
    let results = store.load_results().unwrap();
    assert_eq!(results.best_model, run.best().name);
    let best_metrics = &results.models[&results.best_model];
    for other in results.models.values() {
        assert!(best_metrics.val_rmse <= other.val_rmse);
    }

    // Serve from the artifacts, including a record with an unseen
    // category and a missing numeric value.
    let service = PredictionService::open(&out_dir).unwrap();
    let test_table = RawTable::from_csv_path(&test_path).unwrap();
    for row in 0..test_table.n_rows() {
        let prediction = service.predict(&test_table.record(row)).unwrap();
        assert!(prediction.is_finite(), "row {row} predicted {prediction}");
    }
}

#[test]
fn ensemble_artifacts_carry_confidence_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let train_path = dir.path().join("train.csv");
    let out_dir = dir.path().join("models");
    write_training_csv(&train_path, 24);

    run_full_training(&train_path, None, &out_dir).unwrap();

    // Load the forest explicitly: whichever family won, the ensemble
    // must answer with bounds and the point model without.
    let store = ArtifactStore::new(&out_dir);
    let state = store.load_state().unwrap();
    let forest = store.load_model("Random Forest").unwrap();
    let ridge = store.load_model("Ridge Regression").unwrap();

    let table = RawTable::from_csv_path(&train_path).unwrap();
    let record = table.record(0);

    let forest_service = PredictionService::from_parts(state.clone(), forest);
    let result = forest_service.predict_with_confidence(&record).unwrap();
    let lower = result.lower_bound.unwrap();
    let upper = result.upper_bound.unwrap();
    assert!(lower >= 0.0);
    assert!(lower <= result.prediction && result.prediction <= upper);

    let ridge_service = PredictionService::from_parts(state, ridge);
    let result = ridge_service.predict_with_confidence(&record).unwrap();
    assert!(result.lower_bound.is_none());
    assert!(result.upper_bound.is_none());
}

#[test]
fn serving_without_training_reports_model_not_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let err = PredictionService::open(dir.path().join("models")).unwrap_err();
    assert!(matches!(err, ServeError::ModelNotLoaded { .. }));
    assert!(err.to_string().contains("training"));
}
