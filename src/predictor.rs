use std::io;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::dataset::{self, DEFAULT_AGE, REFERENCE_SEASON, TrainingRecord};
use crate::encoder::LabelEncoder;
use crate::forest::{FEATURE_COUNT, ForestConfig, RandomForest};

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["player_id", "age", "position_id"];

/// Fatal to the whole training operation. No partial model is ever produced.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("read training data {path}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("parse training data")]
    Csv(#[from] csv::Error),
    #[error("training data is missing required column {0:?}")]
    MissingColumn(&'static str),
    #[error("training data has no rows")]
    NoRows,
    #[error("no usable rows left after cleaning")]
    NoUsableRows,
}

/// Per-call prediction failure. Never affects other predictions and is never
/// coerced into a default score.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    #[error("model is not trained")]
    NotTrained,
    #[error("player {0:?} was not in the training data")]
    UnknownPlayer(String),
    #[error("position {0:?} was not in the training data")]
    UnknownPosition(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainSummary {
    pub generated_at: String,
    pub rows_in: usize,
    pub rows_used: usize,
    pub players: usize,
    pub positions: usize,
    pub n_trees: usize,
    pub seed: u64,
}

/// Immutable result of one training run: the fitted forest plus the frozen
/// label encoders it was fitted against. Re-training builds a whole new value,
/// stale encoders can never leak into a fresh forest.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    forest: RandomForest,
    players: LabelEncoder,
    positions: LabelEncoder,
    summary: TrainSummary,
}

impl TrainedModel {
    /// Predicts next-season points for one (player, age, position) triple.
    ///
    /// Closed world: a player or position the encoders never saw is an error,
    /// the forest has no signal for labels outside its training range.
    pub fn predict(&self, player_name: &str, age: f64, position: &str) -> Result<f64, PredictError> {
        let clean_name = dataset::normalize_player_name(player_name);
        let Some(player_id) = self.players.encode(&clean_name) else {
            return Err(PredictError::UnknownPlayer(clean_name));
        };
        let position = position.trim();
        let Some(position_id) = self.positions.encode(position) else {
            return Err(PredictError::UnknownPosition(position.to_string()));
        };

        let row = [player_id as f64, age, position_id as f64];
        Ok(self.forest.predict(&row))
    }

    pub fn summary(&self) -> &TrainSummary {
        &self.summary
    }

    pub fn players(&self) -> &LabelEncoder {
        &self.players
    }

    pub fn positions(&self) -> &LabelEncoder {
        &self.positions
    }
}

/// `1 / max(gap, 0.5)^2` per season, renormalized to mean 1.0.
///
/// The clamp keeps same-season and future-dated rows from blowing up the
/// weight scale; normalization preserves relative recency for whatever loss
/// weighting the regressor applies.
pub fn recency_weights(seasons: &[i32]) -> Vec<f64> {
    let mut weights: Vec<f64> = seasons
        .iter()
        .map(|&season| {
            let gap = f64::from(REFERENCE_SEASON - season).max(0.5);
            1.0 / (gap * gap)
        })
        .collect();

    if weights.is_empty() {
        return weights;
    }
    let mean = weights.iter().sum::<f64>() / weights.len() as f64;
    if mean > 0.0 {
        for w in &mut weights {
            *w /= mean;
        }
    }
    weights
}

pub fn train(records: &[TrainingRecord]) -> Result<TrainedModel, TrainError> {
    train_with_config(records, ForestConfig::default())
}

pub fn train_with_config(
    records: &[TrainingRecord],
    config: ForestConfig,
) -> Result<TrainedModel, TrainError> {
    if records.is_empty() {
        return Err(TrainError::NoRows);
    }

    struct CleanRow {
        player: String,
        position: String,
        age: f64,
        season: i32,
        points: f64,
    }

    let mut clean = Vec::with_capacity(records.len());
    for record in records {
        let Some(points) = record.points else { continue };
        let Some(season) = record.season else { continue };
        if !points.is_finite() {
            continue;
        }
        let age = record
            .age
            .filter(|a| a.is_finite())
            .unwrap_or(DEFAULT_AGE);
        clean.push(CleanRow {
            player: dataset::normalize_player_name(&record.player),
            position: record.position.trim().to_string(),
            age,
            season,
            points,
        });
    }
    if clean.is_empty() {
        return Err(TrainError::NoUsableRows);
    }

    let players = LabelEncoder::fit(clean.iter().map(|r| r.player.as_str()));
    let positions = LabelEncoder::fit(clean.iter().map(|r| r.position.as_str()));

    let mut rows: Vec<[f64; FEATURE_COUNT]> = Vec::with_capacity(clean.len());
    let mut targets: Vec<f64> = Vec::with_capacity(clean.len());
    let mut seasons: Vec<i32> = Vec::with_capacity(clean.len());
    for row in &clean {
        let (Some(player_id), Some(position_id)) =
            (players.encode(&row.player), positions.encode(&row.position))
        else {
            // Encoders were fitted over exactly these rows.
            continue;
        };
        rows.push([player_id as f64, row.age, position_id as f64]);
        targets.push(row.points);
        seasons.push(row.season);
    }

    let weights = recency_weights(&seasons);
    let forest = RandomForest::fit(&rows, &targets, &weights, config);

    let summary = TrainSummary {
        generated_at: chrono::Utc::now().to_rfc3339(),
        rows_in: records.len(),
        rows_used: rows.len(),
        players: players.len(),
        positions: positions.len(),
        n_trees: forest.n_trees(),
        seed: config.seed,
    };

    Ok(TrainedModel {
        forest,
        players,
        positions,
        summary,
    })
}

/// Stateful facade over the train/predict contract.
///
/// `Untrained -> Trained` on the first successful train; a later train
/// replaces the model wholesale. A failed re-train keeps the previous model
/// intact. Predictions are read-only against the current model.
#[derive(Debug, Default)]
pub struct Predictor {
    trained: Option<TrainedModel>,
}

impl Predictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_trained(&self) -> bool {
        self.trained.is_some()
    }

    pub fn model(&self) -> Option<&TrainedModel> {
        self.trained.as_ref()
    }

    pub fn train(&mut self, records: &[TrainingRecord]) -> Result<(), TrainError> {
        let model = train(records)?;
        self.trained = Some(model);
        Ok(())
    }

    pub fn train_from_csv(&mut self, path: &Path) -> Result<(), TrainError> {
        let records = dataset::load_training_csv(path)?;
        self.train(&records)
    }

    pub fn predict(&self, player_name: &str, age: f64, position: &str) -> Result<f64, PredictError> {
        let Some(model) = &self.trained else {
            return Err(PredictError::NotTrained);
        };
        model.predict(player_name, age, position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        player: &str,
        position: &str,
        age: Option<f64>,
        season: Option<i32>,
        points: Option<f64>,
    ) -> TrainingRecord {
        TrainingRecord {
            player: player.to_string(),
            position: position.to_string(),
            age,
            season,
            points,
        }
    }

    #[test]
    fn weights_average_to_one() {
        let weights = recency_weights(&[2020, 2021, 2022, 2023, 2024]);
        let mean = weights.iter().sum::<f64>() / weights.len() as f64;
        assert!((mean - 1.0).abs() < 1e-12);
        assert!(weights.iter().all(|&w| w > 0.0));
    }

    #[test]
    fn weights_decay_with_season_gap() {
        let weights = recency_weights(&[2024, 2022, 2018]);
        assert!(weights[0] > weights[1]);
        assert!(weights[1] > weights[2]);
    }

    #[test]
    fn same_season_rows_are_clamped_not_infinite() {
        let weights = recency_weights(&[2025, 2026, 2020]);
        assert!(weights.iter().all(|&w| w.is_finite() && w > 0.0));
        // Clamping makes the current and future season equally heavy.
        assert!((weights[0] - weights[1]).abs() < 1e-12);
    }

    #[test]
    fn empty_input_is_no_rows() {
        assert!(matches!(train(&[]), Err(TrainError::NoRows)));
    }

    #[test]
    fn all_rows_dropped_is_no_usable_rows() {
        let records = vec![
            record("A", "WR", Some(25.0), None, Some(10.0)),
            record("B", "RB", Some(24.0), Some(2024), None),
        ];
        assert!(matches!(train(&records), Err(TrainError::NoUsableRows)));
    }

    #[test]
    fn missing_age_is_imputed_not_dropped() {
        let records = vec![
            record("A", "WR", None, Some(2024), Some(12.0)),
            record("B", "WR", Some(26.0), Some(2024), Some(18.0)),
        ];
        let model = train(&records).expect("train succeeds");
        assert_eq!(model.summary().rows_used, 2);
        let points = model.predict("A", 25.0, "WR").expect("A is known");
        assert!(points.is_finite());
    }

    #[test]
    fn predict_before_train_is_error() {
        let predictor = Predictor::new();
        assert_eq!(
            predictor.predict("A", 25.0, "WR"),
            Err(PredictError::NotTrained)
        );
    }

    #[test]
    fn retrain_replaces_encoders() {
        let mut predictor = Predictor::new();
        predictor
            .train(&[record("A", "WR", Some(25.0), Some(2024), Some(10.0))])
            .expect("first train");
        assert!(predictor.predict("A", 26.0, "WR").is_ok());

        predictor
            .train(&[record("B", "RB", Some(24.0), Some(2024), Some(8.0))])
            .expect("second train");
        assert_eq!(
            predictor.predict("A", 26.0, "WR"),
            Err(PredictError::UnknownPlayer("A".to_string()))
        );
        assert!(predictor.predict("B", 25.0, "RB").is_ok());
    }

    #[test]
    fn failed_retrain_keeps_previous_model() {
        let mut predictor = Predictor::new();
        predictor
            .train(&[record("A", "WR", Some(25.0), Some(2024), Some(10.0))])
            .expect("first train");
        assert!(predictor.train(&[]).is_err());
        assert!(predictor.predict("A", 26.0, "WR").is_ok());
    }

    #[test]
    fn starred_name_matches_clean_name() {
        let records = vec![record("Justin Jefferson*", "WR", Some(24.0), Some(2024), Some(20.0))];
        let model = train(&records).expect("train succeeds");
        let starred = model.predict("Justin Jefferson*", 25.0, "WR").expect("starred");
        let clean = model.predict("Justin Jefferson", 25.0, "WR").expect("clean");
        assert_eq!(starred, clean);
    }
}
