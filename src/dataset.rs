use std::fs::File;
use std::io;
use std::path::Path;

use crate::predictor::TrainError;

/// Age substituted for rows where the age field is missing or non-numeric.
pub const DEFAULT_AGE: f64 = 25.0;

/// Season treated as "current" when computing recency gaps.
pub const REFERENCE_SEASON: i32 = 2025;

pub const PLAYER_COL: &str = "Player";
pub const POSITION_COL: &str = "FantPos";
pub const AGE_COL: &str = "Age";
pub const SEASON_COL: &str = "Year";

// Pro-Football-Reference exports have used both capitalizations over the years.
pub const TARGET_COLS: [&str; 2] = ["FantPT", "FantPt"];

/// One historical season-player observation, as read from the source table.
///
/// Optional fields are still raw here: cleaning (age imputation, dropping rows
/// without a season or target) happens during training.
#[derive(Debug, Clone)]
pub struct TrainingRecord {
    pub player: String,
    pub position: String,
    pub age: Option<f64>,
    pub season: Option<i32>,
    pub points: Option<f64>,
}

/// Strips trailing source annotations ("*" for Pro Bowl, "+" for All-Pro) and
/// surrounding whitespace. Idempotent.
pub fn normalize_player_name(raw: &str) -> String {
    let cut = match raw.find(['*', '+']) {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    cut.trim().to_string()
}

pub fn load_training_csv(path: &Path) -> Result<Vec<TrainingRecord>, TrainError> {
    let file = File::open(path).map_err(|source| TrainError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_training_records(file)
}

/// Reads CSV rows into raw training records. Headers are trimmed before
/// lookup; a missing required column (including both accepted target
/// spellings) fails before any row is read.
pub fn parse_training_records<R: io::Read>(reader: R) -> Result<Vec<TrainingRecord>, TrainError> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let player_idx = column(PLAYER_COL).ok_or(TrainError::MissingColumn(PLAYER_COL))?;
    let position_idx = column(POSITION_COL).ok_or(TrainError::MissingColumn(POSITION_COL))?;
    let age_idx = column(AGE_COL).ok_or(TrainError::MissingColumn(AGE_COL))?;
    let season_idx = column(SEASON_COL).ok_or(TrainError::MissingColumn(SEASON_COL))?;
    let target_idx = TARGET_COLS
        .iter()
        .find_map(|name| column(name))
        .ok_or(TrainError::MissingColumn("FantPT/FantPt"))?;

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let field = |idx: usize| row.get(idx).unwrap_or("").trim();

        records.push(TrainingRecord {
            player: field(player_idx).to_string(),
            position: field(position_idx).to_string(),
            age: field(age_idx).parse::<f64>().ok().filter(|v| v.is_finite()),
            season: field(season_idx)
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| v as i32),
            points: field(target_idx)
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite()),
        });
    }

    Ok(records)
}
