use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, anyhow};

use fantasy_forecast::dataset::load_training_csv;
use fantasy_forecast::predictor::{PredictError, Predictor};
use fantasy_forecast::roster::load_roster;

const DEFAULT_SLATE: [(&str, f64, &str); 5] = [
    ("Patrick Mahomes", 29.0, "QB"),
    ("Derrick Henry", 31.0, "RB"),
    ("Justin Jefferson", 25.0, "WR"),
    ("CeeDee Lamb", 25.0, "WR"),
    ("Rookie Player", 21.0, "WR"),
];

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let csv_path = parse_data_arg().unwrap_or_else(|| PathBuf::from("complete.csv"));

    let records = load_training_csv(&csv_path)
        .with_context(|| format!("load training data {}", csv_path.display()))?;

    let mut predictor = Predictor::new();
    predictor.train(&records).context("train model")?;
    if let Some(model) = predictor.model() {
        let summary = model.summary();
        println!(
            "model trained rows_used={}/{} players={} positions={} trees={} seed={}",
            summary.rows_used,
            summary.rows_in,
            summary.players,
            summary.positions,
            summary.n_trees,
            summary.seed
        );
        println!();
    }

    let roster = load_roster();

    let slate: Vec<(String, f64, String)> = match parse_request_args()? {
        Some(request) => vec![request],
        None => DEFAULT_SLATE
            .iter()
            .map(|(player, age, pos)| (player.to_string(), *age, pos.to_string()))
            .collect(),
    };

    println!(
        "{:<22} | {:<4} | {:<4} | {:<10} | {}",
        "PLAYER", "AGE", "POS", "PREDICTION", "TEAM"
    );
    println!("{}", "-".repeat(62));

    for (player, age, position) in &slate {
        match predictor.predict(player, *age, position) {
            Ok(points) => {
                let team = roster
                    .get(player)
                    .and_then(|entry| entry.team.clone())
                    .unwrap_or_else(|| "--".to_string());
                println!("{player:<22} | {age:<4} | {position:<4} | {points:<10.2} | {team}");
            }
            // Unknown labels exclude the player from the slate, never abort it.
            Err(PredictError::UnknownPlayer(_)) | Err(PredictError::UnknownPosition(_)) => {
                println!("{player:<22} | not found in training data");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn parse_data_arg() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(v) = arg.strip_prefix("--data=") {
            if !v.trim().is_empty() {
                return Some(PathBuf::from(v));
            }
        }
        if arg == "--data"
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}

fn parse_request_args() -> Result<Option<(String, f64, String)>> {
    let player = arg_value("--player");
    let age = arg_value("--age");
    let position = arg_value("--pos");
    match (player, age, position) {
        (None, None, None) => Ok(None),
        (Some(player), Some(age), Some(position)) => {
            let age: f64 = age
                .parse()
                .with_context(|| format!("parse age {age:?}"))?;
            Ok(Some((player, age, position)))
        }
        _ => Err(anyhow!("--player, --age and --pos must be provided together")),
    }
}

fn arg_value(flag: &str) -> Option<String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(v) = arg.strip_prefix(&prefix)
            && !v.trim().is_empty()
        {
            return Some(v.to_string());
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
        {
            return Some(next.clone());
        }
    }
    None
}
