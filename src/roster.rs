use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dataset::normalize_player_name;

/// Display attributes for one player, from the optional roster file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub headshot_url: Option<String>,
}

/// Lookup keyed by normalized player name. Purely presentational enrichment:
/// the model never consults it, and an absent or unparsable roster file just
/// yields an empty lookup.
#[derive(Debug, Clone, Default)]
pub struct RosterLookup {
    by_name: HashMap<String, RosterEntry>,
}

impl RosterLookup {
    pub fn from_entries(entries: Vec<RosterEntry>) -> Self {
        let mut by_name = HashMap::with_capacity(entries.len());
        for entry in entries {
            by_name.insert(normalize_player_name(&entry.player), entry);
        }
        Self { by_name }
    }

    pub fn get(&self, player_name: &str) -> Option<&RosterEntry> {
        self.by_name.get(&normalize_player_name(player_name))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

pub fn load_roster() -> RosterLookup {
    let path = roster_path_override().unwrap_or_else(|| PathBuf::from("assets/rosters.json"));
    let Ok(raw) = fs::read_to_string(&path) else {
        return RosterLookup::default();
    };
    match serde_json::from_str::<Vec<RosterEntry>>(&raw) {
        Ok(entries) => RosterLookup::from_entries(entries),
        Err(_) => RosterLookup::default(),
    }
}

fn roster_path_override() -> Option<PathBuf> {
    env::var("ROSTER_PATH").ok().map(|s| PathBuf::from(s.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(player: &str, team: &str) -> RosterEntry {
        RosterEntry {
            player: player.to_string(),
            team: Some(team.to_string()),
            headshot_url: None,
        }
    }

    #[test]
    fn lookup_normalizes_names() {
        let roster = RosterLookup::from_entries(vec![entry("Justin Jefferson", "MIN")]);
        let hit = roster.get("Justin Jefferson*").expect("starred name matches");
        assert_eq!(hit.team.as_deref(), Some("MIN"));
    }

    #[test]
    fn unknown_player_is_none() {
        let roster = RosterLookup::from_entries(vec![entry("A", "KC")]);
        assert!(roster.get("B").is_none());
    }

    #[test]
    fn roster_json_parses() {
        let raw = r#"[{"player": "CeeDee Lamb", "team": "DAL", "headshot_url": null}]"#;
        let entries: Vec<RosterEntry> = serde_json::from_str(raw).expect("valid roster json");
        let roster = RosterLookup::from_entries(entries);
        assert_eq!(roster.len(), 1);
        assert!(roster.get("CeeDee Lamb+").is_some());
    }
}
