//! The only thing we persist is the theme preference. Workout history
//! stays out of here on purpose.

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Preferences {
    pub dark_mode: bool,
}

fn prefs_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "tabata", "Tabata")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

    let data_dir = proj_dirs.data_dir();
    fs::create_dir_all(data_dir)?;

    Ok(data_dir.join("prefs.json"))
}

pub fn save(prefs: &Preferences) -> Result<()> {
    save_to(&prefs_path()?, prefs)
}

pub fn load() -> Result<Option<Preferences>> {
    load_from(&prefs_path()?)
}

fn save_to(path: &Path, prefs: &Preferences) -> Result<()> {
    let json = serde_json::to_string_pretty(prefs)?;
    fs::write(path, json)?;
    Ok(())
}

fn load_from(path: &Path) -> Result<Option<Preferences>> {
    if !path.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(path)?;
    let prefs: Preferences = serde_json::from_str(&json)?;
    Ok(Some(prefs))
}

/// Fallback when no preference has been saved yet: the COLORFGBG
/// convention set by several terminals ("fg;bg", sometimes
/// "fg;default;bg"). An unreadable or missing value counts as dark,
/// the common terminal default.
pub fn system_prefers_dark() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|v| parse_colorfgbg(&v))
        .unwrap_or(true)
}

fn parse_colorfgbg(value: &str) -> Option<bool> {
    let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    Some(bg < 7 || bg == 8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        assert!(load_from(&path).unwrap().is_none());

        save_to(&path, &Preferences { dark_mode: false }).unwrap();
        let prefs = load_from(&path).unwrap().unwrap();
        assert!(!prefs.dark_mode);

        save_to(&path, &Preferences { dark_mode: true }).unwrap();
        assert!(load_from(&path).unwrap().unwrap().dark_mode);
    }

    #[test]
    fn test_parse_colorfgbg() {
        assert_eq!(parse_colorfgbg("15;0"), Some(true));
        assert_eq!(parse_colorfgbg("0;15"), Some(false));
        assert_eq!(parse_colorfgbg("12;default;0"), Some(true));
        assert_eq!(parse_colorfgbg(""), None);
        assert_eq!(parse_colorfgbg("garbage"), None);
    }
}
