#![deny(warnings)]

//! Persistence layer: game snapshots on disk.
//!
//! Saves are plain [`GameSave`] values, written as JSON when the path ends
//! in `.json` (human-inspectable) and as bincode otherwise (compact).
//! Both round-trip losslessly.

use sim_core::GameSave;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors raised while reading or writing save files.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}

fn is_json(path: &Path) -> bool {
    path.extension().map(|e| e == "json").unwrap_or(false)
}

/// Write a snapshot to `path`, format chosen by extension.
pub fn save_game<P: AsRef<Path>>(save: &GameSave, path: P) -> Result<(), PersistError> {
    let path = path.as_ref();
    if is_json(path) {
        fs::write(path, serde_json::to_vec_pretty(save)?)?;
    } else {
        fs::write(path, bincode::serialize(save)?)?;
    }
    info!(path = %path.display(), "game saved");
    Ok(())
}

/// Read a snapshot from `path`, format chosen by extension.
pub fn load_game<P: AsRef<Path>>(path: P) -> Result<GameSave, PersistError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let save = if is_json(path) {
        serde_json::from_slice(&bytes)?
    } else {
        bincode::deserialize(&bytes)?
    };
    info!(path = %path.display(), "game loaded");
    Ok(save)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sim_core::{CompanyAISave, CompanySave, SimConfig, SpacecraftTypeId};

    fn sample_save() -> GameSave {
        GameSave {
            date: NaiveDate::from_ymd_opt(2547, 3, 14).unwrap(),
            config: SimConfig { rng_seed: 99 },
            resources: vec![],
            spacecraft_catalog: vec![],
            sectors: vec![],
            companies: vec![CompanySave {
                identifier: sim_core::CompanyId("axis".into()),
                short_name: "AXS".into(),
                name: "Axis Supplies".into(),
                catalog_index: 0,
                money: 123_456,
                hostile_companies: vec![],
                ships: vec![],
                stations: vec![],
                fleets: vec![],
                trade_routes: vec![],
                fleet_immatriculation_index: 0,
                trade_route_immatriculation_index: 0,
                ship_immatriculation_index: 4,
                sectors_knowledge: vec![],
                ai: Some(CompanyAISave {
                    construction_station_description: Some(SpacecraftTypeId("steelworks".into())),
                    construction_need_capacity: 40,
                    budget_trade: 9_000,
                    ..Default::default()
                }),
                companies_reputation: vec![],
                company_value: 200_000,
            }],
        }
    }

    fn roundtrip(extension: &str) {
        let save = sample_save();
        let mut path = std::env::temp_dir();
        path.push(format!("voidtrade-test-{}.{extension}", std::process::id()));
        save_game(&save, &path).unwrap();
        let back = load_game(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(
            serde_json::to_string(&back).unwrap(),
            serde_json::to_string(&save).unwrap()
        );
        let ai = back.companies[0].ai.as_ref().unwrap();
        assert_eq!(ai.construction_need_capacity, 40);
        assert_eq!(ai.budget_trade, 9_000);
    }

    #[test]
    fn json_roundtrip_is_lossless() {
        roundtrip("json");
    }

    #[test]
    fn bincode_roundtrip_is_lossless() {
        roundtrip("bin");
    }
}
