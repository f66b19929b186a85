//! Save-data shapes.
//!
//! These types are the only wire format the simulation exposes. They must
//! round-trip losslessly: resuming from a snapshot continues identically to
//! the unserialized run for the same subsequent world events.

use crate::world::{Company, Fleet, Sector, SimConfig, Spacecraft, TradeRoute};
use crate::{
    CompanyId, ResourceDescription, SectorId, SectorKnowledge, SpacecraftDescription, SpacecraftId,
    SpacecraftTypeId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Live spacecraft are plain data and serialize as-is.
pub type SpacecraftSave = Spacecraft;

/// Live sectors are plain data and serialize as-is.
pub type SectorSave = Sector;

/// One entry of a company's sector knowledge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorKnowledgeSave {
    pub sector: SectorId,
    pub knowledge: SectorKnowledge,
}

/// One entry of a company's view of another company.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReputationSave {
    pub company: CompanyId,
    pub reputation: f32,
}

/// Persisted company AI state: the construction project identifiers and
/// the four budget balances. Everything else the AI holds is ephemeral and
/// rebuilt from the world at the start of a planning pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyAISave {
    pub construction_station_description: Option<SpacecraftTypeId>,
    pub construction_sector: Option<SectorId>,
    pub construction_station: Option<SpacecraftId>,
    pub construction_ships: Vec<SpacecraftId>,
    pub construction_static_ships: Vec<SpacecraftId>,
    pub construction_need_capacity: i64,
    pub budget_technology: i64,
    pub budget_military: i64,
    pub budget_station: i64,
    pub budget_trade: i64,
}

/// Persisted company state, grouping the company's spacecraft records and
/// embedding its AI save. The player company carries no AI save.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompanySave {
    pub identifier: CompanyId,
    pub short_name: String,
    pub name: String,
    /// Index of the company description in the catalog, or -1 if player.
    pub catalog_index: i32,
    pub money: u64,
    pub hostile_companies: Vec<CompanyId>,
    pub ships: Vec<SpacecraftSave>,
    pub stations: Vec<SpacecraftSave>,
    pub fleets: Vec<Fleet>,
    pub trade_routes: Vec<TradeRoute>,
    pub fleet_immatriculation_index: i32,
    pub trade_route_immatriculation_index: i32,
    pub ship_immatriculation_index: i32,
    pub sectors_knowledge: Vec<SectorKnowledgeSave>,
    pub ai: Option<CompanyAISave>,
    pub companies_reputation: Vec<ReputationSave>,
    /// Value of all company assets at save time.
    pub company_value: i64,
}

/// A whole game snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameSave {
    pub date: NaiveDate,
    pub config: SimConfig,
    pub resources: Vec<ResourceDescription>,
    pub spacecraft_catalog: Vec<SpacecraftDescription>,
    pub sectors: Vec<SectorSave>,
    pub companies: Vec<CompanySave>,
}

impl CompanySave {
    /// Rebuild the live company record. Spacecraft are reinserted into the
    /// world separately since they live in the world-global table.
    pub fn to_company(&self) -> Company {
        Company {
            id: self.identifier.clone(),
            short_name: self.short_name.clone(),
            name: self.name.clone(),
            catalog_index: self.catalog_index,
            money: self.money,
            hostile_companies: self.hostile_companies.iter().cloned().collect(),
            reputation: self
                .companies_reputation
                .iter()
                .map(|r| (r.company.clone(), r.reputation))
                .collect(),
            sector_knowledge: self
                .sectors_knowledge
                .iter()
                .map(|k| (k.sector.clone(), k.knowledge))
                .collect(),
            fleets: self.fleets.clone(),
            trade_routes: self.trade_routes.clone(),
            fleet_immatriculation_index: self.fleet_immatriculation_index,
            trade_route_immatriculation_index: self.trade_route_immatriculation_index,
            ship_immatriculation_index: self.ship_immatriculation_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mid_construction_ai_save() -> CompanyAISave {
        CompanyAISave {
            construction_station_description: Some(SpacecraftTypeId("steelworks".into())),
            construction_sector: Some(SectorId("anchor".into())),
            construction_station: Some(SpacecraftId("AXS-004".into())),
            construction_ships: vec![SpacecraftId("AXS-002".into())],
            construction_static_ships: vec![SpacecraftId("AXS-003".into())],
            construction_need_capacity: 140,
            budget_technology: 1_000,
            budget_military: 40_000,
            budget_station: -2_500,
            budget_trade: 12_000,
        }
    }

    #[test]
    fn ai_save_roundtrip_preserves_project_and_budgets() {
        let save = mid_construction_ai_save();
        let text = serde_json::to_string(&save).unwrap();
        let back: CompanyAISave = serde_json::from_str(&text).unwrap();
        assert_eq!(back, save);
    }

    #[test]
    fn empty_ai_save_has_no_project() {
        let save = CompanyAISave::default();
        assert!(save.construction_station_description.is_none());
        assert!(save.construction_ships.is_empty());
        assert_eq!(save.construction_need_capacity, 0);
    }

    #[test]
    fn company_save_rebuilds_company() {
        let save = CompanySave {
            identifier: CompanyId("axis".into()),
            short_name: "AXS".into(),
            name: "Axis Supplies".into(),
            catalog_index: 2,
            money: 77,
            hostile_companies: vec![CompanyId("kor".into())],
            ships: vec![],
            stations: vec![],
            fleets: vec![],
            trade_routes: vec![],
            fleet_immatriculation_index: 1,
            trade_route_immatriculation_index: 2,
            ship_immatriculation_index: 3,
            sectors_knowledge: vec![SectorKnowledgeSave {
                sector: SectorId("anchor".into()),
                knowledge: SectorKnowledge::Visited,
            }],
            ai: Some(mid_construction_ai_save()),
            companies_reputation: vec![ReputationSave {
                company: CompanyId("kor".into()),
                reputation: -40.0,
            }],
            company_value: 123,
        };
        let company = save.to_company();
        assert_eq!(company.money, 77);
        assert!(company.hostile_companies.contains(&CompanyId("kor".into())));
        assert!(company.knows_sector(&SectorId("anchor".into())));
        assert_eq!(company.reputation_of(&CompanyId("kor".into())), -40.0);
    }
}
