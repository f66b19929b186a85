//! Numeric behavior profile of a company AI.
//!
//! Affinities bias the construction scorer and the allocator; the
//! diplomatic knobs drive hostility declarations. Profiles are regenerated
//! deterministically from the company's catalog archetype, never persisted.

use sim_core::{Budget, CompanyId, ResourceId, SectorId, World};
use std::collections::BTreeMap;
use tracing::info;

/// Reputation below which an aggressive company declares war.
const WAR_THRESHOLD: f32 = -40.0;

/// Reputation above which a peaceful company sues for peace.
const PEACE_THRESHOLD: f32 = -10.0;

#[derive(Clone, Debug)]
pub struct AiBehavior {
    pub budget_technology_weight: f32,
    pub budget_military_weight: f32,
    pub budget_station_weight: f32,
    pub budget_trade_weight: f32,
    /// Station scoring bonus for shipyard designs.
    pub shipyard_affinity: f32,
    /// Station scoring bonus for consumer-goods production.
    pub consumer_affinity: f32,
    /// Station scoring bonus for maintenance-goods production.
    pub maintenance_affinity: f32,
    /// Target army strength relative to company value.
    pub army_size: f32,
    /// Strength ratio required before committing to an offensive.
    pub confidence_target: f32,
    pub aggressivity: f32,
    pub bold: f32,
    pub peaceful: f32,
    pub diplomatic_reactivity: f32,
    /// Raider profile: no station building, offensive military posture.
    pub is_pirate: bool,
    resource_affinities: BTreeMap<ResourceId, f32>,
    sector_affinities: BTreeMap<SectorId, f32>,
}

impl Default for AiBehavior {
    fn default() -> Self {
        Self {
            budget_technology_weight: 0.1,
            budget_military_weight: 0.3,
            budget_station_weight: 0.3,
            budget_trade_weight: 0.3,
            shipyard_affinity: 1.0,
            consumer_affinity: 1.0,
            maintenance_affinity: 1.0,
            army_size: 0.2,
            confidence_target: 1.2,
            aggressivity: 0.5,
            bold: 0.5,
            peaceful: 0.5,
            diplomatic_reactivity: 0.5,
            is_pirate: false,
            resource_affinities: BTreeMap::new(),
            sector_affinities: BTreeMap::new(),
        }
    }
}

impl AiBehavior {
    pub fn budget_weight(&self, category: Budget) -> f32 {
        match category {
            Budget::Technology => self.budget_technology_weight,
            Budget::Military => self.budget_military_weight,
            Budget::Station => self.budget_station_weight,
            Budget::Trade => self.budget_trade_weight,
        }
    }

    pub fn resource_affinity(&self, resource: &ResourceId) -> f32 {
        self.resource_affinities.get(resource).copied().unwrap_or(1.0)
    }

    pub fn sector_affinity(&self, sector: &SectorId) -> f32 {
        self.sector_affinities.get(sector).copied().unwrap_or(1.0)
    }

    pub fn set_resource_affinity(&mut self, resource: ResourceId, value: f32) {
        self.resource_affinities.insert(resource, value);
    }

    pub fn set_sector_affinity(&mut self, sector: SectorId, value: f32) {
        self.sector_affinities.insert(sector, value);
    }

    /// Set every known resource affinity to `value`.
    pub fn set_resource_affinities(&mut self, world: &World, value: f32) {
        for resource in &world.resources {
            self.resource_affinities.insert(resource.id.clone(), value);
        }
    }

    /// Set every known sector affinity to `value`.
    pub fn set_sector_affinities(&mut self, world: &World, value: f32) {
        for sector in &world.sectors {
            self.sector_affinities.insert(sector.id.clone(), value);
        }
    }

    /// Seed the profile from the company's catalog archetype. The mapping
    /// is deterministic so save/load reproduces identical behavior.
    pub fn generate_affinities(&mut self, world: &World, company_id: &CompanyId) {
        let Some(company) = world.company(company_id) else {
            return;
        };
        self.set_resource_affinities(world, 1.0);
        self.set_sector_affinities(world, 1.0);
        // Home turf: sectors where the company already holds assets.
        for craft in world.company_spacecrafts(company_id) {
            self.set_sector_affinity(craft.sector.clone(), 1.5);
        }
        match company.catalog_index.rem_euclid(4) {
            // Freight specialist: trade-heavy, timid.
            0 => {
                self.budget_trade_weight = 0.5;
                self.budget_station_weight = 0.2;
                self.budget_military_weight = 0.2;
                self.army_size = 0.1;
                self.aggressivity = 0.2;
                self.peaceful = 0.8;
            }
            // Industrialist: builds aggressively, favors producers.
            1 => {
                self.budget_station_weight = 0.5;
                self.budget_trade_weight = 0.25;
                self.budget_military_weight = 0.15;
                self.consumer_affinity = 1.4;
                self.shipyard_affinity = 1.3;
                self.bold = 0.7;
            }
            // Militarist: strong navy, quick to declare.
            2 => {
                self.budget_military_weight = 0.5;
                self.budget_station_weight = 0.2;
                self.budget_trade_weight = 0.2;
                self.army_size = 0.4;
                self.aggressivity = 0.8;
                self.peaceful = 0.2;
                self.maintenance_affinity = 1.4;
                self.confidence_target = 1.0;
            }
            // Pirate: raids, never builds.
            _ => {
                self.is_pirate = true;
                self.budget_military_weight = 0.6;
                self.budget_trade_weight = 0.3;
                self.budget_station_weight = 0.0;
                self.army_size = 0.5;
                self.aggressivity = 1.0;
                self.peaceful = 0.0;
                self.bold = 1.0;
                self.confidence_target = 0.8;
            }
        }
    }

    /// Declare or retract hostilities from current reputations.
    ///
    /// Thresholds scale with the diplomatic knobs: aggressive companies
    /// declare early, peaceful ones forgive early. Reputation itself
    /// drifts in the world tick, not here.
    pub fn update_diplomacy(&self, world: &mut World, company_id: &CompanyId) {
        let others: Vec<CompanyId> = world
            .companies
            .iter()
            .filter(|c| &c.id != company_id)
            .map(|c| c.id.clone())
            .collect();
        for other in others {
            let Some(company) = world.company(company_id) else {
                return;
            };
            let reputation = company.reputation_of(&other);
            let war_line = WAR_THRESHOLD * (1.5 - self.aggressivity) / self.diplomatic_reactivity.max(0.1);
            let peace_line = PEACE_THRESHOLD * (1.0 - self.peaceful);
            let at_war = company.hostile_companies.contains(&other);
            if !at_war && reputation < war_line {
                info!(company = %company_id.0, against = %other.0, reputation, "declaring hostilities");
                if let Some(company) = world.company_mut(company_id) {
                    company.hostile_companies.insert(other.clone());
                }
            } else if at_war && reputation > peace_line && self.peaceful > 0.0 {
                info!(company = %company_id.0, with = %other.0, reputation, "standing down");
                if let Some(company) = world.company_mut(company_id) {
                    company.hostile_companies.remove(&other);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_affinity_is_neutral() {
        let behavior = AiBehavior::default();
        assert_eq!(behavior.resource_affinity(&ResourceId("ore".into())), 1.0);
        assert_eq!(behavior.sector_affinity(&SectorId("rim".into())), 1.0);
    }

    #[test]
    fn affinity_overrides_apply() {
        let mut behavior = AiBehavior::default();
        behavior.set_resource_affinity(ResourceId("ore".into()), 2.0);
        assert_eq!(behavior.resource_affinity(&ResourceId("ore".into())), 2.0);
    }

    #[test]
    fn budget_weights_cover_all_categories() {
        let behavior = AiBehavior::default();
        for category in Budget::ALL {
            assert!(behavior.budget_weight(category) >= 0.0);
        }
    }
}
