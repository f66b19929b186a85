//! Built-in scenario: a small four-sector cluster with a freight
//! specialist, an industrialist, a pirate band and a player company.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sim_core::{
    Company, CompanyId, FactoryDescription, ResourceDescription, ResourceId, ResourceQuantity,
    Sector, SectorId, SectorKnowledge, SimConfig, SpacecraftDescription, SpacecraftTypeId, World,
};
use std::collections::{BTreeMap, BTreeSet};

fn resource(
    id: &str,
    name: &str,
    min: i64,
    max: i64,
    fee: i64,
    consumer: bool,
    maintenance: bool,
) -> ResourceDescription {
    ResourceDescription {
        id: ResourceId(id.to_string()),
        name: name.to_string(),
        min_price: Decimal::new(min, 0),
        max_price: Decimal::new(max, 0),
        transport_fee: Decimal::new(fee, 0),
        is_consumer: consumer,
        is_maintenance: maintenance,
    }
}

fn rq(resource: &str, quantity: i64) -> ResourceQuantity {
    ResourceQuantity {
        resource: ResourceId(resource.to_string()),
        quantity,
    }
}

fn factory(id: &str, inputs: Vec<ResourceQuantity>, outputs: Vec<ResourceQuantity>) -> FactoryDescription {
    FactoryDescription {
        identifier: id.to_string(),
        cycle_inputs: inputs,
        cycle_outputs: outputs,
        cycle_days: 10,
    }
}

fn ship(id: &str, name: &str, cargo: i64, combat: i32, price: i64, build_days: u32) -> SpacecraftDescription {
    SpacecraftDescription {
        id: SpacecraftTypeId(id.to_string()),
        name: name.to_string(),
        is_station: false,
        is_military: combat > 0,
        is_shipyard: false,
        cargo_capacity: cargo,
        combat_points: combat,
        price,
        construction_resources: vec![],
        factories: vec![],
        build_days,
    }
}

fn station(
    id: &str,
    name: &str,
    price: i64,
    steel_cost: i64,
    factories: Vec<FactoryDescription>,
    is_shipyard: bool,
) -> SpacecraftDescription {
    SpacecraftDescription {
        id: SpacecraftTypeId(id.to_string()),
        name: name.to_string(),
        is_station: true,
        is_military: false,
        is_shipyard,
        cargo_capacity: 600,
        combat_points: 0,
        price,
        construction_resources: vec![rq("steel", steel_cost)],
        factories,
        build_days: 0,
    }
}

fn sector(id: &str, name: &str, orbit: u32, population: u32) -> Sector {
    Sector {
        id: SectorId(id.to_string()),
        name: name.to_string(),
        orbit,
        population,
        prices: BTreeMap::new(),
        storage: BTreeMap::new(),
        storage_capacity: 2_000,
    }
}

fn company(id: &str, short: &str, name: &str, index: i32, money: u64, sectors: &[&str]) -> Company {
    Company {
        id: CompanyId(id.to_string()),
        short_name: short.to_string(),
        name: name.to_string(),
        catalog_index: index,
        money,
        hostile_companies: BTreeSet::new(),
        reputation: BTreeMap::new(),
        sector_knowledge: sectors
            .iter()
            .map(|s| (SectorId(s.to_string()), SectorKnowledge::Visited))
            .collect(),
        fleets: vec![],
        trade_routes: vec![],
        fleet_immatriculation_index: 0,
        trade_route_immatriculation_index: 0,
        ship_immatriculation_index: 0,
    }
}

/// The default cluster. Deterministic for a given seed.
pub fn default_scenario(seed: u64) -> World {
    let all_sectors = ["anchor", "forge", "haven", "rim"];
    let mut world = World {
        date: NaiveDate::from_ymd_opt(2547, 3, 1).unwrap_or_default(),
        config: SimConfig { rng_seed: seed },
        resources: vec![
            resource("food", "Food", 8, 30, 1, true, false),
            resource("ore", "Ore", 15, 40, 1, false, false),
            resource("steel", "Steel", 20, 60, 1, false, false),
            resource("components", "Components", 40, 120, 2, false, false),
            resource("fleet-supply", "Fleet supply", 30, 90, 2, false, true),
        ],
        spacecraft_catalog: vec![
            ship("light-freighter", "Light freighter", 100, 0, 50_000, 8),
            ship("heavy-freighter", "Heavy freighter", 250, 0, 90_000, 12),
            ship("corvette", "Corvette", 10, 40, 60_000, 6),
            ship("frigate", "Frigate", 20, 120, 150_000, 12),
            station(
                "agri-dome",
                "Agricultural dome",
                90_000,
                60,
                vec![factory("hydroponics", vec![], vec![rq("food", 80)])],
                false,
            ),
            station(
                "ore-mine",
                "Ore mine",
                200_000,
                120,
                vec![factory("mine-shaft", vec![], vec![rq("ore", 100)])],
                false,
            ),
            station(
                "steelworks",
                "Steelworks",
                120_000,
                80,
                vec![factory("smelter", vec![rq("ore", 100)], vec![rq("steel", 50)])],
                false,
            ),
            station(
                "parts-factory",
                "Parts factory",
                160_000,
                100,
                vec![factory(
                    "assembly-line",
                    vec![rq("steel", 40)],
                    vec![rq("components", 20)],
                )],
                false,
            ),
            station(
                "supply-depot",
                "Supply depot",
                140_000,
                90,
                vec![factory(
                    "refit-bay",
                    vec![rq("components", 10)],
                    vec![rq("fleet-supply", 20)],
                )],
                false,
            ),
            station("shipyard", "Shipyard", 300_000, 150, vec![], true),
        ],
        sectors: vec![
            sector("anchor", "Anchor", 1, 2_500),
            sector("forge", "The Forge", 2, 1_200),
            sector("haven", "Haven", 3, 2_000),
            sector("rim", "Outer Rim", 5, 400),
        ],
        companies: vec![
            company("stellar-nomads", "STN", "Stellar Nomads", -1, 100_000, &all_sectors),
            company("axis-supplies", "AXS", "Axis Supplies", 0, 150_000, &all_sectors),
            company("koro-works", "KOR", "Koro Works", 1, 250_000, &all_sectors),
            company("crimson-vultures", "CRV", "Crimson Vultures", 3, 80_000, &all_sectors),
        ],
        spacecrafts: BTreeMap::new(),
    };
    // Everyone despises the pirates from the start.
    let pirate = CompanyId("crimson-vultures".to_string());
    let others: Vec<CompanyId> = world
        .companies
        .iter()
        .filter(|c| c.id != pirate)
        .map(|c| c.id.clone())
        .collect();
    for id in &others {
        if let Some(company) = world.company_mut(id) {
            company.reputation.insert(pirate.clone(), -60.0);
        }
        if let Some(company) = world.company_mut(&pirate) {
            company.reputation.insert(id.clone(), -60.0);
        }
    }
    // Seed stock so early trade runs have something to move.
    let stock = [
        ("anchor", "food", 600),
        ("anchor", "steel", 150),
        ("forge", "ore", 600),
        ("haven", "steel", 200),
        ("haven", "food", 200),
        ("rim", "fleet-supply", 120),
        ("rim", "food", 80),
    ];
    for (sector_id, resource_id, quantity) in stock {
        if let Some(sector) = world.sector_mut(&SectorId(sector_id.to_string())) {
            sector.store(&ResourceId(resource_id.to_string()), quantity);
        }
    }
    // Starting assets.
    let fleet = [
        ("stellar-nomads", "light-freighter", "anchor"),
        ("axis-supplies", "light-freighter", "anchor"),
        ("axis-supplies", "light-freighter", "anchor"),
        ("axis-supplies", "agri-dome", "anchor"),
        ("koro-works", "ore-mine", "forge"),
        ("koro-works", "steelworks", "forge"),
        ("koro-works", "shipyard", "haven"),
        ("koro-works", "heavy-freighter", "forge"),
        ("crimson-vultures", "corvette", "rim"),
        ("crimson-vultures", "corvette", "rim"),
    ];
    for (company_id, design_id, sector_id) in fleet {
        // The scenario is static data; a failure here is a bug in the
        // tables above, caught by the validation test below.
        let _ = world.create_spacecraft(
            &CompanyId(company_id.to_string()),
            &SpacecraftTypeId(design_id.to_string()),
            &SectorId(sector_id.to_string()),
        );
    }
    world
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::validate_catalogs;

    #[test]
    fn scenario_catalogs_validate() {
        let world = default_scenario(42);
        validate_catalogs(&world.resources, &world.spacecraft_catalog).unwrap();
    }

    #[test]
    fn scenario_assets_exist() {
        let world = default_scenario(42);
        assert_eq!(world.companies.len(), 4);
        assert_eq!(world.sectors.len(), 4);
        assert_eq!(world.spacecrafts.len(), 10);
        let pirates = CompanyId("crimson-vultures".to_string());
        assert_eq!(world.company_spacecrafts(&pirates).count(), 2);
    }

    #[test]
    fn scenario_is_deterministic() {
        let a = serde_json::to_string(&default_scenario(7)).unwrap();
        let b = serde_json::to_string(&default_scenario(7)).unwrap();
        assert_eq!(a, b);
    }
}
