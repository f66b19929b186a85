//! Live world state: sectors, spacecraft, companies and the mutation
//! commands the simulation and the company AIs drive them with.
//!
//! The world is strictly turn-based shared state. Every mutation is
//! synchronous and deterministic; iteration orders are stable (BTreeMap,
//! fixed company vector) so simulation outcomes are reproducible.

use crate::{
    CompanyId, ResourceId, SectorId, SectorKnowledge, SpacecraftDescription, SpacecraftId,
    SpacecraftTypeId,
};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

/// Simulation configuration parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    /// Seed for deterministic price noise.
    pub rng_seed: u64,
}

/// A discrete world location containing spacecraft, factories and storage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sector {
    pub id: SectorId,
    pub name: String,
    /// Abstract orbital distance; travel time between two sectors is
    /// `1 + |orbit_a - orbit_b|` days.
    pub orbit: u32,
    /// Inhabitants consuming consumer resources daily.
    pub population: u32,
    /// Current unit price level per resource, drifting inside the
    /// resource's price band.
    pub prices: BTreeMap<ResourceId, Decimal>,
    /// Public storage stock per resource.
    pub storage: BTreeMap<ResourceId, i64>,
    /// Public storage ceiling, per resource.
    pub storage_capacity: i64,
}

impl Sector {
    pub fn storage_stock(&self, resource: &ResourceId) -> i64 {
        self.storage.get(resource).copied().unwrap_or(0)
    }

    pub fn storage_space(&self, resource: &ResourceId) -> i64 {
        (self.storage_capacity - self.storage_stock(resource)).max(0)
    }

    /// Add up to `quantity` units to public storage, returns the amount
    /// actually stored.
    pub fn store(&mut self, resource: &ResourceId, quantity: i64) -> i64 {
        let stored = quantity.min(self.storage_space(resource)).max(0);
        if stored > 0 {
            *self.storage.entry(resource.clone()).or_insert(0) += stored;
        }
        stored
    }

    /// Remove up to `quantity` units from public storage, returns the
    /// amount actually removed.
    pub fn unstore(&mut self, resource: &ResourceId, quantity: i64) -> i64 {
        let stock = self.storage_stock(resource);
        let taken = quantity.min(stock).max(0);
        if taken > 0 {
            *self.storage.entry(resource.clone()).or_insert(0) -= taken;
        }
        taken
    }
}

/// A committed resource haul from one sector to another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOrder {
    pub origin: SectorId,
    pub destination: SectorId,
    pub resource: ResourceId,
    pub quantity: i64,
    /// Cargo has been purchased and loaded at the origin.
    pub loaded: bool,
    pub days_remaining: u32,
}

/// A resource ferry leg toward a station under construction.
///
/// The ship first repositions to `source` if needed, purchases there, then
/// hauls to `destination` and pays its load into the station's debt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionOrder {
    pub target_station: SpacecraftId,
    pub source: SectorId,
    pub destination: SectorId,
    pub resource: ResourceId,
    pub quantity: i64,
    pub loaded: bool,
    pub days_remaining: u32,
}

/// What a spacecraft is currently committed to.
///
/// A ship is in exactly one variant at a time, which structurally enforces
/// the reservation partition: idle pool, construction reservation or trade
/// commitment, never two at once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assignment {
    Idle,
    Trade(TradeOrder),
    /// Reserved by its company's construction project. `None` means the
    /// ship is held at the build site without an active ferry leg.
    Construction(Option<ConstructionOrder>),
    /// Military posting toward a sector.
    Defense {
        sector: SectorId,
        days_remaining: u32,
    },
}

impl Assignment {
    pub fn is_idle(&self) -> bool {
        matches!(self, Assignment::Idle)
    }

    pub fn is_construction(&self) -> bool {
        matches!(self, Assignment::Construction(_))
    }
}

/// Per-factory runtime state, parallel to the design's factory list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryState {
    /// Days accumulated toward the current cycle.
    pub progress_days: u32,
}

/// A pending hull order in a shipyard queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipyardOrder {
    pub company: CompanyId,
    pub design: SpacecraftTypeId,
    pub days_remaining: u32,
}

/// A live spacecraft: mobile ship or anchored station.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Spacecraft {
    pub id: SpacecraftId,
    pub description: SpacecraftTypeId,
    pub company: CompanyId,
    pub sector: SectorId,
    /// Build level; factories run `level` parallel cycles.
    pub level: u32,
    /// 1.0 pristine, 0.0 destroyed.
    pub health: f32,
    pub cargo: BTreeMap<ResourceId, i64>,
    pub factories: Vec<FactoryState>,
    /// Resources still to deliver before the station (or its next level)
    /// becomes operational. `None` once complete.
    pub under_construction: Option<BTreeMap<ResourceId, i64>>,
    pub shipyard_queue: Vec<ShipyardOrder>,
    pub assignment: Assignment,
}

impl Spacecraft {
    pub fn cargo_used(&self) -> i64 {
        self.cargo.values().sum()
    }

    pub fn cargo_quantity(&self, resource: &ResourceId) -> i64 {
        self.cargo.get(resource).copied().unwrap_or(0)
    }

    /// Add up to `quantity` units bounded by `capacity`, returns the
    /// amount actually loaded.
    pub fn load_cargo(&mut self, resource: &ResourceId, quantity: i64, capacity: i64) -> i64 {
        let free = (capacity - self.cargo_used()).max(0);
        let loaded = quantity.min(free).max(0);
        if loaded > 0 {
            *self.cargo.entry(resource.clone()).or_insert(0) += loaded;
        }
        loaded
    }

    /// Remove up to `quantity` units, returns the amount actually removed.
    pub fn unload_cargo(&mut self, resource: &ResourceId, quantity: i64) -> i64 {
        let held = self.cargo_quantity(resource);
        let unloaded = quantity.min(held).max(0);
        if unloaded > 0 {
            let slot = self.cargo.entry(resource.clone()).or_insert(0);
            *slot -= unloaded;
            if *slot == 0 {
                self.cargo.remove(resource);
            }
        }
        unloaded
    }

    /// Operational means finished building and not crippled.
    pub fn is_operational(&self) -> bool {
        self.under_construction.is_none() && self.health > 0.0
    }

    /// Total construction resource units still missing.
    pub fn missing_construction_quantity(&self) -> i64 {
        self.under_construction
            .as_ref()
            .map(|m| m.values().sum())
            .unwrap_or(0)
    }
}

/// A named group of ships.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fleet {
    pub name: String,
    pub ships: Vec<SpacecraftId>,
}

/// A standing route definition between sectors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRoute {
    pub name: String,
    pub sectors: Vec<SectorId>,
    pub resource: Option<ResourceId>,
}

/// An economic and military faction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    /// Short immatriculation prefix, e.g. "AXS".
    pub short_name: String,
    pub name: String,
    /// Index of the company description in the catalog, or -1 for the
    /// player company (which runs without an AI).
    pub catalog_index: i32,
    pub money: u64,
    pub hostile_companies: BTreeSet<CompanyId>,
    pub reputation: BTreeMap<CompanyId, f32>,
    pub sector_knowledge: BTreeMap<SectorId, SectorKnowledge>,
    pub fleets: Vec<Fleet>,
    pub trade_routes: Vec<TradeRoute>,
    pub fleet_immatriculation_index: i32,
    pub trade_route_immatriculation_index: i32,
    pub ship_immatriculation_index: i32,
}

impl Company {
    /// Take money, guarded: returns false and leaves the balance untouched
    /// when the amount exceeds it.
    pub fn take_money(&mut self, amount: u64) -> bool {
        if amount > self.money {
            return false;
        }
        self.money -= amount;
        true
    }

    pub fn give_money(&mut self, amount: u64) {
        self.money = self.money.saturating_add(amount);
    }

    pub fn knows_sector(&self, sector: &SectorId) -> bool {
        matches!(
            self.sector_knowledge.get(sector),
            Some(SectorKnowledge::Known) | Some(SectorKnowledge::Visited)
        )
    }

    pub fn reputation_of(&self, other: &CompanyId) -> f32 {
        self.reputation.get(other).copied().unwrap_or(0.0)
    }
}

/// Errors raised by world mutation commands.
#[derive(Debug, Error, PartialEq)]
pub enum WorldError {
    #[error("unknown sector: {0}")]
    UnknownSector(String),
    #[error("unknown company: {0}")]
    UnknownCompany(String),
    #[error("unknown spacecraft: {0}")]
    UnknownSpacecraft(String),
    #[error("unknown design: {0}")]
    UnknownDesign(String),
    #[error("design {0} is not a station")]
    NotAStation(String),
    #[error("station {0} is not a shipyard")]
    NotAShipyard(String),
    #[error("company {0} cannot afford {1} credits")]
    InsufficientFunds(String, u64),
}

/// Top-level world state: catalogs, sectors, companies and spacecraft.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct World {
    pub date: NaiveDate,
    pub config: SimConfig,
    pub resources: Vec<crate::ResourceDescription>,
    pub spacecraft_catalog: Vec<SpacecraftDescription>,
    pub sectors: Vec<Sector>,
    /// Fixed turn order: companies are processed in this order every day.
    pub companies: Vec<Company>,
    pub spacecrafts: BTreeMap<SpacecraftId, Spacecraft>,
}

impl World {
    pub fn resource(&self, id: &ResourceId) -> Option<&crate::ResourceDescription> {
        self.resources.iter().find(|r| &r.id == id)
    }

    pub fn description(&self, id: &SpacecraftTypeId) -> Option<&SpacecraftDescription> {
        self.spacecraft_catalog.iter().find(|d| &d.id == id)
    }

    pub fn sector(&self, id: &SectorId) -> Option<&Sector> {
        self.sectors.iter().find(|s| &s.id == id)
    }

    pub fn sector_mut(&mut self, id: &SectorId) -> Option<&mut Sector> {
        self.sectors.iter_mut().find(|s| &s.id == id)
    }

    pub fn company(&self, id: &CompanyId) -> Option<&Company> {
        self.companies.iter().find(|c| &c.id == id)
    }

    pub fn company_mut(&mut self, id: &CompanyId) -> Option<&mut Company> {
        self.companies.iter_mut().find(|c| &c.id == id)
    }

    pub fn spacecraft(&self, id: &SpacecraftId) -> Option<&Spacecraft> {
        self.spacecrafts.get(id)
    }

    pub fn spacecraft_mut(&mut self, id: &SpacecraftId) -> Option<&mut Spacecraft> {
        self.spacecrafts.get_mut(id)
    }

    /// Cargo capacity of a live spacecraft, from its design.
    pub fn cargo_capacity_of(&self, craft: &Spacecraft) -> i64 {
        self.description(&craft.description)
            .map(|d| d.cargo_capacity)
            .unwrap_or(0)
    }

    /// Spacecraft physically present in a sector, in stable id order.
    pub fn sector_spacecrafts(&self, sector: &SectorId) -> impl Iterator<Item = &Spacecraft> {
        let sector = sector.clone();
        self.spacecrafts.values().filter(move |s| s.sector == sector)
    }

    /// All spacecraft owned by a company, in stable id order.
    pub fn company_spacecrafts(&self, company: &CompanyId) -> impl Iterator<Item = &Spacecraft> {
        let company = company.clone();
        self.spacecrafts
            .values()
            .filter(move |s| s.company == company)
    }

    /// Sectors a company can plan over, in world order.
    pub fn known_sectors(&self, company: &CompanyId) -> Vec<&Sector> {
        let Some(company) = self.company(company) else {
            return vec![];
        };
        self.sectors
            .iter()
            .filter(|s| company.knows_sector(&s.id))
            .collect()
    }

    /// Travel duration between two sectors in days; zero within a sector.
    pub fn travel_days(&self, from: &SectorId, to: &SectorId) -> u32 {
        if from == to {
            return 0;
        }
        let orbit = |id: &SectorId| self.sector(id).map(|s| s.orbit).unwrap_or(0);
        1 + orbit(from).abs_diff(orbit(to))
    }

    /// Stance of `company` toward `other`.
    pub fn hostility(&self, company: &CompanyId, other: &CompanyId) -> crate::Hostility {
        if company == other {
            return crate::Hostility::Owned;
        }
        let (Some(a), Some(b)) = (self.company(company), self.company(other)) else {
            return crate::Hostility::Neutral;
        };
        if a.hostile_companies.contains(other) || b.hostile_companies.contains(company) {
            return crate::Hostility::Hostile;
        }
        if a.reputation_of(other) > 25.0 {
            return crate::Hostility::Friendly;
        }
        crate::Hostility::Neutral
    }

    /// Spawn a ship of `design` owned by `company` in `sector`.
    pub fn create_spacecraft(
        &mut self,
        company_id: &CompanyId,
        design_id: &SpacecraftTypeId,
        sector_id: &SectorId,
    ) -> Result<SpacecraftId, WorldError> {
        let design = self
            .description(design_id)
            .ok_or_else(|| WorldError::UnknownDesign(design_id.0.clone()))?;
        let factories = vec![FactoryState::default(); design.factories.len()];
        if self.sector(sector_id).is_none() {
            return Err(WorldError::UnknownSector(sector_id.0.clone()));
        }
        let company = self
            .company_mut(company_id)
            .ok_or_else(|| WorldError::UnknownCompany(company_id.0.clone()))?;
        company.ship_immatriculation_index += 1;
        let id = SpacecraftId(format!(
            "{}-{:03}",
            company.short_name, company.ship_immatriculation_index
        ));
        debug!(id = %id.0, design = %design_id.0, sector = %sector_id.0, "spacecraft created");
        let craft = Spacecraft {
            id: id.clone(),
            description: design_id.clone(),
            company: company_id.clone(),
            sector: sector_id.clone(),
            level: 1,
            health: 1.0,
            cargo: BTreeMap::new(),
            factories,
            under_construction: None,
            shipyard_queue: vec![],
            assignment: Assignment::Idle,
        };
        self.spacecrafts.insert(id.clone(), craft);
        Ok(id)
    }

    /// Remove a spacecraft from the world, returning it.
    pub fn destroy_spacecraft(&mut self, id: &SpacecraftId) -> Option<Spacecraft> {
        self.spacecrafts.remove(id)
    }

    /// Start building a station: takes the design price from the company
    /// and spawns the hull with its full construction resource debt.
    pub fn begin_station_construction(
        &mut self,
        company_id: &CompanyId,
        design_id: &SpacecraftTypeId,
        sector_id: &SectorId,
    ) -> Result<SpacecraftId, WorldError> {
        let design = self
            .description(design_id)
            .ok_or_else(|| WorldError::UnknownDesign(design_id.0.clone()))?;
        if !design.is_station {
            return Err(WorldError::NotAStation(design_id.0.clone()));
        }
        let price = design.price as u64;
        let missing: BTreeMap<ResourceId, i64> = design
            .construction_resources
            .iter()
            .map(|rq| (rq.resource.clone(), rq.quantity))
            .collect();
        {
            let company = self
                .company_mut(company_id)
                .ok_or_else(|| WorldError::UnknownCompany(company_id.0.clone()))?;
            if !company.take_money(price) {
                return Err(WorldError::InsufficientFunds(company_id.0.clone(), price));
            }
        }
        let id = self.create_spacecraft(company_id, design_id, sector_id)?;
        if let Some(station) = self.spacecraft_mut(&id) {
            station.under_construction = Some(missing);
        }
        Ok(id)
    }

    /// Start upgrading an operational station: takes `price * level` from
    /// the owner and re-opens the construction resource debt.
    pub fn begin_station_upgrade(&mut self, station_id: &SpacecraftId) -> Result<(), WorldError> {
        let (company_id, design_id, level) = {
            let station = self
                .spacecraft(station_id)
                .ok_or_else(|| WorldError::UnknownSpacecraft(station_id.0.clone()))?;
            (
                station.company.clone(),
                station.description.clone(),
                station.level,
            )
        };
        let design = self
            .description(&design_id)
            .ok_or_else(|| WorldError::UnknownDesign(design_id.0.clone()))?;
        if !design.is_station {
            return Err(WorldError::NotAStation(design_id.0.clone()));
        }
        let price = (design.price as u64).saturating_mul(level as u64);
        let missing: BTreeMap<ResourceId, i64> = design
            .construction_resources
            .iter()
            .map(|rq| (rq.resource.clone(), rq.quantity))
            .collect();
        let company = self
            .company_mut(&company_id)
            .ok_or_else(|| WorldError::UnknownCompany(company_id.0.clone()))?;
        if !company.take_money(price) {
            return Err(WorldError::InsufficientFunds(company_id.0.clone(), price));
        }
        if let Some(station) = self.spacecraft_mut(station_id) {
            station.under_construction = Some(missing);
        }
        Ok(())
    }

    /// Place a hull order with a shipyard. The ordering company pays the
    /// design price up front.
    pub fn order_ship(
        &mut self,
        shipyard_id: &SpacecraftId,
        company_id: &CompanyId,
        design_id: &SpacecraftTypeId,
    ) -> Result<(), WorldError> {
        let design = self
            .description(design_id)
            .ok_or_else(|| WorldError::UnknownDesign(design_id.0.clone()))?;
        let price = design.price as u64;
        let build_days = design.build_days;
        {
            let shipyard = self
                .spacecraft(shipyard_id)
                .ok_or_else(|| WorldError::UnknownSpacecraft(shipyard_id.0.clone()))?;
            let yard_design = self
                .description(&shipyard.description)
                .ok_or_else(|| WorldError::UnknownDesign(shipyard.description.0.clone()))?;
            if !yard_design.is_shipyard {
                return Err(WorldError::NotAShipyard(shipyard_id.0.clone()));
            }
        }
        {
            let company = self
                .company_mut(company_id)
                .ok_or_else(|| WorldError::UnknownCompany(company_id.0.clone()))?;
            if !company.take_money(price) {
                return Err(WorldError::InsufficientFunds(company_id.0.clone(), price));
            }
        }
        let order = ShipyardOrder {
            company: company_id.clone(),
            design: design_id.clone(),
            days_remaining: build_days,
        };
        if let Some(shipyard) = self.spacecraft_mut(shipyard_id) {
            shipyard.shipyard_queue.push(order);
        }
        Ok(())
    }

    /// Value of all company assets: money plus hulls and cargo at floor
    /// prices.
    pub fn company_value(&self, company_id: &CompanyId) -> i64 {
        let Some(company) = self.company(company_id) else {
            return 0;
        };
        let mut value = company.money as i64;
        for craft in self.company_spacecrafts(company_id) {
            if let Some(design) = self.description(&craft.description) {
                value += design.price * craft.level as i64;
            }
            for (resource, quantity) in &craft.cargo {
                if let Some(desc) = self.resource(resource) {
                    let floor = desc.min_price.to_i64().unwrap_or(0);
                    value += floor * quantity;
                }
            }
        }
        value
    }
}
