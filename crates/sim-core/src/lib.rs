#![deny(warnings)]

//! Core domain models and invariants for Voidtrade.
//!
//! This crate defines the serializable catalog, world and save types used
//! across the simulation with validation helpers to guarantee basic
//! invariants.

pub mod save;
pub mod world;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub use save::{
    CompanyAISave, CompanySave, GameSave, ReputationSave, SectorKnowledgeSave, SectorSave,
    SpacecraftSave,
};
pub use world::{
    Assignment, Company, ConstructionOrder, FactoryState, Fleet, Sector, ShipyardOrder, SimConfig,
    Spacecraft, TradeOrder, TradeRoute, World, WorldError,
};

/// Unique identifier for a tradable resource, e.g. "food", "steel".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub String);

/// Unique identifier for a sector, e.g. "first-light".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SectorId(pub String);

/// Unique identifier for a company, e.g. "axis-supplies".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompanyId(pub String);

/// Catalog identifier for a spacecraft design, e.g. "light-freighter".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpacecraftTypeId(pub String);

/// Immatriculation of a live spacecraft, e.g. "AXS-012".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpacecraftId(pub String);

/// Budget categories a company AI allocates money across.
///
/// Each category is an independent spend pool; balances persist and
/// accumulate across simulated days.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Budget {
    Military,
    Station,
    Technology,
    Trade,
}

impl Budget {
    /// All categories in daily processing order. Technology is processed
    /// last and currently has no spend path.
    pub const ALL: [Budget; 4] = [
        Budget::Military,
        Budget::Station,
        Budget::Trade,
        Budget::Technology,
    ];
}

/// Stance of one company toward another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hostility {
    Hostile,
    Neutral,
    Friendly,
    Owned,
}

/// How much a company knows about a sector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectorKnowledge {
    /// The existence of this sector is unknown.
    Unknown,
    /// The sector is visible on the map but its content is unknown.
    Known,
    /// The sector has been visited, all static structures are visible.
    Visited,
}

/// Price context for buying or selling a resource in a sector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceContext {
    /// Default price.
    Default,
    /// Price when selling to a factory needing the resource.
    FactoryInput,
    /// Price when buying the resource from a factory.
    FactoryOutput,
    /// Price when selling to a sector's population.
    ConsumerConsumption,
    /// Price when selling to a company doing fleet maintenance.
    MaintenanceConsumption,
}

/// A resource together with an amount, used in factory cycles and
/// construction costs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuantity {
    pub resource: ResourceId,
    pub quantity: i64,
}

/// A tradable resource with its price band and consumption roles.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceDescription {
    /// Resource identifier, e.g. "steel".
    pub id: ResourceId,
    /// Human-readable name.
    pub name: String,
    /// Lowest unit price the market can reach, in credits.
    pub min_price: Decimal,
    /// Highest unit price the market can reach, in credits.
    pub max_price: Decimal,
    /// Hauling cost per unit per day of travel, in credits.
    pub transport_fee: Decimal,
    /// Consumed daily by sector populations.
    pub is_consumer: bool,
    /// Consumed by fleet maintenance and refits.
    pub is_maintenance: bool,
}

/// A production line hosted by a station.
///
/// A factory turns `cycle_inputs` into `cycle_outputs` every `cycle_days`
/// simulated days, drawing from and feeding the station's cargo hold.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FactoryDescription {
    /// Factory identifier, unique within its spacecraft description.
    pub identifier: String,
    /// Resources consumed per cycle. Empty for extraction factories.
    pub cycle_inputs: Vec<ResourceQuantity>,
    /// Resources produced per cycle.
    pub cycle_outputs: Vec<ResourceQuantity>,
    /// Cycle duration in days (> 0).
    pub cycle_days: u32,
}

/// A spacecraft design: either a mobile ship or an anchored station.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpacecraftDescription {
    /// Design identifier, e.g. "heavy-freighter".
    pub id: SpacecraftTypeId,
    /// Human-readable name.
    pub name: String,
    /// Anchored station rather than a mobile ship.
    pub is_station: bool,
    /// Armed design counted toward army strength.
    pub is_military: bool,
    /// Station able to take ship construction orders.
    pub is_shipyard: bool,
    /// Total cargo hold size in resource units.
    pub cargo_capacity: i64,
    /// Relative combat strength (0 for civilian designs).
    pub combat_points: i32,
    /// Purchase or construction price in credits.
    pub price: i64,
    /// Resources that must be delivered to finish building a station
    /// (or one upgrade level of it). Empty for ships.
    pub construction_resources: Vec<ResourceQuantity>,
    /// Production lines hosted by the design (stations only).
    pub factories: Vec<FactoryDescription>,
    /// Days a shipyard needs to build one hull of this design.
    pub build_days: u32,
}

impl SpacecraftDescription {
    /// Total construction resource units needed for one build level.
    pub fn construction_capacity(&self) -> i64 {
        self.construction_resources.iter().map(|r| r.quantity).sum()
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Identifier must be non-empty.
    #[error("empty identifier")]
    EmptyIdentifier,
    /// Duplicate identifier in a catalog.
    #[error("duplicate identifier: {0}")]
    DuplicateIdentifier(String),
    /// Price band must satisfy 0 <= min <= max.
    #[error("invalid price band for {0}")]
    InvalidPriceBand(String),
    /// Monetary value must be non-negative.
    #[error("negative monetary value is invalid")]
    NegativeMoney,
    /// Factory cycle must last at least one day.
    #[error("factory {0} has a zero-day cycle")]
    ZeroCycle(String),
    /// Resource quantity must be strictly positive.
    #[error("non-positive resource quantity in {0}")]
    NonPositiveQuantity(String),
    /// Referenced resource not found in the catalog.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
    /// Ships cannot carry construction resource lists or factories.
    #[error("ship design {0} carries station-only data")]
    ShipWithStationData(String),
}

/// Validate a resource description.
pub fn validate_resource(resource: &ResourceDescription) -> Result<(), ValidationError> {
    if resource.id.0.trim().is_empty() {
        return Err(ValidationError::EmptyIdentifier);
    }
    if resource.min_price < Decimal::ZERO || resource.min_price > resource.max_price {
        return Err(ValidationError::InvalidPriceBand(resource.id.0.clone()));
    }
    if resource.transport_fee < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney);
    }
    Ok(())
}

/// Validate a factory description against a resource catalog.
pub fn validate_factory(
    factory: &FactoryDescription,
    resources: &BTreeSet<&ResourceId>,
) -> Result<(), ValidationError> {
    if factory.identifier.trim().is_empty() {
        return Err(ValidationError::EmptyIdentifier);
    }
    if factory.cycle_days == 0 {
        return Err(ValidationError::ZeroCycle(factory.identifier.clone()));
    }
    for rq in factory.cycle_inputs.iter().chain(&factory.cycle_outputs) {
        if rq.quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity(
                factory.identifier.clone(),
            ));
        }
        if !resources.contains(&rq.resource) {
            return Err(ValidationError::ResourceNotFound(rq.resource.0.clone()));
        }
    }
    Ok(())
}

/// Validate a spacecraft description against a resource catalog.
pub fn validate_spacecraft_description(
    desc: &SpacecraftDescription,
    resources: &BTreeSet<&ResourceId>,
) -> Result<(), ValidationError> {
    if desc.id.0.trim().is_empty() {
        return Err(ValidationError::EmptyIdentifier);
    }
    if desc.price < 0 || desc.cargo_capacity < 0 {
        return Err(ValidationError::NegativeMoney);
    }
    if !desc.is_station && (!desc.construction_resources.is_empty() || !desc.factories.is_empty()) {
        return Err(ValidationError::ShipWithStationData(desc.id.0.clone()));
    }
    for rq in &desc.construction_resources {
        if rq.quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity(desc.id.0.clone()));
        }
        if !resources.contains(&rq.resource) {
            return Err(ValidationError::ResourceNotFound(rq.resource.0.clone()));
        }
    }
    for factory in &desc.factories {
        validate_factory(factory, resources)?;
    }
    Ok(())
}

/// Validate both catalogs, including cross-references and uniqueness.
pub fn validate_catalogs(
    resources: &[ResourceDescription],
    spacecrafts: &[SpacecraftDescription],
) -> Result<(), ValidationError> {
    let mut ids: BTreeSet<&ResourceId> = BTreeSet::new();
    for resource in resources {
        validate_resource(resource)?;
        if !ids.insert(&resource.id) {
            return Err(ValidationError::DuplicateIdentifier(resource.id.0.clone()));
        }
    }
    let mut seen: BTreeSet<&SpacecraftTypeId> = BTreeSet::new();
    for desc in spacecrafts {
        validate_spacecraft_description(desc, &ids)?;
        if !seen.insert(&desc.id) {
            return Err(ValidationError::DuplicateIdentifier(desc.id.0.clone()));
        }
    }
    Ok(())
}

/// Index resource descriptions by identifier for fast lookups.
pub fn index_resources(
    resources: &[ResourceDescription],
) -> BTreeMap<&ResourceId, &ResourceDescription> {
    resources.iter().map(|r| (&r.id, r)).collect()
}
