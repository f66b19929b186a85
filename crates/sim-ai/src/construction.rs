//! Construction planner.
//!
//! Scores candidate (sector, station design) pairs, keeps at most one
//! in-flight project per company, musters ships to deliver the build's
//! resource debt and releases everything on completion or cancellation.
//! Construction never fails loudly: shortfalls defer to a later pass.

use crate::budget::BudgetOutcome;
use crate::CompanyAI;
use sim_core::{
    Assignment, Budget, ConstructionOrder, FactoryDescription, PriceContext, ResourceId, Sector,
    SectorId, Spacecraft, SpacecraftDescription, SpacecraftId, SpacecraftTypeId, World,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Relative advantage a fresh candidate needs before it may displace a
/// project that has not broken ground yet.
const REPLACE_MARGIN: f32 = 1.25;

/// Stand-in daily gain for factory-less designs (shipyards earn through
/// hull orders, not cycles).
const SHIPYARD_NOMINAL_GAIN: i64 = 400;

/// A single in-progress station build or upgrade.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructionProject {
    pub station_description: SpacecraftTypeId,
    pub sector: SectorId,
    /// The hull once ground is broken; `None` while saving up.
    pub station: Option<SpacecraftId>,
    /// Cargo ships ferrying resources to the site.
    pub ships: Vec<SpacecraftId>,
    /// Ships already on site contributing from their holds.
    pub static_ships: Vec<SpacecraftId>,
    /// Resource units still lacking a committed ship.
    pub need_capacity: i64,
}

/// Best-known construction candidate while scanning.
#[derive(Clone, Debug, PartialEq)]
pub struct BestCandidate {
    pub score: f32,
    pub sector: SectorId,
    pub description: SpacecraftTypeId,
    /// Existing station when the candidate is an upgrade.
    pub station: Option<SpacecraftId>,
    /// Credits needed to break ground.
    pub cost: i64,
}

/// Replace `best` if and only if `score` strictly exceeds it. Ties keep
/// the earlier candidate, so callers iterating in a stable order get
/// deterministic picks, and re-applying the same pair is a no-op.
pub fn update_best_score(
    score: f32,
    sector: &SectorId,
    description: &SpacecraftTypeId,
    station: Option<&SpacecraftId>,
    cost: i64,
    best: &mut Option<BestCandidate>,
) {
    let beats = match best {
        None => score > 0.0,
        Some(current) => score > current.score,
    };
    if beats {
        *best = Some(BestCandidate {
            score,
            sector: sector.clone(),
            description: description.clone(),
            station: station.cloned(),
            cost,
        });
    }
}

impl CompanyAI {
    /// Heuristic score of running one factory line of `description` in
    /// `sector`, or of the bare design when `factory` is `None`.
    ///
    /// Combines the behavior's sector and resource affinities, the
    /// estimated daily margin at local prices, input availability and a
    /// saturation divisor for same-design stations already present.
    pub fn compute_construction_score_for_station(
        &self,
        world: &World,
        sector: &Sector,
        description: &SpacecraftDescription,
        factory: Option<&FactoryDescription>,
        station: Option<&Spacecraft>,
    ) -> f32 {
        let behavior = &self.behavior;
        let mut affinity = behavior.sector_affinity(&sector.id);
        if description.is_shipyard {
            affinity *= behavior.shipyard_affinity;
        }
        let price = description.price * station.map(|s| s.level as i64).unwrap_or(1);
        if price <= 0 {
            return 0.0;
        }
        let gain = match factory {
            None => {
                if !description.is_shipyard {
                    return 0.0;
                }
                SHIPYARD_NOMINAL_GAIN
            }
            Some(factory) => {
                let mut gain = 0i64;
                for output in &factory.cycle_outputs {
                    let Some(resource) = world.resource(&output.resource) else {
                        continue;
                    };
                    let rate = output.quantity / factory.cycle_days.max(1) as i64;
                    let base = sector
                        .prices
                        .get(&output.resource)
                        .copied()
                        .unwrap_or(resource.max_price);
                    gain += sim_econ::total_value(base, rate);
                    affinity *= behavior.resource_affinity(&output.resource);
                    if resource.is_consumer {
                        affinity *= behavior.consumer_affinity;
                    }
                    if resource.is_maintenance {
                        affinity *= behavior.maintenance_affinity;
                    }
                }
                for input in &factory.cycle_inputs {
                    let Some(resource) = world.resource(&input.resource) else {
                        continue;
                    };
                    let rate = input.quantity / factory.cycle_days.max(1) as i64;
                    let base = sector
                        .prices
                        .get(&input.resource)
                        .copied()
                        .unwrap_or(resource.min_price);
                    gain -= sim_econ::total_value(
                        sim_econ::context_price(base, PriceContext::FactoryInput),
                        rate,
                    );
                    // Feeding on a globally scarce resource is a bad bet.
                    if self.world_flow.get(&input.resource).copied().unwrap_or(0) < 0 {
                        affinity *= 0.2;
                    }
                }
                gain
            }
        };
        if gain <= 0 {
            return 0.0;
        }
        let same_design = world
            .sector_spacecrafts(&sector.id)
            .filter(|c| c.description == description.id && c.is_operational())
            .count() as f32;
        affinity * (gain as f32 / price as f32) * 1000.0 / (1.0 + same_design)
    }

    /// Score of a whole candidate: the sum of its factory lines, or the
    /// bare-design score for factory-less stations.
    fn score_candidate(
        &self,
        world: &World,
        sector: &Sector,
        description: &SpacecraftDescription,
        station: Option<&Spacecraft>,
    ) -> f32 {
        if description.factories.is_empty() {
            return self.compute_construction_score_for_station(
                world,
                sector,
                description,
                None,
                station,
            );
        }
        description
            .factories
            .iter()
            .map(|f| {
                self.compute_construction_score_for_station(
                    world,
                    sector,
                    description,
                    Some(f),
                    station,
                )
            })
            .sum()
    }

    /// Scan every known sector and station design, including upgrades of
    /// our own operational stations, in stable iteration order.
    pub(crate) fn find_best_construction_candidate(&self, world: &World) -> Option<BestCandidate> {
        if self.behavior.is_pirate {
            return None;
        }
        let mut best = None;
        for sector in world.known_sectors(&self.company) {
            for description in world.spacecraft_catalog.iter().filter(|d| d.is_station) {
                let score = self.score_candidate(world, sector, description, None);
                update_best_score(
                    score,
                    &sector.id,
                    &description.id,
                    None,
                    description.price,
                    &mut best,
                );
                for station in world
                    .sector_spacecrafts(&sector.id)
                    .filter(|c| {
                        c.company == self.company
                            && c.description == description.id
                            && c.is_operational()
                    })
                {
                    let score = self.score_candidate(world, sector, description, Some(station));
                    update_best_score(
                        score,
                        &sector.id,
                        &description.id,
                        Some(&station.id),
                        description.price * station.level as i64,
                        &mut best,
                    );
                }
            }
        }
        best
    }

    /// Station budget handler: adopt the best candidate when no project is
    /// in flight, otherwise hold the budget for the running project.
    pub(crate) fn process_budget_station(
        &mut self,
        world: &mut World,
        amount: i64,
    ) -> BudgetOutcome {
        if let Some(project) = self.construction.clone() {
            // A project that has not broken ground may still be displaced
            // by a clearly better opportunity; never one with cargo in
            // flight.
            if project.station.is_none() {
                if let Some(best) = self.find_best_construction_candidate(world) {
                    let current = self.score_of_unstarted(world, &project);
                    let different = best.sector != project.sector
                        || best.description != project.station_description;
                    if best.station.is_none() && different && best.score > current * REPLACE_MARGIN
                    {
                        info!(
                            company = %self.company.0,
                            from = %project.station_description.0,
                            to = %best.description.0,
                            "replacing unstarted construction project"
                        );
                        self.clear_construction_project(world);
                        self.adopt_candidate(world, &best);
                    }
                }
            }
            return BudgetOutcome::locked(0);
        }
        let Some(best) = self.find_best_construction_candidate(world) else {
            return BudgetOutcome::idle();
        };
        if let Some(station_id) = best.station.clone() {
            // Upgrades break ground immediately or wait for funding.
            if amount >= best.cost && world.begin_station_upgrade(&station_id).is_ok() {
                self.ledger.spend(Budget::Station, best.cost);
                let need = world
                    .description(&best.description)
                    .map(|d| d.construction_capacity())
                    .unwrap_or(0);
                info!(
                    company = %self.company.0,
                    station = %station_id.0,
                    "station upgrade started"
                );
                self.construction = Some(ConstructionProject {
                    station_description: best.description,
                    sector: best.sector,
                    station: Some(station_id),
                    ships: vec![],
                    static_ships: vec![],
                    need_capacity: need,
                });
                return BudgetOutcome::locked(best.cost);
            }
            return BudgetOutcome::locked(0);
        }
        self.adopt_candidate(world, &best);
        BudgetOutcome::locked(0)
    }

    fn adopt_candidate(&mut self, world: &World, best: &BestCandidate) {
        let need = world
            .description(&best.description)
            .map(|d| d.construction_capacity())
            .unwrap_or(0);
        debug!(
            company = %self.company.0,
            design = %best.description.0,
            sector = %best.sector.0,
            score = best.score,
            "construction project selected"
        );
        self.construction = Some(ConstructionProject {
            station_description: best.description.clone(),
            sector: best.sector.clone(),
            station: None,
            ships: vec![],
            static_ships: vec![],
            need_capacity: need,
        });
    }

    fn score_of_unstarted(&self, world: &World, project: &ConstructionProject) -> f32 {
        let (Some(sector), Some(description)) = (
            world.sector(&project.sector),
            world.description(&project.station_description),
        ) else {
            return 0.0;
        };
        self.score_candidate(world, sector, description, None)
    }

    /// Advance or start the in-flight project. Insufficient funds or
    /// resources only defer progress; external destruction of the target
    /// cancels.
    pub fn update_station_construction(&mut self, world: &mut World) {
        let Some(project) = self.construction.clone() else {
            return;
        };
        if world.sector(&project.sector).is_none() {
            info!(company = %self.company.0, "construction sector lost, cancelling project");
            self.clear_construction_project(world);
            return;
        }
        match project.station {
            Some(station_id) => match world.spacecraft(&station_id) {
                None => {
                    info!(
                        company = %self.company.0,
                        station = %station_id.0,
                        "construction target destroyed, cancelling project"
                    );
                    self.clear_construction_project(world);
                }
                Some(station) => {
                    if station.missing_construction_quantity() == 0 {
                        if let Some(station) = world.spacecraft_mut(&station_id) {
                            station.under_construction = None;
                        }
                        info!(
                            company = %self.company.0,
                            station = %station_id.0,
                            "station construction complete"
                        );
                        self.clear_construction_project(world);
                    } else {
                        self.find_resources_for_station_construction(world);
                    }
                }
            },
            None => {
                let Some(description) = world.description(&project.station_description) else {
                    self.clear_construction_project(world);
                    return;
                };
                let cost = description.price;
                if self.ledger.get(Budget::Station) < cost {
                    return; // keep saving
                }
                match world.begin_station_construction(
                    &self.company,
                    &project.station_description,
                    &project.sector,
                ) {
                    Ok(station_id) => {
                        self.ledger.spend(Budget::Station, cost);
                        info!(
                            company = %self.company.0,
                            station = %station_id.0,
                            sector = %project.sector.0,
                            "station construction started"
                        );
                        if let Some(p) = self.construction.as_mut() {
                            p.station = Some(station_id);
                        }
                        self.find_resources_for_station_construction(world);
                    }
                    Err(_) => {
                        // Company cash is short even though the budget is
                        // earmarked; retry on a later pass.
                    }
                }
            }
        }
    }

    /// Muster idle ships against the build's remaining resource debt.
    ///
    /// Ships already on site contribute straight from their holds; idle
    /// cargos elsewhere are sent to buy and haul. A shortfall leaves the
    /// project open with `need_capacity` tracking what is still uncovered.
    pub fn find_resources_for_station_construction(&mut self, world: &mut World) {
        let Some(mut project) = self.construction.clone() else {
            return;
        };
        let Some(station_id) = project.station.clone() else {
            return;
        };
        let Some(station) = world.spacecraft(&station_id) else {
            return;
        };
        let mut missing: BTreeMap<ResourceId, i64> =
            station.under_construction.clone().unwrap_or_default();
        // Drop reservations that no longer exist or were re-assigned.
        let still_reserved = |world: &World, id: &SpacecraftId| {
            world
                .spacecraft(id)
                .map(|c| c.assignment.is_construction())
                .unwrap_or(false)
        };
        project.ships.retain(|id| still_reserved(world, id));
        project.static_ships.retain(|id| still_reserved(world, id));
        // Contributions already in flight reduce what is missing.
        for id in project.ships.iter().chain(&project.static_ships) {
            if let Some(Assignment::Construction(Some(order))) =
                world.spacecraft(id).map(|c| c.assignment.clone())
            {
                if let Some(entry) = missing.get_mut(&order.resource) {
                    *entry = (*entry - order.quantity).max(0);
                }
            }
        }
        // Ships on site with useful cargo contribute without travelling.
        let on_site: Vec<SpacecraftId> = world
            .company_spacecrafts(&self.company)
            .filter(|c| {
                c.sector == project.sector
                    && c.assignment.is_idle()
                    && c.is_operational()
                    && world
                        .description(&c.description)
                        .map(|d| !d.is_station)
                        .unwrap_or(false)
            })
            .map(|c| c.id.clone())
            .collect();
        for ship_id in on_site {
            let Some(craft) = world.spacecraft(&ship_id) else {
                continue;
            };
            let Some((resource, quantity)) = missing
                .iter()
                .filter(|(_, need)| **need > 0)
                .find_map(|(r, need)| {
                    let carried = craft.cargo_quantity(r);
                    (carried > 0).then(|| (r.clone(), carried.min(*need)))
                })
            else {
                continue;
            };
            if let Some(craft) = world.spacecraft_mut(&ship_id) {
                craft.assignment = Assignment::Construction(Some(ConstructionOrder {
                    target_station: station_id.clone(),
                    source: project.sector.clone(),
                    destination: project.sector.clone(),
                    resource: resource.clone(),
                    quantity,
                    loaded: true,
                    days_remaining: 0,
                }));
            }
            debug!(ship = %ship_id.0, resource = %resource.0, quantity, "static ship reserved for construction");
            project.static_ships.push(ship_id);
            if let Some(entry) = missing.get_mut(&resource) {
                *entry -= quantity;
            }
        }
        // Reserved ships between ferry legs go first, then idle cargos;
        // stops when the station budget runs dry, leaving the rest for a
        // later pass.
        let mut budget_dry = false;
        for (resource, need) in missing.iter_mut().filter(|(_, need)| **need > 0) {
            if budget_dry {
                break;
            }
            let mut candidates: Vec<SpacecraftId> = project
                .ships
                .iter()
                .chain(&project.static_ships)
                .filter(|id| {
                    matches!(
                        world.spacecraft(id).map(|c| &c.assignment),
                        Some(Assignment::Construction(None))
                    )
                })
                .cloned()
                .collect();
            candidates.extend(self.find_idle_cargos(world));
            for ship_id in candidates {
                if *need <= 0 {
                    break;
                }
                let Some(craft) = world.spacecraft(&ship_id) else {
                    continue;
                };
                let free = matches!(
                    craft.assignment,
                    Assignment::Idle | Assignment::Construction(None)
                );
                if !free {
                    continue;
                }
                let capacity = world.cargo_capacity_of(craft);
                let Some((source, available, unit_price)) = self.best_source_for(world, resource)
                else {
                    break; // nowhere to buy from this pass
                };
                let quantity = (*need).min(capacity).min(available);
                if quantity <= 0 {
                    break;
                }
                let cost = sim_econ::total_value(
                    sim_econ::context_price(unit_price, PriceContext::FactoryOutput),
                    quantity,
                );
                if !self.ledger.spend(Budget::Station, cost) {
                    budget_dry = true;
                    break;
                }
                if let Some(craft) = world.spacecraft_mut(&ship_id) {
                    craft.assignment = Assignment::Construction(Some(ConstructionOrder {
                        target_station: station_id.clone(),
                        source: source.clone(),
                        destination: project.sector.clone(),
                        resource: resource.clone(),
                        quantity,
                        loaded: false,
                        days_remaining: 0,
                    }));
                }
                debug!(ship = %ship_id.0, resource = %resource.0, quantity, from = %source.0, "cargo ship reserved for construction");
                self.claim_stock(&source, resource, quantity);
                if !project.ships.contains(&ship_id) && !project.static_ships.contains(&ship_id) {
                    project.ships.push(ship_id);
                }
                *need -= quantity;
            }
        }
        project.need_capacity = missing.values().filter(|v| **v > 0).sum();
        self.construction = Some(project);
    }

    /// Known sector with the most purchasable stock of `resource`.
    fn best_source_for(
        &self,
        world: &World,
        resource: &ResourceId,
    ) -> Option<(SectorId, i64, rust_decimal::Decimal)> {
        let mut best: Option<(SectorId, i64)> = None;
        for sector in world.known_sectors(&self.company) {
            let Some(variation) = self.variations.get(&sector.id) else {
                continue;
            };
            let available = variation.resource(resource).available_stock();
            if available > 0 && best.as_ref().map(|(_, a)| available > *a).unwrap_or(true) {
                best = Some((sector.id.clone(), available));
            }
        }
        let (sector_id, available) = best?;
        let price = world
            .sector(&sector_id)
            .and_then(|s| s.prices.get(resource).copied())
            .or_else(|| world.resource(resource).map(|r| r.max_price))?;
        Some((sector_id, available, price))
    }

    /// Book a purchase against the cached variation so later decisions in
    /// the same pass see the claimed stock.
    pub(crate) fn claim_stock(&mut self, sector: &SectorId, resource: &ResourceId, quantity: i64) {
        if let Some(variation) = self.variations.get_mut(sector) {
            let slot = variation.resources.entry(resource.clone()).or_default();
            let from_factories = quantity.min(slot.factory_stock);
            slot.factory_stock -= from_factories;
            slot.storage_stock = (slot.storage_stock - (quantity - from_factories)).max(0);
        }
    }

    /// Release every reserved ship and forget the project. Invoked on
    /// completion, cancellation, or replacement of an unstarted project.
    pub fn clear_construction_project(&mut self, world: &mut World) {
        let Some(project) = self.construction.take() else {
            return;
        };
        for id in project.ships.iter().chain(&project.static_ships) {
            if let Some(craft) = world.spacecraft_mut(id) {
                if craft.assignment.is_construction() {
                    craft.assignment = Assignment::Idle;
                }
            }
        }
        debug!(
            company = %self.company.0,
            design = %project.station_description.0,
            "construction project cleared"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{add_ship, add_station, fund, test_world};
    use sim_core::CompanyId;

    fn candidate(score: f32) -> (SectorId, SpacecraftTypeId) {
        let _ = score;
        (SectorId("anchor".into()), SpacecraftTypeId("ore-mine".into()))
    }

    #[test]
    fn update_best_score_keeps_earlier_on_tie() {
        let (sector_a, design_a) = candidate(1.0);
        let sector_b = SectorId("rim".into());
        let mut best = None;
        update_best_score(1.0, &sector_a, &design_a, None, 100, &mut best);
        update_best_score(1.0, &sector_b, &design_a, None, 100, &mut best);
        assert_eq!(best.as_ref().unwrap().sector, sector_a);
        update_best_score(1.5, &sector_b, &design_a, None, 100, &mut best);
        assert_eq!(best.as_ref().unwrap().sector, sector_b);
    }

    #[test]
    fn update_best_score_is_idempotent() {
        let (sector, design) = candidate(2.0);
        let mut once = None;
        update_best_score(2.0, &sector, &design, None, 100, &mut once);
        let mut twice = once.clone();
        update_best_score(2.0, &sector, &design, None, 100, &mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn update_best_score_ignores_non_positive() {
        let (sector, design) = candidate(0.0);
        let mut best = None;
        update_best_score(0.0, &sector, &design, None, 100, &mut best);
        assert!(best.is_none());
        update_best_score(-1.0, &sector, &design, None, 100, &mut best);
        assert!(best.is_none());
    }

    #[test]
    fn planner_finds_a_candidate_and_adopts_it() {
        let mut world = test_world();
        let company = CompanyId("axis".into());
        fund(&mut world, &company, 1_000_000);
        let mut ai = crate::CompanyAI::new(company);
        let company_id = ai.company().clone();
        ai.behavior.generate_affinities(&world, &company_id);
        ai.refresh_analysis(&world);
        ai.ledger_mut().modify(Budget::Station, 500_000);
        let outcome = ai.process_budget_station(&mut world, 500_000);
        assert!(outcome.locked);
        assert!(ai.construction_project().is_some());
        // A second pass with a project in flight stays locked and keeps
        // exactly one project.
        let outcome = ai.process_budget_station(&mut world, 500_000);
        assert!(outcome.locked);
        assert!(ai.construction_project().is_some());
    }

    #[test]
    fn pirate_never_plans_construction() {
        let mut world = test_world();
        let company = CompanyId("axis".into());
        fund(&mut world, &company, 1_000_000);
        let mut ai = crate::CompanyAI::new(company);
        ai.behavior.is_pirate = true;
        ai.refresh_analysis(&world);
        let outcome = ai.process_budget_station(&mut world, 500_000);
        assert!(outcome.idle);
        assert!(ai.construction_project().is_none());
    }

    #[test]
    fn zero_need_project_completes_on_next_pass() {
        let mut world = test_world();
        let company = CompanyId("axis".into());
        let station = add_station(
            &mut world,
            &company,
            &SpacecraftTypeId("steelworks".into()),
            &SectorId("anchor".into()),
        );
        world.spacecraft_mut(&station).unwrap().under_construction = Some(BTreeMap::new());
        let helper = add_ship(
            &mut world,
            &company,
            &SpacecraftTypeId("light-freighter".into()),
            &SectorId("anchor".into()),
        );
        world.spacecraft_mut(&helper).unwrap().assignment = Assignment::Construction(None);
        let mut ai = crate::CompanyAI::new(company);
        ai.set_construction_project(ConstructionProject {
            station_description: SpacecraftTypeId("steelworks".into()),
            sector: SectorId("anchor".into()),
            station: Some(station.clone()),
            ships: vec![],
            static_ships: vec![helper.clone()],
            need_capacity: 0,
        });
        ai.update_station_construction(&mut world);
        assert!(ai.construction_project().is_none());
        assert!(world.spacecraft(&station).unwrap().is_operational());
        assert!(world.spacecraft(&helper).unwrap().assignment.is_idle());
    }

    #[test]
    fn destroyed_target_cancels_and_releases_ships() {
        let mut world = test_world();
        let company = CompanyId("axis".into());
        let ship = add_ship(
            &mut world,
            &company,
            &SpacecraftTypeId("light-freighter".into()),
            &SectorId("anchor".into()),
        );
        world.spacecraft_mut(&ship).unwrap().assignment = Assignment::Construction(None);
        let mut ai = crate::CompanyAI::new(company);
        ai.set_construction_project(ConstructionProject {
            station_description: SpacecraftTypeId("steelworks".into()),
            sector: SectorId("anchor".into()),
            station: Some(SpacecraftId("GONE-001".into())),
            ships: vec![ship.clone()],
            static_ships: vec![],
            need_capacity: 80,
        });
        ai.update_station_construction(&mut world);
        assert!(ai.construction_project().is_none());
        assert!(world.spacecraft(&ship).unwrap().assignment.is_idle());
    }

    #[test]
    fn static_ship_with_cargo_is_mustered() {
        let mut world = test_world();
        let company = CompanyId("axis".into());
        let station = add_station(
            &mut world,
            &company,
            &SpacecraftTypeId("steelworks".into()),
            &SectorId("anchor".into()),
        );
        world.spacecraft_mut(&station).unwrap().under_construction =
            Some([(ResourceId("steel".into()), 80)].into_iter().collect());
        let ship = add_ship(
            &mut world,
            &company,
            &SpacecraftTypeId("light-freighter".into()),
            &SectorId("anchor".into()),
        );
        world
            .spacecraft_mut(&ship)
            .unwrap()
            .load_cargo(&ResourceId("steel".into()), 50, 100);
        let mut ai = crate::CompanyAI::new(company);
        ai.refresh_analysis(&world);
        ai.set_construction_project(ConstructionProject {
            station_description: SpacecraftTypeId("steelworks".into()),
            sector: SectorId("anchor".into()),
            station: Some(station.clone()),
            ships: vec![],
            static_ships: vec![],
            need_capacity: 80,
        });
        ai.find_resources_for_station_construction(&mut world);
        let project = ai.construction_project().unwrap();
        assert_eq!(project.static_ships, vec![ship.clone()]);
        // 80 needed, 50 contributed from the hold, 30 still uncovered.
        assert_eq!(project.need_capacity, 30);
        assert!(world.spacecraft(&ship).unwrap().assignment.is_construction());
    }
}
