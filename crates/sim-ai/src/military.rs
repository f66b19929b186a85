//! Military management and fleet upkeep.
//!
//! Ship acquisition helpers shared with the trade side, threat-driven
//! military posting, and the opportunistic repair/refill sweep that runs
//! outside the budget protocol.

use crate::budget::BudgetOutcome;
use crate::variation::MAINT_SUPPLY_PER_LEVEL;
use crate::CompanyAI;
use sim_core::{
    Assignment, Budget, Hostility, PriceContext, SectorId, SpacecraftDescription, SpacecraftId,
    World,
};
use tracing::{debug, info};

/// Below this health a cargo hull is considered damaged and unusable.
const DAMAGED_THRESHOLD: f32 = 0.75;

/// Company value per point of desired army strength (scaled by the
/// behavior's `army_size`).
const ARMY_VALUE_UNIT: i64 = 10_000;

/// Fraction of the hull price a full repair costs.
const REPAIR_COST_RATIO: f32 = 0.3;

/// Hull orders a single shipyard will queue for one company.
const SHIPYARD_QUEUE_LIMIT: usize = 2;

impl CompanyAI {
    /// Idle, healthy, operational cargo hulls, in stable id order.
    pub fn find_idle_cargos(&self, world: &World) -> Vec<SpacecraftId> {
        world
            .company_spacecrafts(&self.company)
            .filter(|c| {
                c.assignment.is_idle()
                    && c.is_operational()
                    && c.health >= DAMAGED_THRESHOLD
                    && world
                        .description(&c.description)
                        .map(|d| !d.is_station && !d.is_military && d.cargo_capacity > 0)
                        .unwrap_or(false)
            })
            .map(|c| c.id.clone())
            .collect()
    }

    /// Idle, operational military hulls, in stable id order.
    pub fn find_idle_military_ships(&self, world: &World) -> Vec<SpacecraftId> {
        world
            .company_spacecrafts(&self.company)
            .filter(|c| {
                c.assignment.is_idle()
                    && c.is_operational()
                    && world
                        .description(&c.description)
                        .map(|d| !d.is_station && d.is_military)
                        .unwrap_or(false)
            })
            .map(|c| c.id.clone())
            .collect()
    }

    pub(crate) fn compute_idle_cargo_capacity(&self, world: &World) -> i64 {
        self.find_idle_cargos(world)
            .iter()
            .filter_map(|id| world.spacecraft(id))
            .map(|c| world.cargo_capacity_of(c))
            .sum()
    }

    /// Capacity tied up in damaged cargo hulls, excluded from planning.
    pub fn damaged_cargos_capacity(&self, world: &World) -> i64 {
        world
            .company_spacecrafts(&self.company)
            .filter(|c| {
                c.health < DAMAGED_THRESHOLD
                    && world
                        .description(&c.description)
                        .map(|d| !d.is_station && !d.is_military && d.cargo_capacity > 0)
                        .unwrap_or(false)
            })
            .map(|c| world.cargo_capacity_of(c))
            .sum()
    }

    /// Operational shipyards in known sectors whose owner will deal with
    /// us, in stable id order.
    pub fn find_shipyards(&self, world: &World) -> Vec<SpacecraftId> {
        world
            .spacecrafts
            .values()
            .filter(|c| {
                c.is_operational()
                    && world
                        .description(&c.description)
                        .map(|d| d.is_shipyard)
                        .unwrap_or(false)
                    && world.hostility(&c.company, &self.company) != Hostility::Hostile
                    && world
                        .company(&self.company)
                        .map(|me| me.knows_sector(&c.sector))
                        .unwrap_or(false)
            })
            .map(|c| c.id.clone())
            .collect()
    }

    /// Whether any shipyard is already building a hull of the given kind
    /// for us.
    pub fn is_building_ship(&self, world: &World, military: bool) -> bool {
        world.spacecrafts.values().any(|c| {
            c.shipyard_queue.iter().any(|order| {
                order.company == self.company
                    && world
                        .description(&order.design)
                        .map(|d| d.is_military == military)
                        .unwrap_or(false)
            })
        })
    }

    /// Strongest military design, or the biggest cargo hauler. Catalog
    /// order breaks ties.
    pub fn find_best_ship_to_build<'w>(
        &self,
        world: &'w World,
        military: bool,
    ) -> Option<&'w SpacecraftDescription> {
        let mut best: Option<&SpacecraftDescription> = None;
        for design in world
            .spacecraft_catalog
            .iter()
            .filter(|d| !d.is_station && d.is_military == military)
        {
            let metric = |d: &SpacecraftDescription| {
                if military {
                    d.combat_points as i64
                } else {
                    d.cargo_capacity
                }
            };
            if best.map(|b| metric(design) > metric(b)).unwrap_or(true) {
                best = Some(design);
            }
        }
        best
    }

    /// Order one hull at the first shipyard with queue room, spending the
    /// given budget category. Returns the price paid, or 0.
    pub(crate) fn order_one_ship(
        &mut self,
        world: &mut World,
        design_id: &sim_core::SpacecraftTypeId,
        category: Budget,
    ) -> i64 {
        let Some(price) = world.description(design_id).map(|d| d.price) else {
            return 0;
        };
        if self.ledger.get(category) < price {
            return 0;
        }
        for shipyard_id in self.find_shipyards(world) {
            let queue_len = world
                .spacecraft(&shipyard_id)
                .map(|y| {
                    y.shipyard_queue
                        .iter()
                        .filter(|o| o.company == self.company)
                        .count()
                })
                .unwrap_or(usize::MAX);
            if queue_len >= SHIPYARD_QUEUE_LIMIT {
                continue;
            }
            if world
                .order_ship(&shipyard_id, &self.company, design_id)
                .is_ok()
            {
                self.ledger.spend(category, price);
                info!(
                    company = %self.company.0,
                    design = %design_id.0,
                    shipyard = %shipyard_id.0,
                    price,
                    "hull ordered"
                );
                return price;
            }
        }
        0
    }

    /// Buy war ships until the desired strength is queued or the budget
    /// runs out. Returns the credits spent.
    pub fn update_war_ship_acquisition(&mut self, world: &mut World, limit_to_one: bool) -> i64 {
        let mut spent = 0i64;
        loop {
            if self.current_combat_points(world) >= self.desired_combat_points(world) {
                break;
            }
            let Some(design_id) = self
                .find_best_ship_to_build(world, true)
                .map(|d| d.id.clone())
            else {
                break;
            };
            let paid = self.order_one_ship(world, &design_id, Budget::Military);
            if paid == 0 {
                break;
            }
            spent += paid;
            if limit_to_one {
                break;
            }
        }
        spent
    }

    /// Buy one cargo hull. Returns the credits spent.
    pub(crate) fn update_cargo_ship_acquisition(&mut self, world: &mut World) -> i64 {
        let Some(design_id) = self
            .find_best_ship_to_build(world, false)
            .map(|d| d.id.clone())
        else {
            return 0;
        };
        self.order_one_ship(world, &design_id, Budget::Trade)
    }

    pub(crate) fn desired_combat_points(&self, world: &World) -> i32 {
        let value = world.company_value(&self.company);
        (self.behavior.army_size * (value / ARMY_VALUE_UNIT) as f32) as i32
    }

    pub(crate) fn current_combat_points(&self, world: &World) -> i32 {
        world
            .company_spacecrafts(&self.company)
            .filter(|c| c.is_operational())
            .filter_map(|c| world.description(&c.description))
            .map(|d| d.combat_points)
            .sum()
    }

    /// Military budget handler: grow the navy toward the behavior's target
    /// strength, saving up when the next hull is unaffordable.
    pub(crate) fn process_budget_military(
        &mut self,
        world: &mut World,
        amount: i64,
    ) -> BudgetOutcome {
        if self.current_combat_points(world) >= self.desired_combat_points(world) {
            return BudgetOutcome::idle();
        }
        if self.is_building_ship(world, true) {
            return BudgetOutcome::locked(0);
        }
        if self.find_shipyards(world).is_empty() {
            return BudgetOutcome::idle();
        }
        let Some(design) = self.find_best_ship_to_build(world, true) else {
            return BudgetOutcome::idle();
        };
        if amount < design.price {
            return BudgetOutcome::locked(0);
        }
        let spent = self.update_war_ship_acquisition(world, true);
        if spent > 0 {
            BudgetOutcome::spent(spent)
        } else {
            BudgetOutcome::locked(0)
        }
    }

    /// Post idle military ships against threats; aggressive profiles also
    /// raid when they outmatch the defenders.
    pub fn update_military_movement(&mut self, world: &mut World, defend_only: bool) {
        self.stand_down_settled_posts(world);
        let mut idle = self.find_idle_military_ships(world);
        if idle.is_empty() {
            return;
        }
        // Threatened sectors: hostiles present where we hold assets.
        let threatened: Vec<(SectorId, i32)> = world
            .sectors
            .iter()
            .filter_map(|sector| {
                let ours = world
                    .sector_spacecrafts(&sector.id)
                    .any(|c| c.company == self.company);
                if !ours {
                    return None;
                }
                let threat: i32 = world
                    .sector_spacecrafts(&sector.id)
                    .filter(|c| {
                        c.is_operational()
                            && world.hostility(&self.company, &c.company) == Hostility::Hostile
                    })
                    .filter_map(|c| world.description(&c.description))
                    .filter(|d| d.is_military)
                    .map(|d| d.combat_points)
                    .sum();
                (threat > 0).then(|| (sector.id.clone(), threat))
            })
            .collect();
        for (sector_id, threat) in threatened {
            let mut committed = 0i32;
            let goal = (threat as f32 * self.behavior.confidence_target) as i32;
            while committed < goal {
                let Some(ship_id) = idle.pop() else {
                    break;
                };
                let points = world
                    .spacecraft(&ship_id)
                    .and_then(|c| world.description(&c.description))
                    .map(|d| d.combat_points)
                    .unwrap_or(0);
                let days = world
                    .spacecraft(&ship_id)
                    .map(|c| world.travel_days(&c.sector, &sector_id))
                    .unwrap_or(0);
                if let Some(craft) = world.spacecraft_mut(&ship_id) {
                    craft.assignment = Assignment::Defense {
                        sector: sector_id.clone(),
                        days_remaining: days,
                    };
                }
                debug!(company = %self.company.0, ship = %ship_id.0, sector = %sector_id.0, "military posted to threatened sector");
                committed += points;
            }
        }
        if defend_only || idle.is_empty() {
            return;
        }
        if !self.behavior.is_pirate && self.behavior.aggressivity < 0.7 {
            return;
        }
        // Offense: hit the weakest defended hostile sector with assets.
        let strength: i32 = idle
            .iter()
            .filter_map(|id| world.spacecraft(id))
            .filter_map(|c| world.description(&c.description))
            .map(|d| d.combat_points)
            .sum();
        let mut target: Option<(SectorId, i32)> = None;
        for sector in &world.sectors {
            let hostile_assets = world.sector_spacecrafts(&sector.id).any(|c| {
                world.hostility(&self.company, &c.company) == Hostility::Hostile
            });
            if !hostile_assets {
                continue;
            }
            let defense: i32 = world
                .sector_spacecrafts(&sector.id)
                .filter(|c| {
                    c.is_operational()
                        && world.hostility(&self.company, &c.company) == Hostility::Hostile
                })
                .filter_map(|c| world.description(&c.description))
                .filter(|d| d.is_military)
                .map(|d| d.combat_points)
                .sum();
            if target.as_ref().map(|(_, d)| defense < *d).unwrap_or(true) {
                target = Some((sector.id.clone(), defense));
            }
        }
        let Some((sector_id, defense)) = target else {
            return;
        };
        if strength as f32 <= defense as f32 * self.behavior.confidence_target {
            return;
        }
        info!(company = %self.company.0, sector = %sector_id.0, strength, defense, "launching offensive");
        for ship_id in idle {
            let days = world
                .spacecraft(&ship_id)
                .map(|c| world.travel_days(&c.sector, &sector_id))
                .unwrap_or(0);
            if let Some(craft) = world.spacecraft_mut(&ship_id) {
                craft.assignment = Assignment::Defense {
                    sector: sector_id.clone(),
                    days_remaining: days,
                };
            }
        }
    }

    /// Release posted ships whose station sector holds no hostile military
    /// anymore, returning them to the idle pool for re-tasking.
    fn stand_down_settled_posts(&mut self, world: &mut World) {
        let posted: Vec<(SpacecraftId, SectorId)> = world
            .company_spacecrafts(&self.company)
            .filter_map(|c| match &c.assignment {
                Assignment::Defense {
                    sector,
                    days_remaining: 0,
                } => Some((c.id.clone(), sector.clone())),
                _ => None,
            })
            .collect();
        for (ship_id, sector_id) in posted {
            let hostiles = world.sector_spacecrafts(&sector_id).any(|c| {
                c.is_operational()
                    && world.hostility(&self.company, &c.company) == Hostility::Hostile
                    && world
                        .description(&c.description)
                        .map(|d| d.is_military)
                        .unwrap_or(false)
            });
            if !hostiles {
                if let Some(craft) = world.spacecraft_mut(&ship_id) {
                    craft.assignment = Assignment::Idle;
                }
                debug!(company = %self.company.0, ship = %ship_id.0, "post stood down");
            }
        }
    }

    /// Repair every damaged hull and top up military maintenance stocks.
    /// Treated as overhead: paid from company cash, not budget-gated.
    pub fn repair_and_refill(&mut self, world: &mut World) {
        let ids: Vec<SpacecraftId> = world
            .company_spacecrafts(&self.company)
            .map(|c| c.id.clone())
            .collect();
        for id in &ids {
            let Some((health, price)) = world.spacecraft(id).and_then(|c| {
                world
                    .description(&c.description)
                    .map(|d| (c.health, d.price))
            }) else {
                continue;
            };
            if health < 1.0 {
                let cost = ((1.0 - health) * price as f32 * REPAIR_COST_RATIO).ceil() as u64;
                let paid = world
                    .company_mut(&self.company)
                    .map(|c| c.take_money(cost))
                    .unwrap_or(false);
                if paid {
                    if let Some(craft) = world.spacecraft_mut(id) {
                        craft.health = 1.0;
                    }
                    debug!(company = %self.company.0, ship = %id.0, cost, "hull repaired");
                }
            }
        }
        // Refill: military hulls draw maintenance resources from local
        // storage at the maintenance price.
        let maintenance: Vec<sim_core::ResourceId> = world
            .resources
            .iter()
            .filter(|r| r.is_maintenance)
            .map(|r| r.id.clone())
            .collect();
        for id in &ids {
            let Some(craft) = world.spacecraft(id) else {
                continue;
            };
            let is_military = world
                .description(&craft.description)
                .map(|d| d.is_military && !d.is_station)
                .unwrap_or(false);
            if !is_military || !craft.is_operational() {
                continue;
            }
            let sector_id = craft.sector.clone();
            let capacity = world.cargo_capacity_of(craft);
            let level = craft.level;
            for resource in &maintenance {
                let aboard = world
                    .spacecraft(id)
                    .map(|c| c.cargo_quantity(resource))
                    .unwrap_or(0);
                let wanted = (MAINT_SUPPLY_PER_LEVEL * level as i64 - aboard).max(0);
                if wanted == 0 {
                    continue;
                }
                let available = world
                    .sector(&sector_id)
                    .map(|s| s.storage_stock(resource))
                    .unwrap_or(0);
                let take = wanted.min(available);
                if take == 0 {
                    continue;
                }
                let unit = world
                    .sector(&sector_id)
                    .and_then(|s| s.prices.get(resource).copied())
                    .or_else(|| world.resource(resource).map(|r| r.max_price))
                    .unwrap_or_default();
                let cost = sim_econ::total_value(
                    sim_econ::context_price(unit, PriceContext::MaintenanceConsumption),
                    take,
                ) as u64;
                let paid = world
                    .company_mut(&self.company)
                    .map(|c| c.take_money(cost))
                    .unwrap_or(false);
                if !paid {
                    continue;
                }
                if let Some(sector) = world.sector_mut(&sector_id) {
                    sector.unstore(resource, take);
                }
                if let Some(craft) = world.spacecraft_mut(id) {
                    craft.load_cargo(resource, take, capacity);
                }
                debug!(company = %self.company.0, ship = %id.0, resource = %resource.0, take, "fleet resupplied");
            }
        }
    }

    /// Per-frame urgency only: idle military already sharing a sector with
    /// hostiles digs in on the spot. No daily analysis is re-run here.
    pub(crate) fn urgent_defense(&mut self, world: &mut World) {
        for ship_id in self.find_idle_military_ships(world) {
            let Some(craft) = world.spacecraft(&ship_id) else {
                continue;
            };
            let sector_id = craft.sector.clone();
            let hostiles_present = world.sector_spacecrafts(&sector_id).any(|c| {
                c.is_operational()
                    && world.hostility(&self.company, &c.company) == Hostility::Hostile
                    && world
                        .description(&c.description)
                        .map(|d| d.is_military)
                        .unwrap_or(false)
            });
            if hostiles_present {
                if let Some(craft) = world.spacecraft_mut(&ship_id) {
                    craft.assignment = Assignment::Defense {
                        sector: sector_id,
                        days_remaining: 0,
                    };
                }
            }
        }
    }
}
