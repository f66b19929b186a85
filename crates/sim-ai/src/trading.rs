//! Trade dispatcher.
//!
//! For every idle cargo ship the dispatcher runs a best-of search across
//! all (destination, resource) pairs reachable from the ship's sector,
//! threading the running best through `deal_to_beat` so no beaten
//! candidate is rescanned. Winning ships are committed to trade orders and
//! the purchase cost is taken from the trade budget.

use crate::budget::BudgetOutcome;
use crate::CompanyAI;
use sim_core::{
    Assignment, Budget, PriceContext, ResourceId, SectorId, Spacecraft, TradeOrder, World,
};
use tracing::{debug, info};

/// Deals scoring below this are unusable; the ship stays idle instead.
pub(crate) const MIN_DEAL_SCORE: f32 = 1.0;

/// Idle cargo capacity the dispatcher wants on top of construction needs
/// before it stops buying freighters.
const SPARE_CARGO_CAPACITY: i64 = 100;

/// A candidate purchase-and-resale between two sectors. Ephemeral:
/// produced by the deal search and discarded once a ship is committed.
#[derive(Clone, Debug, PartialEq)]
pub struct SectorDeal {
    /// Profitability estimate, gain discounted by travel time.
    pub score: f32,
    pub sector_a: SectorId,
    pub sector_b: SectorId,
    pub resource: ResourceId,
    /// Units to haul, including any already aboard.
    pub buy_quantity: i64,
}

impl CompanyAI {
    /// Best deal for an idle cargo ship sitting in `sector_a`, never worse
    /// than `deal_to_beat`.
    ///
    /// Quantity is capped by ship capacity, purchasable stock at the
    /// origin (plus cargo already aboard) and residual demand at the
    /// destination net of shipments already under way. A resource flagged
    /// globally scarce is never exported out of a sector whose own flow of
    /// it is non-positive.
    pub fn find_best_deal_for_ship_from_sector(
        &self,
        world: &World,
        ship: &Spacecraft,
        sector_a: &SectorId,
        deal_to_beat: Option<SectorDeal>,
    ) -> Option<SectorDeal> {
        let mut best = deal_to_beat;
        let Some(variation_a) = self.variations.get(sector_a) else {
            return best;
        };
        let Some(sector_a_state) = world.sector(sector_a) else {
            return best;
        };
        let capacity = world.cargo_capacity_of(ship);
        for sector_b in world.known_sectors(&self.company) {
            if &sector_b.id == sector_a {
                continue;
            }
            let Some(variation_b) = self.variations.get(&sector_b.id) else {
                continue;
            };
            let travel = world.travel_days(sector_a, &sector_b.id);
            for resource in &world.resources {
                let a = variation_a.resource(&resource.id);
                let b = variation_b.resource(&resource.id);
                let carried = ship.cargo_quantity(&resource.id);
                let consumer_room = if resource.is_consumer {
                    (b.consumer_max_stock - b.storage_stock).max(0)
                } else {
                    0
                };
                let needed = b.demand_capacity() + consumer_room;
                let quantity = capacity.min(a.available_stock() + carried).min(needed);
                if quantity <= 0 {
                    continue;
                }
                let world_flow = self.world_flow.get(&resource.id).copied().unwrap_or(0);
                if world_flow < 0 && a.net_flow() <= 0 {
                    continue;
                }
                let base_a = sector_a_state
                    .prices
                    .get(&resource.id)
                    .copied()
                    .unwrap_or(resource.max_price);
                let base_b = sector_b
                    .prices
                    .get(&resource.id)
                    .copied()
                    .unwrap_or(resource.max_price);
                let buy_units = (quantity - carried).max(0);
                let mut sell_price = sim_econ::context_price(base_b, PriceContext::Default);
                if b.owned_capacity + b.factory_capacity > 0 {
                    sell_price =
                        sell_price.max(sim_econ::context_price(base_b, PriceContext::FactoryInput));
                }
                if consumer_room > 0 {
                    sell_price = sell_price.max(sim_econ::context_price(
                        base_b,
                        PriceContext::ConsumerConsumption,
                    ));
                }
                if b.maintenance_capacity > 0 {
                    sell_price = sell_price.max(sim_econ::context_price(
                        base_b,
                        PriceContext::MaintenanceConsumption,
                    ));
                }
                let buy_price = sim_econ::context_price(base_a, PriceContext::FactoryOutput);
                let gain = sim_econ::total_value(sell_price, quantity)
                    - sim_econ::total_value(buy_price, buy_units)
                    - sim_econ::transport_cost(resource.transport_fee, quantity, travel);
                let score = sim_econ::deal_score(gain, travel);
                let beats = match &best {
                    None => score > 0.0,
                    Some(current) => score > current.score,
                };
                if beats {
                    best = Some(SectorDeal {
                        score,
                        sector_a: sector_a.clone(),
                        sector_b: sector_b.id.clone(),
                        resource: resource.id.clone(),
                        buy_quantity: quantity,
                    });
                }
            }
        }
        best
    }

    /// Commit every idle cargo ship to its best usable deal, spending the
    /// trade budget for the purchases. Claimed stock and booked shipments
    /// are written back into the pass caches so later ships see them.
    pub fn update_trading(&mut self, world: &mut World) {
        for ship_id in self.find_idle_cargos(world) {
            let Some(ship) = world.spacecraft(&ship_id) else {
                continue;
            };
            let sector_a = ship.sector.clone();
            let Some(deal) = self.find_best_deal_for_ship_from_sector(world, ship, &sector_a, None)
            else {
                continue;
            };
            if deal.score < MIN_DEAL_SCORE {
                continue;
            }
            let carried = ship.cargo_quantity(&deal.resource);
            let buy_units = (deal.buy_quantity - carried).max(0);
            let base = world
                .sector(&sector_a)
                .and_then(|s| s.prices.get(&deal.resource).copied())
                .or_else(|| world.resource(&deal.resource).map(|r| r.max_price))
                .unwrap_or_default();
            let cost = sim_econ::total_value(
                sim_econ::context_price(base, PriceContext::FactoryOutput),
                buy_units,
            );
            if !self.ledger.spend(Budget::Trade, cost) {
                debug!(company = %self.company.0, "trade budget exhausted for this pass");
                break;
            }
            if let Some(craft) = world.spacecraft_mut(&ship_id) {
                craft.assignment = Assignment::Trade(TradeOrder {
                    origin: sector_a.clone(),
                    destination: deal.sector_b.clone(),
                    resource: deal.resource.clone(),
                    quantity: deal.buy_quantity,
                    loaded: false,
                    days_remaining: 0,
                });
            }
            info!(
                company = %self.company.0,
                ship = %ship_id.0,
                resource = %deal.resource.0,
                quantity = deal.buy_quantity,
                from = %sector_a.0,
                to = %deal.sector_b.0,
                score = deal.score,
                cost,
                "trade deal committed"
            );
            self.claim_stock(&sector_a, &deal.resource, buy_units);
            if let Some(variation_b) = self.variations.get_mut(&deal.sector_b) {
                variation_b
                    .resources
                    .entry(deal.resource.clone())
                    .or_default()
                    .incoming_resources += deal.buy_quantity;
            }
        }
    }

    /// Trade budget handler: keeps enough idle cargo capacity for trading
    /// and the running construction project, buying freighters otherwise.
    pub(crate) fn process_budget_trade(&mut self, world: &mut World, amount: i64) -> BudgetOutcome {
        let construction_need = self
            .construction
            .as_ref()
            .map(|p| p.need_capacity)
            .unwrap_or(0);
        let wanted = construction_need + SPARE_CARGO_CAPACITY;
        // Damaged hulls return through the repair sweep; buying a new one
        // on top of them would overshoot.
        let expected = self.idle_cargo_capacity + self.damaged_cargos_capacity(world);
        if expected >= wanted {
            return BudgetOutcome::idle();
        }
        if self.is_building_ship(world, false) {
            return BudgetOutcome::locked(0);
        }
        if self.find_shipyards(world).is_empty() {
            return BudgetOutcome::idle();
        }
        let Some(design) = self.find_best_ship_to_build(world, false) else {
            return BudgetOutcome::idle();
        };
        if amount < design.price {
            return BudgetOutcome::locked(0);
        }
        let spent = self.update_cargo_ship_acquisition(world);
        if spent > 0 {
            BudgetOutcome::spent(spent)
        } else {
            BudgetOutcome::locked(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{add_ship, add_station, test_world};
    use rust_decimal::Decimal;
    use sim_core::{CompanyId, SpacecraftTypeId};

    /// Surplus ore in anchor, a hungry steelworks in rim, healthy world
    /// flow: the ship must commit to the ore run and the trade budget must
    /// drop by exactly the purchase cost.
    #[test]
    fn idle_cargo_commits_to_profitable_deal() {
        let mut world = test_world();
        let axis = CompanyId("axis".into());
        let koro = CompanyId("koro".into());
        add_station(
            &mut world,
            &koro,
            &SpacecraftTypeId("ore-mine".into()),
            &SectorId("anchor".into()),
        );
        add_station(
            &mut world,
            &koro,
            &SpacecraftTypeId("steelworks".into()),
            &SectorId("rim".into()),
        );
        let ore = ResourceId("ore".into());
        world
            .sector_mut(&SectorId("anchor".into()))
            .unwrap()
            .store(&ore, 200);
        world
            .sector_mut(&SectorId("anchor".into()))
            .unwrap()
            .prices
            .insert(ore.clone(), Decimal::new(10, 0));
        world
            .sector_mut(&SectorId("rim".into()))
            .unwrap()
            .prices
            .insert(ore.clone(), Decimal::new(38, 0));
        let ship = add_ship(
            &mut world,
            &axis,
            &SpacecraftTypeId("light-freighter".into()),
            &SectorId("anchor".into()),
        );
        // Company has no cash at all; commitment only needs trade budget.
        world.company_mut(&axis).unwrap().money = 0;
        let mut ai = crate::CompanyAI::new(axis);
        ai.ledger_mut().modify(Budget::Trade, 10_000);
        ai.refresh_analysis(&world);
        ai.update_trading(&mut world);
        let craft = world.spacecraft(&ship).unwrap();
        let Assignment::Trade(order) = &craft.assignment else {
            panic!("ship was not committed: {:?}", craft.assignment);
        };
        assert_eq!(order.destination, SectorId("rim".into()));
        assert_eq!(order.resource, ore);
        // Demand at rim: 10 ore/day * 5 buffer days = 50 units.
        assert_eq!(order.quantity, 50);
        // 50 units at 10 * 0.95 = 475 credits off the trade budget.
        assert_eq!(ai.budget(Budget::Trade), 10_000 - 475);
    }

    #[test]
    fn no_deal_without_demand() {
        let mut world = test_world();
        let axis = CompanyId("axis".into());
        let ore = ResourceId("ore".into());
        world
            .sector_mut(&SectorId("anchor".into()))
            .unwrap()
            .store(&ore, 200);
        let ship = add_ship(
            &mut world,
            &axis,
            &SpacecraftTypeId("light-freighter".into()),
            &SectorId("anchor".into()),
        );
        let mut ai = crate::CompanyAI::new(axis);
        ai.ledger_mut().modify(Budget::Trade, 10_000);
        ai.refresh_analysis(&world);
        ai.update_trading(&mut world);
        assert!(world.spacecraft(&ship).unwrap().assignment.is_idle());
        assert_eq!(ai.budget(Budget::Trade), 10_000);
    }

    /// Ore is globally scarce and anchor produces none of it, so exporting
    /// anchor's buffer would worsen the shortage: the dispatcher must
    /// refuse the run even though it would be profitable.
    #[test]
    fn scarce_resource_is_not_exported_from_tight_sector() {
        let mut world = test_world();
        let axis = CompanyId("axis".into());
        let koro = CompanyId("koro".into());
        add_station(
            &mut world,
            &koro,
            &SpacecraftTypeId("steelworks".into()),
            &SectorId("rim".into()),
        );
        let ore = ResourceId("ore".into());
        world
            .sector_mut(&SectorId("anchor".into()))
            .unwrap()
            .store(&ore, 200);
        world
            .sector_mut(&SectorId("anchor".into()))
            .unwrap()
            .prices
            .insert(ore.clone(), Decimal::new(10, 0));
        world
            .sector_mut(&SectorId("rim".into()))
            .unwrap()
            .prices
            .insert(ore.clone(), Decimal::new(38, 0));
        let ship = add_ship(
            &mut world,
            &axis,
            &SpacecraftTypeId("light-freighter".into()),
            &SectorId("anchor".into()),
        );
        let mut ai = crate::CompanyAI::new(axis);
        ai.ledger_mut().modify(Budget::Trade, 10_000);
        ai.refresh_analysis(&world);
        ai.update_trading(&mut world);
        assert!(world.spacecraft(&ship).unwrap().assignment.is_idle());
    }

    #[test]
    fn deal_to_beat_is_never_degraded() {
        let mut world = test_world();
        let axis = CompanyId("axis".into());
        let ship_id = add_ship(
            &mut world,
            &axis,
            &SpacecraftTypeId("light-freighter".into()),
            &SectorId("anchor".into()),
        );
        let mut ai = crate::CompanyAI::new(axis);
        ai.refresh_analysis(&world);
        let unbeatable = SectorDeal {
            score: f32::MAX,
            sector_a: SectorId("anchor".into()),
            sector_b: SectorId("rim".into()),
            resource: ResourceId("ore".into()),
            buy_quantity: 1,
        };
        let ship = world.spacecraft(&ship_id).unwrap().clone();
        let result = ai
            .find_best_deal_for_ship_from_sector(
                &world,
                &ship,
                &SectorId("anchor".into()),
                Some(unbeatable.clone()),
            )
            .unwrap();
        assert_eq!(result, unbeatable);
    }
}
