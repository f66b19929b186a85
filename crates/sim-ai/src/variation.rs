//! Resource flow analysis.
//!
//! Ephemeral, recomputed every planning pass from the live world; never
//! persisted. Per sector and per resource the analyzer accumulates
//! production and consumption rates, stock at each storage class and the
//! remaining capacity each class could absorb. World-wide net flow flags
//! globally scarce resources the trade dispatcher must not worsen.

use crate::CompanyAI;
use sim_core::{Assignment, ResourceId, Sector, World};
use std::collections::BTreeMap;

/// Days of input stock a factory wants buffered ahead.
pub(crate) const INPUT_TARGET_DAYS: i64 = 5;

/// Days of consumer stock a sector population wants buffered.
const CONSUMER_STOCK_DAYS: i64 = 10;

/// Maintenance resource units a military hull wants aboard, per level.
pub(crate) const MAINT_SUPPLY_PER_LEVEL: i64 = 5;

/// Per-resource integer counters for one sector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceVariation {
    /// Net production rate of the company's own factories, units/day.
    pub owned_flow: i64,
    /// Net production rate of everyone else, including population
    /// consumption, units/day.
    pub factory_flow: i64,
    /// Stock held by the company's own spacecraft.
    pub owned_stock: i64,
    /// Sellable output stock held by other companies' factories.
    pub factory_stock: i64,
    /// Stock in public storage.
    pub storage_stock: i64,
    /// Units already committed to ships bound for this sector.
    pub incoming_resources: i64,
    /// Input buffer space in the company's own factories, plus its own
    /// construction debts.
    pub owned_capacity: i64,
    /// Input buffer space in other companies' factories, plus their
    /// construction debts.
    pub factory_capacity: i64,
    /// Free space in public storage.
    pub storage_capacity: i64,
    /// Maintenance resupply wanted by military hulls present.
    pub maintenance_capacity: i64,
    /// Ceiling of useful consumer stock for the population.
    pub consumer_max_stock: i64,
    /// Ceiling of useful maintenance stock for the hulls present.
    pub maintenance_max_stock: i64,
}

impl ResourceVariation {
    /// Net local production minus consumption, units/day.
    pub fn net_flow(&self) -> i64 {
        self.owned_flow + self.factory_flow
    }

    /// Units this sector could profitably absorb right now.
    pub fn demand_capacity(&self) -> i64 {
        (self.owned_capacity + self.factory_capacity + self.maintenance_capacity
            - self.incoming_resources)
            .max(0)
    }

    /// Units available for purchase here.
    pub fn available_stock(&self) -> i64 {
        self.factory_stock + self.storage_stock
    }
}

/// Resource flows of one sector, plus the cargo capacity already under way
/// toward it.
#[derive(Clone, Debug, Default)]
pub struct SectorVariation {
    pub incoming_capacity: i64,
    pub resources: BTreeMap<ResourceId, ResourceVariation>,
}

impl SectorVariation {
    pub fn resource(&self, id: &ResourceId) -> ResourceVariation {
        self.resources.get(id).cloned().unwrap_or_default()
    }
}

/// Daily rate of one factory line entry at a given station level.
fn daily_rate(quantity: i64, cycle_days: u32, level: u32) -> i64 {
    (quantity * level as i64) / cycle_days.max(1) as i64
}

impl CompanyAI {
    /// Resource flows for one sector, from the company's point of view.
    ///
    /// Pure read-only analysis; must be recomputed whenever the world may
    /// have changed.
    pub fn compute_sector_resource_variation(
        &self,
        world: &World,
        sector: &Sector,
    ) -> SectorVariation {
        let mut variation = SectorVariation::default();
        for craft in world.sector_spacecrafts(&sector.id) {
            let Some(design) = world.description(&craft.description) else {
                continue;
            };
            let owned = craft.company == self.company;
            // Construction debts are demand: deliveries are needed here.
            if let Some(missing) = &craft.under_construction {
                for (resource, quantity) in missing {
                    let slot = variation.resources.entry(resource.clone()).or_default();
                    if owned {
                        slot.owned_capacity += *quantity;
                    } else {
                        slot.factory_capacity += *quantity;
                    }
                }
                continue;
            }
            if !craft.is_operational() {
                continue;
            }
            for factory in &design.factories {
                for input in &factory.cycle_inputs {
                    let rate = daily_rate(input.quantity, factory.cycle_days, craft.level);
                    let target = rate * INPUT_TARGET_DAYS;
                    let buffered = craft.cargo_quantity(&input.resource);
                    let slot = variation.resources.entry(input.resource.clone()).or_default();
                    if owned {
                        slot.owned_flow -= rate;
                        slot.owned_capacity += (target - buffered).max(0);
                    } else {
                        slot.factory_flow -= rate;
                        slot.factory_capacity += (target - buffered).max(0);
                    }
                }
                for output in &factory.cycle_outputs {
                    let rate = daily_rate(output.quantity, factory.cycle_days, craft.level);
                    let held = craft.cargo_quantity(&output.resource);
                    let slot = variation
                        .resources
                        .entry(output.resource.clone())
                        .or_default();
                    if owned {
                        slot.owned_flow += rate;
                        slot.owned_stock += held;
                    } else {
                        slot.factory_flow += rate;
                        slot.factory_stock += held;
                    }
                }
            }
            // Own idle ships' cargo counts as stock we can reuse.
            if owned && !design.is_station && craft.assignment.is_idle() {
                for (resource, quantity) in &craft.cargo {
                    variation
                        .resources
                        .entry(resource.clone())
                        .or_default()
                        .owned_stock += *quantity;
                }
            }
            // Military hulls want maintenance resupply.
            if design.is_military {
                for resource in world.resources.iter().filter(|r| r.is_maintenance) {
                    let wanted = MAINT_SUPPLY_PER_LEVEL * craft.level as i64;
                    let aboard = craft.cargo_quantity(&resource.id);
                    let slot = variation.resources.entry(resource.id.clone()).or_default();
                    slot.maintenance_capacity += (wanted - aboard).max(0);
                    slot.maintenance_max_stock += wanted * 2;
                }
            }
        }
        // Public storage and population demand.
        for resource in &world.resources {
            let slot = variation.resources.entry(resource.id.clone()).or_default();
            slot.storage_stock += sector.storage_stock(&resource.id);
            slot.storage_capacity += sector.storage_space(&resource.id);
            if resource.is_consumer && sector.population > 0 {
                let daily = sim_econ::consumer_daily_demand(sector.population);
                slot.factory_flow -= daily;
                slot.consumer_max_stock += daily * CONSUMER_STOCK_DAYS;
            }
        }
        // Shipments already under way toward this sector.
        for craft in world.spacecrafts.values() {
            match &craft.assignment {
                Assignment::Trade(order) if order.destination == sector.id => {
                    variation
                        .resources
                        .entry(order.resource.clone())
                        .or_default()
                        .incoming_resources += order.quantity;
                    variation.incoming_capacity += world.cargo_capacity_of(craft);
                }
                _ => {}
            }
        }
        variation
    }

    /// World-wide net flow per resource over all known sectors. Negative
    /// totals flag global scarcity.
    pub fn compute_world_resource_flow(&self, world: &World) -> BTreeMap<ResourceId, i64> {
        let mut flow: BTreeMap<ResourceId, i64> = BTreeMap::new();
        for sector in world.known_sectors(&self.company) {
            for craft in world.sector_spacecrafts(&sector.id) {
                if !craft.is_operational() {
                    continue;
                }
                let Some(design) = world.description(&craft.description) else {
                    continue;
                };
                for factory in &design.factories {
                    for input in &factory.cycle_inputs {
                        *flow.entry(input.resource.clone()).or_insert(0) -=
                            daily_rate(input.quantity, factory.cycle_days, craft.level);
                    }
                    for output in &factory.cycle_outputs {
                        *flow.entry(output.resource.clone()).or_insert(0) +=
                            daily_rate(output.quantity, factory.cycle_days, craft.level);
                    }
                }
            }
            for resource in world.resources.iter().filter(|r| r.is_consumer) {
                if sector.population > 0 {
                    *flow.entry(resource.id.clone()).or_insert(0) -=
                        sim_econ::consumer_daily_demand(sector.population);
                }
            }
        }
        flow
    }

    /// Rebuild every per-pass cache from the live world.
    pub(crate) fn refresh_analysis(&mut self, world: &World) {
        self.world_flow = self.compute_world_resource_flow(world);
        self.variations = world
            .known_sectors(&self.company)
            .into_iter()
            .map(|s| (s.id.clone(), self.compute_sector_resource_variation(world, s)))
            .collect();
        self.idle_cargo_capacity = self.compute_idle_cargo_capacity(world);
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil::{add_ship, add_station, test_world};
    use crate::CompanyAI;
    use sim_core::{CompanyId, ResourceId, SectorId, SpacecraftTypeId};

    #[test]
    fn lone_consumer_factory_yields_negative_world_flow() {
        let mut world = test_world();
        // A steelworks eats 10 ore/day; nothing in the world produces ore.
        add_station(
            &mut world,
            &CompanyId("koro".into()),
            &SpacecraftTypeId("steelworks".into()),
            &SectorId("anchor".into()),
        );
        let ai = CompanyAI::new(CompanyId("axis".into()));
        let flow = ai.compute_world_resource_flow(&world);
        assert_eq!(flow.get(&ResourceId("ore".into())), Some(&-10));
        // Its steel output shows up as positive flow.
        assert_eq!(flow.get(&ResourceId("steel".into())), Some(&5));
    }

    #[test]
    fn variation_splits_owned_and_foreign_factories() {
        let mut world = test_world();
        add_station(
            &mut world,
            &CompanyId("axis".into()),
            &SpacecraftTypeId("ore-mine".into()),
            &SectorId("anchor".into()),
        );
        add_station(
            &mut world,
            &CompanyId("koro".into()),
            &SpacecraftTypeId("steelworks".into()),
            &SectorId("anchor".into()),
        );
        let ai = CompanyAI::new(CompanyId("axis".into()));
        let sector = world.sector(&SectorId("anchor".into())).unwrap();
        let variation = ai.compute_sector_resource_variation(&world, sector);
        let ore = variation.resource(&ResourceId("ore".into()));
        assert_eq!(ore.owned_flow, 10); // our mine produces
        assert_eq!(ore.factory_flow, -10); // their steelworks consumes
        assert_eq!(ore.factory_capacity, 50); // 10/day * 5 days buffer
    }

    #[test]
    fn construction_debt_counts_as_capacity() {
        let mut world = test_world();
        let station = add_station(
            &mut world,
            &CompanyId("axis".into()),
            &SpacecraftTypeId("steelworks".into()),
            &SectorId("rim".into()),
        );
        world
            .spacecraft_mut(&station)
            .unwrap()
            .under_construction =
            Some([(ResourceId("steel".into()), 80)].into_iter().collect());
        let ai = CompanyAI::new(CompanyId("axis".into()));
        let sector = world.sector(&SectorId("rim".into())).unwrap();
        let variation = ai.compute_sector_resource_variation(&world, sector);
        let steel = variation.resource(&ResourceId("steel".into()));
        assert_eq!(steel.owned_capacity, 80);
        // An unfinished station neither produces nor consumes.
        assert_eq!(steel.net_flow(), 0);
    }

    #[test]
    fn inbound_shipments_book_into_the_destination() {
        use sim_core::{Assignment, TradeOrder};
        let mut world = test_world();
        let ship = add_ship(
            &mut world,
            &CompanyId("koro".into()),
            &SpacecraftTypeId("light-freighter".into()),
            &SectorId("anchor".into()),
        );
        world.spacecraft_mut(&ship).unwrap().assignment = Assignment::Trade(TradeOrder {
            origin: SectorId("anchor".into()),
            destination: SectorId("rim".into()),
            resource: ResourceId("steel".into()),
            quantity: 60,
            loaded: true,
            days_remaining: 3,
        });
        let ai = CompanyAI::new(CompanyId("axis".into()));
        let rim = world.sector(&SectorId("rim".into())).unwrap();
        let variation = ai.compute_sector_resource_variation(&world, rim);
        assert_eq!(
            variation.resource(&ResourceId("steel".into())).incoming_resources,
            60
        );
        // The whole hull is on its way, whatever it ends up carrying.
        assert_eq!(variation.incoming_capacity, 100);
    }

    #[test]
    fn idle_ship_cargo_counts_as_owned_stock() {
        let mut world = test_world();
        let ship = add_ship(
            &mut world,
            &CompanyId("axis".into()),
            &SpacecraftTypeId("light-freighter".into()),
            &SectorId("anchor".into()),
        );
        world
            .spacecraft_mut(&ship)
            .unwrap()
            .load_cargo(&ResourceId("steel".into()), 30, 100);
        let ai = CompanyAI::new(CompanyId("axis".into()));
        let sector = world.sector(&SectorId("anchor".into())).unwrap();
        let variation = ai.compute_sector_resource_variation(&world, sector);
        assert_eq!(variation.resource(&ResourceId("steel".into())).owned_stock, 30);
    }

}
