//! Cascade levers: building power modes and throttleable sources.
//!
//! Every lever takes the remaining need (deficit levers) or excess (surplus
//! levers) as a positive kW figure, applies changes until that figure
//! reaches zero or the lever is exhausted, and returns what is left.

use tracing::{debug, info};

use super::balance::ROLLING_FACTOR;
use super::event::{EventQueue, GridEvent};
use crate::building::{Building, PowerMode};
use crate::inventory::ResourceStore;
use crate::sources::{AdjustableLoad, PowerSource};

fn switch_mode(building: &mut Building, to: PowerMode, events: &mut EventQueue) {
    let from = building.power_mode();
    building.set_power_mode(to);
    info!(building = %building.name, %from, %to, "building power mode changed");
    events.push(GridEvent::BuildingPowerMode {
        building: building.id,
        from,
        to,
    });
}

/// Whether the shedding pass for `life_support` may switch `building` down.
///
/// Buildings that host generation are only shed when they house life
/// support; otherwise their generators would shut down with them.
fn sheddable(building: &Building, life_support: bool) -> bool {
    building.life_support == life_support
        && (building.life_support || building.generation.is_none())
        && building.power_required() > 0.0
}

/// Lowers buildings with the given life-support flag, `FULL → LOW` for all
/// of them first and then `LOW → NONE`.
///
/// Each switch counts `ROLLING_FACTOR ×` the demand it saves against `needed`.
/// Buildings that draw nothing in their current mode are left alone, as are
/// generator hosts without life support.
pub fn shed_buildings(
    buildings: &mut [Building],
    life_support: bool,
    mut needed: f64,
    events: &mut EventQueue,
) -> f64 {
    for from in [PowerMode::Full, PowerMode::Low] {
        let Some(to) = from.lowered() else {
            continue;
        };
        for building in buildings
            .iter_mut()
            .filter(|b| b.power_mode() == from && sheddable(b, life_support))
        {
            let saved = building.power_required_in(from) - building.power_required_in(to);
            switch_mode(building, to, events);
            needed -= ROLLING_FACTOR * saved;
            if needed <= 0.0 {
                return needed;
            }
        }
    }
    needed
}

/// Raises buildings with the given life-support flag, `NONE → LOW` for all
/// of them first and then `LOW → FULL`.
///
/// A building is raised only if `ROLLING_FACTOR ×` its extra demand fits in
/// `excess`, so the next tick cannot swing into deficit because of it.
pub fn restore_buildings(
    buildings: &mut [Building],
    life_support: bool,
    mut excess: f64,
    events: &mut EventQueue,
) -> f64 {
    for from in [PowerMode::None, PowerMode::Low] {
        let Some(to) = from.raised() else {
            continue;
        };
        for building in buildings
            .iter_mut()
            .filter(|b| b.life_support == life_support && b.power_mode() == from)
        {
            let cost = ROLLING_FACTOR
                * (building.power_required_in(to) - building.power_required_in(from));
            if cost > excess {
                continue;
            }
            switch_mode(building, to, events);
            excess -= cost;
            if excess <= 0.0 {
                return excess;
            }
        }
    }
    excess
}

/// Whether every life-support building is at full power.
pub fn life_support_at_full(buildings: &[Building]) -> bool {
    buildings
        .iter()
        .filter(|b| b.life_support)
        .all(|b| b.power_mode() == PowerMode::Full)
}

/// Raises every reactor by one notch, counting the added output against `needed`.
pub fn raise_reactors(buildings: &mut [Building], mut needed: f64, events: &mut EventQueue) -> f64 {
    for building in buildings.iter_mut() {
        let id = building.id;
        let Some(generation) = building.generation.as_mut() else {
            continue;
        };
        for source in generation.sources_mut() {
            let PowerSource::Reactor(reactor) = source else {
                continue;
            };
            let before = reactor.current_power();
            if !reactor.increase_load_capacity() {
                continue;
            }
            needed -= reactor.current_power() - before;
            debug!(building = %id, load = reactor.load_capacity(), "reactor raised");
            events.push(GridEvent::ReactorLoad {
                building: id,
                percent: reactor.load_capacity(),
            });
            if needed <= 0.0 {
                return needed;
            }
        }
    }
    needed
}

/// Lowers reactors by one notch where the lost output fits in `excess`.
///
/// At most `limit` reactors are lowered when a limit is given.
pub fn lower_reactors(
    buildings: &mut [Building],
    mut excess: f64,
    limit: Option<usize>,
    events: &mut EventQueue,
) -> f64 {
    let mut lowered = 0;
    for building in buildings.iter_mut() {
        let id = building.id;
        let Some(generation) = building.generation.as_mut() else {
            continue;
        };
        for source in generation.sources_mut() {
            if limit.is_some_and(|n| lowered >= n) {
                return excess;
            }
            let PowerSource::Reactor(reactor) = source else {
                continue;
            };
            let next = (reactor.load_capacity() - reactor.load_step()).max(reactor.min_load());
            let delta = reactor.current_power() - reactor.request_power(next);
            if delta <= 0.0 || delta > excess {
                continue;
            }
            reactor.decrease_load_capacity();
            excess -= delta;
            lowered += 1;
            debug!(building = %id, load = reactor.load_capacity(), "reactor lowered");
            events.push(GridEvent::ReactorLoad {
                building: id,
                percent: reactor.load_capacity(),
            });
            if excess <= 0.0 {
                return excess;
            }
        }
    }
    excess
}

/// Brings fuel generators up to at least `target` percent load.
///
/// Generators in shut-down buildings are skipped, as are generators whose
/// tank and settlement stock cannot feed a tick at the new load.
pub fn raise_fuel_generators(
    buildings: &mut [Building],
    target: f64,
    mut needed: f64,
    hours: f64,
    store: &dyn ResourceStore,
    events: &mut EventQueue,
) -> f64 {
    for building in buildings.iter_mut() {
        if building.power_mode() == PowerMode::None {
            continue;
        }
        let id = building.id;
        let Some(generation) = building.generation.as_mut() else {
            continue;
        };
        for source in generation.sources_mut() {
            let PowerSource::Fuel(generator) = source else {
                continue;
            };
            let percent = generator.load_capacity().max(target);
            let delta = generator.request_power(percent) - generator.committed_power();
            if delta <= 0.0 {
                continue;
            }
            if !generator.can_sustain(percent, hours, store) {
                debug!(building = %id, "fuel generator left idle, not enough fuel");
                continue;
            }
            let was_on = generator.is_on();
            generator.set_load_capacity(percent);
            if !was_on {
                info!(building = %id, "fuel generator turned on");
                events.push(GridEvent::FuelGeneratorToggle {
                    building: id,
                    on: true,
                });
            }
            events.push(GridEvent::FuelGeneratorLoad {
                building: id,
                percent,
            });
            needed -= delta;
            if needed <= 0.0 {
                return needed;
            }
        }
    }
    needed
}

/// Steps running fuel generators down while the lost output fits in `excess`.
///
/// A generator stepped to 0 % is turned off.
pub fn lower_fuel_generators(
    buildings: &mut [Building],
    mut excess: f64,
    events: &mut EventQueue,
) -> f64 {
    for building in buildings.iter_mut() {
        let id = building.id;
        let Some(generation) = building.generation.as_mut() else {
            continue;
        };
        for source in generation.sources_mut() {
            let PowerSource::Fuel(generator) = source else {
                continue;
            };
            while generator.committed_power() > 0.0 {
                let next = (generator.load_capacity() - generator.load_step()).max(0.0);
                let delta = generator.committed_power() - generator.request_power(next);
                if delta > excess {
                    break;
                }
                generator.set_load_capacity(next);
                excess -= delta;
                events.push(GridEvent::FuelGeneratorLoad {
                    building: id,
                    percent: next,
                });
                if !generator.is_on() {
                    info!(building = %id, "fuel generator turned off");
                    events.push(GridEvent::FuelGeneratorToggle {
                        building: id,
                        on: false,
                    });
                }
                if excess <= 0.0 {
                    return excess;
                }
            }
        }
    }
    excess
}
