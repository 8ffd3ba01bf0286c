//! Property paths over a [`Propulsion`] tree.
//!
//! Layout:
//! - `propulsion/engine[n]/<command>` read/write engine commands
//! - `propulsion/engine[n]/<telemetry>` read-only engine outputs
//! - `propulsion/engine[n]/thruster/...` thruster state
//! - `propulsion/tank[n]/...` tank state
//! - `propulsion/...` aggregates and fuel-system switches

use ps_core::{CoreResult, PropertyManager};
use ps_engines::EngineCommands;

use crate::propulsion::Propulsion;

pub const ENGINE_ROOT: &str = "propulsion/engine[";

pub fn engine_prefix(n: usize) -> String {
    format!("{ENGINE_ROOT}{n}]/")
}

pub fn tank_prefix(n: usize) -> String {
    format!("propulsion/tank[{n}]/")
}

fn flag(b: bool) -> f64 {
    f64::from(u8::from(b))
}

fn tie_command(
    pm: &mut PropertyManager<Propulsion>,
    n: usize,
    name: &str,
    get: fn(&EngineCommands) -> f64,
    set: fn(&mut EngineCommands, f64),
) -> CoreResult<()> {
    pm.tie_rw(
        format!("{}{name}", engine_prefix(n)),
        move |p: &Propulsion| p.commands(n).map_or(0.0, get),
        move |p: &mut Propulsion, v| {
            if let Some(c) = p.commands_mut(n) {
                set(c, v);
            }
        },
    )
}

/// Ties every path of engine `n`.
pub fn bind_engine(pm: &mut PropertyManager<Propulsion>, p: &Propulsion, n: usize) -> CoreResult<()> {
    let Some(engine) = p.engine(n) else {
        return Ok(());
    };

    tie_command(pm, n, "throttle-cmd-norm", |c| c.throttle, |c, v| c.throttle = v)?;
    tie_command(pm, n, "mixture-cmd-norm", |c| c.mixture, |c, v| c.mixture = v)?;
    tie_command(pm, n, "starter-cmd", |c| flag(c.starter), |c, v| c.starter = v != 0.0)?;
    tie_command(pm, n, "cutoff-cmd", |c| flag(c.cutoff), |c, v| c.cutoff = v != 0.0)?;
    tie_command(
        pm,
        n,
        "magneto-cmd",
        |c| f64::from(c.magnetos),
        |c, v| c.magnetos = v.round().clamp(0.0, 3.0) as u8,
    )?;
    tie_command(
        pm,
        n,
        "augmentation-cmd",
        |c| flag(c.augmentation),
        |c, v| c.augmentation = v != 0.0,
    )?;
    tie_command(pm, n, "injection-cmd", |c| flag(c.injection), |c, v| c.injection = v != 0.0)?;
    tie_command(pm, n, "condition-cmd-norm", |c| c.condition, |c, v| c.condition = v)?;
    tie_command(
        pm,
        n,
        "advance-cmd-norm",
        |c| c.thruster.advance,
        |c, v| c.thruster.advance = v,
    )?;
    tie_command(
        pm,
        n,
        "feather-cmd",
        |c| flag(c.thruster.feather),
        |c, v| c.thruster.feather = v != 0.0,
    )?;
    tie_command(
        pm,
        n,
        "reverse-cmd",
        |c| flag(c.thruster.reverse),
        |c, v| c.thruster.reverse = v != 0.0,
    )?;
    tie_command(
        pm,
        n,
        "reverse-coef-norm",
        |c| c.thruster.reverse_coef,
        |c, v| c.thruster.reverse_coef = v,
    )?;
    tie_command(
        pm,
        n,
        "collective-ctrl-rad",
        |c| c.thruster.collective,
        |c, v| c.thruster.collective = v,
    )?;
    tie_command(
        pm,
        n,
        "lateral-cyclic-ctrl-rad",
        |c| c.thruster.lateral_cyclic,
        |c, v| c.thruster.lateral_cyclic = v,
    )?;
    tie_command(
        pm,
        n,
        "longitudinal-cyclic-ctrl-rad",
        |c| c.thruster.longitudinal_cyclic,
        |c, v| c.thruster.longitudinal_cyclic = v,
    )?;
    tie_command(
        pm,
        n,
        "antitorque-ctrl-rad",
        |c| c.thruster.antitorque,
        |c, v| c.thruster.antitorque = v,
    )?;
    tie_command(
        pm,
        n,
        "rotor-brake-cmd-norm",
        |c| c.thruster.rotor_brake,
        |c, v| c.thruster.rotor_brake = v,
    )?;

    let prefix = engine_prefix(n);
    pm.tie_rw(
        format!("{prefix}set-running"),
        move |p: &Propulsion| p.engine(n).map_or(0.0, |e| flag(e.core.running)),
        move |p: &mut Propulsion, v| {
            if let Some(e) = p.engine_mut(n) {
                if v != 0.0 {
                    e.init_running();
                } else {
                    e.core.running = false;
                }
            }
        },
    )?;
    pm.tie_rw(
        format!("{prefix}compressor-stall-cmd"),
        move |p: &Propulsion| p.engine(n).and_then(|e| e.telemetry("stalled")).unwrap_or(0.0),
        move |p: &mut Propulsion, v| {
            if let Some(e) = p.engine_mut(n) {
                e.set_stalled(v != 0.0);
            }
        },
    )?;
    pm.tie_rw(
        format!("{prefix}seize-cmd"),
        move |p: &Propulsion| p.engine(n).and_then(|e| e.telemetry("seized")).unwrap_or(0.0),
        move |p: &mut Propulsion, v| {
            if let Some(e) = p.engine_mut(n) {
                e.set_seized(v != 0.0);
            }
        },
    )?;

    for name in engine.telemetry_names() {
        pm.tie(
            format!("{prefix}{name}"),
            move |p: &Propulsion| p.engine(n).and_then(|e| e.telemetry(name)).unwrap_or(0.0),
            None,
        )?;
    }

    pm.tie_rw(
        format!("{prefix}thruster/rpm"),
        move |p: &Propulsion| p.engine(n).map_or(0.0, |e| e.thruster.rpm()),
        move |p: &mut Propulsion, v| {
            if let Some(e) = p.engine_mut(n) {
                e.thruster.set_rpm(v);
            }
        },
    )?;
    pm.tie_rw(
        format!("{prefix}thruster/reverser-angle-rad"),
        move |p: &Propulsion| p.engine(n).map_or(0.0, |e| e.thruster.reverser_angle()),
        move |p: &mut Propulsion, v| {
            if let Some(e) = p.engine_mut(n) {
                e.thruster.set_reverser_angle(v);
            }
        },
    )?;
    for name in engine.thruster.telemetry_names() {
        pm.tie(
            format!("{prefix}thruster/{name}"),
            move |p: &Propulsion| {
                p.engine(n)
                    .and_then(|e| e.thruster.telemetry(name))
                    .unwrap_or(0.0)
            },
            None,
        )?;
    }
    pm.tie(
        format!("{prefix}thruster/gear-ratio"),
        move |p: &Propulsion| p.engine(n).map_or(0.0, |e| e.thruster.gear_ratio),
        None,
    )?;
    Ok(())
}

/// Ties every path of tank `n`.
pub fn bind_tank(pm: &mut PropertyManager<Propulsion>, n: usize) -> CoreResult<()> {
    let prefix = tank_prefix(n);
    pm.tie_rw(
        format!("{prefix}contents-kg"),
        move |p: &Propulsion| p.tank(n).map_or(0.0, |t| t.contents()),
        move |p: &mut Propulsion, v| {
            if let Some(t) = p.tank_mut(n) {
                t.set_contents(v);
            }
        },
    )?;
    pm.tie(
        format!("{prefix}capacity-kg"),
        move |p: &Propulsion| p.tank(n).map_or(0.0, |t| t.capacity),
        None,
    )?;
    pm.tie(
        format!("{prefix}pct-full"),
        move |p: &Propulsion| p.tank(n).map_or(0.0, |t| t.pct_full()),
        None,
    )?;
    pm.tie(
        format!("{prefix}volume-m3"),
        move |p: &Propulsion| p.tank(n).map_or(0.0, |t| t.volume()),
        None,
    )?;
    pm.tie(
        format!("{prefix}temperature-k"),
        move |p: &Propulsion| p.tank(n).and_then(|t| t.temperature()).unwrap_or(0.0),
        None,
    )?;
    pm.tie_rw(
        format!("{prefix}priority"),
        move |p: &Propulsion| p.tank(n).map_or(0.0, |t| f64::from(t.priority)),
        move |p: &mut Propulsion, v| {
            if let Some(t) = p.tank_mut(n) {
                t.set_priority(v.max(0.0).round() as u32);
            }
        },
    )?;
    pm.tie_rw(
        format!("{prefix}selected"),
        move |p: &Propulsion| p.tank(n).map_or(0.0, |t| flag(t.is_selected())),
        move |p: &mut Propulsion, v| {
            if let Some(t) = p.tank_mut(n) {
                t.set_selected(v != 0.0);
            }
        },
    )?;
    pm.tie_rw(
        format!("{prefix}external-flow-kgps"),
        move |p: &Propulsion| p.tank(n).map_or(0.0, |t| t.external_flow),
        move |p: &mut Propulsion, v| {
            if let Some(t) = p.tank_mut(n) {
                t.external_flow = v;
            }
        },
    )?;
    Ok(())
}

fn bind_aggregates(pm: &mut PropertyManager<Propulsion>) -> CoreResult<()> {
    pm.tie("propulsion/total-fuel-kg", |p: &Propulsion| p.total_fuel(), None)?;
    pm.tie("propulsion/total-oxidizer-kg", |p: &Propulsion| p.total_oxidizer(), None)?;
    pm.tie(
        "propulsion/total-fuel-flow-kgps",
        |p: &Propulsion| p.output().total_fuel_flow,
        None,
    )?;
    pm.tie(
        "propulsion/engines-running",
        |p: &Propulsion| p.output().engines_running as f64,
        None,
    )?;
    pm.tie("propulsion/force-x-n", |p: &Propulsion| p.output().force.x, None)?;
    pm.tie("propulsion/force-y-n", |p: &Propulsion| p.output().force.y, None)?;
    pm.tie("propulsion/force-z-n", |p: &Propulsion| p.output().force.z, None)?;
    pm.tie("propulsion/moment-l-nm", |p: &Propulsion| p.output().moment.x, None)?;
    pm.tie("propulsion/moment-m-nm", |p: &Propulsion| p.output().moment.y, None)?;
    pm.tie("propulsion/moment-n-nm", |p: &Propulsion| p.output().moment.z, None)?;
    pm.tie_rw(
        "propulsion/fuel-freeze",
        |p: &Propulsion| flag(p.fuel_freeze()),
        |p: &mut Propulsion, v| p.set_fuel_freeze(v != 0.0),
    )?;
    pm.tie_rw(
        "propulsion/fuel-dump",
        |p: &Propulsion| flag(p.is_dumping()),
        |p: &mut Propulsion, v| p.set_dumping(v != 0.0),
    )?;
    pm.tie_rw(
        "propulsion/refuel",
        |p: &Propulsion| flag(p.is_refueling()),
        |p: &mut Propulsion, v| p.set_refueling(v != 0.0),
    )?;
    // Broadcast switches read back engine 0.
    pm.tie_rw(
        "propulsion/starter-cmd",
        |p: &Propulsion| p.commands(0).map_or(0.0, |c| flag(c.starter)),
        |p: &mut Propulsion, v| p.command_all(|c| c.starter = v != 0.0),
    )?;
    pm.tie_rw(
        "propulsion/cutoff-cmd",
        |p: &Propulsion| p.commands(0).map_or(0.0, |c| flag(c.cutoff)),
        |p: &mut Propulsion, v| p.command_all(|c| c.cutoff = v != 0.0),
    )?;
    Ok(())
}

/// Builds the full registry for `p`.
pub fn bind(p: &Propulsion) -> CoreResult<PropertyManager<Propulsion>> {
    let mut pm = PropertyManager::new();
    bind_aggregates(&mut pm)?;
    for n in 0..p.engines().len() {
        bind_engine(&mut pm, p, n)?;
    }
    for n in 0..p.tanks().len() {
        bind_tank(&mut pm, n)?;
    }
    Ok(pm)
}

/// Drops every engine path and ties them again for the current engine list.
pub fn rebind_engines(pm: &mut PropertyManager<Propulsion>, p: &Propulsion) -> CoreResult<()> {
    pm.untie_prefix(ENGINE_ROOT);
    for n in 0..p.engines().len() {
        bind_engine(pm, p, n)?;
    }
    Ok(())
}
