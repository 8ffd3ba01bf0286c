//! Fixed-step runner and result recording.

use ps_core::FlightConditions;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::scenario::{ActionDef, EventDef};
use crate::simulation::Simulation;

/// Options for simulation runs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimOptions {
    /// Fixed time step (seconds)
    pub dt: f64,
    /// Final simulation time (seconds)
    pub t_end: f64,
    /// Maximum number of steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 1.0 / 120.0,
            t_end: 10.0,
            max_steps: 1_000_000,
            record_every: 12,
        }
    }
}

impl SimOptions {
    fn validate(&self) -> SimResult<()> {
        if self.dt.is_nan() || self.dt <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if self.t_end.is_nan() || self.t_end < 0.0 {
            return Err(SimError::InvalidArg {
                what: "t_end must be non-negative",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        if self.record_every == 0 {
            return Err(SimError::InvalidArg {
                what: "record_every must be positive",
            });
        }
        Ok(())
    }
}

/// Recorded channels over time. `rows[i][j]` is channel `j` at `t[i]`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SimRecord {
    pub t: Vec<f64>,
    pub channels: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl SimRecord {
    /// Time history of one channel.
    pub fn channel(&self, name: &str) -> Option<Vec<f64>> {
        let j = self.channels.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[j]).collect())
    }

    pub fn last(&self, name: &str) -> Option<f64> {
        let j = self.channels.iter().position(|c| c == name)?;
        self.rows.last().map(|r| r[j])
    }
}

fn sample(sim: &Simulation, channels: &[String]) -> SimResult<Vec<f64>> {
    channels.iter().map(|c| sim.get(c)).collect()
}

fn apply(sim: &mut Simulation, action: &ActionDef) -> SimResult<()> {
    match action {
        ActionDef::SetProperty { path, value } => sim.set(path, *value),
        ActionDef::InitRunning { engine } => sim.propulsion.init_running(*engine),
    }
}

/// Steps `sim` at fixed `opts.dt` under constant flight conditions.
///
/// Events fire on the first step whose start time reaches their `time_s`;
/// events sharing a time fire in list order. Channels are sampled at t = 0,
/// then every `record_every` steps, and always at the final step.
pub fn run(
    sim: &mut Simulation,
    conditions: &FlightConditions,
    events: &[EventDef],
    channels: &[String],
    opts: &SimOptions,
) -> SimResult<SimRecord> {
    opts.validate()?;
    // Fail before stepping if a channel is not tied.
    let first = sample(sim, channels)?;

    let mut pending: Vec<&EventDef> = events.iter().collect();
    pending.sort_by(|a, b| a.time_s.total_cmp(&b.time_s));
    let mut pending = pending.into_iter().peekable();

    let mut fc = conditions.clone();
    fc.dt = opts.dt;

    let mut record = SimRecord {
        t: vec![0.0],
        channels: channels.to_vec(),
        rows: vec![first],
    };

    let mut t = 0.0;
    let mut step = 0;
    while t < opts.t_end - 0.5 * opts.dt && step < opts.max_steps {
        while let Some(ev) = pending.next_if(|ev| ev.time_s <= t + 0.5 * opts.dt) {
            tracing::debug!(t, action = ?ev.action, "event");
            apply(sim, &ev.action)?;
        }
        sim.calculate(&fc);
        t += opts.dt;
        step += 1;

        if step % opts.record_every == 0 {
            record.t.push(t);
            record.rows.push(sample(sim, channels)?);
        }
    }

    if step % opts.record_every != 0 {
        record.t.push(t);
        record.rows.push(sample(sim, channels)?);
    }
    if step == opts.max_steps && t < opts.t_end - 0.5 * opts.dt {
        tracing::warn!(step, t, "run stopped at max_steps");
    }

    Ok(record)
}
