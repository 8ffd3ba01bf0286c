//! Helicopter rotor: a main disc and an optional tail disc on one drive.
//!
//! Each disc keeps its induced inflow `ν` (normalised by tip speed) as
//! state and advances it once per tick by integrating
//!
//! ```text
//! dν/dt = (c0(λ(ν)) − ν) / τ_inflow,    λ = w/(ΩR) − ν
//! ```
//!
//! with the adaptive Runge-Kutta-Fehlberg solver, where `c0` is the
//! momentum-theory equilibrium `C_T / (2·sqrt(μ² + λ²))`. Thrust, coning,
//! flapping, H-force, side force and torque then follow in closed form.
//!
//! Disc forces are formed in hub-shaft axes (x along the in-plane flow
//! reference, z against thrust) and mapped back to the thruster frame.

use std::f64::consts::PI;

use nalgebra::{Matrix3, Vector3};
use ps_config::Element;
use ps_core::{FlightConditions, LagFilter, LoadContext};
use ps_forces::{Force, Placement, structural_to_body};
use ps_solver::{Integrator, Rkf45};

use crate::error::{ThrusterError, ThrusterResult};
use crate::thruster::{ThrusterCommands, frame_from_element};

/// Steps per tick for the inflow integration.
const INFLOW_INTERVALS: usize = 4;
const MAX_MU: f64 = 0.7;

fn tbo_to_hsr() -> Matrix3<f64> {
    Matrix3::new(0.0, 0.0, 1.0, 0.0, 1.0, 0.0, -1.0, 0.0, 0.0)
}

#[derive(Clone, Copy, Debug)]
struct DiscGeometry {
    radius: f64,
    blades: f64,
    chord: f64,
    lift_curve_slope: f64,
    /// Linear blade twist, root to tip (rad).
    twist: f64,
    tip_loss: f64,
    solidity: f64,
    /// Lock number divided by air density.
    lock_per_density: f64,
    inflow_lag: f64,
    sense: f64,
}

impl DiscGeometry {
    fn ct_over_sigma(&self, lambda: f64, mu: f64, theta0: f64) -> f64 {
        let b = self.tip_loss;
        let mu2 = mu * mu;
        let ct_t0 = (b.powi(3) / 3.0 + 0.5 * b * mu2) * theta0;
        let ct_t1 = (0.25 * b.powi(4) + 0.25 * b * mu2) * self.twist;
        let ct_l = (0.5 * b * b + 0.25 * mu2) * lambda;
        0.5 * self.lift_curve_slope * (ct_l + ct_t0 + ct_t1)
    }

    fn equilibrium_inflow(&self, lambda: f64, mu: f64, theta0: f64) -> f64 {
        let ct = self.ct_over_sigma(lambda, mu, theta0) * self.solidity;
        ct / (2.0 * (mu * mu + lambda * lambda).sqrt()).max(1.0e-3)
    }
}

/// One rotor disc and its aerodynamic state.
#[derive(Clone, Debug)]
pub struct RotorDisc {
    geo: DiscGeometry,
    solver: Rkf45,

    nu: f64,
    lambda: f64,
    mu: f64,
    c_t: f64,
    thrust: f64,
    torque: f64,
    h_drag: f64,
    j_side: f64,
    a0: f64,
    a1: f64,
    b1: f64,
    v_induced: f64,
    theta_downwash: f64,
    phi_downwash: f64,
}

impl RotorDisc {
    pub fn from_element(el: &Element) -> ThrusterResult<Self> {
        let diameter = el.find_element_value_as_number_convert_to("diameter", "M")?;
        let blades = el.find_element_value_as_number("numblades")?;
        let chord = el.find_element_value_as_number_convert_to("chord", "M")?;
        if diameter <= 0.0 || blades < 1.0 || chord <= 0.0 {
            return Err(ThrusterError::InvalidArg {
                what: "rotor diameter, blade count and chord must be positive",
            });
        }
        let radius = 0.5 * diameter;
        let lift_curve_slope = el.number_or("liftcurveslope", "", 6.0)?;
        let flap_moment = el.number_or("bladeflappingmoment", "KG*M2", 0.0)?;
        let lock_per_density = if flap_moment > 0.0 {
            lift_curve_slope * chord * radius.powi(4) / flap_moment
        } else {
            0.0
        };
        let inflow_lag = el.number_or("inflowlag", "SEC", 0.2)?;
        if inflow_lag <= 0.0 {
            return Err(ThrusterError::InvalidArg {
                what: "rotor inflow lag must be positive",
            });
        }

        let geo = DiscGeometry {
            radius,
            blades,
            chord,
            lift_curve_slope,
            twist: el.number_or("twist", "RAD", 0.0)?,
            tip_loss: el.number_or("tiplossfactor", "", 1.0)?,
            solidity: blades * chord / (PI * radius),
            lock_per_density,
            inflow_lag,
            sense: if el.number_or("sense", "", 1.0)? < 0.0 { -1.0 } else { 1.0 },
        };
        Ok(Self::with_geometry(geo))
    }

    fn with_geometry(geo: DiscGeometry) -> Self {
        Self {
            geo,
            solver: Rkf45::new().with_epsilon(1.0e-6),
            nu: 0.0,
            lambda: 0.0,
            mu: 0.0,
            c_t: 0.0,
            thrust: 0.0,
            torque: 0.0,
            h_drag: 0.0,
            j_side: 0.0,
            a0: 0.0,
            a1: 0.0,
            b1: 0.0,
            v_induced: 0.0,
            theta_downwash: 0.0,
            phi_downwash: 0.0,
        }
    }

    pub fn radius(&self) -> f64 {
        self.geo.radius
    }

    pub fn solidity(&self) -> f64 {
        self.geo.solidity
    }

    /// Normalised induced inflow.
    pub fn inflow(&self) -> f64 {
        self.nu
    }

    pub fn inflow_ratio(&self) -> f64 {
        self.lambda
    }

    pub fn advance_ratio(&self) -> f64 {
        self.mu
    }

    pub fn thrust_coefficient(&self) -> f64 {
        self.c_t
    }

    pub fn thrust(&self) -> f64 {
        self.thrust
    }

    /// Aerodynamic torque on the shaft (N·m).
    pub fn torque(&self) -> f64 {
        self.torque
    }

    pub fn h_drag(&self) -> f64 {
        self.h_drag
    }

    pub fn side_force(&self) -> f64 {
        self.j_side
    }

    /// Coning angle (rad).
    pub fn coning(&self) -> f64 {
        self.a0
    }

    /// Longitudinal and lateral flapping (rad).
    pub fn flapping(&self) -> (f64, f64) {
        (self.a1, self.b1)
    }

    pub fn induced_velocity(&self) -> f64 {
        self.v_induced
    }

    /// Downwash angles (rad) behind the disc.
    pub fn downwash(&self) -> (f64, f64) {
        (self.theta_downwash, self.phi_downwash)
    }

    fn reset(&mut self) {
        *self = Self::with_geometry(self.geo);
    }

    fn clear_outputs(&mut self) {
        self.lambda = 0.0;
        self.mu = 0.0;
        self.c_t = 0.0;
        self.thrust = 0.0;
        self.torque = 0.0;
        self.h_drag = 0.0;
        self.j_side = 0.0;
        self.a0 = 0.0;
        self.a1 = 0.0;
        self.b1 = 0.0;
        self.v_induced = 0.0;
    }

    /// Advance the disc one tick at shaft speed `omega` (rad/s) and write
    /// its native force and moment into `force`.
    #[allow(clippy::too_many_arguments)]
    pub fn calculate(
        &mut self,
        force: &mut Force,
        fc: &FlightConditions,
        omega: f64,
        theta0: f64,
        lateral_cyclic: f64,
        longitudinal_cyclic: f64,
        flow_scale: f64,
    ) {
        let g = self.geo;
        let t = force.transform(fc);
        let to_hsr = tbo_to_hsr();
        let arm = structural_to_body(&force.location(), &fc.cg);
        let v_hsr = to_hsr * (t.transpose() * (fc.uvw_aero + fc.pqr.cross(&arm)));
        let pqr_hsr = to_hsr * (t.transpose() * fc.pqr);

        let omega_r = omega * g.radius;
        if omega_r < 1.0e-3 {
            self.clear_outputs();
            force.native_force = Vector3::zeros();
            force.native_moment = Vector3::zeros();
            return;
        }

        let beta_orient = v_hsr.y.atan2(v_hsr.x);
        let (sb, cb) = beta_orient.sin_cos();
        let uw = v_hsr.x.hypot(v_hsr.y);
        let w_norm = v_hsr.z / omega_r;
        let mu = (uw / omega_r).min(MAX_MU);
        self.mu = mu;

        let inflow = move |_t: f64, nu: f64| -> f64 {
            (g.equilibrium_inflow(w_norm - nu, mu, theta0) - nu) / g.inflow_lag
        };
        if self.solver.init(0.0, fc.dt, INFLOW_INTERVALS).is_ok() {
            let nu = self.solver.evolve(self.nu, &inflow);
            if self.solver.status().is_ok() {
                self.nu = flow_scale * nu;
            } else {
                tracing::warn!(
                    status = %self.solver.status(),
                    iterations = self.solver.iterations(),
                    "rotor inflow integration failed; keeping previous inflow"
                );
            }
        }

        let rho = fc.density;
        let tip2 = omega_r * omega_r;
        let lambda = w_norm - self.nu;
        self.lambda = lambda;

        let ct_over_sigma = g.ct_over_sigma(lambda, mu, theta0);
        let thrust = g.blades * g.chord * g.radius * rho * tip2 * ct_over_sigma;
        self.thrust = thrust;
        self.c_t = ct_over_sigma * g.solidity;
        self.v_induced = self.nu * omega_r;

        // Coning and flapping, rates resolved into the flow-aligned axes.
        let gamma = rho * g.lock_per_density;
        let p_w = pqr_hsr.x * cb + pqr_hsr.y * sb;
        let q_w = -pqr_hsr.x * sb + pqr_hsr.y * cb;
        let mu2 = mu * mu;
        let t075 = theta0 + 0.75 * g.twist;

        self.a0 = gamma * (t075 * (1.0 + mu2) / 8.0 + lambda / 6.0);
        let (rate_a, rate_b) = if gamma > 1.0e-9 {
            (
                p_w / omega - 16.0 * q_w / (gamma * omega),
                -q_w / omega - 16.0 * p_w / (gamma * omega),
            )
        } else {
            (0.0, 0.0)
        };
        self.a1 = ((2.0 * lambda + 8.0 / 3.0 * t075) * mu + rate_a) / (1.0 - 0.5 * mu2);
        self.b1 = (4.0 / 3.0 * mu * self.a0 + rate_b) / (1.0 + 0.5 * mu2);
        let (a0, a1, b1) = (self.a0, self.a1, self.b1);

        let delta_dr = 0.009
            + 0.3 * (6.0 * self.c_t / (g.lift_curve_slope * g.solidity)).powi(2);
        let area = PI * g.radius * g.radius;
        self.h_drag = rho * area * tip2 * g.solidity * delta_dr * mu / 4.0;

        let cy_over_sigma = 0.5
            * g.lift_curve_slope
            * (0.75 * b1 * lambda - 1.5 * a0 * mu * lambda + 0.25 * a1 * b1 * mu
                - a0 * a1 * mu2
                + a0 * a1 / 6.0
                - (0.75 * mu * a0 - b1 / 3.0 - 0.5 * mu2 * b1) * t075);
        self.j_side = g.blades * g.chord * g.radius * rho * tip2 * cy_over_sigma;

        self.torque = rho * g.blades * g.chord * delta_dr * tip2 * g.radius * g.radius
            * (1.0 + 4.5 * mu2)
            / 8.0
            - (thrust * lambda - self.h_drag * mu) * g.radius;

        let through = self.v_induced - v_hsr.z;
        self.theta_downwash = (-v_hsr.x).atan2(through) + a1;
        self.phi_downwash = v_hsr.y.atan2(through) + b1;

        let fw_x = -self.h_drag - thrust * a1;
        let fw_y = self.j_side + thrust * b1;
        let f_hsr = Vector3::new(
            fw_x * cb - fw_y * sb + thrust * longitudinal_cyclic,
            fw_x * sb + fw_y * cb + thrust * lateral_cyclic,
            -thrust,
        );

        force.native_force = to_hsr.transpose() * f_hsr;
        force.native_moment = t * Vector3::new(-g.sense * self.torque, 0.0, 0.0);
    }
}

/// Tail disc with its own mounting and drive ratio.
#[derive(Clone, Debug)]
pub struct TailRotor {
    pub disc: RotorDisc,
    pub force: Force,
    /// Tail RPM over main RPM.
    pub gear_ratio: f64,
}

#[derive(Clone, Debug)]
pub struct Rotor {
    pub main: RotorDisc,
    pub tail: Option<TailRotor>,

    pub nominal_rpm: f64,
    pub min_rpm: f64,
    pub max_rpm: f64,
    /// Rotor polar moment (kg·m²).
    pub polar_moment: f64,
    /// Drive train inertia referred to the rotor shaft (kg·m²).
    pub gear_moment: f64,
    /// Power lost in the gearbox (W).
    pub gear_loss: f64,
    pub max_brake_power: f64,

    pub ground_effect_exp: f64,
    pub ground_effect_shift: f64,
    pub ground_effect_scale: f64,
    hagl_filter: Option<LagFilter>,
    ground_effect_factor: f64,

    rpm: f64,
    power_required: f64,
    shaft_torque: f64,
}

impl Rotor {
    pub fn from_element(el: &Element, ctx: &LoadContext) -> ThrusterResult<Self> {
        let main = RotorDisc::from_element(el)?;
        let nominal_rpm = el.find_element_value_as_number_convert_to("nominalrpm", "RPM")?;
        if nominal_rpm <= 0.0 {
            return Err(ThrusterError::InvalidArg {
                what: "rotor nominal rpm must be positive",
            });
        }
        let min_rpm = el.number_or("minrpm", "RPM", 1.0)?;
        let max_rpm = el.number_or("maxrpm", "RPM", 2.0 * nominal_rpm)?;
        let polar_moment = el.find_element_value_as_number_convert_to("polarmoment", "KG*M2")?;
        if polar_moment <= 0.0 || max_rpm < min_rpm {
            return Err(ThrusterError::InvalidArg {
                what: "rotor polar moment must be positive and rpm range ordered",
            });
        }

        let tail = match el.find_element("tailrotor") {
            Some(t) => {
                let mut force = Force::new(frame_from_element(t)?);
                force.set_placement(&Placement::from_element(t)?);
                Some(TailRotor {
                    disc: RotorDisc::from_element(t)?,
                    force,
                    gear_ratio: t.number_or("gearratio", "", 1.0)?,
                })
            }
            None => None,
        };

        let rotor = Self {
            main,
            tail,
            nominal_rpm,
            min_rpm,
            max_rpm,
            polar_moment,
            gear_moment: el.number_or("gearmoment", "KG*M2", 0.0)?,
            gear_loss: el.number_or("gearloss", "W", 0.0)?,
            max_brake_power: el.number_or("maxbrakepower", "W", 0.0)?,
            ground_effect_exp: el.number_or("groundeffectexp", "", 0.0)?,
            ground_effect_shift: el.number_or("groundeffectshift", "M", 0.0)?,
            ground_effect_scale: el.number_or("groundeffectscalenorm", "", 1.0)?,
            hagl_filter: None,
            ground_effect_factor: 1.0,
            rpm: min_rpm,
            power_required: 0.0,
            shaft_torque: 0.0,
        };

        if ctx.verbose() {
            tracing::debug!(
                radius = rotor.main.radius(),
                solidity = rotor.main.solidity(),
                nominal_rpm,
                tail = rotor.tail.is_some(),
                "rotor loaded"
            );
        }
        Ok(rotor)
    }

    pub fn rpm(&self) -> f64 {
        self.rpm
    }

    pub fn set_rpm(&mut self, rpm: f64) {
        self.rpm = rpm.clamp(self.min_rpm, self.max_rpm);
    }

    pub fn tail_rpm(&self) -> Option<f64> {
        self.tail.as_ref().map(|t| self.rpm * t.gear_ratio)
    }

    pub fn power_required(&self) -> f64 {
        self.power_required
    }

    /// Total aerodynamic torque referred to the main shaft (N·m).
    pub fn shaft_torque(&self) -> f64 {
        self.shaft_torque
    }

    pub fn ground_effect_factor(&self) -> f64 {
        self.ground_effect_factor
    }

    pub fn reset(&mut self) {
        self.main.reset();
        if let Some(tail) = &mut self.tail {
            tail.disc.reset();
        }
        self.hagl_filter = None;
        self.ground_effect_factor = 1.0;
        self.rpm = self.min_rpm;
        self.power_required = 0.0;
        self.shaft_torque = 0.0;
    }

    fn update_ground_effect(&mut self, fc: &FlightConditions) -> f64 {
        if self.ground_effect_exp <= 1.0e-5 {
            self.ground_effect_factor = 1.0;
            return 1.0;
        }
        if self.hagl_filter.is_none() && fc.dt > 0.0 {
            if let Ok(mut f) = LagFilter::new(1.0, fc.dt) {
                f.reset(fc.h_agl);
                self.hagl_filter = Some(f);
            }
        }
        let filtered = match &mut self.hagl_filter {
            Some(f) if fc.dt > 0.0 => f.execute(fc.h_agl),
            Some(f) => f.output(),
            None => fc.h_agl,
        } + self.ground_effect_shift;

        let factor = 1.0
            - self.ground_effect_scale
                * (-filtered * self.ground_effect_exp).exp()
                * (self.rpm / self.nominal_rpm);
        self.ground_effect_factor = factor.clamp(0.5, 1.0);
        self.ground_effect_factor
    }

    /// One tick. `engine_power` is shaft power (W) delivered through the
    /// gearbox. Returns main rotor thrust (N).
    pub fn calculate(
        &mut self,
        engine_power: f64,
        force: &mut Force,
        fc: &FlightConditions,
        cmd: &ThrusterCommands,
    ) -> f64 {
        let omega = self.rpm * 2.0 * PI / 60.0;
        let flow_scale = self.update_ground_effect(fc);

        self.main.calculate(
            force,
            fc,
            omega,
            cmd.collective,
            cmd.lateral_cyclic,
            cmd.longitudinal_cyclic,
            flow_scale,
        );
        let mut torque = self.main.torque();

        if let Some(tail) = &mut self.tail {
            // Positive pedal commands negative tail collective.
            tail.disc.calculate(
                &mut tail.force,
                fc,
                omega * tail.gear_ratio,
                -cmd.antitorque,
                0.0,
                0.0,
                1.0,
            );
            torque += tail.disc.torque() * tail.gear_ratio;
        }

        self.shaft_torque = torque;
        self.power_required = torque * omega;

        if fc.dt > 0.0 {
            let omega_guard = omega.max(1.0);
            let engine_torque = (engine_power - self.gear_loss).max(0.0) / omega_guard;
            let brake = cmd.rotor_brake.clamp(0.0, 1.0) * self.max_brake_power / omega_guard;
            let net = engine_torque - torque - brake;
            let inertia = self.polar_moment + self.gear_moment;
            self.rpm += net / inertia * fc.dt * 60.0 / (2.0 * PI);
            self.rpm = self.rpm.clamp(self.min_rpm, self.max_rpm);
        }

        self.main.thrust()
    }
}
