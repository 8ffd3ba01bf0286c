//! Propeller: thrust and power coefficients, pitch governor, spin-up.
//!
//! Coefficient tables are indexed by advance ratio `J = V/(n·D)` and, for
//! variable-pitch propellers, blade pitch in degrees. Thrust is
//! `Ct·n²·D⁴·ρ` and absorbed power is `Cp·n³·D⁵·ρ` with `n` in rev/s.
//!
//! RPM is integrated from the torque left over after the propeller's own
//! demand; the engine sees `RPM × gear_ratio`.

use std::f64::consts::PI;

use nalgebra::Vector3;
use ps_config::Element;
use ps_core::{FlightConditions, LoadContext, Table1D, Table2D, ensure_positive};
use ps_forces::{Force, structural_to_body};

use crate::error::{ThrusterError, ThrusterResult};
use crate::thruster::ThrusterCommands;

/// Below this speed the governor oil pump cannot move the blades.
const GOVERNOR_MIN_RPM: f64 = 200.0;

#[derive(Clone, Debug)]
enum Coefficients {
    Fixed { ct: Table1D, cp: Table1D },
    Variable { ct: Table2D, cp: Table2D },
}

#[derive(Clone, Debug)]
pub struct Propeller {
    /// Polar moment of inertia (kg·m²).
    pub ixx: f64,
    /// Diameter (m).
    pub diameter: f64,
    pub blades: u32,
    /// Blade pitch limits (deg).
    pub min_pitch: f64,
    pub max_pitch: f64,
    pub reverse_pitch: f64,
    /// Governor RPM range.
    pub min_rpm: f64,
    pub max_rpm: f64,
    pub constant_speed: bool,
    /// Acting-location shift per radian of inflow angle (m).
    pub p_factor: f64,
    /// +1 clockwise seen from behind, -1 counter-clockwise.
    pub sense: f64,
    pub ct_factor: f64,
    pub cp_factor: f64,
    coefficients: Coefficients,
    ct_mach: Option<Table1D>,
    cp_mach: Option<Table1D>,

    rpm: f64,
    pitch: f64,
    advance_ratio: f64,
    thrust_coeff: f64,
    power_required: f64,
    excess_torque: f64,
    induced_velocity: f64,
    helical_tip_mach: f64,
    feathered: bool,
    reversed: bool,
    torque: f64,
}

impl Propeller {
    pub fn from_element(el: &Element, ctx: &LoadContext) -> ThrusterResult<Self> {
        let ixx = el.find_element_value_as_number_convert_to("ixx", "KG*M2")?;
        let ixx = ensure_positive(ixx, "propeller ixx")?;
        let diameter = el.find_element_value_as_number_convert_to("diameter", "M")?;
        let diameter = ensure_positive(diameter, "propeller diameter")?;
        let blades = el.number_or("numblades", "", 2.0)? as u32;
        let min_pitch = el.number_or("minpitch", "DEG", 0.0)?;
        let max_pitch = el.number_or("maxpitch", "DEG", min_pitch)?;
        let reverse_pitch = el.number_or("reversepitch", "DEG", 0.0)?;
        let min_rpm = el.number_or("minrpm", "RPM", 0.0)?;
        let max_rpm = el.number_or("maxrpm", "RPM", 0.0)?;
        let constant_speed = el.flag_or("constspeed", false)?;
        let p_factor = el.number_or("p_factor", "M", 0.0)?;
        let sense = match el.number_or("sense", "", 1.0)? {
            s if s < 0.0 => -1.0,
            _ => 1.0,
        };
        let ct_factor = el.number_or("ct_factor", "", 1.0)?;
        let cp_factor = el.number_or("cp_factor", "", 1.0)?;

        let ct = el.table_named("C_THRUST")?.ok_or(ThrusterError::MissingTable {
            what: "propeller",
            name: "C_THRUST",
        })?;
        let cp = el.table_named("C_POWER")?.ok_or(ThrusterError::MissingTable {
            what: "propeller",
            name: "C_POWER",
        })?;

        let coefficients = if max_pitch == min_pitch {
            Coefficients::Fixed {
                ct: ct.into_1d("C_THRUST")?,
                cp: cp.into_1d("C_POWER")?,
            }
        } else {
            Coefficients::Variable {
                ct: ct.into_2d(),
                cp: cp.into_2d(),
            }
        };

        let ct_mach = el
            .table_named("CT_MACH")?
            .map(|t| t.into_1d("CT_MACH"))
            .transpose()?;
        let cp_mach = el
            .table_named("CP_MACH")?
            .map(|t| t.into_1d("CP_MACH"))
            .transpose()?;

        if ctx.verbose() {
            tracing::debug!(
                diameter,
                ixx,
                blades,
                min_pitch,
                max_pitch,
                constant_speed,
                "propeller loaded"
            );
        }

        Ok(Self {
            ixx,
            diameter,
            blades,
            min_pitch,
            max_pitch,
            reverse_pitch,
            min_rpm,
            max_rpm,
            constant_speed,
            p_factor,
            sense,
            ct_factor,
            cp_factor,
            coefficients,
            ct_mach,
            cp_mach,
            rpm: 0.0,
            pitch: min_pitch,
            advance_ratio: 0.0,
            thrust_coeff: 0.0,
            power_required: 0.0,
            excess_torque: 0.0,
            induced_velocity: 0.0,
            helical_tip_mach: 0.0,
            feathered: false,
            reversed: false,
            torque: 0.0,
        })
    }

    /// Fixed-pitch propeller from explicit coefficient tables.
    pub fn fixed_pitch(diameter: f64, ixx: f64, ct: Table1D, cp: Table1D) -> Self {
        Self {
            ixx,
            diameter,
            blades: 2,
            min_pitch: 0.0,
            max_pitch: 0.0,
            reverse_pitch: 0.0,
            min_rpm: 0.0,
            max_rpm: 0.0,
            constant_speed: false,
            p_factor: 0.0,
            sense: 1.0,
            ct_factor: 1.0,
            cp_factor: 1.0,
            coefficients: Coefficients::Fixed { ct, cp },
            ct_mach: None,
            cp_mach: None,
            rpm: 0.0,
            pitch: 0.0,
            advance_ratio: 0.0,
            thrust_coeff: 0.0,
            power_required: 0.0,
            excess_torque: 0.0,
            induced_velocity: 0.0,
            helical_tip_mach: 0.0,
            feathered: false,
            reversed: false,
            torque: 0.0,
        }
    }

    pub fn is_variable_pitch(&self) -> bool {
        matches!(self.coefficients, Coefficients::Variable { .. })
    }

    pub fn rpm(&self) -> f64 {
        self.rpm
    }

    pub fn set_rpm(&mut self, rpm: f64) {
        self.rpm = rpm.max(0.0);
    }

    /// Blade pitch (deg).
    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn set_pitch(&mut self, pitch: f64) {
        self.pitch = pitch.clamp(self.reverse_pitch.min(self.min_pitch), self.max_pitch);
    }

    pub fn advance_ratio(&self) -> f64 {
        self.advance_ratio
    }

    pub fn thrust_coeff(&self) -> f64 {
        self.thrust_coeff
    }

    pub fn power_required(&self) -> f64 {
        self.power_required
    }

    pub fn excess_torque(&self) -> f64 {
        self.excess_torque
    }

    pub fn induced_velocity(&self) -> f64 {
        self.induced_velocity
    }

    pub fn helical_tip_mach(&self) -> f64 {
        self.helical_tip_mach
    }

    pub fn is_feathered(&self) -> bool {
        self.feathered
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Shaft torque reaction about the propeller axis (N·m).
    pub fn torque(&self) -> f64 {
        self.torque
    }

    pub fn reset(&mut self) {
        self.rpm = 0.0;
        self.pitch = self.min_pitch;
        self.advance_ratio = 0.0;
        self.thrust_coeff = 0.0;
        self.power_required = 0.0;
        self.excess_torque = 0.0;
        self.induced_velocity = 0.0;
        self.helical_tip_mach = 0.0;
        self.feathered = false;
        self.reversed = false;
        self.torque = 0.0;
    }

    fn ct_at(&self, j: f64) -> f64 {
        match &self.coefficients {
            Coefficients::Fixed { ct, .. } => ct.value(j),
            Coefficients::Variable { ct, .. } => ct.value(j, self.pitch),
        }
    }

    fn cp_at(&self, j: f64) -> f64 {
        match &self.coefficients {
            Coefficients::Fixed { cp, .. } => cp.value(j),
            Coefficients::Variable { cp, .. } => cp.value(j, self.pitch),
        }
    }

    /// Moves the blades according to the governor, feather or reverse
    /// schedule, then evaluates the power the propeller absorbs at the
    /// current advance ratio.
    fn update_power_required(&mut self, density: f64, dt: f64, cmd: &ThrusterCommands) -> f64 {
        self.feathered = cmd.feather;
        self.reversed = cmd.reverse;

        if self.is_variable_pitch() {
            if self.constant_speed {
                if self.feathered {
                    self.pitch += (self.max_pitch - self.pitch) / 300.0;
                } else if self.reversed {
                    let pitch_req = self.min_pitch
                        - (self.min_pitch - self.reverse_pitch) * cmd.reverse_coef;
                    if self.rpm > GOVERNOR_MIN_RPM {
                        self.pitch += (pitch_req - self.pitch) / 200.0;
                    }
                    if self.rpm > self.max_rpm {
                        self.pitch += (self.max_rpm - self.rpm) / 50.0;
                        self.pitch = self.pitch.clamp(self.reverse_pitch, self.max_pitch);
                    }
                } else {
                    let rpm_req = self.min_rpm + (self.max_rpm - self.min_rpm) * cmd.advance;
                    let d_rpm = rpm_req - self.rpm;
                    if self.rpm > GOVERNOR_MIN_RPM {
                        self.pitch -= d_rpm * dt;
                    }
                    self.pitch = self.pitch.clamp(self.min_pitch, self.max_pitch);
                }
            } else if let Some(pitch) = cmd.pitch {
                self.set_pitch(pitch);
            }
        }

        let mut cp = self.cp_at(self.advance_ratio) * self.cp_factor;
        if let Some(t) = &self.cp_mach {
            cp *= t.value(self.helical_tip_mach);
        }

        let rps = self.rpm / 60.0;
        let local_rps = rps.max(0.01);
        let d5 = self.diameter.powi(5);
        self.power_required = cp * local_rps * rps * local_rps * d5 * density;
        self.power_required
    }

    /// One tick. Returns thrust (N) and sets the native force and moment on
    /// `force`.
    pub fn calculate(
        &mut self,
        engine_power: f64,
        force: &mut Force,
        fc: &FlightConditions,
        cmd: &ThrusterCommands,
    ) -> f64 {
        // Friction stops the propeller outright below 1 RPM.
        if self.rpm < 1.0 {
            self.rpm = 0.0;
        }

        let t = force.transform(fc);
        let arm = structural_to_body(&force.location(), &fc.cg);
        let local_vel = t.transpose() * (fc.uvw_aero + fc.pqr.cross(&arm));
        let vel = local_vel.x;
        let rho = fc.density;
        let rps = self.rpm / 60.0;
        let d = self.diameter;

        let v_tip = rps * d * PI;
        self.helical_tip_mach = if fc.sound_speed > 0.0 {
            (v_tip * v_tip + vel * vel).sqrt() / fc.sound_speed
        } else {
            0.0
        };

        self.advance_ratio = if rps > 0.01 { vel / (d * rps) } else { vel / d };

        let power_required = self.update_power_required(rho, fc.dt, cmd);
        let power_available = engine_power - power_required;

        let mut ct = self.ct_at(self.advance_ratio) * self.ct_factor;
        if let Some(tm) = &self.ct_mach {
            ct *= tm.value(self.helical_tip_mach);
        }
        self.thrust_coeff = ct;

        let thrust = ct * rps * rps * d.powi(4) * rho;

        let area = 0.25 * d * d * PI;
        let vel2sum = vel * vel.abs() + 2.0 * thrust / (rho * area).max(f64::MIN_POSITIVE);
        self.induced_velocity = if vel2sum > 0.0 {
            0.5 * (-vel + vel2sum.sqrt())
        } else {
            0.5 * (-vel - (-vel2sum).sqrt())
        };

        if self.p_factor > 1.0e-4 {
            let tangential = (local_vel.y * local_vel.y + local_vel.z * local_vel.z).sqrt();
            if tangential > 1.0e-4 {
                let angle = tangential.atan2(vel + self.induced_velocity);
                let factor = self.sense * self.p_factor * angle / tangential;
                let loc = force.location();
                force.set_acting_location(Vector3::new(
                    loc.x,
                    loc.y + factor * local_vel.z,
                    loc.z + factor * local_vel.y,
                ));
            }
        }

        let omega = rps * 2.0 * PI;
        let torque = Vector3::new(-self.sense * engine_power / omega.max(0.01), 0.0, 0.0);
        self.torque = torque.x;
        let angular_momentum = Vector3::new(self.ixx * omega * self.sense, 0.0, 0.0);

        self.excess_torque = power_available / omega.max(0.01);
        self.rpm = (rps + self.excess_torque / self.ixx / (2.0 * PI) * fc.dt) * 60.0;
        if self.rpm < 1.0 {
            self.rpm = 0.0;
        }

        force.native_force = Vector3::new(thrust, 0.0, 0.0);
        force.native_moment = fc.pqr.cross(&(t * angular_momentum)) + t * torque;

        thrust
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_forces::Frame;

    #[test]
    fn rejects_zero_diameter() {
        let el = Element::from_yaml_str("propeller", "ixx: 1.5\ndiameter: 0 FT\n").unwrap();
        let err = Propeller::from_element(&el, &LoadContext::default()).unwrap_err();
        assert!(matches!(
            err,
            ThrusterError::Core(ps_core::CoreError::InvalidArg { what: "propeller diameter" })
        ));
    }

    fn simple_prop() -> Propeller {
        let ct = Table1D::new(vec![(0.0, 0.1), (1.0, 0.0), (1.4, -0.05)]).unwrap();
        let cp = Table1D::new(vec![(0.0, 0.05), (1.0, 0.02), (1.4, 0.0)]).unwrap();
        Propeller::fixed_pitch(1.9, 2.0, ct, cp)
    }

    #[test]
    fn friction_stop_below_one_rpm() {
        let mut prop = simple_prop();
        let mut force = Force::new(Frame::Custom);
        let fc = FlightConditions::standard(0.0, 0.0, 0.01);
        prop.set_rpm(0.9);
        let thrust = prop.calculate(0.0, &mut force, &fc, &ThrusterCommands::default());
        assert_eq!(thrust, 0.0);
        assert_eq!(prop.rpm(), 0.0);
    }

    #[test]
    fn static_thrust_and_spin_up() {
        let mut prop = simple_prop();
        let mut force = Force::new(Frame::Custom);
        let fc = FlightConditions::standard(0.0, 0.0, 0.01);
        prop.set_rpm(1000.0);
        let thrust = prop.calculate(100_000.0, &mut force, &fc, &ThrusterCommands::default());
        let n: f64 = 1000.0 / 60.0;
        let expected = 0.1 * n * n * 1.9_f64.powi(4) * fc.density;
        assert!((thrust - expected).abs() < 1e-9);
        assert!(prop.rpm() > 1000.0);
        assert!(prop.induced_velocity() > 0.0);
        assert_eq!(force.native_force.x, thrust);
    }

    #[test]
    fn power_required_matches_cp() {
        let mut prop = simple_prop();
        let mut force = Force::new(Frame::Custom);
        let fc = FlightConditions::standard(0.0, 0.0, 0.01);
        prop.set_rpm(1200.0);
        prop.calculate(0.0, &mut force, &fc, &ThrusterCommands::default());
        let n: f64 = 20.0;
        let expected = 0.05 * n.powi(3) * 1.9_f64.powi(5) * fc.density;
        assert!((prop.power_required() - expected).abs() < 1e-6);
        // Without engine power the propeller slows down.
        assert!(prop.rpm() < 1200.0);
    }

    #[test]
    fn advance_ratio_in_forward_flight() {
        let mut prop = simple_prop();
        let mut force = Force::new(Frame::Custom);
        let fc = FlightConditions::standard(0.0, 50.0, 0.01);
        prop.set_rpm(1800.0);
        prop.calculate(50_000.0, &mut force, &fc, &ThrusterCommands::default());
        assert!((prop.advance_ratio() - 50.0 / (1.9 * 30.0)).abs() < 1e-12);
    }

    #[test]
    fn rpm_never_negative() {
        let mut prop = simple_prop();
        let mut force = Force::new(Frame::Custom);
        let fc = FlightConditions::standard(0.0, 0.0, 0.5);
        prop.set_rpm(50.0);
        prop.calculate(-1.0e6, &mut force, &fc, &ThrusterCommands::default());
        assert_eq!(prop.rpm(), 0.0);
    }
}
