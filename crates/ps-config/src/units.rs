//! Unit names accepted in configuration and their conversion to SI.

use uom::si::f64::{
    Angle, AngularVelocity, Area, Force, Length, Mass, Power, Pressure, ThermodynamicTemperature,
    Time, Velocity, Volume,
};

use crate::{ConfigError, ConfigResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimension {
    Length,
    Area,
    Volume,
    Mass,
    Force,
    Power,
    Pressure,
    Velocity,
    Angle,
    AngularVelocity,
    Temperature,
    MomentOfInertia,
    MassRate,
    Density,
    Torque,
    Time,
}

const ALL: [Dimension; 16] = [
    Dimension::Length,
    Dimension::Area,
    Dimension::Volume,
    Dimension::Mass,
    Dimension::Force,
    Dimension::Power,
    Dimension::Pressure,
    Dimension::Velocity,
    Dimension::Angle,
    Dimension::AngularVelocity,
    Dimension::Temperature,
    Dimension::MomentOfInertia,
    Dimension::MassRate,
    Dimension::Density,
    Dimension::Torque,
    Dimension::Time,
];

fn kg_per(mass_unit_kg: f64, seconds: f64) -> f64 {
    mass_unit_kg / seconds
}

/// SI value of one `unit` of the given dimension; temperatures are not
/// linear and are handled in [`temperature_to_k`].
fn linear_factor(unit: &str, dim: Dimension) -> Option<f64> {
    use uom::si::{
        angle, angular_velocity, area, force, length, mass, power, pressure, time, velocity,
        volume,
    };

    let f = match (dim, unit) {
        (Dimension::Length, "M") => 1.0,
        (Dimension::Length, "FT") => Length::new::<length::foot>(1.0).get::<length::meter>(),
        (Dimension::Length, "IN") => Length::new::<length::inch>(1.0).get::<length::meter>(),
        (Dimension::Length, "CM") => Length::new::<length::centimeter>(1.0).get::<length::meter>(),
        (Dimension::Length, "MM") => Length::new::<length::millimeter>(1.0).get::<length::meter>(),
        (Dimension::Length, "KM") => Length::new::<length::kilometer>(1.0).get::<length::meter>(),

        (Dimension::Area, "M2") => 1.0,
        (Dimension::Area, "FT2") => Area::new::<area::square_foot>(1.0).get::<area::square_meter>(),
        (Dimension::Area, "IN2") => Area::new::<area::square_inch>(1.0).get::<area::square_meter>(),

        (Dimension::Volume, "M3") => 1.0,
        (Dimension::Volume, "FT3") => {
            Volume::new::<volume::cubic_foot>(1.0).get::<volume::cubic_meter>()
        }
        (Dimension::Volume, "IN3") => {
            Volume::new::<volume::cubic_inch>(1.0).get::<volume::cubic_meter>()
        }
        (Dimension::Volume, "L") => Volume::new::<volume::liter>(1.0).get::<volume::cubic_meter>(),
        (Dimension::Volume, "GAL") => Volume::new::<volume::gallon>(1.0).get::<volume::cubic_meter>(),
        (Dimension::Volume, "CC") => {
            Volume::new::<volume::cubic_centimeter>(1.0).get::<volume::cubic_meter>()
        }

        (Dimension::Mass, "KG") => 1.0,
        (Dimension::Mass, "G") => Mass::new::<mass::gram>(1.0).get::<mass::kilogram>(),
        (Dimension::Mass, "LBS" | "LB") => Mass::new::<mass::pound>(1.0).get::<mass::kilogram>(),
        (Dimension::Mass, "SLUG") => Mass::new::<mass::slug>(1.0).get::<mass::kilogram>(),

        (Dimension::Force, "N") => 1.0,
        (Dimension::Force, "KN") => Force::new::<force::kilonewton>(1.0).get::<force::newton>(),
        (Dimension::Force, "LBS" | "LBF") => {
            Force::new::<force::pound_force>(1.0).get::<force::newton>()
        }

        (Dimension::Power, "W" | "WATTS") => 1.0,
        (Dimension::Power, "KW") => Power::new::<power::kilowatt>(1.0).get::<power::watt>(),
        (Dimension::Power, "HP") => Power::new::<power::horsepower>(1.0).get::<power::watt>(),

        (Dimension::Pressure, "PA") => 1.0,
        (Dimension::Pressure, "KPA") => {
            Pressure::new::<pressure::kilopascal>(1.0).get::<pressure::pascal>()
        }
        (Dimension::Pressure, "HPA") => {
            Pressure::new::<pressure::hectopascal>(1.0).get::<pressure::pascal>()
        }
        (Dimension::Pressure, "BAR") => Pressure::new::<pressure::bar>(1.0).get::<pressure::pascal>(),
        (Dimension::Pressure, "MBAR") => {
            Pressure::new::<pressure::millibar>(1.0).get::<pressure::pascal>()
        }
        (Dimension::Pressure, "ATM") => {
            Pressure::new::<pressure::atmosphere>(1.0).get::<pressure::pascal>()
        }
        (Dimension::Pressure, "PSI") => {
            Pressure::new::<pressure::pound_force_per_square_inch>(1.0).get::<pressure::pascal>()
        }
        (Dimension::Pressure, "PSF") => {
            Pressure::new::<pressure::pound_force_per_square_foot>(1.0).get::<pressure::pascal>()
        }
        (Dimension::Pressure, "INHG") => {
            Pressure::new::<pressure::inch_of_mercury>(1.0).get::<pressure::pascal>()
        }

        (Dimension::Velocity, "M/S" | "M/SEC") => 1.0,
        (Dimension::Velocity, "FT/S" | "FT/SEC") => {
            Velocity::new::<velocity::foot_per_second>(1.0).get::<velocity::meter_per_second>()
        }
        (Dimension::Velocity, "KTS" | "KNOTS") => {
            Velocity::new::<velocity::knot>(1.0).get::<velocity::meter_per_second>()
        }
        (Dimension::Velocity, "MPH") => {
            Velocity::new::<velocity::mile_per_hour>(1.0).get::<velocity::meter_per_second>()
        }
        (Dimension::Velocity, "KM/H") => {
            Velocity::new::<velocity::kilometer_per_hour>(1.0).get::<velocity::meter_per_second>()
        }

        (Dimension::Angle, "RAD") => 1.0,
        (Dimension::Angle, "DEG") => Angle::new::<angle::degree>(1.0).get::<angle::radian>(),

        (Dimension::AngularVelocity, "RAD/S" | "RAD/SEC") => 1.0,
        (Dimension::AngularVelocity, "DEG/S" | "DEG/SEC") => {
            AngularVelocity::new::<angular_velocity::degree_per_second>(1.0)
                .get::<angular_velocity::radian_per_second>()
        }
        (Dimension::AngularVelocity, "RPM") => {
            AngularVelocity::new::<angular_velocity::revolution_per_minute>(1.0)
                .get::<angular_velocity::radian_per_second>()
        }

        (Dimension::MomentOfInertia, "KG*M2") => 1.0,
        (Dimension::MomentOfInertia, "SLUG*FT2") => {
            Mass::new::<mass::slug>(1.0).get::<mass::kilogram>()
                * Area::new::<area::square_foot>(1.0).get::<area::square_meter>()
        }

        (Dimension::MassRate, "KG/S" | "KG/SEC") => 1.0,
        (Dimension::MassRate, "KG/HR") => kg_per(1.0, Time::new::<time::hour>(1.0).get::<time::second>()),
        (Dimension::MassRate, "LBS/SEC" | "LBS/S") => {
            kg_per(Mass::new::<mass::pound>(1.0).get::<mass::kilogram>(), 1.0)
        }
        (Dimension::MassRate, "LBS/HR" | "PPH") => kg_per(
            Mass::new::<mass::pound>(1.0).get::<mass::kilogram>(),
            Time::new::<time::hour>(1.0).get::<time::second>(),
        ),

        (Dimension::Density, "KG/M3") => 1.0,
        (Dimension::Density, "LBS/GAL") => {
            Mass::new::<mass::pound>(1.0).get::<mass::kilogram>()
                / Volume::new::<volume::gallon>(1.0).get::<volume::cubic_meter>()
        }
        (Dimension::Density, "LBS/FT3" | "SLUG/FT3") => {
            let per = if unit == "LBS/FT3" {
                Mass::new::<mass::pound>(1.0)
            } else {
                Mass::new::<mass::slug>(1.0)
            };
            per.get::<mass::kilogram>()
                / Volume::new::<volume::cubic_foot>(1.0).get::<volume::cubic_meter>()
        }

        (Dimension::Torque, "N*M" | "NM") => 1.0,
        (Dimension::Torque, "FT*LBF" | "LBF*FT" | "FT*LBS") => {
            Force::new::<force::pound_force>(1.0).get::<force::newton>()
                * Length::new::<length::foot>(1.0).get::<length::meter>()
        }

        (Dimension::Time, "S" | "SEC") => 1.0,
        (Dimension::Time, "MIN") => Time::new::<time::minute>(1.0).get::<time::second>(),
        (Dimension::Time, "HR") => Time::new::<time::hour>(1.0).get::<time::second>(),

        _ => return None,
    };
    Some(f)
}

fn temperature_to_k(value: f64, unit: &str) -> Option<f64> {
    use uom::si::thermodynamic_temperature::{
        degree_celsius, degree_fahrenheit, degree_rankine, kelvin,
    };
    let t = match unit {
        "K" | "DEGK" => ThermodynamicTemperature::new::<kelvin>(value),
        "DEGC" => ThermodynamicTemperature::new::<degree_celsius>(value),
        "DEGF" => ThermodynamicTemperature::new::<degree_fahrenheit>(value),
        "DEGR" => ThermodynamicTemperature::new::<degree_rankine>(value),
        _ => return None,
    };
    Some(t.get::<kelvin>())
}

fn temperature_from_k(value: f64, unit: &str) -> Option<f64> {
    use uom::si::thermodynamic_temperature::{
        degree_celsius, degree_fahrenheit, degree_rankine, kelvin,
    };
    let t = ThermodynamicTemperature::new::<kelvin>(value);
    Some(match unit {
        "K" | "DEGK" => value,
        "DEGC" => t.get::<degree_celsius>(),
        "DEGF" => t.get::<degree_fahrenheit>(),
        "DEGR" => t.get::<degree_rankine>(),
        _ => return None,
    })
}

fn knows(unit: &str, dim: Dimension) -> bool {
    match dim {
        Dimension::Temperature => temperature_to_k(0.0, unit).is_some(),
        _ => linear_factor(unit, dim).is_some(),
    }
}

/// Convert `value` expressed in `from` into `to`. Both must name units of
/// the same dimension; `LBS` resolves to mass or force from the target.
pub fn convert(value: f64, from: &str, to: &str) -> ConfigResult<f64> {
    let from_u = from.trim().to_ascii_uppercase();
    let to_u = to.trim().to_ascii_uppercase();
    if from_u == to_u {
        return Ok(value);
    }

    let unknown = || ConfigError::UnknownUnit {
        unit: from.to_string(),
        target: to.to_string(),
    };

    let dim = ALL
        .iter()
        .copied()
        .find(|d| knows(&to_u, *d) && knows(&from_u, *d))
        .ok_or_else(unknown)?;

    if dim == Dimension::Temperature {
        return temperature_to_k(value, &from_u)
            .and_then(|kelvin| temperature_from_k(kelvin, &to_u))
            .ok_or_else(unknown);
    }

    let f_from = linear_factor(&from_u, dim).ok_or_else(unknown)?;
    let f_to = linear_factor(&to_u, dim).ok_or_else(unknown)?;
    Ok(value * f_from / f_to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_core::constants::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6 * b.abs().max(1.0)
    }

    #[test]
    fn english_to_si() {
        assert!(close(convert(1.0, "FT", "M").unwrap(), FT_TO_M));
        assert!(close(convert(1.0, "IN", "M").unwrap(), IN_TO_M));
        assert!(close(convert(1.0, "LBS", "KG").unwrap(), LB_TO_KG));
        assert!(close(convert(1.0, "LBS", "N").unwrap(), LBF_TO_N));
        assert!(close(convert(1.0, "PSI", "PA").unwrap(), PSI_TO_PA));
        assert!(close(convert(1.0, "GAL", "M3").unwrap(), GAL_TO_M3));
        assert!(close(convert(100.0, "HP", "W").unwrap(), 74_569.987));
    }

    #[test]
    fn fuel_density_in_pounds_per_gallon() {
        let rho = convert(6.6, "LBS/GAL", "KG/M3").unwrap();
        assert!(close(rho, 6.6 * LB_TO_KG / GAL_TO_M3));
    }

    #[test]
    fn starter_torque_in_foot_pounds() {
        let t = convert(100.0, "FT*LBF", "N*M").unwrap();
        assert!(close(t, 100.0 * FTLBF_TO_NM));
    }

    #[test]
    fn temperature_is_affine() {
        assert!(close(convert(0.0, "DEGC", "K").unwrap(), 273.15));
        assert!(close(convert(59.0, "DEGF", "K").unwrap(), 288.15));
        assert!(close(convert(288.15, "K", "DEGC").unwrap(), 15.0));
    }

    #[test]
    fn inertia_and_rates() {
        assert!(close(convert(1.0, "SLUG*FT2", "KG*M2").unwrap(), 1.355_817_9));
        assert!(close(convert(3600.0, "LBS/HR", "KG/SEC").unwrap(), LB_TO_KG));
        assert!(close(convert(60.0, "RPM", "RAD/SEC").unwrap(), 2.0 * core::f64::consts::PI));
    }

    #[test]
    fn mismatched_dimensions_fail() {
        assert!(matches!(
            convert(1.0, "FT", "KG"),
            Err(ConfigError::UnknownUnit { .. })
        ));
        assert!(convert(1.0, "FURLONG", "M").is_err());
    }

    #[test]
    fn lowercase_accepted() {
        assert!(close(convert(1.0, "ft", "m").unwrap(), FT_TO_M));
    }
}
