use ps_config::Element;
use ps_core::{FlightConditions, LoadContext};
use ps_thrusters::{Thruster, ThrusterCommands, ThrusterKind};

const PROPELLER: &str = r#"
"@type": propeller
"@name": prop
ixx: 1.67 SLUG*FT2
diameter: 76 IN
numblades: 2
gearratio: 1.0
location:
  "@unit": IN
  x: -40
  y: 0
  z: 0
table:
  - "@name": C_THRUST
    tableData: |
      0.0  0.068
      0.6  0.040
      1.0 -0.010
  - "@name": C_POWER
    tableData: |
      0.0  0.0580
      0.6  0.0450
      1.0  0.0100
"#;

const HELICOPTER: &str = r#"
"@type": rotor
diameter: 10.0 M
numblades: 2
chord: 0.3 M
liftcurveslope: 5.7
bladeflappingmoment: 200 KG*M2
inflowlag: 0.1 SEC
nominalrpm: 400
polarmoment: 1500 KG*M2
orientation:
  "@unit": DEG
  pitch: 90
tailrotor:
  diameter: 2.0 M
  numblades: 2
  chord: 0.15 M
  liftcurveslope: 5.7
  gearratio: 5.0
  location:
    "@unit": M
    x: 7.0
  orientation:
    "@unit": DEG
    yaw: 90
"#;

#[test]
fn propeller_spins_up_and_pulls_forward() {
    let el = Element::from_yaml_str("thruster", PROPELLER).unwrap();
    let mut t = Thruster::from_element(&el, &LoadContext::default()).unwrap();
    assert_eq!(t.name, "prop");
    assert!(matches!(t.kind, ThrusterKind::Propeller(_)));

    let fc = FlightConditions::standard(0.0, 0.0, 0.01);
    t.set_rpm(500.0);
    for _ in 0..200 {
        t.calculate(100_000.0, &fc, &ThrusterCommands::default());
    }
    assert!(t.rpm() > 500.0);
    let f = t.body_forces(&fc);
    assert!(f.x > 0.0);
    assert!(f.y.abs() < 1e-9 && f.z.abs() < 1e-9);
    assert_eq!(t.engine_rpm(), t.rpm());
}

#[test]
fn helicopter_rotor_lifts_and_tail_pushes_sideways() {
    let el = Element::from_yaml_str("thruster", HELICOPTER).unwrap();
    let mut t = Thruster::from_element(&el, &LoadContext::default()).unwrap();
    let fc = FlightConditions::standard(50.0, 0.0, 0.01);
    let cmd = ThrusterCommands {
        collective: 8.0_f64.to_radians(),
        antitorque: -10.0_f64.to_radians(),
        ..Default::default()
    };

    for _ in 0..300 {
        t.set_rpm(400.0);
        let power = t.power_required().max(0.0);
        t.calculate(power, &fc, &cmd);
    }
    let rotor = t.rotor().unwrap();
    assert!(rotor.main.thrust() > 0.0);
    let tail = rotor.tail.as_ref().unwrap();
    assert!(tail.disc.thrust() > 0.0);
    assert!((rotor.tail_rpm().unwrap() - 5.0 * rotor.rpm()).abs() < 1e-9);
    assert!(rotor.shaft_torque() > rotor.main.torque());

    let f = t.body_forces(&fc);
    assert!(f.z < 0.0);
    assert!(f.y > 0.0);
}

#[test]
fn missing_power_table_is_reported() {
    let doc = PROPELLER.replace("C_POWER", "C_OTHER");
    let el = Element::from_yaml_str("thruster", &doc).unwrap();
    let err = Thruster::from_element(&el, &LoadContext::default()).unwrap_err();
    assert!(err.to_string().contains("C_POWER"));
}
