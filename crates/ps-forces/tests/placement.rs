use nalgebra::Vector3;
use ps_config::Element;
use ps_core::FlightConditions;
use ps_forces::{Force, Frame, Placement};

#[test]
fn placement_from_config_in_inches_and_degrees() {
    let el = Element::from_yaml_str(
        "thruster",
        r#"
location:
  "@unit": IN
  x: 39.37007874015748
  y: 0
  z: 0
orientation:
  "@unit": DEG
  roll: 0
  pitch: 0
  yaw: 90
"#,
    )
    .unwrap();

    let p = Placement::from_element(&el).unwrap();
    assert!((p.location.x - 1.0).abs() < 1e-9);
    assert!((p.orientation.z - core::f64::consts::FRAC_PI_2).abs() < 1e-12);

    let mut f = Force::new(Frame::Custom);
    f.set_placement(&p);
    f.native_force = Vector3::new(10.0, 0.0, 0.0);
    let fb = f.body_forces(&FlightConditions::default());
    assert!((fb - Vector3::new(0.0, 10.0, 0.0)).norm() < 1e-9);
    // Side force one metre aft of the CG: arm (-1, 0, 0) × (0, 10, 0).
    assert!((f.moments() - Vector3::new(0.0, 0.0, -10.0)).norm() < 1e-9);
}

#[test]
fn missing_placement_defaults_to_origin() {
    let p = Placement::from_element(&Element::new("thruster")).unwrap();
    assert_eq!(p, Placement::default());
}
