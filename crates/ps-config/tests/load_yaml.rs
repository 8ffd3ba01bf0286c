use std::io::Write;

use ps_config::{ConfigError, Element, Table, load_yaml};

const ENGINE: &str = r#"
"@name": O-320
"@type": piston
minmp: 10.0 INHG
maxmp: 28.5 INHG
displacement: 320 IN3
maxhp: 160 HP
thruster:
  "@type": propeller
  ixx: 1.67 SLUG*FT2
  diameter: 76 IN
  numblades: 2
  table:
    - "@name": C_THRUST
      tableData: |
        0.0  0.068
        1.0 -0.010
    - "@name": C_POWER
      tableData: |
        0.0  0.0580
        1.0  0.0100
"#;

#[test]
fn loads_nested_thruster_from_file() {
    let dir = std::env::temp_dir().join(format!("ps-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("engine.yaml");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(ENGINE.as_bytes())
        .unwrap();

    let engine = load_yaml(&path, "engine").unwrap();
    assert_eq!(engine.attribute("type"), Some("piston"));

    let maxmp = engine.find_element_value_as_number_convert_to("maxmp", "PA").unwrap();
    assert!((maxmp - 28.5 * 3386.38).abs() < 1.0);

    let thruster = engine.require("thruster").unwrap();
    let d = thruster.find_element_value_as_number_convert_to("diameter", "M").unwrap();
    assert!((d - 1.9304).abs() < 1e-9);

    let ct = thruster.table_named("C_THRUST").unwrap().unwrap();
    assert!(matches!(ct, Table::OneD(_)));
    assert!((ct.value(0.5) - 0.029).abs() < 1e-12);
    assert!(thruster.table_named("CT_MACH").unwrap().is_none());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_file_is_io_error() {
    let err = load_yaml(std::path::Path::new("/definitely/not/here.yaml"), "x").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn bad_unit_surfaces_at_lookup() {
    let el = Element::from_yaml_str("engine", "maxhp: 160 FURLONGS\n").unwrap();
    let err = el.find_element_value_as_number_convert_to("maxhp", "W").unwrap_err();
    assert!(matches!(err, ConfigError::UnknownUnit { .. }));
}
