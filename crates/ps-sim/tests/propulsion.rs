use ps_config::Element;
use ps_core::{FlightConditions, LoadContext, Tolerances, nearly_equal};
use ps_sim::{ActionDef, EventDef, Propulsion, Scenario, SimOptions, Simulation};

const TWIN_JET: &str = r#"
dumprate: 2 KG/S
tank:
  - "@name": left
    capacity: 400 KG
    contents: 300 KG
  - "@name": right
    capacity: 400 KG
    contents: 300 KG
engine:
  - "@type": turbine
    "@name": J85-left
    feed: [0, 1]
    milthrust: 2850 LBS
    bypassratio: 0.0
    tsfc: 1.03
    thruster:
      "@type": direct
  - "@type": turbine
    "@name": J85-right
    feed: [0, 1]
    milthrust: 2850 LBS
    bypassratio: 0.0
    tsfc: 1.03
    thruster:
      "@type": direct
"#;

fn twin_jet() -> Simulation {
    let el = Element::from_yaml_str("propulsion", TWIN_JET).unwrap();
    Simulation::from_element(&el, &LoadContext::default()).unwrap()
}

fn tol() -> Tolerances {
    Tolerances {
        abs: 1e-6,
        rel: 1e-9,
    }
}

#[test]
fn two_engines_share_tanks_and_sum_their_forces() {
    let mut sim = twin_jet();
    sim.propulsion.init_running(None).unwrap();
    sim.propulsion.command_all(|c| c.throttle = 0.8);
    let fc = FlightConditions::standard(0.0, 0.0, 0.05);

    for _ in 0..200 {
        sim.calculate(&fc);
    }

    let p = &sim.propulsion;
    let thrust: f64 = p.engines().iter().map(|e| e.thrust()).sum();
    let flow: f64 = p.engines().iter().map(|e| e.core.fuel_flow_rate).sum();
    let out = p.output();
    assert_eq!(out.engines_running, 2);
    assert!(thrust > 0.0);
    assert!(nearly_equal(out.force.x, thrust, tol()));
    assert!(nearly_equal(out.total_fuel_flow, flow, tol()));

    let left = p.tank(0).unwrap().contents();
    let right = p.tank(1).unwrap().contents();
    assert!((left - right).abs() < 1e-9);
    assert!(left < 300.0);
    assert!(nearly_equal(
        sim.get("propulsion/total-fuel-kg").unwrap(),
        left + right,
        tol()
    ));
}

#[test]
fn engine_paths_track_the_engine_list() {
    let mut sim = twin_jet();
    assert!(sim.paths().any(|p| p == "propulsion/engine[1]/n2"));
    assert!(sim.paths().any(|p| p == "propulsion/tank[1]/contents-kg"));

    sim.remove_engine(0).unwrap();
    assert!(!sim.paths().any(|p| p.starts_with("propulsion/engine[1]/")));
    assert!(sim.paths().any(|p| p == "propulsion/engine[0]/n2"));
    assert_eq!(sim.propulsion.engine(0).unwrap().name(), "J85-right");
}

#[test]
fn set_running_through_the_property_tree() {
    let mut sim = twin_jet();
    sim.set("propulsion/engine[1]/set-running", 1.0).unwrap();
    assert_eq!(sim.get("propulsion/engine[1]/running").unwrap(), 1.0);
    assert_eq!(sim.get("propulsion/engine[0]/running").unwrap(), 0.0);
}

#[test]
fn unknown_path_is_an_error() {
    let sim = twin_jet();
    assert!(sim.get("propulsion/engine[7]/n1").is_err());
}

#[test]
fn runner_fires_events_and_records_channels() {
    let mut sim = twin_jet();
    let fc = FlightConditions::standard(0.0, 0.0, 0.05);
    let events = vec![
        EventDef {
            time_s: 0.0,
            action: ActionDef::InitRunning { engine: None },
        },
        EventDef {
            time_s: 0.0,
            action: ActionDef::SetProperty {
                path: "propulsion/engine[0]/throttle-cmd-norm".into(),
                value: 1.0,
            },
        },
        EventDef {
            time_s: 1.0,
            action: ActionDef::SetProperty {
                path: "propulsion/fuel-dump".into(),
                value: 1.0,
            },
        },
    ];
    let channels = vec![
        "propulsion/engine[0]/thrust-n".to_string(),
        "propulsion/engine[1]/thrust-n".to_string(),
        "propulsion/fuel-dump".to_string(),
    ];
    let opts = SimOptions {
        dt: 0.05,
        t_end: 2.0,
        max_steps: 1000,
        record_every: 4,
    };
    let rec = ps_sim::run(&mut sim, &fc, &events, &channels, &opts).unwrap();

    assert_eq!(rec.t.first(), Some(&0.0));
    assert!((rec.t.last().unwrap() - 2.0).abs() < 1e-9);
    assert_eq!(rec.t.len(), rec.rows.len());
    assert_eq!(rec.last("propulsion/fuel-dump"), Some(1.0));
    let full = rec.last("propulsion/engine[0]/thrust-n").unwrap();
    let idle = rec.last("propulsion/engine[1]/thrust-n").unwrap();
    assert!(full > idle);
    assert!(sim.propulsion.output().fuel_dumped > 0.0);
}

#[test]
fn runner_rejects_untied_channels() {
    let mut sim = twin_jet();
    let fc = FlightConditions::standard(0.0, 0.0, 0.05);
    let err = ps_sim::run(
        &mut sim,
        &fc,
        &[],
        &["propulsion/nope".to_string()],
        &SimOptions::default(),
    );
    assert!(err.is_err());
}

#[test]
fn scenario_document_runs_end_to_end() {
    let doc = r#"
name: electric taxi
conditions: { altitude_m: 0.0, airspeed_mps: 0.0 }
options: { dt: 0.01, t_end: 1.0, record_every: 10 }
init_running: true
events:
  - time_s: 0.0
    action: { type: SetProperty, path: "propulsion/engine[0]/throttle-cmd-norm", value: 1.0 }
record:
  - "propulsion/engine[0]/power-w"
propulsion:
  engine:
    - "@type": electric
      "@name": motor
      power: 10 KW
      thruster:
        "@type": direct
"#;
    let scenario = Scenario::from_yaml_str(doc).unwrap();
    let rec = scenario.run(&LoadContext::default()).unwrap();
    assert_eq!(rec.t.len(), 11);
    assert!(rec.last("propulsion/engine[0]/power-w").unwrap() > 0.0);
}

#[test]
fn empty_propulsion_has_only_aggregates() {
    let sim = Simulation::new(Propulsion::default()).unwrap();
    assert!(sim.paths().all(|p| !p.contains('[')));
    assert_eq!(sim.get("propulsion/engines-running").unwrap(), 0.0);
}
