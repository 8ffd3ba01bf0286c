//! The scenario files shipped under `demos/` must load and run.

use ps_core::LoadContext;
use ps_sim::Scenario;

const DEMOS: [(&str, &str); 2] = [
    ("c172_runup", include_str!("../../../demos/c172_runup.yaml")),
    ("twin_jet_dump", include_str!("../../../demos/twin_jet_dump.yaml")),
];

#[test]
fn demos_build_with_all_record_channels_tied() {
    for (name, text) in DEMOS {
        let scenario = Scenario::from_yaml_str(text).unwrap();
        let sim = scenario.build(&LoadContext::default()).unwrap();
        for channel in &scenario.record {
            assert!(
                sim.properties().contains(channel),
                "{name}: {channel} is not tied"
            );
        }
    }
}

#[test]
fn twin_jet_dump_keeps_the_standpipes() {
    let scenario = Scenario::from_yaml_str(DEMOS[1].1).unwrap();
    let rec = scenario.run(&LoadContext::default()).unwrap();
    let main = rec.last("propulsion/tank[0]/contents-kg").unwrap();
    assert!(main >= 0.0 && main < 900.0);
    assert_eq!(rec.last("propulsion/engines-running"), Some(1.0));
    assert!(rec.last("propulsion/force-x-n").unwrap() > 0.0);
}
