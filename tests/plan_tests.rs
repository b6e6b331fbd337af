// Integration tests for plan generation: topology scaling, placement
// compatibility and the rendered server configs.

use std::path::PathBuf;

use saio_provision::{
    build_provision_plan, place_disk, render, ClusterConfig, Guard, Step, SwiftService,
};
use strum::IntoEnumIterator;

fn custom_config() -> ClusterConfig {
    ClusterConfig {
        nodes: 2,
        disks: 4,
        zones: 2,
        regions: 2,
        part_power: 8,
        replicas: 2,
        ..Default::default()
    }
}

#[test]
fn test_plan_covers_custom_topology() {
    let config = custom_config();
    let plan = build_provision_plan(&config).expect("plan");

    // 4 disks -> 4 symlinks, 2 nodes -> 2 server configs per service
    let links = plan
        .steps
        .iter()
        .filter(|s| matches!(s, Step::Link { .. }))
        .count();
    assert_eq!(links, 4);

    let templates = plan
        .steps
        .iter()
        .filter(|s| matches!(s, Step::Template { .. }))
        .count();
    assert_eq!(templates, 2 * 3);

    // Builder creation picks up part_power and replicas
    assert!(plan.steps.iter().any(|s| matches!(
        s,
        Step::Command { command, .. } if command.contains("object.builder create 8 2 1")
    )));
}

#[test]
fn test_ring_add_specs_match_placement_formula() {
    let config = custom_config();
    let plan = build_provision_plan(&config).expect("plan");

    for service in SwiftService::iter() {
        for disk in 1..=config.disks {
            let expected = place_disk(disk, &config).add_spec(service);
            assert!(
                plan.steps.iter().any(|s| matches!(
                    s,
                    Step::Command { command, .. } if command.contains(&expected)
                )),
                "missing add spec {} for {}",
                expected,
                service
            );
        }
    }
}

#[test]
fn test_spec_reference_placement() {
    // Reference topology: disks=8, nodes=4, zones=2, regions=1
    let config = ClusterConfig::default();
    let device = place_disk(5, &config);
    assert_eq!((device.node, device.zone, device.region), (1, 1, 1));
    assert_eq!(
        device.add_spec(SwiftService::Container),
        "r1z1-127.0.0.1:6011/sdb5"
    );
}

#[test]
fn test_rendered_server_configs_are_complete() {
    let plan = build_provision_plan(&ClusterConfig::default()).expect("plan");

    for step in &plan.steps {
        if let Step::Template { path, template, vars, .. } = step {
            let rendered = render(template, vars).expect("template renders");
            assert!(
                !rendered.contains("{{"),
                "residual placeholder in {}",
                path.display()
            );
            assert!(rendered.contains("[pipeline:main]"));
            assert!(rendered.contains("bind_port = 60"));
        }
    }
}

#[test]
fn test_node1_object_config_values() {
    let plan = build_provision_plan(&ClusterConfig::default()).expect("plan");
    let target = PathBuf::from("/etc/swift/object-server/1.conf");

    let rendered = plan
        .steps
        .iter()
        .find_map(|s| match s {
            Step::Template { path, template, vars, .. } if path == &target => {
                Some(render(template, vars).expect("render"))
            }
            _ => None,
        })
        .expect("object server config for node 1");

    assert!(rendered.contains("devices = /srv/node1"));
    assert!(rendered.contains("bind_port = 6010"));
    assert!(rendered.contains("recon_cache_path = /var/cache/swift/node1"));
}

#[test]
fn test_apt_update_is_marker_guarded_and_first_command() {
    let plan = build_provision_plan(&ClusterConfig::default()).expect("plan");

    let first_guarded = plan
        .steps
        .iter()
        .find(|s| matches!(s, Step::Command { guards, .. } if !guards.is_empty()))
        .expect("plan has guarded commands");

    match first_guarded {
        Step::Command { id, guards, .. } => {
            assert_eq!(id, "apt-get-update");
            assert_eq!(
                guards,
                &vec![Guard::PathExists(PathBuf::from("/tmp/.apt-get-update"))]
            );
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_plan_is_deterministic() {
    let config = custom_config();
    let first = build_provision_plan(&config).expect("plan");
    let second = build_provision_plan(&config).expect("plan");
    assert_eq!(first.steps, second.steps);
}

#[test]
fn test_summary_lists_every_step() {
    let plan = build_provision_plan(&custom_config()).expect("plan");
    let summary = plan.summary();
    assert!(summary.contains(&format!("Steps ({}):", plan.steps.len())));
    assert!(summary.contains("2 node(s), 4 disk(s), 2 zone(s), 2 region(s)"));
}
