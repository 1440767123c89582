mod helpers;

use ceph_broker::BrokerConfig;
use helpers::{SimCluster, envelope, run};
use serde_json::json;

#[test]
fn create_pool_twice_creates_once() {
    let sim = SimCluster::new(3);
    let broker = sim.broker();
    let request = envelope(json!([{"op": "create-pool", "name": "glance", "replicas": 3}]));
    assert_eq!(run(&broker, &request)["exit-code"], 0);
    assert_eq!(run(&broker, &request)["exit-code"], 0);
    assert_eq!(sim.pools(), vec!["glance".to_string()]);
    assert_eq!(sim.commands_matching("osd pool create").len(), 1);
    assert_eq!(sim.pool_value("glance", "size").as_deref(), Some("3"));
}

#[test]
fn placement_groups_follow_the_cluster_size() {
    let sim = SimCluster::new(3);
    run(
        &sim.broker(),
        &envelope(json!([{"op": "create-pool", "name": "glance", "replicas": 3, "weight": 100}])),
    );
    assert_eq!(
        sim.commands_matching("osd pool create"),
        vec!["ceph --id admin osd pool create glance 128"]
    );

    let sim = SimCluster::new(0);
    run(
        &sim.broker(),
        &envelope(json!([{"op": "create-pool", "name": "glance", "replicas": 3}])),
    );
    assert_eq!(
        sim.commands_matching("osd pool create"),
        vec!["ceph --id admin osd pool create glance 200"]
    );
}

#[test]
fn erasure_pool_needs_its_profile() {
    let sim = SimCluster::new(6);
    let broker = sim.broker();
    let response = run(
        &broker,
        &envelope(json!([{"op": "create-pool", "name": "objects", "pool-type": "erasure", "erasure-profile": "ec42"}])),
    );
    assert_eq!(
        response["stderr"],
        "erasure-profile ec42 does not exist.  Please create it with: create-erasure-profile"
    );
    assert!(sim.pools().is_empty());

    let response = run(
        &broker,
        &envelope(json!([
            {"op": "create-erasure-profile", "name": "ec42", "k": 4, "m": 2, "failure-domain": "rack"},
            {"op": "create-pool", "name": "objects", "pool-type": "erasure", "erasure-profile": "ec42", "max-bytes": 1000},
        ])),
    );
    assert_eq!(response["exit-code"], 0);
    assert_eq!(sim.profile("ec42"), Some((4, 2)));
    // 100 * 6 * 0.1 / 6 = 10 -> 8
    assert_eq!(
        sim.commands_matching("osd pool create"),
        vec!["ceph --id admin osd pool create objects 8 8 erasure ec42"]
    );
    assert_eq!(sim.commands_matching("set-quota").len(), 1);
}

#[test]
fn invalid_failure_domain_issues_no_profile_command() {
    let sim = SimCluster::new(3);
    let response = run(
        &sim.broker(),
        &envelope(json!([{"op": "create-erasure-profile", "name": "ec", "failure-domain": "invalid-domain"}])),
    );
    assert_eq!(response["exit-code"], 1);
    assert!(sim.commands_matching("erasure-code-profile").is_empty());
}

#[test]
fn set_pool_value_guards_keys_and_values() {
    let sim = SimCluster::new(3);
    sim.add_pool("glance");
    let broker = sim.broker();
    for (key, value) in [
        ("erasure_code_profile", json!("x")),
        ("hashpspool", json!("true")),
        ("hit_set_fpp", json!(1.5)),
        ("hit_set_type", json!("cuckoo")),
    ] {
        let response = run(
            &broker,
            &envelope(json!([{"op": "set-pool-value", "name": "glance", "key": key, "value": value}])),
        );
        assert_eq!(response["exit-code"], 1, "{key}");
    }
    assert!(sim.commands_matching("osd pool set").is_empty());

    let response = run(
        &broker,
        &envelope(json!([{"op": "set-pool-value", "name": "glance", "key": "hit_set_fpp", "value": 0.05}])),
    );
    assert_eq!(response["exit-code"], 0);
    assert_eq!(sim.pool_value("glance", "hit_set_fpp").as_deref(), Some("0.05"));
}

#[test]
fn pass_through_ops_report_tool_output() {
    let sim = SimCluster::new(3);
    let response = run(
        &sim.broker(),
        &envelope(json!([{"op": "delete-pool", "name": "ghost"}])),
    );
    assert_eq!(response["exit-code"], 1);
    assert_eq!(response["stderr"], "Error ENOENT: pool 'ghost' does not exist");
}

#[test]
fn cephfs_is_created_once() {
    let sim = SimCluster::new(3);
    sim.add_pool("fs_data");
    sim.add_pool("fs_metadata");
    let broker = sim.broker();
    let request = envelope(json!([{
        "op": "create-cephfs", "mds_name": "fs", "data_pool": "fs_data", "metadata_pool": "fs_metadata"
    }]));
    assert_eq!(run(&broker, &request)["exit-code"], 0);
    assert_eq!(run(&broker, &request)["exit-code"], 0);
    assert_eq!(sim.filesystems(), vec!["fs".to_string()]);
}

#[test]
fn commands_run_as_the_configured_identity() {
    let sim = SimCluster::new(3);
    let config = BrokerConfig {
        service: "broker".into(),
        ..BrokerConfig::default()
    };
    run(
        &sim.broker_with(config),
        &envelope(json!([{"op": "create-pool", "name": "glance", "replicas": 2}])),
    );
    assert!(sim.commands().iter().all(|c| c.contains(" --id broker ")));
}
