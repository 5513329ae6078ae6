//! Experiment routing properties: registration boundaries, determinism,
//! distribution, metric summaries.

use insight_experiments::{
    ArmConfig, ArmOverrides, Experiment, ExperimentRouter, ExperimentStatus,
};

fn two_arm_experiment(id: &str, w1: f64, w2: f64) -> Experiment {
    Experiment::new(
        id,
        "A vs B",
        vec![
            ArmConfig::new("A", "Arm A", w1),
            ArmConfig::new("B", "Arm B", w2),
        ],
    )
    .with_targets(vec!["/ask".into()])
    .with_status(ExperimentStatus::Active)
}

#[test]
fn registration_weight_boundaries() {
    let router = ExperimentRouter::new();
    assert!(router.register(two_arm_experiment("ok-low", 0.5, 0.49)).is_ok());
    assert!(router.register(two_arm_experiment("ok-high", 0.5, 0.51)).is_ok());
    assert!(router.register(two_arm_experiment("bad-low", 0.5, 0.48)).is_err());
    assert!(router.register(two_arm_experiment("bad-high", 0.5, 0.52)).is_err());
}

#[test]
fn same_user_always_gets_the_same_arm() {
    let router = ExperimentRouter::new();
    router.register(two_arm_experiment("E", 0.5, 0.5)).unwrap();

    let (_, first) = router.arm_for_request("/ask", Some("alice"), Some("E")).unwrap();
    for _ in 0..50 {
        let (_, again) = router.arm_for_request("/ask", Some("alice"), Some("E")).unwrap();
        assert_eq!(first.arm_id, again.arm_id);
    }
}

#[test]
fn ten_thousand_users_split_within_tolerance() {
    let router = ExperimentRouter::new();
    router.register(two_arm_experiment("E", 0.5, 0.5)).unwrap();

    let mut assigned_a = 0usize;
    for i in 0..10_000 {
        let user = format!("user-{i}");
        let (_, arm) = router.arm_for_request("/ask", Some(&user), Some("E")).unwrap();
        if arm.arm_id == "A" {
            assigned_a += 1;
        }
    }
    assert!(
        (4500..=5500).contains(&assigned_a),
        "A received {assigned_a} of 10000"
    );
}

#[test]
fn assignment_is_independent_per_experiment() {
    let router = ExperimentRouter::new();
    router.register(two_arm_experiment("E1", 0.5, 0.5)).unwrap();
    router.register(two_arm_experiment("E2", 0.5, 0.5)).unwrap();

    // The same user may land on different arms in different experiments;
    // what matters is stability within each.
    let (_, e1_first) = router.arm_for_request("/ask", Some("carol"), Some("E1")).unwrap();
    let (_, e2_first) = router.arm_for_request("/ask", Some("carol"), Some("E2")).unwrap();
    let (_, e1_again) = router.arm_for_request("/ask", Some("carol"), Some("E1")).unwrap();
    let (_, e2_again) = router.arm_for_request("/ask", Some("carol"), Some("E2")).unwrap();
    assert_eq!(e1_first.arm_id, e1_again.arm_id);
    assert_eq!(e2_first.arm_id, e2_again.arm_id);
}

#[test]
fn disabled_arm_receives_no_traffic() {
    let router = ExperimentRouter::new();
    let experiment = Experiment::new(
        "D",
        "Disabled arm",
        vec![
            ArmConfig::new("live", "Live", 1.0),
            ArmConfig::new("dead", "Dead", 0.5).disabled(),
        ],
    )
    .with_status(ExperimentStatus::Active);
    router.register(experiment).unwrap();

    for i in 0..200 {
        let user = format!("user-{i}");
        let (_, arm) = router.arm_for_request("/x", Some(&user), Some("D")).unwrap();
        assert_eq!(arm.arm_id, "live");
    }
}

#[test]
fn overrides_merge_into_the_annotation() {
    let router = ExperimentRouter::new();
    let experiment = Experiment::new(
        "O",
        "Override",
        vec![ArmConfig::new("only", "Only Arm", 1.0).with_config(ArmOverrides {
            depth: Some(2),
            use_rerank: Some(false),
            ..Default::default()
        })],
    )
    .with_status(ExperimentStatus::Active);
    router.register(experiment).unwrap();

    let (applied, arm) = router.arm_config_override("/ask", Some("dave"), Some("O")).unwrap();
    assert_eq!(applied.experiment_id, "O");
    assert_eq!(applied.arm_name, "Only Arm");
    assert_eq!(arm.config.depth, Some(2));
    assert_eq!(arm.config.use_rerank, Some(false));
}

#[test]
fn metrics_summarize_per_arm() {
    let router = ExperimentRouter::new();
    router.register(two_arm_experiment("S", 0.5, 0.5)).unwrap();

    for value in [10.0, 20.0, 30.0] {
        router.record("S", "A", "latency_ms", value, None);
    }
    router.record("S", "B", "latency_ms", 100.0, None);
    router.record("S", "B", "quality", "good", None);

    let summary = router.summary("S").unwrap();
    let arm_a = summary.arms.iter().find(|a| a.arm_id == "A").unwrap();
    assert_eq!(arm_a.sample_size, 3);
    let latency = arm_a.statistics.get("latency_ms").unwrap();
    assert!((latency.mean - 20.0).abs() < f64::EPSILON);
    assert!((latency.min - 10.0).abs() < f64::EPSILON);
    assert!((latency.max - 30.0).abs() < f64::EPSILON);

    let arm_b = summary.arms.iter().find(|a| a.arm_id == "B").unwrap();
    assert_eq!(arm_b.sample_size, 2);
    assert!(!arm_b.statistics.contains_key("quality"));
}

#[test]
fn pause_and_resume_traffic() {
    let router = ExperimentRouter::new();
    router.register(two_arm_experiment("P", 0.5, 0.5)).unwrap();
    assert!(router.arm_for_request("/ask", Some("erin"), Some("P")).is_some());

    router.deactivate("P");
    assert!(router.arm_for_request("/ask", Some("erin"), Some("P")).is_none());

    router.activate("P");
    assert!(router.arm_for_request("/ask", Some("erin"), Some("P")).is_some());
}
