use poisson_slab::prelude::*;

/// 10x10 interior, h = 0.1, zero edges and source, a single 10.0 at (1, 1).
fn point_case(max_iterations: usize) -> SolverConfig {
    SolverConfig {
        rows: 10,
        cols: 10,
        spacing: 0.1,
        residual: 1e-12,
        max_iterations,
        boundary: BoundaryValues::uniform(0.0),
        initial: vec![PointValue::new(1, 1, 10.0)],
        ..SolverConfig::default()
    }
}

#[test]
fn single_worker_matches_reference_norms() {
    let one = solve(&point_case(1), &NoComm).unwrap();
    assert_eq!(one.report.global_norm, 112.5);

    let ten = solve(&point_case(10), &NoComm).unwrap();
    assert_eq!(ten.report.status, SolveStatus::IterationLimitReached);
    assert_eq!(ten.report.iterations, 10);
    assert!(
        (ten.report.global_norm - 0.208634816).abs() < 1e-6,
        "norm after 10 iterations: {}",
        ten.report.global_norm
    );
}

#[test]
fn two_workers_agree_with_one_on_first_norm() {
    let sols = run_local(&point_case(1), 2).unwrap();
    assert_eq!(sols.len(), 2);
    for s in &sols {
        assert_eq!(s.report.global_norm, 112.5);
        assert_eq!(s.topology().slab_height(), 5);
    }
}

#[test]
fn two_workers_track_the_reference_for_ten_iterations() {
    let serial = solve(&point_case(10), &NoComm).unwrap();
    for schedule in [ExchangeSchedule::Nonblocking, ExchangeSchedule::Parity] {
        let cfg = SolverConfig {
            exchange: schedule,
            ..point_case(10)
        };
        let sols = run_local(&cfg, 2).unwrap();
        for (a, b) in serial.report.norm_history.iter().zip(&sols[0].report.norm_history) {
            assert!((a - b).abs() <= 1e-12 * a.max(1.0), "{a} vs {b} ({schedule:?})");
        }
        assert!((sols[1].report.global_norm - 0.208634816).abs() < 1e-6);
    }
}

#[test]
fn every_worker_reports_the_same_outcome() {
    let cfg = SolverConfig {
        rows: 16,
        cols: 12,
        residual: 1e-3,
        max_iterations: 5_000,
        ..SolverConfig::default()
    };
    let sols = run_local(&cfg, 4).unwrap();
    let first = &sols[0].report;
    assert!(first.converged());
    for s in &sols[1..] {
        assert_eq!(&s.report, first);
    }
}

#[test]
fn toml_job_runs_end_to_end() {
    let cfg = SolverConfig::from_toml_str(
        r#"
        rows = 10
        cols = 10
        spacing = 0.1
        residual = 1e-12
        max_iterations = 1
        exchange = "parity"

        [boundary]
        left = 0.0

        [[initial]]
        row = 1
        col = 1
        value = 10.0
        "#,
    )
    .unwrap();
    let sols = run_local(&cfg, 5).unwrap();
    assert_eq!(sols[4].report.global_norm, 112.5);
}

#[test]
fn configuration_errors_stop_before_any_iteration() {
    let cfg = SolverConfig {
        rows: 10,
        ..SolverConfig::default()
    };
    let err = run_local(&cfg, 3).unwrap_err();
    assert!(err.is_config_error());

    let huge_spacing = SolverConfig {
        spacing: 1e20,
        ..point_case(1)
    };
    assert!(matches!(
        solve(&huge_spacing, &NoComm),
        Err(SolverError::InvalidConfig(_))
    ));

    let group = LocalComm::group(3);
    let err = JacobiSolver::new(&cfg, &group[0]).err().expect("uneven split must fail");
    assert!(matches!(
        err,
        SolverError::UnevenDecomposition { rows: 10, workers: 3 }
    ));
}
