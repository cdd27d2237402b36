//! Integration tests for u-cutlist-d1.

use std::collections::BTreeMap;
use u_cutlist_d1::{
    BranchAndBound, BranchBoundConfig, Error, Nester1D, NestingConfig, NestingReport, SolveStatus,
    TieBreak, MAX_LENGTH,
};

/// Checks that every part is cut exactly once and no stock piece is overfilled.
fn assert_valid_cut_list(config: &NestingConfig, report: &NestingReport) {
    let kerf = config.effective_kerf_width();
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();

    for usage in &report.stock_usage {
        assert!(!usage.part_ids.is_empty());
        let lengths: u64 = usage
            .part_ids
            .iter()
            .map(|id| config.parts[id.as_str()] as u64)
            .sum();
        assert_eq!(lengths, usage.length_utilised);
        assert_eq!(usage.kerf_loss, kerf * (usage.part_ids.len() as u64 - 1));
        assert!(
            usage.length_utilised + usage.kerf_loss <= usage.stock_length,
            "stock {} overfilled",
            usage.stock_id
        );
        for id in &usage.part_ids {
            *seen.entry(id.as_str()).or_default() += 1;
        }
    }

    assert_eq!(seen.len(), config.parts.len());
    assert!(seen.values().all(|&n| n == 1));
}

/// Larger instance with a loose bound: three offcuts and enough 6000 bars.
fn synthetic_config(parts: usize) -> NestingConfig {
    let mut config = NestingConfig::new();
    for i in 0..parts {
        config = config.with_part(format!("p{:03}", i), 400 + (i as i64 * 733) % 2600);
    }
    for i in 0..3 {
        config = config.with_offcut(format!("o{:03}", i), 500 + i as i64 * 450);
    }
    for i in 0..(parts / 2 + 1) {
        config = config.with_new_stock(format!("n{:03}", i), 6000);
    }
    config
}

/// Cheapest cost value over every part → stock assignment.
fn brute_force_cost(config: &NestingConfig) -> Option<u64> {
    let kerf = config.effective_kerf_width();
    let parts: Vec<u64> = config.parts.values().map(|&l| l as u64).collect();
    let stock: Vec<(u64, u64)> = config
        .existing_offcuts
        .values()
        .map(|&l| (l as u64, l as u64 / 2))
        .chain(config.new_stock.values().map(|&l| (l as u64, l as u64)))
        .collect();

    let combos = stock.len().pow(parts.len() as u32);
    let mut best = None;
    for code in 0..combos {
        let mut fill = vec![(0u64, 0u64); stock.len()];
        let mut c = code;
        for &len in &parts {
            let s = c % stock.len();
            c /= stock.len();
            fill[s].0 += len;
            fill[s].1 += 1;
        }
        let feasible = fill
            .iter()
            .zip(&stock)
            .all(|(&(used, n), &(len, _))| n == 0 || used + kerf * (n - 1) <= len);
        if !feasible {
            continue;
        }
        let cost: u64 = fill
            .iter()
            .zip(&stock)
            .filter(|((_, n), _)| *n > 0)
            .map(|(_, &(_, cost))| cost)
            .sum();
        if best.map_or(true, |b| cost < b) {
            best = Some(cost);
        }
    }
    best
}

mod scenario_tests {
    use super::*;

    #[test]
    fn test_sample_inventory() {
        let config = NestingConfig::sample();
        let report = Nester1D::new(config.clone()).solve().unwrap();

        assert_eq!(report.status, SolveStatus::Optimal);
        assert!(report.optimality_proven);
        assert_valid_cut_list(&config, &report);

        // The two long parts need a new length each; the short ones ride along.
        assert_eq!(report.totals.stock_count, 2);
        assert_eq!(report.totals.total_cost_value, 20000);
        assert_eq!(report.totals.total_stock_length, 20000);
        assert_eq!(report.totals.parts_nested, 4);
        assert_eq!(report.totals.total_part_length, 19050);
        assert_eq!(report.totals.total_offcut, 950);
        assert!((report.totals.wastage_pct - 4.75).abs() <= 0.05 + 1e-9);
        assert!(report.stock_usage.iter().all(|u| u.stock_id.starts_with("ns_")));
        for offcut in ["os_00001", "os_00002", "os_00003"] {
            assert!(report.unused_stock.contains(&offcut.to_string()));
        }

        let with_9000 = report.stock_for_part("p_00003").unwrap();
        assert_eq!(report.stock_for_part("p_00002"), Some(with_9000));
        let usage = report.usage_for(with_9000).unwrap();
        assert_eq!(usage.length_utilised, 9500);
        assert_eq!(usage.kerf_loss, 2);
        assert_eq!(usage.offcut, 500);
        assert_eq!(usage.wastage_pct, 5.0);

        let with_8500 = report.stock_for_part("p_00004").unwrap();
        assert_eq!(report.stock_for_part("p_00001"), Some(with_8500));
        let usage = report.usage_for(with_8500).unwrap();
        assert_eq!(usage.length_utilised, 9550);
        assert_eq!(usage.offcut, 450);
        assert_eq!(usage.wastage_pct, 4.5);
    }

    #[test]
    fn test_part_longer_than_any_stock_is_infeasible() {
        let config = NestingConfig::new()
            .with_part("p1", 12000)
            .with_offcut("o1", 500)
            .with_new_stock("n1", 10000);
        match Nester1D::new(config).solve() {
            Err(Error::NoSolutionFound { status, .. }) => {
                assert_eq!(status, SolveStatus::Infeasible)
            }
            other => panic!("expected NoSolutionFound, got {:?}", other.map(|r| r.status)),
        }
    }

    #[test]
    fn test_exact_fit_without_kerf() {
        let config = NestingConfig::new()
            .with_kerf_width(0)
            .with_part("p1", 400)
            .with_part("p2", 600)
            .with_new_stock("n1", 1000);
        let report = Nester1D::new(config.clone()).solve().unwrap();

        assert_valid_cut_list(&config, &report);
        assert_eq!(report.totals.stock_count, 1);
        let usage = &report.stock_usage[0];
        assert_eq!(usage.length_utilised, 1000);
        assert_eq!(usage.kerf_loss, 0);
        assert_eq!(usage.offcut, 0);
        assert_eq!(usage.wastage_pct, 0.0);
        assert_eq!(report.totals.wastage_pct, 0.0);
    }

    #[test]
    fn test_exact_fit_needs_two_pieces_with_kerf() {
        let config = NestingConfig::new()
            .with_kerf_width(2)
            .with_part("p1", 400)
            .with_part("p2", 600)
            .with_new_stock("n1", 1000)
            .with_new_stock("n2", 1000);
        let report = Nester1D::new(config.clone()).solve().unwrap();

        assert_valid_cut_list(&config, &report);
        assert_eq!(report.totals.stock_count, 2);
        assert_eq!(report.totals.total_cost_value, 2000);
    }

    #[test]
    fn test_no_parts() {
        let config = NestingConfig::new()
            .with_offcut("o1", 300)
            .with_new_stock("n1", 1000);
        let report = Nester1D::new(config).solve().unwrap();

        assert_eq!(report.status, SolveStatus::Optimal);
        assert!(report.stock_usage.is_empty());
        assert_eq!(report.unused_stock, vec!["o1".to_string(), "n1".to_string()]);
        assert_eq!(report.totals.stock_count, 0);
        assert_eq!(report.totals.total_cost_value, 0);
        assert_eq!(report.totals.total_offcut, 0);
        assert_eq!(report.totals.wastage_pct, 0.0);
    }

    #[test]
    fn test_empty_inventory() {
        let report = Nester1D::new(NestingConfig::new()).solve().unwrap();
        assert_eq!(report.status, SolveStatus::Optimal);
        assert!(report.unused_stock.is_empty());
    }
}

mod validation_tests {
    use super::*;

    #[test]
    fn test_colliding_stock_id() {
        let config = NestingConfig::new()
            .with_part("p1", 100)
            .with_offcut("shared", 500)
            .with_new_stock("shared", 6000);
        let err = Nester1D::new(config).solve().unwrap_err();
        assert!(matches!(err, Error::InvalidInventory(_)));
        assert!(err.to_string().contains("shared"));
    }

    #[test]
    fn test_non_positive_lengths() {
        for config in [
            NestingConfig::new().with_part("p1", 0).with_new_stock("n1", 100),
            NestingConfig::new().with_part("p1", 10).with_offcut("o1", -1),
            NestingConfig::new().with_part("p1", 10).with_new_stock("n1", 0),
        ] {
            assert!(matches!(
                Nester1D::new(config).solve(),
                Err(Error::InvalidInventory(_))
            ));
        }
    }

    #[test]
    fn test_oversized_lengths_rejected_before_solving() {
        let config = NestingConfig::new()
            .with_part("a", i64::MAX)
            .with_part("b", i64::MAX)
            .with_part("c", i64::MAX)
            .with_new_stock("n1", 6000)
            .with_kerf_width(0);
        assert!(matches!(
            Nester1D::new(config).solve(),
            Err(Error::InvalidInventory(_))
        ));

        let config = NestingConfig::new()
            .with_part("p", 11)
            .with_new_stock("n", 10)
            .with_kerf_width(1 << 60);
        let err = Nester1D::new(config).solve().unwrap_err();
        assert!(matches!(err, Error::InvalidInventory(_)));
        assert!(err.to_string().contains(&MAX_LENGTH.to_string()));
    }

    #[test]
    fn test_large_kerf_within_limit_is_infeasible() {
        let config = NestingConfig::new()
            .with_part("p", 11)
            .with_new_stock("n", 10)
            .with_kerf_width(1 << 40);
        match Nester1D::new(config).solve() {
            Err(Error::NoSolutionFound { status, .. }) => {
                assert_eq!(status, SolveStatus::Infeasible)
            }
            other => panic!("expected NoSolutionFound, got {:?}", other),
        }
    }
}

mod property_tests {
    use super::*;

    fn small_instances() -> Vec<NestingConfig> {
        vec![
            NestingConfig::new()
                .with_part("a", 300)
                .with_part("b", 450)
                .with_part("c", 700)
                .with_part("d", 120)
                .with_offcut("o1", 500)
                .with_offcut("o2", 800)
                .with_new_stock("n1", 1000)
                .with_new_stock("n2", 1000),
            NestingConfig::new()
                .with_kerf_width(5)
                .with_part("a", 495)
                .with_part("b", 500)
                .with_part("c", 250)
                .with_offcut("o1", 1000)
                .with_offcut("o2", 260)
                .with_new_stock("n1", 1200),
            NestingConfig::new()
                .with_kerf_width(0)
                .with_part("a", 333)
                .with_part("b", 333)
                .with_part("c", 334)
                .with_part("d", 1000)
                .with_new_stock("n1", 1000)
                .with_new_stock("n2", 1000)
                .with_new_stock("n3", 1500),
        ]
    }

    #[test]
    fn test_matches_brute_force_optimum() {
        for config in small_instances() {
            let expected = brute_force_cost(&config).unwrap();
            let report = Nester1D::new(config.clone()).solve().unwrap();
            assert_eq!(report.status, SolveStatus::Optimal);
            assert_valid_cut_list(&config, &report);
            assert_eq!(report.totals.total_cost_value, expected);
        }
    }

    #[test]
    fn test_symmetry_breaking_keeps_optimum() {
        for config in small_instances() {
            let with = Nester1D::new(config.clone()).solve().unwrap();
            let without = Nester1D::new(config.with_symmetry_breaking(false))
                .solve()
                .unwrap();
            assert_eq!(with.totals.total_cost_value, without.totals.total_cost_value);
        }
    }

    #[test]
    fn test_kerf_monotonicity() {
        let base = NestingConfig::new()
            .with_part("a", 3000)
            .with_part("b", 3000)
            .with_part("c", 3000)
            .with_new_stock("n1", 10000)
            .with_new_stock("n2", 10000)
            .with_new_stock("n3", 10000);

        let pieces = |kerf: u64| {
            Nester1D::new(base.clone().with_kerf_width(kerf))
                .solve()
                .unwrap()
                .totals
                .stock_count
        };
        assert_eq!(pieces(0), 1);
        assert_eq!(pieces(500), 1);
        assert_eq!(pieces(501), 2);

        let mut previous = 0;
        for kerf in [0, 100, 500, 501, 2000, 4000] {
            let n = pieces(kerf);
            assert!(n >= previous, "kerf {} used {} pieces", kerf, n);
            previous = n;
        }
    }

    #[test]
    fn test_offcuts_preferred_when_they_fit() {
        let config = NestingConfig::new()
            .with_part("a", 400)
            .with_offcut("o1", 450)
            .with_new_stock("n1", 1000);
        let report = Nester1D::new(config).solve().unwrap();
        assert_eq!(report.stock_for_part("a"), Some("o1"));
        assert_eq!(report.totals.total_cost_value, 225);
    }

    #[test]
    fn test_deterministic() {
        let config = NestingConfig::sample();
        let first = Nester1D::new(config.clone()).solve().unwrap();
        let second = Nester1D::new(config).solve().unwrap();
        assert_eq!(first.stock_usage, second.stock_usage);
        assert_eq!(first.unused_stock, second.unused_stock);
    }
}

mod solver_tests {
    use super::*;

    #[test]
    fn test_node_limit_without_incumbent() {
        let solver = BranchAndBound::new(BranchBoundConfig::default().with_max_nodes(1));
        let result = Nester1D::new(NestingConfig::sample())
            .with_solver(solver)
            .solve();
        match result {
            Err(Error::NoSolutionFound { status, message }) => {
                assert_eq!(status, SolveStatus::Error);
                assert!(message.contains("node limit"));
            }
            other => panic!("expected NoSolutionFound, got {:?}", other),
        }
    }

    #[test]
    fn test_time_limit_returns_feasible_report() {
        let config = synthetic_config(15).with_time_limit_ms(200);
        let report = Nester1D::new(config.clone()).solve().unwrap();

        assert_eq!(report.status, SolveStatus::Feasible);
        assert!(!report.optimality_proven);
        assert!(report.diagnostics.message.contains("time limit"));
        assert_valid_cut_list(&config, &report);
    }

    #[test]
    fn test_unlimited_time() {
        let config = NestingConfig::sample().with_time_limit_ms(0);
        let report = Nester1D::new(config).solve().unwrap();
        assert_eq!(report.status, SolveStatus::Optimal);
        assert_eq!(report.diagnostics.solver, "branch-and-bound");
    }

    #[test]
    fn test_fewest_pieces_on_sample() {
        let config = NestingConfig::sample().with_tie_break(TieBreak::FewestPieces);
        let report = Nester1D::new(config).solve().unwrap();
        assert_eq!(report.totals.total_cost_value, 20000);
        assert_eq!(report.totals.stock_count, 2);
    }

    #[test]
    fn test_solve_many() {
        let configs = vec![
            NestingConfig::sample(),
            NestingConfig::new().with_part("p", 5).with_new_stock("n", 4),
            NestingConfig::sample().with_kerf_width(0),
        ];
        let results = u_cutlist_d1::solve_many(&configs, &BranchAndBound::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().totals.total_cost_value, 20000);
        assert!(results[1].as_ref().unwrap_err().is_no_solution());
        assert_eq!(results[2].as_ref().unwrap().totals.total_cost_value, 20000);
    }

    #[cfg(feature = "milp")]
    #[test]
    fn test_good_lp_matches_branch_and_bound() {
        use u_cutlist_d1::GoodLpSolver;

        let config = NestingConfig::sample().with_time_limit_ms(0);
        let exact = Nester1D::new(config.clone()).solve().unwrap();
        let milp = Nester1D::new(config.clone())
            .with_solver(GoodLpSolver::new())
            .solve()
            .unwrap();
        assert_valid_cut_list(&config, &milp);
        assert_eq!(milp.totals.total_cost_value, exact.totals.total_cost_value);
        assert_eq!(milp.diagnostics.solver, "good_lp");
    }
}
