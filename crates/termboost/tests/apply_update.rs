//! Model update tests: staging, inspecting, and applying term updates.

use approx::assert_abs_diff_eq;

use termboost::{
    BoostError, BoosterConfig, BoosterCore, BoosterShell, Feature, SampleSet, Target, Tensor,
};

// =============================================================================
// Helpers
// =============================================================================

/// One 4-bin feature, one term over it, validation rows in bins 0..4.
fn regression_shell(targets: Vec<f64>) -> BoosterShell {
    let target = Target::Regression;
    let features = vec![Feature::new(4)];
    let validation =
        SampleSet::new(target, &features, vec![vec![0, 1, 2, 3]], targets, None).unwrap();
    let core = BoosterCore::new(
        target,
        features,
        &[vec![0]],
        SampleSet::empty(target),
        validation,
        BoosterConfig::default(),
    )
    .unwrap();
    BoosterShell::new(core).unwrap()
}

fn classification_shell(n_classes: usize, config: BoosterConfig) -> BoosterShell {
    let target = Target::classification(n_classes);
    let features = vec![Feature::new(2)];
    let labels: Vec<f64> = (0..2).map(|i| (i % n_classes.max(1)) as f64).collect();
    let training =
        SampleSet::new(target, &features, vec![vec![0, 1]], labels.clone(), None).unwrap();
    let validation = SampleSet::new(target, &features, vec![vec![0, 1]], labels, None).unwrap();
    let core = BoosterCore::new(target, features, &[vec![0]], training, validation, config).unwrap();
    BoosterShell::new(core).unwrap()
}

fn step(shell: &mut BoosterShell, splits: Vec<usize>, values: Vec<f64>) -> f64 {
    let update = Tensor::compressed(&[4], 1, vec![splits], values).unwrap();
    shell.stage_term_update(0, update).unwrap();
    shell.apply_term_update().unwrap()
}

// =============================================================================
// Expansion through the session
// =============================================================================

#[test]
fn staged_update_expands_to_region_values() {
    let mut shell = regression_shell(vec![0.0; 4]);
    let update = Tensor::compressed(&[4], 1, vec![vec![2]], vec![1.0, 3.0]).unwrap();
    shell.stage_term_update(0, update).unwrap();

    assert_eq!(shell.term_update_splits(0, 3).unwrap(), &[2]);
    assert_eq!(shell.term_update_expanded().unwrap(), &[1.0, 1.0, 3.0, 3.0]);
    // expanded form lists every bin boundary
    assert_eq!(shell.term_update_splits(0, 3).unwrap(), &[1, 2, 3]);
    // second expansion is a no-op
    assert_eq!(shell.term_update_expanded().unwrap(), &[1.0, 1.0, 3.0, 3.0]);
}

#[test]
fn splits_reject_stale_count_and_bad_dimension() {
    let mut shell = regression_shell(vec![0.0; 4]);
    let update = Tensor::compressed(&[4], 1, vec![vec![2]], vec![1.0, 3.0]).unwrap();
    shell.stage_term_update(0, update).unwrap();

    assert!(matches!(
        shell.term_update_splits(0, 2),
        Err(BoostError::InvalidParameter(_))
    ));
    assert!(matches!(
        shell.term_update_splits(1, 3),
        Err(BoostError::InvalidParameter(_))
    ));
}

#[test]
fn stage_rejects_mismatched_tensor() {
    let mut shell = regression_shell(vec![0.0; 4]);
    let wrong_bins = Tensor::zeros_compressed(&[3], 1).unwrap();
    assert!(matches!(
        shell.stage_term_update(0, wrong_bins),
        Err(BoostError::InvalidParameter(_))
    ));
    assert_eq!(shell.pending_term(), None);

    let wrong_term = Tensor::zeros_compressed(&[4], 1).unwrap();
    assert!(matches!(
        shell.stage_term_update(1, wrong_term),
        Err(BoostError::InvalidParameter(_))
    ));
}

// =============================================================================
// Apply
// =============================================================================

#[test]
fn apply_without_pending_is_invalid_state() {
    let mut shell = regression_shell(vec![0.0; 4]);
    assert!(matches!(shell.apply_term_update(), Err(BoostError::InvalidState(_))));
    assert!(matches!(shell.term_update_expanded(), Err(BoostError::InvalidState(_))));
    assert!(matches!(shell.term_update_splits(0, 3), Err(BoostError::InvalidState(_))));
}

#[test]
fn apply_clears_pending() {
    let mut shell = regression_shell(vec![0.0; 4]);
    step(&mut shell, vec![], vec![0.5]);
    assert_eq!(shell.pending_term(), None);
    assert!(matches!(shell.apply_term_update(), Err(BoostError::InvalidState(_))));
}

#[test]
fn improvement_promotes_current_to_best() {
    let mut shell = regression_shell(vec![1.0, 1.0, 3.0, 3.0]);
    assert_eq!(shell.core().best_metric(), f64::MAX);

    let metric = step(&mut shell, vec![2], vec![1.0, 3.0]);
    assert_abs_diff_eq!(metric, 0.0);
    assert_eq!(shell.core().best_metric(), metric);
    assert_eq!(shell.core().best_model(0).values(), &[1.0, 1.0, 3.0, 3.0]);

    // every score moves 1.0 away from its target
    let metric = step(&mut shell, vec![], vec![1.0]);
    assert_abs_diff_eq!(metric, 1.0);
    assert_eq!(shell.core().current_model(0).values(), &[2.0, 2.0, 4.0, 4.0]);
    assert_eq!(shell.core().best_model(0).values(), &[1.0, 1.0, 3.0, 3.0]);
    assert_abs_diff_eq!(shell.core().best_metric(), 0.0);
}

#[test]
fn equal_metric_does_not_promote() {
    let mut shell = regression_shell(vec![1.0, 1.0, -1.0, -1.0]);
    let first = step(&mut shell, vec![2], vec![0.5, -0.5]);
    assert_abs_diff_eq!(first, 0.25);
    // mirror move: same loss, different model
    let second = step(&mut shell, vec![2], vec![1.0, -1.0]);
    assert_abs_diff_eq!(second, 0.25);
    assert_eq!(shell.core().best_model(0).values(), &[0.5, 0.5, -0.5, -0.5]);
}

#[test]
fn overflow_yields_max_metric_without_promotion() {
    let mut shell = regression_shell(vec![0.0; 4]);
    step(&mut shell, vec![], vec![0.5]);
    let best_before = shell.core().best_metric();

    let metric = step(&mut shell, vec![1], vec![f64::INFINITY, 0.0]);
    assert_eq!(metric, f64::MAX);
    assert_eq!(shell.core().best_metric(), best_before);
    assert_eq!(shell.core().best_model(0).values(), &[0.5; 4]);
    // non-finite values stay in the cells they landed on
    let current = shell.core().current_model(0).values();
    assert!(current[0].is_infinite());
    assert_eq!(&current[1..], &[0.5, 0.5, 0.5]);
}

#[test]
fn no_validation_reports_zero_and_keeps_best() {
    let target = Target::Regression;
    let features = vec![Feature::new(4)];
    let training =
        SampleSet::new(target, &features, vec![vec![0, 1, 2, 3]], vec![1.0; 4], None).unwrap();
    let core = BoosterCore::new(
        target,
        features,
        &[vec![0]],
        training,
        SampleSet::empty(target),
        BoosterConfig::default(),
    )
    .unwrap();
    let mut shell = BoosterShell::new(core).unwrap();

    let metric = step(&mut shell, vec![], vec![1.0]);
    assert_eq!(metric, 0.0);
    assert_eq!(shell.core().best_metric(), f64::MAX);
    let scores: Vec<f64> = shell.core().training().scores().iter().copied().collect();
    assert_eq!(scores, vec![1.0; 4]);
}

#[test]
fn binary_metric_is_logloss_on_logits() {
    let mut shell = classification_shell(2, BoosterConfig::default());
    shell.set_term_update_expanded(0, &[-2.0, 2.0]).unwrap();
    let metric = shell.apply_term_update().unwrap();
    let expected = (1.0 + (-2.0f64).exp()).ln();
    assert_abs_diff_eq!(metric, expected, epsilon = 1e-12);
}

// =============================================================================
// Set expanded
// =============================================================================

#[test]
fn set_expanded_recenters_multiclass_when_configured() {
    let config = BoosterConfig::builder()
        .zero_first_multiclass_logit(true)
        .build()
        .unwrap();
    let mut shell = classification_shell(3, config);
    shell
        .set_term_update_expanded(0, &[1.0, 2.0, 3.0, 4.0, 4.0, 4.0])
        .unwrap();
    assert_eq!(shell.pending_term(), Some(0));
    assert_eq!(
        shell.term_update_expanded().unwrap(),
        &[0.0, 1.0, 2.0, 0.0, 0.0, 0.0]
    );
}

#[test]
fn set_expanded_keeps_values_by_default() {
    let mut shell = classification_shell(3, BoosterConfig::default());
    let values = [1.0, 2.0, 3.0, 4.0, 4.0, 4.0];
    shell.set_term_update_expanded(0, &values).unwrap();
    assert_eq!(shell.term_update_expanded().unwrap(), &values);
}

#[test]
fn set_expanded_rejects_wrong_length_and_clears_pending() {
    let mut shell = classification_shell(3, BoosterConfig::default());
    shell.set_term_update_expanded(0, &[0.0; 6]).unwrap();
    assert!(matches!(
        shell.set_term_update_expanded(0, &[0.0; 5]),
        Err(BoostError::InvalidParameter(_))
    ));
    assert_eq!(shell.pending_term(), None);
    assert!(matches!(
        shell.set_term_update_expanded(1, &[0.0; 6]),
        Err(BoostError::InvalidParameter(_))
    ));
}

#[test]
fn degenerate_target_skips_tensor_work() {
    for n_classes in [0, 1] {
        let target = Target::classification(n_classes);
        let features = vec![Feature::new(3)];
        let core = BoosterCore::new(
            target,
            features,
            &[vec![0]],
            SampleSet::empty(target),
            SampleSet::empty(target),
            BoosterConfig::default(),
        )
        .unwrap();
        let mut shell = BoosterShell::new(core).unwrap();

        shell.set_term_update_expanded(0, &[]).unwrap();
        assert_eq!(shell.pending_term(), Some(0));
        assert!(shell.term_update_expanded().unwrap().is_empty());
        assert!(shell.term_update_splits(0, 2).unwrap().is_empty());
        assert_eq!(shell.apply_term_update().unwrap(), 0.0);
        assert_eq!(shell.pending_term(), None);
    }
}
