mod common;

use active_shape::evaluation::leave_one_out;
use active_shape::pyramid::RoiSpec;
use active_shape::{AsmConfig, CancellationToken, ContourLocator, Error, Pose, TrainingSample};
use common::init_logging;
use common::synthetic_image::{filled_polygon, stretched_polygon};

const STRETCHES: [f64; 4] = [-0.03, -0.01, 0.01, 0.03];

fn samples(size: usize, center: [f64; 2]) -> Vec<TrainingSample> {
    STRETCHES
        .iter()
        .map(|&s| {
            let contour = stretched_polygon(16, s).transformed(&Pose::new(center, 20.0, 0.0));
            let image = filled_polygon(size, size, contour.points(), 0.85, 0.15);
            TrainingSample::new(image, vec![contour])
        })
        .collect()
}

#[test]
fn left_out_contour_is_recovered_from_its_pose() {
    init_logging();
    let samples = samples(128, [64.0, 64.0]);
    let start = [Pose::new([64.0, 64.0], 20.0, 0.0)];
    let report = leave_one_out(
        &samples,
        1,
        &AsmConfig::default(),
        Some(&start),
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(report.left_out, 1);
    assert_eq!(report.contours.len(), 1);
    let err = &report.contours[0];
    assert!(err.average < 0.2, "average relative error {}", err.average);
    assert!(err.maximum >= err.average);
    assert_eq!(err.found.len(), 16);
    assert!((report.mean_average_error() - err.average).abs() < 1e-12);
}

#[test]
fn left_out_index_must_exist() {
    let samples = samples(64, [32.0, 32.0]);
    let result = leave_one_out(&samples, 9, &AsmConfig::default(), None, &CancellationToken::new());
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn results_are_reported_in_original_image_coordinates() {
    init_logging();
    let mut config = AsmConfig::default();
    config.pyramid.roi = RoiSpec::CenteredWindow {
        half_width: 48,
        top: 16,
        bottom: 144,
    };
    let samples = samples(160, [80.0, 80.0]);
    let mut locator = ContourLocator::train(&samples, &config).unwrap();
    locator.set_image(&samples[2].image);
    assert_eq!(locator.framework().crop_offset(), [32.0, 16.0]);

    // (80, 80) in the image is (48, 64) inside the region of interest.
    let outcome = locator
        .fit(Pose::new([48.0, 64.0], 20.0, 0.0), &CancellationToken::new())
        .unwrap();
    let c = outcome.shape.centroid();
    assert!((c[0] - 80.0).abs() < 2.0 && (c[1] - 80.0).abs() < 2.0, "centroid {c:?}");
    assert_eq!(outcome.levels.len(), config.levels());
}

#[test]
fn fit_selected_skips_unknown_pose_indices() {
    init_logging();
    let samples = samples(128, [64.0, 64.0]);
    let mut locator = ContourLocator::train(&samples, &AsmConfig::default()).unwrap();
    assert!(matches!(locator.initial_poses(), Err(Error::NoImage)));

    locator.set_image(&samples[0].image);
    let fitted = locator.fit_selected(&[99, 0], &CancellationToken::new()).unwrap();
    assert_eq!(fitted.len(), 1);
    assert_eq!(fitted[0].0, 0);
    assert_eq!(fitted[0].1.shape.len(), 16);
}
