mod common;

use active_shape::image::ImageF32;
use active_shape::initial_pose::{estimate_initial_poses, InitialPoseParams, POSE_COUNT};
use common::init_logging;
use common::synthetic_image::jaw_stripes;

const SIDE: f64 = 160.0;

fn radiograph() -> ImageF32 {
    // Separators at inner columns 100, 200 and 300.
    jaw_stripes(720, 600, (280, 300), &[260, 360, 460])
}

#[test]
fn separation_band_and_lines_are_found() {
    init_logging();
    let params = InitialPoseParams::default();
    let poses = estimate_initial_poses(&radiograph(), &params);

    assert_eq!(poses.band.top, 280);
    assert_eq!(poses.band.bottom, 299);
    for (found, expected) in poses.upper_lines.iter().zip([100.0, 200.0, 300.0]) {
        assert!((found - expected).abs() <= 4.0, "upper line {found} vs {expected}");
    }
    for (found, expected) in poses.lower_lines.iter().zip([100.0, 200.0, 300.0]) {
        assert!((found - expected).abs() <= 4.0, "lower line {found} vs {expected}");
    }
}

#[test]
fn poses_sit_between_the_separators() {
    let params = InitialPoseParams::default();
    let poses = estimate_initial_poses(&radiograph(), &params);
    assert_eq!(poses.poses.len(), POSE_COUNT);

    let upper_base = 280.0 - params.upper_crop_height as f64;
    let expected_x = [
        SIDE + 100.0 - params.upper.outer_offset,
        SIDE + 150.0,
        SIDE + 250.0,
        SIDE + 300.0 + params.upper.outer_offset,
    ];
    for (i, pose) in poses.poses[..4].iter().enumerate() {
        assert!((pose.translation[0] - expected_x[i]).abs() <= 4.0);
        assert_eq!(pose.scale, params.upper.scale);
        assert_eq!(pose.rotation, params.upper.rotations[i]);
    }
    assert_eq!(poses.poses[0].translation[1], upper_base + params.upper.outer_y);
    assert_eq!(poses.poses[1].translation[1], upper_base + params.upper.inner_y);
    assert_eq!(poses.poses[4].translation[1], 299.0 + params.lower.outer_y);
    assert_eq!(poses.poses[5].scale, params.lower.scale);

    let picked = poses.select(&[1, 6]);
    assert_eq!(picked, vec![poses.poses[1], poses.poses[6]]);
}

#[test]
fn featureless_image_falls_back_to_placeholders() {
    init_logging();
    let params = InitialPoseParams::default();
    let mut flat = ImageF32::new(720, 600);
    flat.data.iter_mut().for_each(|v| *v = 0.5);
    let poses = estimate_initial_poses(&flat, &params);

    assert_eq!(poses.poses.len(), POSE_COUNT);
    let mid = (720.0 - 2.0 * SIDE) / 2.0;
    assert_eq!(
        poses.lower_lines,
        [mid - params.line_gap, mid, mid + params.line_gap]
    );
    assert!(poses
        .poses
        .iter()
        .all(|p| p.translation[0].is_finite() && p.translation[1].is_finite()));
}
