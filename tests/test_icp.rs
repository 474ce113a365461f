use meshalign::{
    find_best_start_rotation, icp_optimized,
    mesh::compute_normals,
    metrics::{error_metric, overlap_error_metric, TransformMetrics},
    noise::{add_noise, bounding_box_scale},
    overlap::find_non_overlapping_faces,
    transform::{apply_rigid_transform, rotate},
    Icp, IcpParams, IcpState, RigidTransform,
};
use ndarray::{s, Array2, Axis};
use rand::{rngs::StdRng, Rng, SeedableRng};

mod common;
use common::{init_logging, uv_sphere};

#[test]
fn test_sphere_registration() {
    init_logging();

    let (target, _) = uv_sphere(20, 25);
    assert_eq!(target.nrows(), 500);
    let scale = bounding_box_scale(&target.view()).unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let processed = add_noise(
        &rotate(&target.view(), 0.0, 0.0, 15f64.to_radians())
            .unwrap()
            .view(),
        0.01 * scale,
        &mut rng,
    )
    .unwrap();

    let result = icp_optimized(&target.view(), &processed.view(), &IcpParams::default()).unwrap();

    assert_eq!(result.state, IcpState::Converged);
    assert!(result.iterations < 50);
    assert!(result.transform.is_proper(1e-9));
    assert!(
        result.error < 0.02 * scale,
        "error {} >= {}",
        result.error,
        0.02 * scale
    );
    assert!(result.error <= error_metric(&target.view(), &processed.view()).unwrap());
}

#[test]
fn test_identical_sets_give_identity() {
    init_logging();

    let (target, _) = uv_sphere(20, 25);
    let result = icp_optimized(&target.view(), &target.view(), &IcpParams::default()).unwrap();

    assert_eq!(result.state, IcpState::Converged);
    assert!(result.error < 1e-12);
    let metrics = TransformMetrics::new(&result.transform, &RigidTransform::identity());
    assert!(metrics.angle < 1e-6 && metrics.translation < 1e-9, "{}", metrics);
}

#[test]
fn test_reuse_icp_for_several_sets() {
    init_logging();

    let mut rng = StdRng::seed_from_u64(3);
    let target = Array2::from_shape_fn((400, 3), |(_, axis)| {
        rng.gen_range(0.0..[4.0, 2.0, 1.0][axis])
    });

    let mut params = IcpParams::default();
    params.subsample_rate(0.5).max_iterations(30);
    let icp = Icp::new(params, &target.view()).unwrap();

    for angle in [1.0f64, -2.0, 3.0] {
        let motion = &RigidTransform::from_euler(0.0, 0.0, angle.to_radians())
            * &RigidTransform::from_parts(
                nalgebra::Matrix3::identity(),
                nalgebra::Vector3::new(0.01, 0.0, -0.01),
            );
        let processed = apply_rigid_transform(&target.view(), &motion).unwrap();

        let result = icp.align(&processed.view()).unwrap();
        assert!(
            result.error < error_metric(&target.view(), &processed.view()).unwrap(),
            "angle {}",
            angle
        );
    }
}

#[test]
fn test_start_rotation_then_icp() {
    init_logging();

    let mut rng = StdRng::seed_from_u64(11);
    let mut target = Array2::from_shape_fn((300, 3), |(_, axis)| {
        rng.gen_range(0.0..[3.0, 1.5, 0.5][axis])
    });
    let center = target.mean_axis(Axis(0)).unwrap();
    target -= &center;
    // Upside down copy, about the centroid.
    let processed = rotate(&target.view(), std::f64::consts::PI, 0.0, 0.0).unwrap();
    let start_error = error_metric(&target.view(), &processed.view()).unwrap();

    let params = IcpParams::default();
    let start = find_best_start_rotation(&target.view(), &processed.view(), &params).unwrap();
    let returned_error = error_metric(&target.view(), &start.points.view()).unwrap();
    assert!(returned_error <= start_error);
    assert!((returned_error - start.error).abs() < 1e-12);
    assert!(start.rotation.is_proper(1e-9));
    assert!(start.transform.is_proper(1e-9));

    let result = icp_optimized(&target.view(), &start.points.view(), &params).unwrap();
    assert!(result.error < 1e-6, "error {}", result.error);
}

#[test]
fn test_partial_overlap() {
    init_logging();

    let (points, faces) = uv_sphere(20, 25);
    // Northern half only.
    let target = points.slice(s![..250, ..]).to_owned();

    let partition =
        find_non_overlapping_faces(&target.view(), &points.view(), &faces.view(), None).unwrap();
    assert_eq!(
        partition.overlapping.len() + partition.non_overlapping.len(),
        faces.nrows()
    );
    assert!(!partition.overlapping.is_empty());
    assert!(!partition.non_overlapping.is_empty());

    // Faces far south share no vertex with the target.
    let overlapping = partition.overlapping_faces(&faces.view());
    assert!(overlapping.iter().all(|&vertex| vertex < 325));

    let error =
        overlap_error_metric(&target.view(), &points.view(), &faces.view(), None).unwrap();
    assert!(error < error_metric(&target.view(), &points.view()).unwrap());

    let normals = compute_normals(&points.view(), &faces.view()).unwrap();
    assert_eq!(normals.dim(), points.dim());
}

#[test]
fn test_params_from_json() {
    let params: IcpParams =
        serde_json::from_str(r#"{"max_iterations": 5, "seed": 9}"#).unwrap();
    assert_eq!(params.max_iterations, 5);
    assert_eq!(params.seed, 9);
    assert_eq!(params.subsample_rate, IcpParams::default().subsample_rate);

    let json = serde_json::to_string(&params).unwrap();
    let parsed: IcpParams = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, params);
}
