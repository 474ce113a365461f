use ndarray::Array2;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Unit UV sphere with `rings * segments` vertices and outward faces.
pub fn uv_sphere(rings: usize, segments: usize) -> (Array2<f64>, Array2<usize>) {
    let points = Array2::from_shape_fn((rings * segments, 3), |(row, axis)| {
        let theta = ((row / segments) as f64 + 0.5) * std::f64::consts::PI / rings as f64;
        let phi = (row % segments) as f64 * std::f64::consts::TAU / segments as f64;
        match axis {
            0 => theta.sin() * phi.cos(),
            1 => theta.sin() * phi.sin(),
            _ => theta.cos(),
        }
    });

    let vertex = |ring: usize, segment: usize| ring * segments + segment % segments;
    let mut faces = Vec::new();
    for ring in 0..rings - 1 {
        for segment in 0..segments {
            let (a, b) = (vertex(ring, segment), vertex(ring, segment + 1));
            let (c, d) = (vertex(ring + 1, segment), vertex(ring + 1, segment + 1));
            faces.push([a, c, b]);
            faces.push([b, c, d]);
        }
    }
    let faces = Array2::from_shape_fn((faces.len(), 3), |(i, j)| faces[i][j]);
    (points, faces)
}
