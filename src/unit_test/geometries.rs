use ndarray::Array2;
use rstest::fixture;

pub struct SampleMesh {
    pub points: Array2<f64>,
    pub faces: Array2<usize>,
}

/// Unit UV sphere without pole vertices. Faces wind counter clockwise seen from outside.
pub fn uv_sphere(rings: usize, segments: usize) -> SampleMesh {
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
    let mut faces = Vec::with_capacity((rings - 1) * segments * 2);
    for ring in 0..rings - 1 {
        for segment in 0..segments {
            let (a, b) = (vertex(ring, segment), vertex(ring, segment + 1));
            let (c, d) = (vertex(ring + 1, segment), vertex(ring + 1, segment + 1));
            faces.push([a, c, b]);
            faces.push([b, c, d]);
        }
    }

    SampleMesh {
        points,
        faces: Array2::from_shape_fn((faces.len(), 3), |(i, j)| faces[i][j]),
    }
}

#[fixture]
pub fn sample_sphere() -> SampleMesh {
    uv_sphere(20, 25)
}

/// Square grid mesh on the z = 0 plane, `size` vertices per side with 0.1 spacing.
pub fn plane_mesh(size: usize) -> SampleMesh {
    let points = Array2::from_shape_fn((size * size, 3), |(row, axis)| match axis {
        0 => (row % size) as f64 * 0.1,
        1 => (row / size) as f64 * 0.1,
        _ => 0.0,
    });

    let mut faces = Vec::new();
    for y in 0..size - 1 {
        for x in 0..size - 1 {
            let a = y * size + x;
            faces.push([a, a + 1, a + size]);
            faces.push([a + 1, a + size + 1, a + size]);
        }
    }

    SampleMesh {
        points,
        faces: Array2::from_shape_fn((faces.len(), 3), |(i, j)| faces[i][j]),
    }
}
