use ndarray::Array2;
use rstest::fixture;

/// Regular 6 x 8 x 10 grid with 0.2 spacing.
#[fixture]
pub fn grid_cloud() -> Array2<f64> {
    let dims = [6, 8, 10];
    Array2::from_shape_fn((dims[0] * dims[1] * dims[2], 3), |(row, axis)| {
        let coord = match axis {
            0 => row % dims[0],
            1 => (row / dims[0]) % dims[1],
            _ => row / (dims[0] * dims[1]),
        };
        coord as f64 * 0.2
    })
}

pub struct SampleSurface {
    pub points: Array2<f64>,
    pub normals: Array2<f64>,
}

/// Samples of `z = 0.2 sin(2x) cos(3y) + 0.1 x^2` over [-1, 1]^2 with their exact normals.
#[fixture]
pub fn height_field() -> SampleSurface {
    let side = 21;
    let coords = |row: usize| {
        let x = -1.0 + (row % side) as f64 * 0.1;
        let y = -1.0 + (row / side) as f64 * 0.1;
        (x, y)
    };

    let points = Array2::from_shape_fn((side * side, 3), |(row, axis)| {
        let (x, y) = coords(row);
        match axis {
            0 => x,
            1 => y,
            _ => 0.2 * (2.0 * x).sin() * (3.0 * y).cos() + 0.1 * x * x,
        }
    });

    let normals = Array2::from_shape_fn((side * side, 3), |(row, axis)| {
        let (x, y) = coords(row);
        let dzdx = 0.4 * (2.0 * x).cos() * (3.0 * y).cos() + 0.2 * x;
        let dzdy = -0.6 * (2.0 * x).sin() * (3.0 * y).sin();
        let norm = (dzdx * dzdx + dzdy * dzdy + 1.0).sqrt();
        match axis {
            0 => -dzdx / norm,
            1 => -dzdy / norm,
            _ => 1.0 / norm,
        }
    });

    SampleSurface { points, normals }
}
