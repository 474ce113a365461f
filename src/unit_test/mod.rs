mod geometries;
pub(crate) use geometries::{plane_mesh, sample_sphere, SampleMesh};
mod point_clouds;
pub(crate) use point_clouds::{grid_cloud, height_field, SampleSurface};
