//! Rigid registration of 3D point sets and triangle meshes with the Iterative
//! Closest Point algorithm.

pub mod access;
pub mod correspondence;
pub mod error;
pub mod icp;
pub mod kdtree;
pub mod mesh;
pub mod metrics;
pub mod noise;
pub mod normals;
mod optim;
pub mod overlap;
pub mod sampling;
pub mod transform;
pub mod trig;

#[cfg(test)]
mod unit_test;

pub use crate::error::Error;
pub use crate::icp::{
    find_best_start_rotation, icp_normal_based, icp_optimized, Icp, IcpParams, IcpResult,
    IcpState,
};
pub use crate::transform::RigidTransform;
