mod icp_params;
pub use icp_params::IcpParams;
mod cost_function;
mod icp;
pub use icp::{icp_normal_based, icp_optimized, Icp, IcpResult, IcpState};
mod rigid;
pub use rigid::{
    estimate_rigid_transform, estimate_rigid_transform_normal_based, RigidEstimate,
    MIN_CORRESPONDENCES,
};
mod start_rotation;
pub use start_rotation::{candidate_rotations, find_best_start_rotation, StartRotation};
