/// Neural network layer primitives
///
/// This module contains the RBF layer and the pieces it is configured with:
/// - RBF layer (Gaussian kernel over learned centers)
/// - Initializers for the centers
/// - Regularizers (weight and activity penalties)
/// - Constraints (post-step projections)

pub mod constraints;
pub mod initializers;
pub mod rbf;
pub mod regularizers;

pub use constraints::Constraint;
pub use initializers::Initializer;
pub use rbf::RbfLayer;
pub use regularizers::Regularizer;
