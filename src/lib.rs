//! Ways of multiplying two 4x4 `f32` matrices, and the harness that times them.
//!
//! The kernels in [`multiply`] share one contract and differ only in code
//! shape: a naive loop, the loop with fused multiply-add, a fully unrolled
//! fused multiply-add kernel and a call into `matrixmultiply`. Compare them
//! with the `mat4-bench` binary or `cargo bench`.
//!
//! ```
//! use mat4_autovec::{Matrix4x4, Variant};
//!
//! let scale = Matrix4x4::from_rows([
//!     [2., 0., 0., 0.],
//!     [0., 3., 0., 0.],
//!     [0., 0., 4., 0.],
//!     [0., 0., 0., 5.],
//! ]);
//! assert_eq!(Matrix4x4::IDENTITY.multiply_with(&scale, Variant::UnrolledFma), scale);
//! ```

pub mod config;
pub mod error;
pub mod harness;
pub mod matrix;
pub mod multiply;
pub mod trial;

pub use config::{BenchConfig, TimeUnit};
pub use error::{ConfigError, Result};
pub use matrix::Matrix4x4;
pub use multiply::{MultiplyFn, Variant};
pub use trial::TrialContext;
