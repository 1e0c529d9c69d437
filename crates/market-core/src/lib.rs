pub mod error;
pub mod priors;
pub mod stats;
pub mod traits;
pub mod types;

pub use error::*;
pub use priors::*;
pub use traits::*;
pub use types::*;
