pub mod levels;
pub mod scoring;
pub mod validation;
pub mod week;

// Re-export main components
pub use levels::*;
pub use scoring::*;
pub use validation::*;
pub use week::*;
