pub mod campaign;
pub mod common;
pub mod loyalty;
pub mod pagination;
pub mod redemption;
pub mod visit;

pub use campaign::*;
pub use common::*;
pub use loyalty::*;
pub use pagination::*;
pub use redemption::*;
pub use visit::*;
