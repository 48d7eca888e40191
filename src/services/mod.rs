pub mod campaign_service;
pub mod ledger_service;
pub mod loyalty_service;
pub mod redemption_service;
pub mod visit_service;

pub use campaign_service::*;
pub use ledger_service::*;
pub use loyalty_service::*;
pub use redemption_service::*;
pub use visit_service::*;
