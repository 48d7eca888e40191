pub mod code_generator;
pub mod jwt;
pub mod proof_token;

pub use code_generator::*;
pub use jwt::JwtService;
pub use proof_token::*;
