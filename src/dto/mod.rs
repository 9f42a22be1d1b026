pub mod health;
pub mod roster;
pub mod sse;
pub mod validation;
