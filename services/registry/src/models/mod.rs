//! Registry service models

pub mod person;

// Re-export for convenience
pub use person::{
    CreatePersonRequest, LoginRequest, NewPerson, Person, PersonFilter, PersonResponse,
    TokenResponse, UpdatePersonRequest,
};
