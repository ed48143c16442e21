pub mod auth;
pub mod health;
pub mod pets;
pub mod services;
pub mod vet_bookings;
