pub mod auth;
pub mod cart;
pub mod favorites;
pub mod orders;
pub mod products;
pub mod profile;
