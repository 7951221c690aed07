pub mod adverts;
pub mod health;
pub mod users;
