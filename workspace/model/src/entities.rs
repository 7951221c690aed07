//! This file serves as the root for all SeaORM entity modules.
//! A user owns any number of adverts; each advert belongs to exactly one user.

pub mod advert;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::advert::Entity as Advert;
    pub use super::user::Entity as User;
}
