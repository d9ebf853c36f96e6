//! Domain definitions.

pub mod donation;
pub mod inventory;
pub mod user;

pub use self::donation::Donation;
