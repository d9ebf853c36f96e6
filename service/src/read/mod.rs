//! Read entities definitions.

pub mod donation;

pub use self::donation::Donation;
