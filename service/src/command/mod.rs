//! [`Command`] definition.

pub mod accept_donation;
pub mod accept_donation_partially;
pub mod add_inventory_entry;
pub mod authorize_user_session;
pub mod complete_donation;
pub mod donate;
pub mod lock_donation;
pub mod reject_donation;
pub mod remove_donation;
pub mod remove_inventory;
pub mod revoke_donation_acceptance;
pub mod set_pickup_location;
pub mod unlock_donation;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    accept_donation::AcceptDonation,
    accept_donation_partially::AcceptDonationPartially,
    add_inventory_entry::AddInventoryEntry,
    authorize_user_session::AuthorizeUserSession,
    complete_donation::CompleteDonation, donate::Donate,
    lock_donation::LockDonation, reject_donation::RejectDonation,
    remove_donation::RemoveDonation, remove_inventory::RemoveInventory,
    revoke_donation_acceptance::RevokeDonationAcceptance,
    set_pickup_location::SetPickupLocation, unlock_donation::UnlockDonation,
};
