//! Allocation of surplus food donations between donors and recipients.
//!
//! Donors keep an inventory and donate parts of it, while recipients review,
//! accept (fully or partially), reject and pick up donations. Every
//! state-changing [`Command`] runs in a single [`Database`] transaction,
//! holding row locks on everything it reads before writing.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod ledger;
pub mod query;
pub mod read;

use std::time::Duration;

use common::{Clock, DateTime, SystemClock};
use derive_more::Debug;

#[cfg(doc)]
use self::{domain::donation::Lock, infra::Database};

pub use self::{command::Command, ledger::Ledger, query::Query};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// Time a [`Lock`] stays active after being placed.
    pub donation_lock_ttl: Duration,
}

/// Donation allocation service, executing [`Command`]s and [`Query`]s.
#[derive(Clone, Debug)]
pub struct Service<Db, Clk = SystemClock> {
    /// [`Config`] of this [`Service`].
    config: Config,

    /// [`Database`] storing inventories and donations.
    database: Db,

    /// [`Clock`] stamping events and expiring locks.
    clock: Clk,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters, reading the
    /// system time.
    #[must_use]
    pub fn new(config: Config, database: Db) -> Self {
        Self::with_clock(config, database, SystemClock)
    }
}

impl<Db, Clk> Service<Db, Clk> {
    /// Creates a new [`Service`] reading time from the provided [`Clock`].
    #[must_use]
    pub fn with_clock(config: Config, database: Db, clock: Clk) -> Self {
        Self {
            config,
            database,
            clock,
        }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns the current [`DateTime`] of this [`Service`].
    #[must_use]
    pub fn now(&self) -> DateTime
    where
        Clk: Clock,
    {
        self.clock.now()
    }
}
