//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing an entity acceptance by its recipient.
#[derive(Clone, Copy, Debug)]
pub struct Acceptance;

/// Marker type describing a physical pickup of an entity.
#[derive(Clone, Copy, Debug)]
pub struct Pickup;

/// Marker type describing an entity being locked for exclusive review.
#[derive(Clone, Copy, Debug)]
pub struct Locking;

/// Marker type describing an entity expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;
