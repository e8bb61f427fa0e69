//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing an entity expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// Marker type describing a start of a period.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker type describing an end of a period.
#[derive(Clone, Copy, Debug)]
pub struct End;
