//! Pure game-organizing rules, independent of storage and transport.

pub mod attendance;
pub mod availability;
pub mod clock;
pub mod pricing;
pub mod recurrence;
pub mod teams;

#[cfg(test)]
pub(crate) mod testing;
