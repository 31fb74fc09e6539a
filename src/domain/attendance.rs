//! Attendance state machine: confirmed spots, waitlist and cost split.

use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::{ConfirmedPlayer, Cost, DeclinedPlayer, Roster, WaitlistEntry};

/// Error returned when an attendance change is not allowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// The player already holds a spot.
    #[error("player already confirmed")]
    AlreadyConfirmed,
    /// The player is already queued.
    #[error("player already on the waitlist")]
    AlreadyWaitlisted,
    /// The player neither holds a spot nor waits for one.
    #[error("player is not attending this game")]
    NotAttending,
}

/// Result of a successful confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The player got a spot.
    Confirmed,
    /// The game was full; the player joined the waitlist at this 1-based position.
    Waitlisted {
        /// Position in the queue.
        position: usize,
    },
}

/// Result of a successful cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancellation {
    /// A confirmed player gave up their spot.
    Withdrew {
        /// Head of the waitlist moved into the freed spot, if any.
        promoted: Option<Uuid>,
    },
    /// A waitlisted player left the queue.
    LeftWaitlist,
}

impl Roster {
    /// Whether the player holds a spot.
    pub fn is_confirmed(&self, user_id: Uuid) -> bool {
        self.confirmed.iter().any(|player| player.user_id == user_id)
    }

    /// Whether the player is queued.
    pub fn is_waitlisted(&self, user_id: Uuid) -> bool {
        self.waitlist.iter().any(|entry| entry.user_id == user_id)
    }

    /// Whether every spot is taken.
    pub fn is_full(&self) -> bool {
        self.confirmed.len() >= usize::from(self.max)
    }

    /// Request a spot for `user_id`, queueing them when the game is full.
    pub fn confirm(&mut self, user_id: Uuid, now: OffsetDateTime) -> Result<Confirmation, RosterError> {
        if self.is_confirmed(user_id) {
            return Err(RosterError::AlreadyConfirmed);
        }
        if self.is_waitlisted(user_id) {
            return Err(RosterError::AlreadyWaitlisted);
        }

        if self.is_full() {
            self.waitlist.push(WaitlistEntry {
                user_id,
                added_at: now,
            });
            return Ok(Confirmation::Waitlisted {
                position: self.waitlist.len(),
            });
        }

        self.pending.retain(|id| *id != user_id);
        self.declined.retain(|declined| declined.user_id != user_id);
        self.confirmed.push(ConfirmedPlayer {
            user_id,
            confirmed_at: now,
            team: None,
            is_paid: false,
        });
        Ok(Confirmation::Confirmed)
    }

    /// Withdraw `user_id`. A freed spot goes to the head of the waitlist.
    pub fn cancel(
        &mut self,
        user_id: Uuid,
        reason: Option<String>,
        now: OffsetDateTime,
    ) -> Result<Cancellation, RosterError> {
        if self.is_confirmed(user_id) {
            self.confirmed.retain(|player| player.user_id != user_id);
            if reason.is_some() {
                self.declined.push(DeclinedPlayer {
                    user_id,
                    reason,
                    declined_at: now,
                });
            }
            let promoted = self.promote_next(now);
            return Ok(Cancellation::Withdrew { promoted });
        }

        if self.is_waitlisted(user_id) {
            self.waitlist.retain(|entry| entry.user_id != user_id);
            return Ok(Cancellation::LeftWaitlist);
        }

        Err(RosterError::NotAttending)
    }

    fn promote_next(&mut self, now: OffsetDateTime) -> Option<Uuid> {
        if self.is_full() || self.waitlist.is_empty() {
            return None;
        }
        let next = self.waitlist.remove(0);
        self.confirmed.push(ConfirmedPlayer {
            user_id: next.user_id,
            confirmed_at: now,
            team: None,
            is_paid: false,
        });
        Some(next.user_id)
    }
}

impl Cost {
    /// Field price plus every additional cost.
    pub fn total(&self) -> f64 {
        self.field_price + self.additional_costs.iter().map(|cost| cost.amount).sum::<f64>()
    }

    /// Split the total among `confirmed` players, rounding each share up to a whole unit.
    pub fn recompute(&mut self, confirmed: usize) {
        let players = confirmed.max(1) as f64;
        self.per_player = (self.total() / players).ceil();
    }
}
