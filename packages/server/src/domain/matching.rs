//! Pure matching logic.
//!
//! This module contains side-effect-free functions implementing the pairing
//! rules: FIFO within a mood group, never across moods, and a deterministic
//! role order both peers can reproduce independently.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::entity::QueueEntry;
use super::value_object::{Mood, UserId};

/// Total order over user ids used for role assignment.
///
/// Ids that both parse as unsigned integers compare numerically (so "9"
/// precedes "10"); any other pair compares lexicographically. Either way the
/// order is deterministic and symmetric.
pub fn user_order(a: &UserId, b: &UserId) -> Ordering {
    match (a.as_str().parse::<u64>(), b.as_str().parse::<u64>()) {
        (Ok(na), Ok(nb)) => na.cmp(&nb),
        _ => a.as_str().cmp(b.as_str()),
    }
}

/// Whether `a` takes the initiator role when paired with `b`.
///
/// The smaller user id initiates; the other side receives.
pub fn initiator_precedes(a: &UserId, b: &UserId) -> bool {
    user_order(a, b) == Ordering::Less
}

/// Pair queue entries FIFO within each mood group.
///
/// # Arguments
///
/// * `entries` - queue entries ordered by joined_at ascending (oldest first)
///
/// # Returns
///
/// Pairs of entries sharing a mood, oldest two first within each group; an
/// odd remainder in a group is left unpaired. Groups are emitted in the fixed
/// `Mood::ALL` order for deterministic output.
pub fn pair_fifo(entries: &[QueueEntry]) -> Vec<(QueueEntry, QueueEntry)> {
    let mut groups: HashMap<Mood, Vec<&QueueEntry>> = HashMap::new();
    for entry in entries {
        groups.entry(entry.mood).or_default().push(entry);
    }

    let mut pairs = Vec::new();
    for mood in Mood::ALL {
        if let Some(group) = groups.get(&mood) {
            for chunk in group.chunks_exact(2) {
                pairs.push((chunk[0].clone(), chunk[1].clone()));
            }
        }
    }
    pairs
}
