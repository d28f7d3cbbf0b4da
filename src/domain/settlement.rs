//! Equal-split settlement of a match's cost

use rust_decimal::Decimal;
use serde::Serialize;

use crate::application::errors::BotError;
use crate::domain::entities::{Match, ParticipantDetail};

/// Amount one participant owes for a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub member_id: String,
    pub member_name: String,
    pub amount_due: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub match_id: String,
    pub match_name: String,
    pub participants: usize,
    pub amount_per_person: Decimal,
    pub total_cost: Decimal,
    pub allocations: Vec<Allocation>,
}

impl Settlement {
    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }
}

/// Split the match cost evenly across the current participants.
///
/// Every participant owes the match's current price per head, so the total is
/// `price * participants`. A match without a price (or priced at zero) settles
/// to nothing. Join-time `amount_due` snapshots are not consulted.
///
/// Fails with [`BotError::Validation`] when the total does not fit a `Decimal`.
pub fn calculate(game: &Match, participants: &[ParticipantDetail]) -> Result<Settlement, BotError> {
    let price = game.price_or_zero();

    if price.is_zero() {
        return Ok(Settlement {
            match_id: game.id.clone(),
            match_name: game.name.clone(),
            participants: participants.len(),
            amount_per_person: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            allocations: Vec::new(),
        });
    }

    let total_cost = price
        .checked_mul(Decimal::from(participants.len()))
        .ok_or_else(|| BotError::Validation("❌ Total tagihan pertandingan terlalu besar".to_string()))?;

    let allocations: Vec<Allocation> = participants
        .iter()
        .map(|p| Allocation {
            member_id: p.member_id.clone(),
            member_name: p.member_name.clone(),
            amount_due: price,
        })
        .collect();

    Ok(Settlement {
        match_id: game.id.clone(),
        match_name: game.name.clone(),
        participants: participants.len(),
        amount_per_person: price,
        total_cost,
        allocations,
    })
}
