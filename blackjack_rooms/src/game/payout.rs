//! Round settlement.

use serde::Serialize;

use super::{
    engine::Round,
    entities::{
        Card, Chips, DEALER_STANDS_ON, HandId, HandValue, PlayerId, is_blackjack, is_bust,
    },
    errors::{GameError, GameResult},
    events::GameEvent,
    stage::Stage,
};
use crate::{deck::DEALER_PILE, store::PlayerStatus};

/// How a hand fared against the dealer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Bust,
    Blackjack,
    DealerBust,
    Win,
    Lose,
    Push,
    DealerBlackjack,
}

impl Outcome {
    /// Compare a hand with the dealer's. A player bust loses even when the
    /// dealer busts too.
    #[must_use]
    pub fn settle(player: &[Card], dealer: &[Card]) -> Self {
        if is_bust(player) {
            return Self::Bust;
        }

        let player_blackjack = is_blackjack(player);
        if is_bust(dealer) {
            return if player_blackjack {
                Self::Blackjack
            } else {
                Self::DealerBust
            };
        }

        let dealer_blackjack = is_blackjack(dealer);
        match (player_blackjack, dealer_blackjack) {
            (true, false) => return Self::Blackjack,
            (false, true) => return Self::DealerBlackjack,
            _ => {}
        }

        let ours = HandValue::of(player).total;
        let theirs = HandValue::of(dealer).total;
        match ours.cmp(&theirs) {
            std::cmp::Ordering::Greater => Self::Win,
            std::cmp::Ordering::Less => Self::Lose,
            std::cmp::Ordering::Equal => Self::Push,
        }
    }

    /// Chips returned to the player for a hand that staked `bet`, stake
    /// included. Blackjack pays 3:2, rounded down.
    #[must_use]
    pub const fn payout(self, bet: Chips) -> Chips {
        match self {
            Self::Bust | Self::Lose | Self::DealerBlackjack => 0,
            Self::Blackjack => bet * 5 / 2,
            Self::DealerBust | Self::Win => bet * 2,
            Self::Push => bet,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandResult {
    pub hand_id: HandId,
    pub player_id: PlayerId,
    pub bet: Chips,
    pub total: u8,
    pub outcome: Outcome,
    pub payout: Chips,
}

impl Round<'_> {
    /// Play the dealer out, pay every active hand and open the next
    /// betting window.
    pub(super) async fn finish_round(&mut self) -> GameResult<()> {
        self.enter(Stage::FinishRound);
        self.play_dealer().await?;

        let dealer = self.state.dealer_hand.clone();
        let mut results = Vec::new();
        for player_id in self.snapshot.active_players() {
            let hands: Vec<(HandId, Chips)> = self
                .snapshot
                .hands_of(player_id)
                .iter()
                .map(|h| (h.id, h.bet))
                .collect();

            for (hand_id, bet) in hands {
                let Some(cards) = self.state.hands.get(&hand_id) else {
                    log::warn!(
                        "Room {}: hand {hand_id} has a bet but no cards, skipping",
                        self.snapshot.room.id
                    );
                    continue;
                };

                let outcome = Outcome::settle(cards, &dealer);
                let payout = outcome.payout(bet);
                results.push(HandResult {
                    hand_id,
                    player_id,
                    bet,
                    total: HandValue::of(cards).total,
                    outcome,
                    payout,
                });
                if let Some(player) = self.snapshot.player_mut(player_id) {
                    player.balance += payout;
                }
            }
        }

        log::info!(
            "Room {}: round settled, dealer {} with {} hand(s)",
            self.snapshot.room.id,
            HandValue::of(&dealer).total,
            results.len()
        );

        self.snapshot.hands.clear();
        self.deck.return_all(&self.deck_id()?).await?;
        self.state.clear_round();
        for player in &mut self.snapshot.players {
            if player.status == PlayerStatus::Active {
                player.status = PlayerStatus::Inactive;
            }
        }

        self.events.push(GameEvent::RoundSettled {
            dealer_hand: dealer,
            results,
        });
        self.open_betting();
        Ok(())
    }

    async fn play_dealer(&mut self) -> GameResult<()> {
        let deck_id = self.deck_id()?;
        loop {
            let value = HandValue::of(&self.state.dealer_hand);
            let hits = value.total < DEALER_STANDS_ON
                || (value.total == DEALER_STANDS_ON
                    && value.soft
                    && self.config.dealer_hits_soft_17);
            if !hits {
                return Ok(());
            }

            let mut drawn = self.deck.draw(&deck_id, DEALER_PILE, 1).await?;
            if drawn.is_empty() {
                return Err(GameError::Internal("dealer draw returned no card".to_string()));
            }
            self.state.dealer_hand.append(&mut drawn);
        }
    }
}
