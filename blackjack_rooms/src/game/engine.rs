//! Action resolution for a room.
//!
//! The engine owns no state. Each call loads the room's stage and config
//! from a [`RoomSnapshot`], applies one operation, and writes the new blob
//! back into the snapshot; the caller decides whether to commit it. An
//! error leaves the caller with a snapshot it must throw away.
//!
//! Deadlines are checked cooperatively: a bet placed after the betting
//! deadline closes betting, and `hurry_up` pushes a stalled stage forward
//! once its deadline has passed.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{
    action::{Action, ActionKind},
    config::GameConfig,
    entities::{Card, Chips, HandId, PlayerId, can_split, is_bust},
    errors::{GameError, GameResult},
    events::GameEvent,
    stage::{GameState, Stage, is_action_valid},
};
use crate::{
    deck::{DEALER_PILE, DeckProvider},
    store::{HandRecord, PlayerStatus, RoomSnapshot},
};

/// Resolves room operations against a deck provider.
pub struct Engine<'a> {
    deck: &'a dyn DeckProvider,
}

impl<'a> Engine<'a> {
    pub fn new(deck: &'a dyn DeckProvider) -> Self {
        Self { deck }
    }

    /// Apply a player's action.
    pub async fn resolve(
        &self,
        snapshot: &mut RoomSnapshot,
        actor: PlayerId,
        action: Action,
        now: DateTime<Utc>,
    ) -> GameResult<Vec<GameEvent>> {
        let mut round = Round::load(snapshot, self.deck, now)?;

        let kind = action.kind();
        if !is_action_valid(kind, &round.state.current_stage) {
            return Err(GameError::InvalidStage {
                action: kind,
                stage: round.state.current_stage.name(),
            });
        }

        if !round
            .snapshot
            .player(actor)
            .is_some_and(|p| p.status != PlayerStatus::Left)
        {
            return Err(GameError::UnknownActor(actor));
        }

        match action {
            Action::Bet { amount } => round.place_bet(actor, amount).await?,
            Action::Hit { hand } => round.hit(actor, hand).await?,
            Action::Stand { hand } => round.stand(actor, hand).await?,
            Action::Double { hand } => round.double(actor, hand).await?,
            Action::Split { amount, hand } => round.split(actor, amount, hand).await?,
            Action::Surrender => round.surrender(actor).await?,
            Action::HurryUp => round.hurry_up().await?,
        }

        round.save()
    }

    /// Start the game: prepare the deck and open the first betting window.
    pub async fn start(
        &self,
        snapshot: &mut RoomSnapshot,
        now: DateTime<Utc>,
    ) -> GameResult<Vec<GameEvent>> {
        let mut round = Round::load(snapshot, self.deck, now)?;
        if round.state.current_stage != Stage::Init {
            return Err(GameError::GameAlreadyStarted);
        }

        round.enter(Stage::Setup);
        let deck_id = round
            .deck
            .create_deck(round.config.deck_count, false)
            .await?;
        round.deck.create_pile(&deck_id, DEALER_PILE).await?;
        round.snapshot.room.deck_id = Some(deck_id);
        round.open_betting();

        round.save()
    }

    /// Push the room forward if its stage deadline has passed. Returns
    /// `None` when there is nothing to do, including an expired betting
    /// window nobody has bet in.
    pub async fn advance_expired(
        &self,
        snapshot: &mut RoomSnapshot,
        now: DateTime<Utc>,
    ) -> GameResult<Option<Vec<GameEvent>>> {
        let mut round = Round::load(snapshot, self.deck, now)?;
        let due = match &round.state.current_stage {
            Stage::Betting { bets, .. } => !bets.is_empty(),
            Stage::PlayerAction { .. } => true,
            _ => false,
        };
        if !due || !round.state.current_stage.deadline_passed(now) {
            return Ok(None);
        }

        round.hurry_up().await?;
        round.save().map(Some)
    }

    /// Take a player out of the room.
    ///
    /// A pending bet is withdrawn, closing betting if everyone left in the
    /// room has now bet. Hands already dealt are forfeited and their seat
    /// stays in the turn order until the round settles; if it was the
    /// player's turn, the turn passes on.
    pub async fn remove_player(
        &self,
        snapshot: &mut RoomSnapshot,
        player_id: PlayerId,
        now: DateTime<Utc>,
    ) -> GameResult<Vec<GameEvent>> {
        let mut round = Round::load(snapshot, self.deck, now)?;
        let order = round.snapshot.turn_order();

        let player = round
            .snapshot
            .player_mut(player_id)
            .filter(|p| p.status != PlayerStatus::Left)
            .ok_or(GameError::UnknownActor(player_id))?;
        player.status = PlayerStatus::Left;
        let user_id = player.user_id;
        round.events.push(GameEvent::PlayerLeft { player_id, user_id });

        let seat = order.iter().position(|id| *id == player_id);
        match &mut round.state.current_stage {
            Stage::Betting { bets, .. } => {
                bets.remove(&player_id);
                if !bets.is_empty() && bets.len() >= round.snapshot.seated_count() {
                    round.close_betting().await?;
                }
            }
            Stage::PlayerAction { turn_index, .. } => {
                let on_turn = seat == Some(*turn_index);
                let forfeited: Vec<HandId> = round
                    .snapshot
                    .hands_of(player_id)
                    .iter()
                    .map(|h| h.id)
                    .collect();
                round.state.finished_hands.extend(forfeited);
                if on_turn {
                    round.advance_turn(player_id).await?;
                }
            }
            _ => {}
        }

        round.save()
    }

    /// Close the room. Bets on hands still in play are refunded; hands
    /// forfeited by players who left are not.
    pub async fn teardown(
        &self,
        snapshot: &mut RoomSnapshot,
        now: DateTime<Utc>,
    ) -> GameResult<Vec<GameEvent>> {
        let mut round = Round::load(snapshot, self.deck, now)?;

        let refunds: Vec<(PlayerId, Chips)> = round
            .snapshot
            .hands
            .iter()
            .map(|h| (h.player_id, h.bet))
            .collect();
        for (player_id, bet) in refunds {
            if let Some(player) = round
                .snapshot
                .player_mut(player_id)
                .filter(|p| p.status != PlayerStatus::Left)
            {
                player.balance += bet;
            }
        }
        round.snapshot.hands.clear();

        if let Some(deck_id) = round.snapshot.room.deck_id.clone() {
            round.deck.return_all(&deck_id).await?;
        }
        round.state.clear_round();
        round.enter(Stage::Teardown);
        round.events.push(GameEvent::RoomClosed {
            reason: "closed by admin".to_string(),
        });

        round.save()
    }
}

/// One room's state, loaded for the duration of a single operation.
pub(super) struct Round<'r> {
    pub(super) snapshot: &'r mut RoomSnapshot,
    pub(super) state: GameState,
    pub(super) config: GameConfig,
    pub(super) deck: &'r dyn DeckProvider,
    pub(super) now: DateTime<Utc>,
    pub(super) events: Vec<GameEvent>,
}

impl<'r> Round<'r> {
    fn load(
        snapshot: &'r mut RoomSnapshot,
        deck: &'r dyn DeckProvider,
        now: DateTime<Utc>,
    ) -> GameResult<Self> {
        let state = GameState::from_blob(&snapshot.room.state)?;
        let config = GameConfig::from_blob(&snapshot.room.config)?;
        Ok(Self {
            snapshot,
            state,
            config,
            deck,
            now,
            events: Vec::new(),
        })
    }

    fn save(self) -> GameResult<Vec<GameEvent>> {
        self.snapshot.room.state = self.state.to_blob()?;
        Ok(self.events)
    }

    pub(super) fn enter(&mut self, stage: Stage) {
        let name = stage.name();
        self.state.current_stage = stage;
        self.events.push(GameEvent::StageChanged { stage: name });
    }

    pub(super) fn open_betting(&mut self) {
        self.enter(Stage::Betting {
            deadline: self.now + self.config.betting_window(),
            bets: BTreeMap::new(),
        });
    }

    pub(super) fn deck_id(&self) -> GameResult<String> {
        self.snapshot
            .room
            .deck_id
            .clone()
            .ok_or_else(|| GameError::Internal("room has no deck".to_string()))
    }

    fn turn_index(&self) -> GameResult<usize> {
        match &self.state.current_stage {
            Stage::PlayerAction { turn_index, .. } => Ok(*turn_index),
            other => Err(GameError::Internal(format!(
                "no turn during {}",
                other.name()
            ))),
        }
    }

    fn balance(&self, player_id: PlayerId) -> GameResult<Chips> {
        self.snapshot
            .player(player_id)
            .map(|p| p.balance)
            .ok_or(GameError::UnknownActor(player_id))
    }

    fn adjust_balance(&mut self, player_id: PlayerId, delta: Chips) -> GameResult<()> {
        let player = self
            .snapshot
            .player_mut(player_id)
            .ok_or(GameError::UnknownActor(player_id))?;
        player.balance += delta;
        Ok(())
    }

    fn bet_on(&self, hand_id: HandId) -> GameResult<Chips> {
        self.snapshot
            .hands
            .iter()
            .find(|h| h.id == hand_id)
            .map(|h| h.bet)
            .ok_or_else(|| GameError::Internal(format!("hand {hand_id} has no record")))
    }

    async fn draw_one(&self, hand_id: HandId) -> GameResult<Card> {
        let deck_id = self.deck_id()?;
        self.deck
            .draw(&deck_id, &hand_id.to_string(), 1)
            .await?
            .pop()
            .ok_or_else(|| GameError::Internal("deck returned no card".to_string()))
    }

    // === Betting ===

    async fn place_bet(&mut self, actor: PlayerId, amount: Chips) -> GameResult<()> {
        if amount < self.config.min_bet {
            return Err(GameError::BetBelowMinimum {
                min_bet: self.config.min_bet,
            });
        }

        let available = self.balance(actor)?;
        if available < amount {
            return Err(GameError::InsufficientBalance {
                available,
                required: amount,
            });
        }

        let Stage::Betting { deadline, bets } = &mut self.state.current_stage else {
            return Err(GameError::Internal("bet outside betting".to_string()));
        };
        bets.insert(actor, amount);
        let deadline = *deadline;
        let bet_count = bets.len();

        if let Some(player) = self.snapshot.player_mut(actor) {
            player.status = PlayerStatus::Active;
        }
        self.events.push(GameEvent::BetPlaced {
            player_id: actor,
            amount,
        });

        if self.now < deadline && bet_count < self.snapshot.seated_count() {
            return Ok(());
        }
        self.close_betting().await
    }

    /// Collect every recorded bet, deal the round and hand the turn to the
    /// first player.
    async fn close_betting(&mut self) -> GameResult<()> {
        let bets = match &self.state.current_stage {
            Stage::Betting { bets, .. } => bets.clone(),
            other => {
                return Err(GameError::Internal(format!(
                    "can't close betting during {}",
                    other.name()
                )));
            }
        };

        if bets.is_empty() {
            log::debug!(
                "Room {}: betting closed without bets, reopening",
                self.snapshot.room.id
            );
            self.open_betting();
            return Ok(());
        }

        for (&player_id, &amount) in &bets {
            let room_id = self.snapshot.room.id;
            let player = self
                .snapshot
                .player_mut(player_id)
                .filter(|p| p.status != PlayerStatus::Left)
                .ok_or_else(|| {
                    log::error!(
                        "Room {room_id}: bet of {amount} belongs to player {player_id} who is not in the room"
                    );
                    GameError::OrphanedBet(player_id)
                })?;
            player.balance -= amount;
            player.status = PlayerStatus::Active;
        }
        for player in &mut self.snapshot.players {
            if player.status == PlayerStatus::Active && !bets.contains_key(&player.id) {
                player.status = PlayerStatus::Inactive;
            }
        }

        self.enter(Stage::Dealing);
        let deck_id = self.deck_id()?;
        let mut dealt = Vec::new();
        for player_id in self.snapshot.active_players() {
            let Some(&bet) = bets.get(&player_id) else {
                continue;
            };
            let hand = HandRecord {
                id: Uuid::new_v4(),
                player_id,
                order: 0,
                bet,
            };
            let pile = hand.id.to_string();
            self.deck.create_pile(&deck_id, &pile).await?;
            let cards = self.deck.draw(&deck_id, &pile, 2).await?;
            self.state.hands.insert(hand.id, cards);
            dealt.push(hand.id);
            self.snapshot.hands.push(hand);
        }
        self.state.dealer_hand = self.deck.draw(&deck_id, DEALER_PILE, 2).await?;
        self.events.push(GameEvent::CardsDealt { hands: dealt });

        log::debug!(
            "Room {}: dealt {} hand(s)",
            self.snapshot.room.id,
            self.state.hands.len()
        );

        self.start_turn(0)
    }

    // === Hurry up ===

    async fn hurry_up(&mut self) -> GameResult<()> {
        let deadline = self
            .state
            .current_stage
            .deadline()
            .ok_or_else(|| GameError::Internal("stage has no deadline".to_string()))?;
        if self.now < deadline {
            return Err(GameError::DeadlineNotReached {
                remaining_secs: (deadline - self.now).num_seconds(),
            });
        }

        match &self.state.current_stage {
            Stage::Betting { .. } => self.close_betting().await,
            Stage::PlayerAction { turn_index, .. } => {
                let current = self.snapshot.turn_order().get(*turn_index).copied();
                match current {
                    Some(player_id) => {
                        let open: Vec<HandId> =
                            self.snapshot.hands_of(player_id).iter().map(|h| h.id).collect();
                        self.state.finished_hands.extend(open);
                        self.advance_turn(player_id).await
                    }
                    None => self.finish_round().await,
                }
            }
            other => Err(GameError::Internal(format!(
                "hurry up during {}",
                other.name()
            ))),
        }
    }

    // === Player actions ===

    fn ensure_turn(&self, actor: PlayerId) -> GameResult<()> {
        let turn_index = self.turn_index()?;
        if self.snapshot.turn_order().get(turn_index) != Some(&actor) {
            return Err(GameError::OutOfTurn);
        }
        Ok(())
    }

    /// The hand an action applies to.
    fn acting_hand(&self, actor: PlayerId, selector: Option<u8>) -> GameResult<HandId> {
        self.ensure_turn(actor)?;

        let hands = self.snapshot.hands_of(actor);
        let hand = match selector {
            Some(order) => hands
                .iter()
                .find(|h| h.order == order)
                .ok_or(GameError::HandNotFound { order })?,
            None => match hands.as_slice() {
                [only] => only,
                [] => return Err(GameError::HandNotFound { order: 0 }),
                many => {
                    return Err(GameError::HandSelectorRequired { hands: many.len() });
                }
            },
        };

        if self.state.is_finished(hand.id) {
            return Err(GameError::HandFinished);
        }
        Ok(hand.id)
    }

    async fn hit(&mut self, actor: PlayerId, selector: Option<u8>) -> GameResult<()> {
        let hand_id = self.acting_hand(actor, selector)?;
        let card = self.draw_one(hand_id).await?;

        let cards = self.state.hands.entry(hand_id).or_default();
        cards.push(card);
        if is_bust(cards) {
            self.state.finished_hands.insert(hand_id);
            self.after_hand_finished(actor).await?;
        }
        Ok(())
    }

    async fn stand(&mut self, actor: PlayerId, selector: Option<u8>) -> GameResult<()> {
        let hand_id = self.acting_hand(actor, selector)?;
        self.state.finished_hands.insert(hand_id);
        self.after_hand_finished(actor).await
    }

    async fn double(&mut self, actor: PlayerId, selector: Option<u8>) -> GameResult<()> {
        let hand_id = self.acting_hand(actor, selector)?;
        let cards = self.state.hand_cards(hand_id).len();
        if cards != 2 {
            return Err(GameError::WrongCardCount {
                action: ActionKind::Double,
                cards,
            });
        }

        let bet = self.bet_on(hand_id)?;
        let available = self.balance(actor)?;
        if available < bet {
            return Err(GameError::InsufficientBalance {
                available,
                required: bet,
            });
        }

        self.adjust_balance(actor, -bet)?;
        if let Some(hand) = self.snapshot.hand_mut(hand_id) {
            hand.bet = bet * 2;
        }

        let card = self.draw_one(hand_id).await?;
        self.state.hands.entry(hand_id).or_default().push(card);
        self.state.finished_hands.insert(hand_id);
        self.after_hand_finished(actor).await
    }

    async fn split(
        &mut self,
        actor: PlayerId,
        amount: Option<Chips>,
        selector: Option<u8>,
    ) -> GameResult<()> {
        let hand_id = self.acting_hand(actor, selector)?;
        if self.snapshot.hands_of(actor).len() > 1 {
            return Err(GameError::AlreadySplit);
        }

        let cards = self.state.hand_cards(hand_id);
        if cards.len() != 2 {
            return Err(GameError::WrongCardCount {
                action: ActionKind::Split,
                cards: cards.len(),
            });
        }
        if !can_split(cards) {
            return Err(GameError::NotSplittable);
        }

        let bet = self.bet_on(hand_id)?;
        if let Some(given) = amount
            && given != bet
        {
            return Err(GameError::SplitAmountMismatch { given, bet });
        }
        let available = self.balance(actor)?;
        if available < bet {
            return Err(GameError::InsufficientBalance {
                available,
                required: bet,
            });
        }

        self.adjust_balance(actor, -bet)?;
        let new_hand = HandRecord {
            id: Uuid::new_v4(),
            player_id: actor,
            order: 1,
            bet,
        };
        self.deck
            .create_pile(&self.deck_id()?, &new_hand.id.to_string())
            .await?;

        let moved = self
            .state
            .hands
            .get_mut(&hand_id)
            .and_then(Vec::pop)
            .ok_or_else(|| GameError::Internal("split hand lost its cards".to_string()))?;
        self.state.hands.insert(new_hand.id, vec![moved]);

        let first = self.draw_one(hand_id).await?;
        self.state.hands.entry(hand_id).or_default().push(first);
        let second = self.draw_one(new_hand.id).await?;
        self.state.hands.entry(new_hand.id).or_default().push(second);

        self.events.push(GameEvent::HandSplit {
            player_id: actor,
            hand_id: new_hand.id,
        });
        self.snapshot.hands.push(new_hand);
        Ok(())
    }

    async fn surrender(&mut self, actor: PlayerId) -> GameResult<()> {
        self.ensure_turn(actor)?;
        let hands = self.snapshot.hands_of(actor);
        if hands.len() > 1 {
            return Err(GameError::SurrenderAfterSplit);
        }
        let hand_id = self.acting_hand(actor, None)?;

        let cards = self.state.hand_cards(hand_id).len();
        if cards != 2 {
            return Err(GameError::WrongCardCount {
                action: ActionKind::Surrender,
                cards,
            });
        }

        let bet = self.bet_on(hand_id)?;
        self.adjust_balance(actor, bet / 2)?;
        self.snapshot.hands.retain(|h| h.id != hand_id);
        self.state.hands.remove(&hand_id);
        self.state.finished_hands.remove(&hand_id);
        if let Some(player) = self.snapshot.player_mut(actor) {
            player.status = PlayerStatus::Inactive;
        }

        self.advance_turn(actor).await
    }

    // === Turn order ===

    async fn after_hand_finished(&mut self, actor: PlayerId) -> GameResult<()> {
        let all_done = self
            .snapshot
            .hands_of(actor)
            .iter()
            .all(|h| self.state.is_finished(h.id));
        if all_done {
            self.advance_turn(actor).await?;
        }
        Ok(())
    }

    fn start_turn(&mut self, turn_index: usize) -> GameResult<()> {
        let player_id = *self
            .snapshot
            .turn_order()
            .get(turn_index)
            .ok_or_else(|| GameError::Internal(format!("no player at turn {turn_index}")))?;
        self.enter(Stage::PlayerAction {
            deadline: self.now + self.config.turn_window(),
            turn_index,
        });
        self.events.push(GameEvent::TurnChanged {
            player_id,
            turn_index,
        });
        Ok(())
    }

    fn has_open_hand(&self, player_id: PlayerId) -> bool {
        self.snapshot
            .hands_of(player_id)
            .iter()
            .any(|h| !self.state.is_finished(h.id))
    }

    /// Move past `actor`'s turn, skipping seats with nothing left to play.
    /// When `actor` has just dropped out of the turn order (surrender), the
    /// next player already sits at the current index.
    pub(super) async fn advance_turn(&mut self, actor: PlayerId) -> GameResult<()> {
        let turn_index = self.turn_index()?;
        let order = self.snapshot.turn_order();
        let mut next = if order.contains(&actor) {
            turn_index + 1
        } else {
            turn_index
        };
        while next < order.len() && !self.has_open_hand(order[next]) {
            next += 1;
        }

        if next < order.len() {
            self.start_turn(next)
        } else {
            self.finish_round().await
        }
    }
}
