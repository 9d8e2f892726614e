//! In-process deck provider.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{DeckError, DeckId, DeckProvider, DeckResult};
use crate::game::entities::{Card, Rank, Suit};

#[derive(Debug)]
struct Shoe {
    deck_count: u8,
    jokers: bool,
    /// Top of the shoe is the end of the vector.
    cards: Vec<Card>,
    piles: HashMap<String, Vec<Card>>,
}

impl Shoe {
    fn new(deck_count: u8, jokers: bool) -> Self {
        let mut shoe = Self {
            deck_count,
            jokers,
            cards: Vec::new(),
            piles: HashMap::new(),
        };
        shoe.refill();
        shoe
    }

    fn refill(&mut self) {
        let mut cards = Vec::with_capacity(usize::from(self.deck_count) * 54);
        for _ in 0..self.deck_count {
            for suit in Suit::STANDARD {
                for rank in Rank::STANDARD {
                    cards.push(Card::new(rank, suit));
                }
            }
            if self.jokers {
                cards.push(Card::new(Rank::Joker, Suit::Black));
                cards.push(Card::new(Rank::Joker, Suit::Red));
            }
        }
        cards.shuffle(&mut rand::rng());
        self.cards = cards;
    }
}

/// Deck provider that keeps its shoes in memory.
///
/// Cards pushed with [`LocalDeck::script`] are dealt before anything from the
/// shoe, in order, which makes rounds reproducible in tests.
#[derive(Debug, Default)]
pub struct LocalDeck {
    shoes: Mutex<HashMap<DeckId, Shoe>>,
    script: Mutex<VecDeque<Card>>,
}

impl LocalDeck {
    pub fn new() -> Self {
        Self::default()
    }

    /// A deck whose first draws are exactly `cards`.
    pub fn scripted(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            shoes: Mutex::default(),
            script: Mutex::new(cards.into_iter().collect()),
        }
    }

    /// Queue more cards to be dealt next.
    pub async fn script(&self, cards: impl IntoIterator<Item = Card>) {
        self.script.lock().await.extend(cards);
    }
}

#[async_trait]
impl DeckProvider for LocalDeck {
    async fn create_deck(&self, deck_count: u8, jokers: bool) -> DeckResult<DeckId> {
        let id = Uuid::new_v4().simple().to_string();
        self.shoes
            .lock()
            .await
            .insert(id.clone(), Shoe::new(deck_count.max(1), jokers));
        log::debug!("Created local deck {id} with {deck_count} deck(s)");
        Ok(id)
    }

    async fn create_pile(&self, deck: &str, pile: &str) -> DeckResult<()> {
        let mut shoes = self.shoes.lock().await;
        let shoe = shoes
            .get_mut(deck)
            .ok_or_else(|| DeckError::DeckNotFound(deck.to_string()))?;
        shoe.piles.entry(pile.to_string()).or_default();
        Ok(())
    }

    async fn draw(&self, deck: &str, pile: &str, count: usize) -> DeckResult<Vec<Card>> {
        let mut shoes = self.shoes.lock().await;
        let shoe = shoes
            .get_mut(deck)
            .ok_or_else(|| DeckError::DeckNotFound(deck.to_string()))?;

        let mut script = self.script.lock().await;
        let scripted = count.min(script.len());
        if count - scripted > shoe.cards.len() {
            return Err(DeckError::Exhausted {
                deck: deck.to_string(),
                wanted: count,
                remaining: shoe.cards.len() + script.len(),
            });
        }

        let mut drawn: Vec<Card> = script.drain(..scripted).collect();
        while drawn.len() < count {
            match shoe.cards.pop() {
                Some(card) => drawn.push(card),
                None => break,
            }
        }

        shoe.piles
            .entry(pile.to_string())
            .or_default()
            .extend(drawn.iter().cloned());
        Ok(drawn)
    }

    async fn list_pile(&self, deck: &str, pile: &str) -> DeckResult<Vec<Card>> {
        let shoes = self.shoes.lock().await;
        let shoe = shoes
            .get(deck)
            .ok_or_else(|| DeckError::DeckNotFound(deck.to_string()))?;
        shoe.piles
            .get(pile)
            .cloned()
            .ok_or_else(|| DeckError::PileNotFound {
                deck: deck.to_string(),
                pile: pile.to_string(),
            })
    }

    async fn return_all(&self, deck: &str) -> DeckResult<()> {
        let mut shoes = self.shoes.lock().await;
        let shoe = shoes
            .get_mut(deck)
            .ok_or_else(|| DeckError::DeckNotFound(deck.to_string()))?;
        shoe.piles.clear();
        shoe.refill();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_deck_has_52_cards_per_deck() {
        let provider = LocalDeck::new();
        let deck = provider.create_deck(2, false).await.unwrap();
        let drawn = provider.draw(&deck, "all", 104).await.unwrap();
        assert_eq!(drawn.len(), 104);
        assert!(provider.draw(&deck, "all", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_jokers_added_on_request() {
        let provider = LocalDeck::new();
        let deck = provider.create_deck(1, true).await.unwrap();
        let drawn = provider.draw(&deck, "all", 54).await.unwrap();
        assert_eq!(drawn.iter().filter(|c| c.value == Rank::Joker).count(), 2);
    }

    #[tokio::test]
    async fn test_draw_goes_into_pile() {
        let provider = LocalDeck::new();
        let deck = provider.create_deck(1, false).await.unwrap();
        provider.create_pile(&deck, "hand").await.unwrap();
        assert!(provider.list_pile(&deck, "hand").await.unwrap().is_empty());

        let drawn = provider.draw(&deck, "hand", 2).await.unwrap();
        assert_eq!(provider.list_pile(&deck, "hand").await.unwrap(), drawn);
    }

    #[tokio::test]
    async fn test_scripted_cards_come_first() {
        let provider = LocalDeck::scripted([
            Card::new(Rank::Eight, Suit::Clubs),
            Card::new(Rank::Eight, Suit::Hearts),
        ]);
        let deck = provider.create_deck(1, false).await.unwrap();
        let drawn = provider.draw(&deck, "p", 3).await.unwrap();
        assert_eq!(drawn[0], Card::new(Rank::Eight, Suit::Clubs));
        assert_eq!(drawn[1], Card::new(Rank::Eight, Suit::Hearts));
        assert_eq!(drawn.len(), 3);
    }

    #[tokio::test]
    async fn test_return_all_empties_piles() {
        let provider = LocalDeck::new();
        let deck = provider.create_deck(1, false).await.unwrap();
        provider.draw(&deck, "p", 50).await.unwrap();
        provider.return_all(&deck).await.unwrap();

        assert!(provider.list_pile(&deck, "p").await.is_err());
        assert_eq!(provider.draw(&deck, "p", 52).await.unwrap().len(), 52);
    }

    #[tokio::test]
    async fn test_unknown_deck() {
        let provider = LocalDeck::new();
        assert!(matches!(
            provider.draw("nope", "p", 1).await,
            Err(DeckError::DeckNotFound(_))
        ));
    }
}
