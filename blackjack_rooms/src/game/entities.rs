use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Chip amounts. Signed because a balance may dip below zero mid-transaction.
pub type Chips = i64;

pub type RoomId = Uuid;
pub type PlayerId = Uuid;
pub type HandId = Uuid;
pub type UserId = i64;

pub const BLACKJACK: u8 = 21;
pub const DEALER_STANDS_ON: u8 = 17;

/// Where the deck provider serves card faces from.
pub const CARD_IMAGE_BASE: &str = "https://deckofcardsapi.com/static/img";

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    #[serde(rename = "SPADES")]
    Spades,
    #[serde(rename = "HEARTS")]
    Hearts,
    #[serde(rename = "DIAMONDS")]
    Diamonds,
    #[serde(rename = "CLUBS")]
    Clubs,
    // Joker "suits" as the deck provider labels them.
    #[serde(rename = "BLACK")]
    Black,
    #[serde(rename = "RED")]
    Red,
}

impl Suit {
    pub const STANDARD: [Self; 4] = [Self::Spades, Self::Hearts, Self::Diamonds, Self::Clubs];

    const fn code(self) -> char {
        match self {
            Self::Spades => 'S',
            Self::Hearts => 'H',
            Self::Diamonds => 'D',
            Self::Clubs => 'C',
            Self::Black => '1',
            Self::Red => '2',
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Spades => "♠",
            Self::Hearts => "♥",
            Self::Diamonds => "♦",
            Self::Clubs => "♣",
            Self::Black | Self::Red => "*",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    #[serde(rename = "ACE")]
    Ace,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "JACK")]
    Jack,
    #[serde(rename = "QUEEN")]
    Queen,
    #[serde(rename = "KING")]
    King,
    #[serde(rename = "JOKER")]
    Joker,
}

impl Rank {
    pub const STANDARD: [Self; 13] = [
        Self::Ace,
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Five,
        Self::Six,
        Self::Seven,
        Self::Eight,
        Self::Nine,
        Self::Ten,
        Self::Jack,
        Self::Queen,
        Self::King,
    ];

    /// Blackjack points with an ace counted high.
    #[must_use]
    pub const fn points(self) -> u8 {
        match self {
            Self::Ace => 11,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
            Self::Nine => 9,
            Self::Ten | Self::Jack | Self::Queen | Self::King => 10,
            Self::Joker => 0,
        }
    }

    /// Rank used when comparing two cards for a split: faces are 10, an ace is 1.
    #[must_use]
    pub const fn split_value(self) -> u8 {
        match self {
            Self::Ace => 1,
            other => other.points(),
        }
    }

    const fn code(self) -> char {
        match self {
            Self::Ace => 'A',
            Self::Two => '2',
            Self::Three => '3',
            Self::Four => '4',
            Self::Five => '5',
            Self::Six => '6',
            Self::Seven => '7',
            Self::Eight => '8',
            Self::Nine => '9',
            Self::Ten => '0',
            Self::Jack => 'J',
            Self::Queen => 'Q',
            Self::King => 'K',
            Self::Joker => 'X',
        }
    }
}

/// A single card as the deck provider describes it.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Card {
    pub code: String,
    pub image: String,
    pub value: Rank,
    pub suit: Suit,
}

impl Card {
    #[must_use]
    pub fn new(value: Rank, suit: Suit) -> Self {
        let code = format!("{}{}", value.code(), suit.code());
        let image = format!("{CARD_IMAGE_BASE}/{code}.png");
        Self {
            code,
            image,
            value,
            suit,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.value {
            Rank::Ace => "A".to_string(),
            Rank::Jack => "J".to_string(),
            Rank::Queen => "Q".to_string(),
            Rank::King => "K".to_string(),
            Rank::Joker => "JOKER".to_string(),
            other => other.points().to_string(),
        };
        write!(f, "{value}{}", self.suit)
    }
}

/// Best total of a set of cards and whether an ace is still counted as 11.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct HandValue {
    pub total: u8,
    pub soft: bool,
}

impl HandValue {
    #[must_use]
    pub fn of(cards: &[Card]) -> Self {
        let mut total: u8 = 0;
        let mut high_aces: u8 = 0;
        for card in cards {
            if card.value == Rank::Ace {
                high_aces += 1;
            }
            total = total.saturating_add(card.value.points());
        }

        while total > BLACKJACK && high_aces > 0 {
            total -= 10;
            high_aces -= 1;
        }

        Self {
            total,
            soft: high_aces > 0,
        }
    }

    #[must_use]
    pub const fn is_bust(self) -> bool {
        self.total > BLACKJACK
    }
}

#[must_use]
pub fn is_bust(cards: &[Card]) -> bool {
    HandValue::of(cards).is_bust()
}

/// A natural: exactly two cards totalling 21.
#[must_use]
pub fn is_blackjack(cards: &[Card]) -> bool {
    cards.len() == 2 && HandValue::of(cards).total == BLACKJACK
}

#[must_use]
pub fn can_split(cards: &[Card]) -> bool {
    match cards {
        [first, second] => first.value.split_value() == second.value.split_value(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(ranks: &[Rank]) -> Vec<Card> {
        ranks.iter().map(|r| Card::new(*r, Suit::Spades)).collect()
    }

    // === Card Tests ===

    #[test]
    fn test_card_code_and_image() {
        let card = Card::new(Rank::Ten, Suit::Hearts);
        assert_eq!(card.code, "0H");
        assert_eq!(card.image, "https://deckofcardsapi.com/static/img/0H.png");
    }

    #[test]
    fn test_card_serializes_with_provider_labels() {
        let card = Card::new(Rank::King, Suit::Diamonds);
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["value"], "KING");
        assert_eq!(json["suit"], "DIAMONDS");
        assert_eq!(json["code"], "KD");

        let back: Card = serde_json::from_value(json).unwrap();
        assert_eq!(back, card);
    }

    #[test]
    fn test_numeric_rank_label() {
        let card: Card = serde_json::from_str(
            r#"{"code":"7C","image":"x","value":"7","suit":"CLUBS"}"#,
        )
        .unwrap();
        assert_eq!(card.value, Rank::Seven);
    }

    #[test]
    fn test_card_display() {
        assert_eq!(Card::new(Rank::Ace, Suit::Spades).to_string(), "A♠");
        assert_eq!(Card::new(Rank::Nine, Suit::Hearts).to_string(), "9♥");
    }

    // === Hand Value Tests ===

    #[test]
    fn test_two_aces_and_nine() {
        let value = HandValue::of(&cards(&[Rank::Ace, Rank::Ace, Rank::Nine]));
        assert_eq!(value.total, 21);
        assert!(value.soft);
    }

    #[test]
    fn test_ten_ten_ace_is_21_but_not_blackjack() {
        let hand = cards(&[Rank::Ten, Rank::Ten, Rank::Ace]);
        assert_eq!(HandValue::of(&hand).total, 21);
        assert!(!HandValue::of(&hand).soft);
        assert!(!is_blackjack(&hand));
    }

    #[test]
    fn test_ace_king_is_blackjack() {
        assert!(is_blackjack(&cards(&[Rank::Ace, Rank::King])));
    }

    #[test]
    fn test_bust() {
        let hand = cards(&[Rank::Nine, Rank::Nine, Rank::Five]);
        assert_eq!(HandValue::of(&hand).total, 23);
        assert!(is_bust(&hand));
    }

    #[test]
    fn test_empty_hand() {
        assert_eq!(HandValue::of(&[]).total, 0);
    }

    // === Split Tests ===

    #[test]
    fn test_faces_split_together() {
        assert!(can_split(&cards(&[Rank::Jack, Rank::King])));
        assert!(can_split(&cards(&[Rank::Ten, Rank::Queen])));
    }

    #[test]
    fn test_ace_two_not_splittable() {
        assert!(!can_split(&cards(&[Rank::Ace, Rank::Two])));
    }

    #[test]
    fn test_split_needs_exactly_two_cards() {
        assert!(!can_split(&cards(&[Rank::Eight])));
        assert!(!can_split(&cards(&[Rank::Eight, Rank::Eight, Rank::Eight])));
    }
}
