//! HTTP client for a deckofcardsapi-compatible deck service.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use super::{DeckError, DeckId, DeckProvider, DeckResult};
use crate::game::entities::Card;

/// Deck provider backed by a remote deck service
#[derive(Clone, Debug)]
pub struct RemoteDeck {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewDeckResponse {
    deck_id: String,
}

#[derive(Debug, Deserialize)]
struct DrawResponse {
    cards: Vec<Card>,
    remaining: usize,
}

#[derive(Debug, Deserialize)]
struct PileContents {
    #[serde(default)]
    cards: Vec<Card>,
}

#[derive(Debug, Deserialize)]
struct ListPileResponse {
    piles: HashMap<String, PileContents>,
}

impl RemoteDeck {
    /// Create a client for the deck endpoint root at `base_url`, e.g.
    /// `https://deckofcardsapi.com/api/deck`. A trailing slash is ignored.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// GET a deck endpoint and decode it, honouring the service's
    /// `success` flag.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> DeckResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        let body: serde_json::Value = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let envelope: Envelope = serde_json::from_value(body.clone())
            .map_err(|e| DeckError::Rejected(format!("malformed response from {url}: {e}")))?;
        if !envelope.success {
            return Err(DeckError::Rejected(
                envelope.error.unwrap_or_else(|| format!("request to {url} failed")),
            ));
        }

        serde_json::from_value(body)
            .map_err(|e| DeckError::Rejected(format!("malformed response from {url}: {e}")))
    }
}

#[async_trait]
impl DeckProvider for RemoteDeck {
    async fn create_deck(&self, deck_count: u8, jokers: bool) -> DeckResult<DeckId> {
        let response: NewDeckResponse = self
            .get(&format!(
                "new/shuffle/?deck_count={deck_count}&jokers_enabled={jokers}"
            ))
            .await?;
        log::debug!("Created remote deck {}", response.deck_id);
        Ok(response.deck_id)
    }

    async fn create_pile(&self, _deck: &str, _pile: &str) -> DeckResult<()> {
        // The service creates a pile the first time cards are added to it.
        Ok(())
    }

    async fn draw(&self, deck: &str, pile: &str, count: usize) -> DeckResult<Vec<Card>> {
        let drawn: DrawResponse = self.get(&format!("{deck}/draw/?count={count}")).await?;
        if drawn.cards.len() < count {
            return Err(DeckError::Exhausted {
                deck: deck.to_string(),
                wanted: count,
                remaining: drawn.remaining,
            });
        }

        let codes: Vec<&str> = drawn.cards.iter().map(|c| c.code.as_str()).collect();
        let _: Envelope = self
            .get(&format!("{deck}/pile/{pile}/add/?cards={}", codes.join(",")))
            .await?;
        Ok(drawn.cards)
    }

    async fn list_pile(&self, deck: &str, pile: &str) -> DeckResult<Vec<Card>> {
        let mut listing: ListPileResponse =
            self.get(&format!("{deck}/pile/{pile}/list/")).await?;
        listing
            .piles
            .remove(pile)
            .map(|contents| contents.cards)
            .ok_or_else(|| DeckError::PileNotFound {
                deck: deck.to_string(),
                pile: pile.to_string(),
            })
    }

    async fn return_all(&self, deck: &str) -> DeckResult<()> {
        let _: Envelope = self.get(&format!("{deck}/return/")).await?;
        let _: Envelope = self.get(&format!("{deck}/shuffle/")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Rank, Suit};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    /// Answer one HTTP request with `body` and hand back its request line.
    async fn serve_once(body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let request = String::from_utf8_lossy(&request).into_owned();
            request.lines().next().unwrap_or_default().to_string()
        });
        (format!("http://{addr}/api/deck"), handle)
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let deck = RemoteDeck::new("https://deckofcardsapi.com/api/deck/");
        assert_eq!(deck.base_url, "https://deckofcardsapi.com/api/deck");
    }

    #[tokio::test]
    async fn test_requests_go_under_configured_root() {
        let (base_url, server) = serve_once(
            r#"{"success": true, "deck_id": "3p40paa87x90", "shuffled": true, "remaining": 52}"#,
        )
        .await;
        let deck = RemoteDeck::new(base_url);

        let deck_id = deck.create_deck(1, false).await.unwrap();

        assert_eq!(deck_id, "3p40paa87x90");
        assert_eq!(
            server.await.unwrap(),
            "GET /api/deck/new/shuffle/?deck_count=1&jokers_enabled=false HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_unsuccessful_response_is_rejected() {
        let (base_url, server) =
            serve_once(r#"{"success": false, "error": "Deck ID does not exist."}"#).await;
        let deck = RemoteDeck::new(base_url);

        let err = deck.return_all("missing").await.unwrap_err();

        assert!(matches!(err, DeckError::Rejected(msg) if msg == "Deck ID does not exist."));
        assert_eq!(server.await.unwrap(), "GET /api/deck/missing/return/ HTTP/1.1");
    }

    #[test]
    fn test_draw_response_decodes_provider_cards() {
        let body = r#"{
            "success": true,
            "deck_id": "kxozasf3edqu",
            "cards": [{
                "code": "6H",
                "image": "https://deckofcardsapi.com/static/img/6H.png",
                "images": {"svg": "x", "png": "y"},
                "value": "6",
                "suit": "HEARTS"
            }],
            "remaining": 50
        }"#;
        let drawn: DrawResponse = serde_json::from_str(body).unwrap();
        assert_eq!(drawn.cards[0], Card::new(Rank::Six, Suit::Hearts));
        assert_eq!(drawn.remaining, 50);
    }

    #[test]
    fn test_pile_listing_decodes() {
        let body = r#"{
            "success": true,
            "deck_id": "d",
            "remaining": 40,
            "piles": {"dealer": {"remaining": 1, "cards": [
                {"code": "AS", "image": "i", "value": "ACE", "suit": "SPADES"}
            ]}}
        }"#;
        let mut listing: ListPileResponse = serde_json::from_str(body).unwrap();
        let cards = listing.piles.remove("dealer").unwrap().cards;
        assert_eq!(cards[0].value, Rank::Ace);
    }

    #[test]
    fn test_failed_envelope() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"success": false, "error": "Deck ID does not exist."}"#)
                .unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some("Deck ID does not exist."));
    }
}
