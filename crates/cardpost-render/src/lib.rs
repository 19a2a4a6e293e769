#![warn(missing_docs)]
//! # cardpost-render
//!
//! ## Purpose
//! Owns the client-side projection of backend card results.
//!
//! ## Responsibilities
//! - Maintain the id-keyed card board with most-recent-first ordering.
//! - Create new cards and patch existing cards in place.
//! - Cache-bust image URLs so a replaced image is never served stale.
//! - Track the transient uploading placeholder and expiring notices.
//!
//! ## Data flow
//! Orchestrator outcomes arrive as [`cardpost_contract::CardResult`] values
//! and mutate [`CardBoard`], which the shell renders.
//!
//! ## Ownership and lifetimes
//! The board exclusively owns the mapping from card id to rendered entity;
//! lookups go through that mapping, never through attribute scanning.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors. A failed patch
//! lookup returns `false` so the caller can fall back to create.
//!
//! ## Security and privacy notes
//! The board holds only display data (ids, statuses, image URLs); key
//! material never reaches this crate.

use std::collections::HashMap;

use cardpost_contract::CardResult;

/// How long a failure notice stays on the board, in milliseconds.
pub const ERROR_NOTICE_TTL_MS: u64 = 4_000;

/// Rendered projection of the most recent result for one card id.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCard {
    /// Card identifier the entity is keyed by.
    pub card_id: String,
    /// Cache-busted image URL.
    pub image_url: String,
    /// Status text from the most recent result.
    pub status: String,
    /// Whether the card was visually marked by a replace.
    pub selected: bool,
}

/// Transient board message with a fixed expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Message text.
    pub text: String,
    /// Absolute epoch milliseconds when the notice disappears.
    pub expires_at_ms: u64,
}

/// Client-owned card board.
///
/// At most one rendered card exists per card id; ordering is
/// most-recent-first.
#[derive(Debug, Clone, Default)]
pub struct CardBoard {
    order: Vec<String>,
    cards: HashMap<String, RenderedCard>,
    pending: bool,
    notices: Vec<Notice>,
}

impl CardBoard {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a card for `result`, prepending it to the board.
    ///
    /// If a card with the same id is already rendered, the stale entry is
    /// replaced and moved to the front.
    pub fn create_card(&mut self, result: &CardResult, now_ms: u64) {
        let card_id = result.card_id.clone();
        self.order.retain(|id| *id != card_id);
        self.order.insert(0, card_id.clone());
        self.cards.insert(
            card_id.clone(),
            RenderedCard {
                card_id,
                image_url: cache_busted_url(&result.detected_image_url, now_ms),
                status: result.status.clone(),
                selected: false,
            },
        );
    }

    /// Patches the card with `card_id` in place from `result`.
    ///
    /// The entity keeps its board position and identity; only the image
    /// URL (cache-busted) and status change, and the card is marked
    /// selected.
    ///
    /// # Returns
    /// `false` when no card with that id is rendered; the caller must fall
    /// back to [`CardBoard::create_card`].
    pub fn patch_card(&mut self, card_id: &str, result: &CardResult, now_ms: u64) -> bool {
        match self.cards.get_mut(card_id) {
            Some(card) => {
                card.image_url = cache_busted_url(&result.detected_image_url, now_ms);
                card.status = result.status.clone();
                card.selected = true;
                true
            }
            None => false,
        }
    }

    /// Returns the rendered card for `card_id`.
    pub fn card(&self, card_id: &str) -> Option<&RenderedCard> {
        self.cards.get(card_id)
    }

    /// Returns rendered cards in most-recent-first order.
    pub fn cards_most_recent_first(&self) -> Vec<&RenderedCard> {
        self.order
            .iter()
            .filter_map(|id| self.cards.get(id))
            .collect()
    }

    /// Returns the number of rendered cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns `true` when no cards are rendered.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Shows the uploading placeholder.
    pub fn set_pending(&mut self) {
        self.pending = true;
    }

    /// Removes the uploading placeholder.
    pub fn clear_pending(&mut self) {
        self.pending = false;
    }

    /// Returns `true` while the uploading placeholder is shown.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Posts a failure notice that expires [`ERROR_NOTICE_TTL_MS`] after
    /// `now_ms`, independent of further user action.
    pub fn push_error_notice(&mut self, text: impl Into<String>, now_ms: u64) {
        self.notices.push(Notice {
            text: text.into(),
            expires_at_ms: now_ms.saturating_add(ERROR_NOTICE_TTL_MS),
        });
    }

    /// Drops notices whose expiry has passed at `now_ms`.
    pub fn expire_notices(&mut self, now_ms: u64) {
        self.notices.retain(|notice| now_ms < notice.expires_at_ms);
    }

    /// Returns currently visible notices.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

/// Appends a cache-busting query parameter to an image URL.
///
/// Uses `&` when the URL already carries a query string, `?` otherwise, so
/// repeated replaces never produce `?...?`.
pub fn cache_busted_url(url: &str, now_ms: u64) -> String {
    if url.contains('?') {
        format!("{url}&_={now_ms}")
    } else {
        format!("{url}?_={now_ms}")
    }
}
