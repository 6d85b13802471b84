//! Saved payment methods.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::seed_written;
use crate::collection::PersistedCollection;
use crate::editor::format::{format_card_number, format_expiry, is_valid_expiry};
use crate::editor::{Draft, FormSession, SubmitError, Submission, ValidationErrors};
use crate::error::StoreError;
use crate::storage::KeyValueStore;
use crate::Record;

/// Flag name used for the wallet's single default card.
pub const DEFAULT_FLAG: &str = "isDefault";

const MIN_CARD_DIGITS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardBrand {
    Visa,
    Mastercard,
    PayPal,
}

impl CardBrand {
    /// Brand guessed from the card number: Visa numbers start with 4.
    pub fn detect(number: &str) -> Self {
        match number.trim_start().chars().next() {
            Some('4') => CardBrand::Visa,
            _ => CardBrand::Mastercard,
        }
    }
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardBrand::Visa => write!(f, "Visa"),
            CardBrand::Mastercard => write!(f, "Mastercard"),
            CardBrand::PayPal => write!(f, "PayPal"),
        }
    }
}

/// A stored card. Only the last four digits are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Record)]
#[serde(rename_all = "camelCase")]
#[record(collection = "user_payment_methods_v2")]
pub struct Card {
    pub id: String,
    #[serde(rename = "type")]
    pub brand: CardBrand,
    pub last4: String,
    pub name: String,
    pub expiry: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Card {
    /// "Visa •••• 4242"
    pub fn label(&self) -> String {
        format!("{} •••• {}", self.brand, self.last4)
    }
}

pub fn default_cards() -> Vec<Card> {
    let card = |id: &str, brand, last4: &str, expiry: &str, is_default| Card {
        id: id.into(),
        brand,
        last4: last4.into(),
        name: "Sarah Martinez".into(),
        expiry: expiry.into(),
        is_default,
        email: None,
    };
    vec![
        card("1", CardBrand::Visa, "4242", "12/26", true),
        card("2", CardBrand::Mastercard, "8888", "09/27", false),
    ]
}

/// The "add card" form. Setters apply the same keystroke formatting as the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDraft {
    pub number: String,
    pub holder: String,
    pub expiry: String,
    /// Checked for presence only; never leaves the draft.
    pub cvv: String,
}

impl CardDraft {
    pub fn set_number(&mut self, input: &str) {
        self.number = format_card_number(input);
    }

    pub fn set_expiry(&mut self, input: &str) {
        self.expiry = format_expiry(input);
    }

    fn digits(&self) -> String {
        self.number.chars().filter(char::is_ascii_digit).collect()
    }
}

impl Draft for CardDraft {
    type Record = Card;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .require("cardNumber", &self.number)
            .require("cardholderName", &self.holder)
            .require("expiryDate", &self.expiry);
        if !errors.has("cardNumber") && self.digits().len() < MIN_CARD_DIGITS {
            errors.reject("cardNumber", "must contain at least 12 digits");
        }
        if !errors.has("expiryDate") && !is_valid_expiry(&self.expiry) {
            errors.reject("expiryDate", "must be MM/YY");
        }
        errors.into_result()
    }

    fn into_record(self) -> Card {
        let digits = self.digits();
        let last4 = digits[digits.len().saturating_sub(4)..].to_string();
        Card {
            id: String::new(),
            brand: CardBrand::detect(&digits),
            last4,
            name: self.holder.trim().to_string(),
            expiry: self.expiry,
            is_default: false,
            email: None,
        }
    }
}

/// The payment methods page.
pub struct Wallet<S> {
    cards: PersistedCollection<Card, S>,
}

impl<S: KeyValueStore> Wallet<S> {
    pub fn open(storage: S) -> Result<Self, StoreError> {
        let mut cards = PersistedCollection::new(storage);
        let seeded = cards.hydrate(default_cards);
        seed_written(cards.key(), seeded)?;
        Ok(Wallet { cards })
    }

    /// Whether a write, the seed included, is waiting to be retried.
    pub fn has_pending(&self) -> bool {
        self.cards.pending().is_some()
    }

    pub fn retry_pending(&mut self) -> Result<bool, StoreError> {
        self.cards.retry_pending()
    }

    pub fn cards(&self) -> Result<&[Card], StoreError> {
        self.cards.records()
    }

    pub fn default_card(&self) -> Result<Option<&Card>, StoreError> {
        Ok(self.cards()?.iter().find(|card| card.is_default))
    }

    /// Append a card. The first card in an empty wallet becomes the default.
    pub fn add(&mut self, mut card: Card) -> Result<String, StoreError> {
        card.is_default = self.cards()?.is_empty();
        self.cards.create(card)
    }

    pub fn submit(&mut self, session: &mut FormSession<CardDraft>) -> Result<String, SubmitError> {
        Ok(self.apply(session.submit()?)?)
    }

    /// Apply a submitted card. An edited card keeps its default flag.
    pub fn apply(&mut self, submission: Submission<Card>) -> Result<String, StoreError> {
        match submission {
            Submission::Create(card) => self.add(card),
            Submission::Update { id, mut record } => {
                record.is_default = self.cards.get(&id)?.is_some_and(|card| card.is_default);
                self.cards.replace(&id, record)?;
                Ok(id)
            }
        }
    }

    /// Removing the default card leaves the wallet without one.
    pub fn remove(&mut self, id: &str) -> Result<(), StoreError> {
        self.cards.remove(id)
    }

    pub fn set_default(&mut self, id: &str) -> Result<(), StoreError> {
        self.cards.set_exclusive_flag(id, DEFAULT_FLAG)
    }
}
