use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use super::cards_model::{Card, CardSyncUpdate, NewCard};
use super::cards_traits::{CardRepositoryTrait, CardServiceTrait};
use crate::errors::Result;
use rust_decimal::Decimal;

/// Service for managing cards.
pub struct CardService {
    repository: Arc<dyn CardRepositoryTrait>,
}

impl CardService {
    pub fn new(repository: Arc<dyn CardRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// Pick the canonical survivor of a duplicate group: oldest created_at,
    /// id as the tiebreaker so the choice is deterministic.
    fn canonical_of(group: &[Card]) -> &Card {
        group
            .iter()
            .min_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .expect("duplicate group is never empty")
    }
}

#[async_trait::async_trait]
impl CardServiceTrait for CardService {
    fn get_card(&self, card_id: &str) -> Result<Card> {
        self.repository.get_by_id(card_id)
    }

    fn get_cards_for_connection(&self, connection_id: &str) -> Result<Vec<Card>> {
        self.repository.list_by_connection(connection_id)
    }

    async fn apply_sync_update(
        &self,
        connection_id: &str,
        update: CardSyncUpdate,
    ) -> Result<Card> {
        let existing = self
            .repository
            .get_by_external_id(&update.external_account_id)?;

        let duplicates = existing.len().saturating_sub(1);
        // When duplicates exist, apply the update to the card the dedupe
        // pass would keep.
        let Some(mut card) = (!existing.is_empty())
            .then(|| Self::canonical_of(&existing).clone())
        else {
            // First sync for this account.
            let new_card = NewCard {
                connection_id: connection_id.to_string(),
                external_account_id: update.external_account_id.clone(),
                name: update.name.clone(),
                mask: update.mask.clone(),
                current_balance: update.current_balance,
                available_balance: update.available_balance,
                credit_limit: update.extracted_limit,
                last_statement_balance: update.last_statement_balance,
                last_statement_date: update.last_statement_date,
                next_payment_due_date: update.next_payment_due_date,
                minimum_payment: update.minimum_payment,
                open_date: update.open_date,
            };
            new_card.validate()?;
            let card = self.repository.create(new_card).await?;
            info!(
                "Created card {} ({}) for connection {}",
                card.id, card.name, connection_id
            );
            return Ok(card);
        };

        if duplicates > 0 {
            warn!(
                "{} duplicate cards exist for external account {}, deferring to dedupe pass",
                duplicates, update.external_account_id
            );
        }

        card.name = update.name;
        card.mask = update.mask.or(card.mask);
        card.current_balance = update.current_balance.or(card.current_balance);
        card.available_balance = update.available_balance.or(card.available_balance);
        card.last_statement_balance =
            update.last_statement_balance.or(card.last_statement_balance);
        card.last_statement_date = update.last_statement_date.or(card.last_statement_date);
        card.next_payment_due_date =
            update.next_payment_due_date.or(card.next_payment_due_date);
        card.minimum_payment = update.minimum_payment.or(card.minimum_payment);
        card.open_date = update.open_date.or(card.open_date);

        // Aggregator data takes precedence whenever the cascade produced a
        // valid value; a failed cascade never erases what we already have.
        match update.extracted_limit {
            Some(limit) => {
                if card.is_manual_limit {
                    debug!(
                        "Card {}: extracted limit {} replaces manual override",
                        card.id, limit
                    );
                }
                card.credit_limit = Some(limit);
                card.is_manual_limit = false;
                card.manual_limit = None;
            }
            None => {
                if card.is_manual_limit {
                    debug!(
                        "Card {}: cascade found no limit, preserving manual override",
                        card.id
                    );
                } else if card.credit_limit.is_some() {
                    debug!(
                        "Card {}: cascade found no limit, keeping previously extracted value",
                        card.id
                    );
                }
            }
        }

        self.repository.update(card).await
    }

    async fn set_manual_limit(&self, card_id: &str, limit: Decimal) -> Result<()> {
        self.repository
            .set_manual_limit(card_id, Some(limit))
            .await
    }

    async fn dedupe_cards(&self) -> Result<usize> {
        // Pass 1: detect duplicate groups and build the canonical-id map.
        // No writes happen here, so detection is not order-dependent.
        let all = self.repository.list_all()?;
        let mut by_external: HashMap<String, Vec<Card>> = HashMap::new();
        for card in all {
            by_external
                .entry(card.external_account_id.clone())
                .or_default()
                .push(card);
        }

        let mut merge_map: Vec<(String, String)> = Vec::new();
        for (external_id, group) in &by_external {
            if group.len() < 2 {
                continue;
            }
            let canonical_id = Self::canonical_of(group).id.clone();
            warn!(
                "Found {} cards for external account {}, merging into {}",
                group.len(),
                external_id,
                canonical_id
            );
            for card in group {
                if card.id != canonical_id {
                    merge_map.push((card.id.clone(), canonical_id.clone()));
                }
            }
        }

        // Pass 2: perform all merges through the map.
        let mut merged = 0;
        for (duplicate_id, canonical_id) in merge_map {
            self.repository
                .merge_into(&duplicate_id, &canonical_id)
                .await?;
            merged += 1;
        }

        if merged > 0 {
            info!("Merged {} duplicate cards", merged);
        }
        Ok(merged)
    }
}
