// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::{zero_crossing, GovernanceProjector, ANOMALY_NEGATIVE_BALANCE};
use crate::events::{EventContext, Transfer};
use ethers::types::Address;
use governance_schema::address_id;
use governance_store::{EntityStore, StoreResult};
use tracing::warn;

impl<S: EntityStore> GovernanceProjector<S> {
    /// Move `value` between two holders. Mints (sender is the zero address)
    /// only credit the receiver.
    pub(crate) async fn handle_transfer(
        &self,
        event: &Transfer,
        ctx: &EventContext,
    ) -> StoreResult<()> {
        let from_id = address_id(&event.from);
        let to_id = address_id(&event.to);
        let value = self.to_signed(event.value, ctx);

        let mut governance = self.get_governance().await?;
        let mut from_holder = self.get_or_create_token_holder(&from_id).await?;
        self.get_or_create_token_holder(&to_id).await?;

        if event.from != Address::zero() {
            let previous = from_holder.token_balance_raw;
            from_holder.token_balance_raw = self.sub_amounts(previous, value, ctx);
            from_holder.token_balance = self.scale.scale(from_holder.token_balance_raw);

            if from_holder.token_balance_raw.is_negative() {
                warn!(
                    "[Projector] Negative balance on holder {} with balance {}. tx_hash: {:?}",
                    from_holder.id, from_holder.token_balance_raw, ctx.tx_hash
                );
                self.record_anomaly(ANOMALY_NEGATIVE_BALANCE);
            }

            let delta = zero_crossing(previous, from_holder.token_balance_raw);
            if delta != 0 {
                governance.current_token_holders += delta;
                self.store.save(&governance).await?;
            }
            self.store.save(&from_holder).await?;
        }

        // Read after the sender save so a self-transfer nets to zero
        let mut to_holder = self.get_or_create_token_holder(&to_id).await?;
        let previous = to_holder.token_balance_raw;
        to_holder.token_balance_raw = self.add_amounts(previous, value, ctx);
        to_holder.token_balance = self.scale.scale(to_holder.token_balance_raw);
        to_holder.total_tokens_held_raw =
            self.add_amounts(to_holder.total_tokens_held_raw, value, ctx);
        to_holder.total_tokens_held = self.scale.scale(to_holder.total_tokens_held_raw);

        let delta = zero_crossing(previous, to_holder.token_balance_raw);
        if delta != 0 {
            governance.current_token_holders += delta;
            self.store.save(&governance).await?;
        }
        self.store.save(&to_holder).await
    }
}
