// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::{zero_crossing, DelegateLookup, GovernanceProjector};
use crate::events::{DelegateChanged, DelegateVotesChanged, EventContext};
use governance_schema::address_id;
use governance_store::{EntityStore, StoreResult};
use tracing::debug;

impl<S: EntityStore> GovernanceProjector<S> {
    pub(crate) async fn handle_delegate_changed(
        &self,
        event: &DelegateChanged,
        _ctx: &EventContext,
    ) -> StoreResult<()> {
        let previous_id = address_id(&event.from_delegate);
        let new_id = address_id(&event.to_delegate);

        let mut holder = self
            .get_or_create_token_holder(&address_id(&event.delegator))
            .await?;
        holder.delegate = Some(new_id.clone());
        self.store.save(&holder).await?;

        // Counts are not floored: a delegate first seen here as the previous
        // delegate goes to -1.
        let mut previous = self
            .get_or_create_delegate(&previous_id, DelegateLookup::CreateIfMissing)
            .await?;
        previous.token_holders_represented_amount -= 1;
        self.store.save(&previous).await?;

        // Loaded after the save above so a from == to change nets to zero
        let mut new_delegate = self
            .get_or_create_delegate(&new_id, DelegateLookup::CreateIfMissing)
            .await?;
        new_delegate.token_holders_represented_amount += 1;
        self.store.save(&new_delegate).await?;

        debug!(
            "[Projector] {} delegated from {} to {}",
            holder.id, previous_id, new_id
        );
        Ok(())
    }

    pub(crate) async fn handle_delegate_votes_changed(
        &self,
        event: &DelegateVotesChanged,
        ctx: &EventContext,
    ) -> StoreResult<()> {
        let mut governance = self.get_governance().await?;
        let mut delegate = self
            .get_or_create_delegate(&address_id(&event.delegate), DelegateLookup::CreateIfMissing)
            .await?;

        let previous = self.to_signed(event.previous_balance, ctx);
        let current = self.to_signed(event.new_balance, ctx);

        delegate.delegated_votes_raw = current;
        delegate.delegated_votes = self.scale.scale(current);
        self.store.save(&delegate).await?;

        governance.current_delegates += zero_crossing(previous, current);
        let diff = self.sub_amounts(current, previous, ctx);
        governance.delegated_votes_raw =
            self.add_amounts(governance.delegated_votes_raw, diff, ctx);
        governance.delegated_votes = self.scale.scale(governance.delegated_votes_raw);
        self.store.save(&governance).await
    }
}
