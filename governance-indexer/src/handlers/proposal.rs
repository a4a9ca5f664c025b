// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Proposal lifecycle. Transitions are applied as emitted, the prior status
//! is never checked.

use super::{DelegateLookup, GovernanceProjector};
use crate::events::{
    EventContext, ProposalCanceled, ProposalCreated, ProposalExecuted, ProposalQueued, VoteCast,
};
use ethers::types::U256;
use governance_schema::{address_id, proposal_id, vote_id, ProposalStatus};
use governance_store::{EntityStore, StoreResult};
use tracing::debug;

impl<S: EntityStore> GovernanceProjector<S> {
    pub(crate) async fn handle_proposal_created(
        &self,
        event: &ProposalCreated,
        ctx: &EventContext,
    ) -> StoreResult<()> {
        let mut proposal = self.get_or_create_proposal(&proposal_id(&event.id)).await?;
        let proposer = self
            .get_or_create_delegate(&address_id(&event.proposer), DelegateLookup::CreateIfMissing)
            .await?;

        proposal.proposer = Some(proposer.id);
        proposal.targets = event.targets.iter().map(address_id).collect();
        proposal.values = event.values.clone();
        proposal.signatures = event.signatures.clone();
        proposal.calldatas = event.calldatas.clone();
        proposal.start_block = event.start_block;
        proposal.end_block = event.end_block;
        proposal.description = event.description.clone();
        proposal.status = if U256::from(ctx.block_number) >= event.start_block {
            ProposalStatus::Active
        } else {
            ProposalStatus::Pending
        };
        self.store.save(&proposal).await?;

        debug!(
            "[Projector] Proposal {} created with status {}",
            proposal.id, proposal.status
        );
        Ok(())
    }

    pub(crate) async fn handle_proposal_canceled(
        &self,
        event: &ProposalCanceled,
        _ctx: &EventContext,
    ) -> StoreResult<()> {
        let mut proposal = self.get_or_create_proposal(&proposal_id(&event.id)).await?;
        proposal.status = ProposalStatus::Cancelled;
        self.store.save(&proposal).await
    }

    pub(crate) async fn handle_proposal_queued(
        &self,
        event: &ProposalQueued,
        _ctx: &EventContext,
    ) -> StoreResult<()> {
        let mut governance = self.get_governance().await?;
        let mut proposal = self.get_or_create_proposal(&proposal_id(&event.id)).await?;

        proposal.status = ProposalStatus::Queued;
        proposal.execution_eta = Some(event.eta);
        self.store.save(&proposal).await?;

        governance.proposals_queued += 1;
        self.store.save(&governance).await
    }

    pub(crate) async fn handle_proposal_executed(
        &self,
        event: &ProposalExecuted,
        _ctx: &EventContext,
    ) -> StoreResult<()> {
        let mut governance = self.get_governance().await?;
        let mut proposal = self.get_or_create_proposal(&proposal_id(&event.id)).await?;

        proposal.status = ProposalStatus::Executed;
        proposal.execution_eta = None;
        self.store.save(&proposal).await?;

        governance.proposals_queued -= 1;
        self.store.save(&governance).await
    }

    pub(crate) async fn handle_vote_cast(
        &self,
        event: &VoteCast,
        ctx: &EventContext,
    ) -> StoreResult<()> {
        let mut proposal = self
            .get_or_create_proposal(&proposal_id(&event.proposal_id))
            .await?;
        let mut vote = self
            .get_or_create_vote(&vote_id(&event.voter, &event.proposal_id))
            .await?;
        // A voter should have been seen through delegation first
        let voter = self
            .get_or_create_delegate(
                &address_id(&event.voter),
                DelegateLookup::ExpectExisting {
                    event: "VoteCast",
                    ctx,
                },
            )
            .await?;

        let votes = self.to_signed(event.votes, ctx);
        vote.proposal = Some(proposal.id.clone());
        vote.voter = Some(voter.id);
        vote.votes_raw = votes;
        vote.votes = self.scale.scale(votes);
        vote.support = event.support;
        self.store.save(&vote).await?;

        if proposal.status == ProposalStatus::Pending {
            proposal.status = ProposalStatus::Active;
            self.store.save(&proposal).await?;
        }
        Ok(())
    }
}
