#![no_std]

mod events;
mod ledger;
mod registry;
mod storage_types;
mod voting;


use soroban_sdk::{contract, contractimpl, log, Address, Env, String, Vec};

use ledger::{
    donor_at, donor_view, exit_pool, load_campaign, load_donor, max_refundable, pay_refund,
    pin_snapshot, receive_funds, register_donor, release_funds, save_campaign, save_donor,
};
pub use storage_types::*;
use voting::{
    decide, load_ballot, load_vote, save_ballot, save_vote, snapshot_vote_weight,
    within_withdrawal_cap,
};

#[contract]
pub struct CrowdfundContract;

#[contractimpl]
impl CrowdfundContract {
    /// Initialize the registry with the asset every campaign holds in custody
    pub fn initialize(e: Env, token: Address) -> Result<(), CrowdfundError> {
        registry::initialize(&e, &token)
    }

    /// Create a new campaign owned by `creator`
    pub fn create_campaign(
        e: Env,
        creator: Address,
        title: String,
        description: String,
        initial_goal: i128,
        emergency_timeout: u64,
    ) -> Result<CampaignId, CrowdfundError> {
        creator.require_auth();

        let campaign = registry::create(
            &e,
            creator.clone(),
            title.clone(),
            description,
            initial_goal,
            emergency_timeout,
        )?;

        events::emit_campaign_created(
            &e,
            events::CampaignCreatedEvent {
                campaign_id: campaign.id,
                creator,
                title,
                initial_goal,
                emergency_timeout,
            },
        );

        Ok(campaign.id)
    }

    /// Donate to a campaign that is still raising funds
    pub fn donate(
        e: Env,
        campaign_id: CampaignId,
        donor: Address,
        amount: i128,
    ) -> Result<i128, CrowdfundError> {
        donor.require_auth();

        if amount <= 0 {
            return Err(CrowdfundError::InvalidAmount);
        }

        let mut campaign = load_campaign(&e, campaign_id)?;
        if !campaign.is_open() {
            return Err(CrowdfundError::DonationsClosed);
        }

        let mut record = load_donor(&e, campaign_id, &donor);
        if record.exited {
            return Err(CrowdfundError::DonorExited);
        }

        let weight_before = record.total_donated;
        let donor_total = weight_before
            .checked_add(amount)
            .ok_or(CrowdfundError::ArithmeticError)?;
        campaign.total_raised = campaign
            .total_raised
            .checked_add(amount)
            .ok_or(CrowdfundError::ArithmeticError)?;

        if !record.exists {
            record = register_donor(&e, &mut campaign, &donor);
        }
        pin_snapshot(&e, &campaign, &donor, weight_before);
        record.total_donated = donor_total;

        receive_funds(&e, &donor, amount)?;
        save_donor(&e, campaign_id, &donor, &record);
        save_campaign(&e, &campaign);

        events::emit_donated(
            &e,
            campaign_id,
            events::DonatedEvent {
                donor,
                amount,
                donor_total,
            },
        );

        Ok(donor_total)
    }

    /// Attach evidence of work done and ask donors to approve a withdrawal
    pub fn submit_proof_and_open_vote(
        e: Env,
        campaign_id: CampaignId,
        evidence_reference: String,
        requested_amount: i128,
        duration_seconds: u64,
    ) -> Result<VoteId, CrowdfundError> {
        let mut campaign = load_campaign(&e, campaign_id)?;
        campaign.creator.require_auth();

        match campaign.state {
            CampaignState::Active => {}
            CampaignState::VotingActive => return Err(CrowdfundError::VoteAlreadyActive),
            _ => return Err(CrowdfundError::CampaignNotActive),
        }
        if campaign.pending_approved_withdrawal > 0 {
            return Err(CrowdfundError::PendingWithdrawalExists);
        }
        if evidence_reference.len() == 0 {
            return Err(CrowdfundError::InvalidEvidence);
        }
        if requested_amount <= 0 {
            return Err(CrowdfundError::InvalidAmount);
        }
        if !within_withdrawal_cap(campaign.initial_goal, requested_amount)? {
            return Err(CrowdfundError::ExceedsWithdrawalCap);
        }
        if duration_seconds == 0 {
            return Err(CrowdfundError::InvalidDuration);
        }

        let now = e.ledger().timestamp();
        let end_at = now
            .checked_add(duration_seconds)
            .ok_or(CrowdfundError::ArithmeticError)?;
        let vote_id = campaign.next_vote_id;

        let vote = Vote {
            id: vote_id,
            evidence_reference: evidence_reference.clone(),
            requested_amount,
            snapshot_total_raised: campaign.total_raised,
            yes_weight: 0,
            no_weight: 0,
            participation_weight: 0,
            start_at: now,
            end_at,
            resolved: false,
            passed: false,
            voided: false,
        };

        campaign.next_vote_id = vote_id
            .checked_add(1)
            .ok_or(CrowdfundError::ArithmeticError)?;
        campaign.active_vote_id = vote_id;
        campaign.state = CampaignState::VotingActive;

        save_vote(&e, campaign_id, &vote);
        save_campaign(&e, &campaign);

        events::emit_proof_submitted(
            &e,
            campaign_id,
            events::ProofSubmittedEvent {
                vote_id,
                evidence_reference,
                requested_amount,
                end_at,
            },
        );

        Ok(vote_id)
    }

    /// Cast a weighted ballot on the open vote
    pub fn cast_vote(
        e: Env,
        campaign_id: CampaignId,
        voter: Address,
        support: bool,
    ) -> Result<i128, CrowdfundError> {
        voter.require_auth();

        let campaign = load_campaign(&e, campaign_id)?;
        if campaign.state != CampaignState::VotingActive || campaign.active_vote_id == 0 {
            return Err(CrowdfundError::NoActiveVote);
        }

        let mut vote = load_vote(&e, campaign_id, campaign.active_vote_id)?;
        if e.ledger().timestamp() >= vote.end_at {
            return Err(CrowdfundError::VotingClosed);
        }
        if load_ballot(&e, campaign_id, vote.id, &voter).is_some() {
            return Err(CrowdfundError::AlreadyVoted);
        }

        let weight = snapshot_vote_weight(&e, &campaign, vote.id, &voter);
        if weight <= 0 {
            return Err(CrowdfundError::NoVotingWeight);
        }

        if support {
            vote.yes_weight = vote
                .yes_weight
                .checked_add(weight)
                .ok_or(CrowdfundError::ArithmeticError)?;
        } else {
            vote.no_weight = vote
                .no_weight
                .checked_add(weight)
                .ok_or(CrowdfundError::ArithmeticError)?;
        }
        vote.participation_weight = vote
            .participation_weight
            .checked_add(weight)
            .ok_or(CrowdfundError::ArithmeticError)?;

        save_ballot(&e, campaign_id, vote.id, &voter, &Ballot { support, weight });
        save_vote(&e, campaign_id, &vote);

        events::emit_vote_cast(
            &e,
            campaign_id,
            events::VoteCastEvent {
                vote_id: vote.id,
                voter,
                support,
                weight,
            },
        );

        Ok(weight)
    }

    /// Close the open vote. Anyone may do so after the deadline, the creator at any time
    pub fn finalize_vote(
        e: Env,
        campaign_id: CampaignId,
        caller: Address,
    ) -> Result<bool, CrowdfundError> {
        caller.require_auth();

        let mut campaign = load_campaign(&e, campaign_id)?;
        if campaign.state != CampaignState::VotingActive || campaign.active_vote_id == 0 {
            return Err(CrowdfundError::NoActiveVote);
        }

        let mut vote = load_vote(&e, campaign_id, campaign.active_vote_id)?;
        if e.ledger().timestamp() < vote.end_at && caller != campaign.creator {
            return Err(CrowdfundError::VotingPeriodNotEnded);
        }

        let outcome = decide(&vote);
        if outcome.auto_passed {
            log!(&e, "vote passed without participation", campaign_id, vote.id);
        }

        vote.resolved = true;
        vote.passed = outcome.passed;
        campaign.active_vote_id = 0;

        if outcome.passed {
            campaign.pending_approved_withdrawal = vote.requested_amount;
            campaign.pending_approved_vote_id = vote.id;
            campaign.latest_passed_vote_id = vote.id;
            campaign.state = CampaignState::Active;
        } else {
            campaign.state = CampaignState::RefundMode;
        }

        save_vote(&e, campaign_id, &vote);
        save_campaign(&e, &campaign);

        events::emit_vote_finalized(
            &e,
            campaign_id,
            events::VoteFinalizedEvent {
                vote_id: vote.id,
                passed: outcome.passed,
                auto_passed: outcome.auto_passed,
                yes_weight: vote.yes_weight,
                no_weight: vote.no_weight,
                participation_weight: vote.participation_weight,
            },
        );

        Ok(outcome.passed)
    }

    /// Release the amount approved by the latest passed vote to the creator
    pub fn withdraw_approved_amount(
        e: Env,
        campaign_id: CampaignId,
    ) -> Result<i128, CrowdfundError> {
        let mut campaign = load_campaign(&e, campaign_id)?;
        campaign.creator.require_auth();

        if campaign.state != CampaignState::Active {
            return Err(CrowdfundError::CampaignNotActive);
        }

        let amount = campaign.pending_approved_withdrawal;
        if amount <= 0 {
            return Err(CrowdfundError::NoPendingWithdrawal);
        }
        if amount > campaign.custody_balance() {
            return Err(CrowdfundError::InsufficientCustody);
        }

        let vote_id = campaign.pending_approved_vote_id;
        campaign.total_withdrawn = campaign
            .total_withdrawn
            .checked_add(amount)
            .ok_or(CrowdfundError::ArithmeticError)?;
        campaign.pending_approved_withdrawal = 0;
        campaign.pending_approved_vote_id = 0;

        save_campaign(&e, &campaign);
        release_funds(&e, &campaign.creator, amount)?;

        events::emit_withdrawal_executed(
            &e,
            campaign_id,
            events::WithdrawalExecutedEvent {
                vote_id,
                amount,
                total_withdrawn: campaign.total_withdrawn,
            },
        );

        Ok(amount)
    }

    /// Reclaim up to the donor's remaining pro-rata share once refunds are open
    pub fn claim_refund(
        e: Env,
        campaign_id: CampaignId,
        donor: Address,
        amount: i128,
    ) -> Result<i128, CrowdfundError> {
        donor.require_auth();

        let mut campaign = load_campaign(&e, campaign_id)?;
        if !matches!(
            campaign.state,
            CampaignState::RefundMode | CampaignState::Cancelled
        ) {
            return Err(CrowdfundError::RefundsNotOpen);
        }
        if amount <= 0 {
            return Err(CrowdfundError::InvalidAmount);
        }

        let mut record = load_donor(&e, campaign_id, &donor);
        let refundable = max_refundable(&campaign, &record)?;
        if amount > refundable {
            return Err(CrowdfundError::ExceedsRefundable);
        }

        pay_refund(&e, &mut campaign, &donor, &mut record, amount)?;
        save_campaign(&e, &campaign);

        events::emit_refund_claimed(
            &e,
            campaign_id,
            events::RefundClaimedEvent {
                donor,
                amount,
                donor_total_refunded: record.total_refunded,
            },
        );

        Ok(refundable - amount)
    }

    /// Creator abandons the campaign before any funds left custody. Donors reclaim
    /// through `claim_refund` or `refund_donors`
    pub fn cancel_campaign(e: Env, campaign_id: CampaignId) -> Result<i128, CrowdfundError> {
        let mut campaign = load_campaign(&e, campaign_id)?;
        campaign.creator.require_auth();

        if campaign.total_withdrawn > 0 {
            return Err(CrowdfundError::CannotCancelAfterWithdrawal);
        }
        if !campaign.is_open() {
            return Err(CrowdfundError::CampaignClosed);
        }

        void_active_vote(&e, &mut campaign)?;
        campaign.state = CampaignState::Cancelled;
        save_campaign(&e, &campaign);

        let refundable = campaign.custody_balance();
        events::emit_campaign_cancelled(
            &e,
            campaign_id,
            events::CampaignCancelledEvent {
                refundable,
                donor_count: campaign.donor_count,
            },
        );

        Ok(refundable)
    }

    /// Push refunds to donors `start..start + count` of a campaign in refund mode
    /// or cancelled. Callable by anyone; pays each donor their full remaining share
    pub fn refund_donors(
        e: Env,
        campaign_id: CampaignId,
        start: u32,
        count: u32,
    ) -> Result<i128, CrowdfundError> {
        let mut campaign = load_campaign(&e, campaign_id)?;
        if !matches!(
            campaign.state,
            CampaignState::RefundMode | CampaignState::Cancelled
        ) {
            return Err(CrowdfundError::RefundsNotOpen);
        }
        if count == 0 || count > MAX_REFUND_BATCH {
            return Err(CrowdfundError::InvalidBatch);
        }

        let end = start.saturating_add(count).min(campaign.donor_count);
        let mut refunded_total: i128 = 0;
        for index in start..end {
            let Some(address) = donor_at(&e, campaign_id, index) else {
                continue;
            };
            let mut record = load_donor(&e, campaign_id, &address);
            let amount = max_refundable(&campaign, &record)?;
            if amount <= 0 {
                continue;
            }

            pay_refund(&e, &mut campaign, &address, &mut record, amount)?;
            refunded_total = refunded_total
                .checked_add(amount)
                .ok_or(CrowdfundError::ArithmeticError)?;

            events::emit_refund_claimed(
                &e,
                campaign_id,
                events::RefundClaimedEvent {
                    donor: address,
                    amount,
                    donor_total_refunded: record.total_refunded,
                },
            );
        }

        save_campaign(&e, &campaign);
        Ok(refunded_total)
    }

    /// Force refund mode once the emergency timeout has elapsed. Callable by anyone
    pub fn trigger_emergency_refund(
        e: Env,
        campaign_id: CampaignId,
        caller: Address,
    ) -> Result<(), CrowdfundError> {
        caller.require_auth();

        let mut campaign = load_campaign(&e, campaign_id)?;
        if !campaign.is_open() {
            return Err(CrowdfundError::CampaignClosed);
        }

        let unlock_at = campaign
            .created_at
            .saturating_add(campaign.emergency_timeout);
        if e.ledger().timestamp() < unlock_at {
            return Err(CrowdfundError::EmergencyTimeoutNotReached);
        }

        let voided_vote_id = void_active_vote(&e, &mut campaign)?;
        campaign.state = CampaignState::RefundMode;
        save_campaign(&e, &campaign);

        events::emit_emergency_refund(
            &e,
            campaign_id,
            events::EmergencyRefundEvent {
                caller,
                voided_vote_id,
            },
        );

        Ok(())
    }

    /// Opt the campaign into dissent exits. Only possible before the first vote
    pub fn enable_dissent_exit(e: Env, campaign_id: CampaignId) -> Result<(), CrowdfundError> {
        let mut campaign = load_campaign(&e, campaign_id)?;
        campaign.creator.require_auth();

        if campaign.state != CampaignState::Active {
            return Err(CrowdfundError::CampaignNotActive);
        }
        if campaign.next_vote_id != 1 {
            return Err(CrowdfundError::DissentExitLocked);
        }

        campaign.dissent_exit_enabled = true;
        save_campaign(&e, &campaign);
        events::emit_dissent_exit_enabled(&e, campaign_id);

        Ok(())
    }

    /// A donor who did not back the latest passed vote leaves the pool. Their
    /// remaining share is set aside on the first claim and may be drawn in parts
    pub fn claim_dissent_refund(
        e: Env,
        campaign_id: CampaignId,
        donor: Address,
        amount: i128,
    ) -> Result<i128, CrowdfundError> {
        donor.require_auth();

        let mut campaign = load_campaign(&e, campaign_id)?;
        if !campaign.dissent_exit_enabled {
            return Err(CrowdfundError::DissentExitDisabled);
        }
        if amount <= 0 {
            return Err(CrowdfundError::InvalidAmount);
        }

        let mut record = load_donor(&e, campaign_id, &donor);
        if !record.exited {
            if campaign.state != CampaignState::Active {
                return Err(CrowdfundError::CampaignNotActive);
            }

            let vote_id = campaign.latest_passed_vote_id;
            if vote_id == 0 {
                return Err(CrowdfundError::NotADissenter);
            }
            let dissented = match load_ballot(&e, campaign_id, vote_id, &donor) {
                Some(ballot) => !ballot.support,
                None => snapshot_vote_weight(&e, &campaign, vote_id, &donor) > 0,
            };
            if !dissented {
                return Err(CrowdfundError::NotADissenter);
            }

            let reserved = exit_pool(&mut campaign, &mut record)?;
            events::emit_dissent_exit(
                &e,
                campaign_id,
                events::DissentExitEvent {
                    donor: donor.clone(),
                    vote_id,
                    reserved,
                },
            );
        }

        let refundable = max_refundable(&campaign, &record)?;
        if amount > refundable {
            return Err(CrowdfundError::ExceedsRefundable);
        }

        pay_refund(&e, &mut campaign, &donor, &mut record, amount)?;
        save_campaign(&e, &campaign);

        events::emit_refund_claimed(
            &e,
            campaign_id,
            events::RefundClaimedEvent {
                donor,
                amount,
                donor_total_refunded: record.total_refunded,
            },
        );

        Ok(refundable - amount)
    }

    /// Close a fully disbursed campaign as successful
    pub fn complete_campaign(e: Env, campaign_id: CampaignId) -> Result<(), CrowdfundError> {
        let mut campaign = load_campaign(&e, campaign_id)?;
        campaign.creator.require_auth();

        if campaign.state != CampaignState::Active {
            return Err(CrowdfundError::CampaignNotActive);
        }
        if campaign.pending_approved_withdrawal > 0 {
            return Err(CrowdfundError::PendingWithdrawalExists);
        }
        if campaign.total_withdrawn == 0 || campaign.custody_balance() != 0 {
            return Err(CrowdfundError::CustodyNotEmpty);
        }

        campaign.state = CampaignState::Successful;
        save_campaign(&e, &campaign);

        events::emit_campaign_completed(
            &e,
            campaign_id,
            events::CampaignCompletedEvent {
                total_withdrawn: campaign.total_withdrawn,
            },
        );

        Ok(())
    }

    /// View functions
    pub fn get_campaigns(e: Env) -> Vec<CampaignId> {
        registry::list(&e)
    }

    pub fn get_campaign_count(e: Env) -> u32 {
        registry::campaign_count(&e)
    }

    pub fn get_token(e: Env) -> Result<Address, CrowdfundError> {
        registry::token(&e)
    }

    pub fn get_campaign(e: Env, campaign_id: CampaignId) -> Result<Campaign, CrowdfundError> {
        load_campaign(&e, campaign_id)
    }

    pub fn get_state(e: Env, campaign_id: CampaignId) -> Result<CampaignState, CrowdfundError> {
        Ok(load_campaign(&e, campaign_id)?.state)
    }

    pub fn get_donor(
        e: Env,
        campaign_id: CampaignId,
        donor: Address,
    ) -> Result<Donor, CrowdfundError> {
        let campaign = load_campaign(&e, campaign_id)?;
        donor_view(&campaign, load_donor(&e, campaign_id, &donor))
    }

    pub fn get_donor_count(e: Env, campaign_id: CampaignId) -> Result<u32, CrowdfundError> {
        Ok(load_campaign(&e, campaign_id)?.donor_count)
    }

    pub fn get_donor_at(e: Env, campaign_id: CampaignId, index: u32) -> Option<Address> {
        donor_at(&e, campaign_id, index)
    }

    pub fn get_vote(e: Env, campaign_id: CampaignId, vote_id: VoteId) -> Result<Vote, CrowdfundError> {
        load_vote(&e, campaign_id, vote_id)
    }

    pub fn get_active_vote(e: Env, campaign_id: CampaignId) -> Result<Option<Vote>, CrowdfundError> {
        let campaign = load_campaign(&e, campaign_id)?;
        if campaign.active_vote_id == 0 {
            return Ok(None);
        }
        Ok(Some(load_vote(&e, campaign_id, campaign.active_vote_id)?))
    }

    /// Weight counted for `donor` in `vote_id`: the ballot weight once resolved,
    /// the snapshot weight while open
    pub fn get_vote_weight(
        e: Env,
        campaign_id: CampaignId,
        vote_id: VoteId,
        donor: Address,
    ) -> Result<i128, CrowdfundError> {
        let campaign = load_campaign(&e, campaign_id)?;
        let vote = load_vote(&e, campaign_id, vote_id)?;

        if vote.resolved {
            return Ok(load_ballot(&e, campaign_id, vote_id, &donor)
                .map(|ballot| ballot.weight)
                .unwrap_or(0));
        }
        Ok(snapshot_vote_weight(&e, &campaign, vote_id, &donor))
    }

    pub fn get_ballot(
        e: Env,
        campaign_id: CampaignId,
        vote_id: VoteId,
        voter: Address,
    ) -> Option<Ballot> {
        load_ballot(&e, campaign_id, vote_id, &voter)
    }

    pub fn get_max_refundable(
        e: Env,
        campaign_id: CampaignId,
        donor: Address,
    ) -> Result<i128, CrowdfundError> {
        let campaign = load_campaign(&e, campaign_id)?;
        max_refundable(&campaign, &load_donor(&e, campaign_id, &donor))
    }

    pub fn get_custody_balance(e: Env, campaign_id: CampaignId) -> Result<i128, CrowdfundError> {
        Ok(load_campaign(&e, campaign_id)?.custody_balance())
    }
}

// Helper functions
fn void_active_vote(e: &Env, campaign: &mut Campaign) -> Result<VoteId, CrowdfundError> {
    let vote_id = campaign.active_vote_id;
    if vote_id != 0 {
        let mut vote = load_vote(e, campaign.id, vote_id)?;
        vote.resolved = true;
        vote.passed = false;
        vote.voided = true;
        save_vote(e, campaign.id, &vote);
        log!(e, "open vote voided", campaign.id, vote_id);
    }

    campaign.active_vote_id = 0;
    campaign.pending_approved_withdrawal = 0;
    campaign.pending_approved_vote_id = 0;
    Ok(vote_id)
}
