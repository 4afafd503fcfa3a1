use soroban_sdk::{contracttype, Address, Env, String, Symbol};

use crate::storage_types::{CampaignId, VoteId};

#[contracttype]
#[derive(Clone)]
pub struct CampaignCreatedEvent {
    pub campaign_id: CampaignId,
    pub creator: Address,
    pub title: String,
    pub initial_goal: i128,
    pub emergency_timeout: u64,
}

#[contracttype]
#[derive(Clone)]
pub struct DonatedEvent {
    pub donor: Address,
    pub amount: i128,
    pub donor_total: i128,
}

#[contracttype]
#[derive(Clone)]
pub struct ProofSubmittedEvent {
    pub vote_id: VoteId,
    pub evidence_reference: String,
    pub requested_amount: i128,
    pub end_at: u64,
}

#[contracttype]
#[derive(Clone)]
pub struct VoteCastEvent {
    pub vote_id: VoteId,
    pub voter: Address,
    pub support: bool,
    pub weight: i128,
}

#[contracttype]
#[derive(Clone)]
pub struct VoteFinalizedEvent {
    pub vote_id: VoteId,
    pub passed: bool,
    pub auto_passed: bool,
    pub yes_weight: i128,
    pub no_weight: i128,
    pub participation_weight: i128,
}

#[contracttype]
#[derive(Clone)]
pub struct WithdrawalExecutedEvent {
    pub vote_id: VoteId,
    pub amount: i128,
    pub total_withdrawn: i128,
}

#[contracttype]
#[derive(Clone)]
pub struct RefundClaimedEvent {
    pub donor: Address,
    pub amount: i128,
    pub donor_total_refunded: i128,
}

#[contracttype]
#[derive(Clone)]
pub struct CampaignCancelledEvent {
    pub refundable: i128,
    pub donor_count: u32,
}

#[contracttype]
#[derive(Clone)]
pub struct EmergencyRefundEvent {
    pub caller: Address,
    pub voided_vote_id: VoteId,
}

#[contracttype]
#[derive(Clone)]
pub struct DissentExitEvent {
    pub donor: Address,
    pub vote_id: VoteId,
    pub reserved: i128,
}

#[contracttype]
#[derive(Clone)]
pub struct CampaignCompletedEvent {
    pub total_withdrawn: i128,
}

pub fn emit_campaign_created(env: &Env, event: CampaignCreatedEvent) {
    env.events().publish(
        (Symbol::new(env, "campaign_created"), event.campaign_id),
        event,
    );
}

pub fn emit_donated(env: &Env, campaign_id: CampaignId, event: DonatedEvent) {
    env.events().publish(
        (Symbol::new(env, "donated"), campaign_id),
        event,
    );
}

pub fn emit_proof_submitted(env: &Env, campaign_id: CampaignId, event: ProofSubmittedEvent) {
    env.events().publish(
        (Symbol::new(env, "proof_submitted"), campaign_id),
        event,
    );
}

pub fn emit_vote_cast(env: &Env, campaign_id: CampaignId, event: VoteCastEvent) {
    env.events().publish(
        (Symbol::new(env, "vote_cast"), campaign_id),
        event,
    );
}

pub fn emit_vote_finalized(env: &Env, campaign_id: CampaignId, event: VoteFinalizedEvent) {
    env.events().publish(
        (Symbol::new(env, "vote_finalized"), campaign_id),
        event,
    );
}

pub fn emit_withdrawal_executed(
    env: &Env,
    campaign_id: CampaignId,
    event: WithdrawalExecutedEvent,
) {
    env.events().publish(
        (Symbol::new(env, "withdrawal_executed"), campaign_id),
        event,
    );
}

pub fn emit_refund_claimed(env: &Env, campaign_id: CampaignId, event: RefundClaimedEvent) {
    env.events().publish(
        (Symbol::new(env, "refund_claimed"), campaign_id),
        event,
    );
}

pub fn emit_campaign_cancelled(
    env: &Env,
    campaign_id: CampaignId,
    event: CampaignCancelledEvent,
) {
    env.events().publish(
        (Symbol::new(env, "campaign_cancelled"), campaign_id),
        event,
    );
}

pub fn emit_emergency_refund(env: &Env, campaign_id: CampaignId, event: EmergencyRefundEvent) {
    env.events().publish(
        (Symbol::new(env, "emergency_refund"), campaign_id),
        event,
    );
}

pub fn emit_dissent_exit_enabled(env: &Env, campaign_id: CampaignId) {
    env.events().publish(
        (Symbol::new(env, "dissent_exit_enabled"), campaign_id),
        true,
    );
}

pub fn emit_dissent_exit(env: &Env, campaign_id: CampaignId, event: DissentExitEvent) {
    env.events().publish(
        (Symbol::new(env, "dissent_exit"), campaign_id),
        event,
    );
}

pub fn emit_campaign_completed(
    env: &Env,
    campaign_id: CampaignId,
    event: CampaignCompletedEvent,
) {
    env.events().publish(
        (Symbol::new(env, "campaign_completed"), campaign_id),
        event,
    );
}
