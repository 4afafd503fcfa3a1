use soroban_sdk::{Address, Env, String, Vec};

use crate::ledger::{extend_instance, save_campaign};
use crate::storage_types::{Campaign, CampaignId, CampaignState, CrowdfundError, DataKey};

pub fn initialize(e: &Env, token: &Address) -> Result<(), CrowdfundError> {
    if e.storage().instance().has(&DataKey::Token) {
        return Err(CrowdfundError::AlreadyInitialized);
    }

    e.storage().instance().set(&DataKey::Token, token);
    e.storage().instance().set(&DataKey::CampaignCount, &0u32);
    extend_instance(e);
    Ok(())
}

pub fn campaign_count(e: &Env) -> u32 {
    e.storage().instance().get(&DataKey::CampaignCount).unwrap_or(0)
}

pub fn token(e: &Env) -> Result<Address, CrowdfundError> {
    e.storage()
        .instance()
        .get(&DataKey::Token)
        .ok_or(CrowdfundError::NotInitialized)
}

/// Stores a fresh campaign under the next sequential id.
pub fn create(
    e: &Env,
    creator: Address,
    title: String,
    description: String,
    initial_goal: i128,
    emergency_timeout: u64,
) -> Result<Campaign, CrowdfundError> {
    if !e.storage().instance().has(&DataKey::Token) {
        return Err(CrowdfundError::NotInitialized);
    }
    if initial_goal <= 0 {
        return Err(CrowdfundError::InvalidGoal);
    }
    if emergency_timeout == 0 {
        return Err(CrowdfundError::InvalidTimeout);
    }

    let id = campaign_count(e)
        .checked_add(1)
        .ok_or(CrowdfundError::ArithmeticError)?;

    let campaign = Campaign {
        id,
        creator,
        title,
        description,
        initial_goal,
        emergency_timeout,
        created_at: e.ledger().timestamp(),
        total_raised: 0,
        total_withdrawn: 0,
        total_refunded: 0,
        state: CampaignState::Active,
        active_vote_id: 0,
        pending_approved_withdrawal: 0,
        pending_approved_vote_id: 0,
        next_vote_id: 1,
        latest_passed_vote_id: 0,
        donor_count: 0,
        dissent_exit_enabled: false,
        exited_raised: 0,
        exited_withdrawn: 0,
    };

    save_campaign(e, &campaign);
    e.storage().instance().set(&DataKey::CampaignCount, &id);
    extend_instance(e);

    Ok(campaign)
}

// Ids are dense and never reused, so the list is 1..=count.
pub fn list(e: &Env) -> Vec<CampaignId> {
    let mut campaigns = Vec::new(e);
    for id in 1..=campaign_count(e) {
        campaigns.push_back(id);
    }
    campaigns
}
