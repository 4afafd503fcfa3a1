use soroban_sdk::{token, Address, Env};

use crate::registry;
use crate::storage_types::{
    Campaign, CampaignId, CrowdfundError, Donor, PersistentKey, VoteId, TTL_INSTANCE,
    TTL_PERSISTENT,
};

pub fn extend_instance(e: &Env) {
    e.storage().instance().extend_ttl(TTL_INSTANCE, TTL_INSTANCE);
}

pub fn extend_persistent(e: &Env, key: &PersistentKey) {
    e.storage().persistent().extend_ttl(key, TTL_PERSISTENT, TTL_PERSISTENT);
}

pub fn load_campaign(e: &Env, campaign_id: CampaignId) -> Result<Campaign, CrowdfundError> {
    e.storage()
        .persistent()
        .get(&PersistentKey::Campaign(campaign_id))
        .ok_or(CrowdfundError::CampaignNotFound)
}

pub fn save_campaign(e: &Env, campaign: &Campaign) {
    let key = PersistentKey::Campaign(campaign.id);
    e.storage().persistent().set(&key, campaign);
    extend_persistent(e, &key);
}

/// Donor record, or an empty one for an address that never donated.
pub fn load_donor(e: &Env, campaign_id: CampaignId, donor: &Address) -> Donor {
    e.storage()
        .persistent()
        .get(&PersistentKey::Donor(campaign_id, donor.clone()))
        .unwrap_or_else(Donor::empty)
}

pub fn save_donor(e: &Env, campaign_id: CampaignId, donor: &Address, record: &Donor) {
    let key = PersistentKey::Donor(campaign_id, donor.clone());
    e.storage().persistent().set(&key, record);
    extend_persistent(e, &key);
}

pub fn donor_at(e: &Env, campaign_id: CampaignId, index: u32) -> Option<Address> {
    e.storage()
        .persistent()
        .get(&PersistentKey::DonorAt(campaign_id, index))
}

/// Appends a first-time donor to the campaign's donor arena.
pub fn register_donor(e: &Env, campaign: &mut Campaign, donor: &Address) -> Donor {
    let key = PersistentKey::DonorAt(campaign.id, campaign.donor_count);
    e.storage().persistent().set(&key, donor);
    extend_persistent(e, &key);
    campaign.donor_count += 1;

    Donor {
        exists: true,
        first_vote_id: campaign.next_vote_id,
        ..Donor::empty()
    }
}

/// Keeps the open vote's weight for `donor` at its pre-donation value.
pub fn pin_snapshot(e: &Env, campaign: &Campaign, donor: &Address, weight_before: i128) {
    if campaign.active_vote_id == 0 {
        return;
    }
    let key = PersistentKey::Snapshot(campaign.id, campaign.active_vote_id, donor.clone());
    if !e.storage().persistent().has(&key) {
        e.storage().persistent().set(&key, &weight_before);
        extend_persistent(e, &key);
    }
}

pub fn snapshot_weight(
    e: &Env,
    campaign_id: CampaignId,
    vote_id: VoteId,
    donor: &Address,
) -> Option<i128> {
    e.storage()
        .persistent()
        .get(&PersistentKey::Snapshot(campaign_id, vote_id, donor.clone()))
}

/// Pro-rata share of what remains in custody, less what the donor already reclaimed.
/// An exited donor keeps whatever was set aside for them on exit.
pub fn max_refundable(campaign: &Campaign, donor: &Donor) -> Result<i128, CrowdfundError> {
    if !donor.exists {
        return Ok(0);
    }
    if donor.exited {
        return Ok((donor.total_donated - donor.withdrawn_share - donor.total_refunded).max(0));
    }

    let pool_raised = campaign.pool_raised();
    if pool_raised <= 0 {
        return Ok(0);
    }

    let remaining = pool_raised - campaign.pool_withdrawn();
    let share = donor
        .total_donated
        .checked_mul(remaining)
        .ok_or(CrowdfundError::ArithmeticError)?
        / pool_raised;

    Ok((share - donor.total_refunded).max(0))
}

/// Part of the creator's withdrawals borne by `donor`, derived on read so a
/// withdrawal never has to touch every donor record.
pub fn withdrawn_share(campaign: &Campaign, donor: &Donor) -> Result<i128, CrowdfundError> {
    if donor.exited {
        return Ok(donor.withdrawn_share);
    }

    let pool_raised = campaign.pool_raised();
    if !donor.exists || pool_raised <= 0 {
        return Ok(0);
    }

    Ok(donor
        .total_donated
        .checked_mul(campaign.pool_withdrawn())
        .ok_or(CrowdfundError::ArithmeticError)?
        / pool_raised)
}

/// Donor record as reported to callers, with the withdrawn share filled in.
pub fn donor_view(campaign: &Campaign, donor: Donor) -> Result<Donor, CrowdfundError> {
    let share = withdrawn_share(campaign, &donor)?;
    Ok(Donor {
        withdrawn_share: share,
        ..donor
    })
}

/// Takes `donor` out of the pool, freezing their share of past withdrawals.
/// Returns the amount set aside for them.
pub fn exit_pool(campaign: &mut Campaign, donor: &mut Donor) -> Result<i128, CrowdfundError> {
    let reserved = max_refundable(campaign, donor)?;
    let borne = donor.total_donated - reserved - donor.total_refunded;

    campaign.exited_raised = campaign
        .exited_raised
        .checked_add(donor.total_donated)
        .ok_or(CrowdfundError::ArithmeticError)?;
    campaign.exited_withdrawn = campaign
        .exited_withdrawn
        .checked_add(borne)
        .ok_or(CrowdfundError::ArithmeticError)?;

    donor.withdrawn_share = borne;
    donor.exited = true;
    Ok(reserved)
}

pub fn receive_funds(e: &Env, from: &Address, amount: i128) -> Result<(), CrowdfundError> {
    let token_client = token::Client::new(e, &registry::token(e)?);
    token_client.transfer(from, &e.current_contract_address(), &amount);
    Ok(())
}

pub fn release_funds(e: &Env, to: &Address, amount: i128) -> Result<(), CrowdfundError> {
    if amount <= 0 {
        return Ok(());
    }
    let token_client = token::Client::new(e, &registry::token(e)?);
    token_client.transfer(&e.current_contract_address(), to, &amount);
    Ok(())
}

/// Pays out `amount` to a donor and books it against their record and the campaign.
pub fn pay_refund(
    e: &Env,
    campaign: &mut Campaign,
    address: &Address,
    donor: &mut Donor,
    amount: i128,
) -> Result<(), CrowdfundError> {
    donor.total_refunded = donor
        .total_refunded
        .checked_add(amount)
        .ok_or(CrowdfundError::ArithmeticError)?;
    campaign.total_refunded = campaign
        .total_refunded
        .checked_add(amount)
        .ok_or(CrowdfundError::ArithmeticError)?;
    save_donor(e, campaign.id, address, donor);
    release_funds(e, address, amount)
}
