use soroban_sdk::{Address, Env};

use crate::ledger::{extend_persistent, load_donor, snapshot_weight};
use crate::storage_types::{
    Ballot, Campaign, CampaignId, CrowdfundError, PersistentKey, Vote, VoteId, BASIS_POINTS,
    WITHDRAWAL_CAP_BPS,
};

pub fn load_vote(e: &Env, campaign_id: CampaignId, vote_id: VoteId) -> Result<Vote, CrowdfundError> {
    e.storage()
        .persistent()
        .get(&PersistentKey::Vote(campaign_id, vote_id))
        .ok_or(CrowdfundError::VoteNotFound)
}

pub fn save_vote(e: &Env, campaign_id: CampaignId, vote: &Vote) {
    let key = PersistentKey::Vote(campaign_id, vote.id);
    e.storage().persistent().set(&key, vote);
    extend_persistent(e, &key);
}

pub fn load_ballot(
    e: &Env,
    campaign_id: CampaignId,
    vote_id: VoteId,
    voter: &Address,
) -> Option<Ballot> {
    e.storage()
        .persistent()
        .get(&PersistentKey::Ballot(campaign_id, vote_id, voter.clone()))
}

pub fn save_ballot(e: &Env, campaign_id: CampaignId, vote_id: VoteId, voter: &Address, ballot: &Ballot) {
    let key = PersistentKey::Ballot(campaign_id, vote_id, voter.clone());
    e.storage().persistent().set(&key, ballot);
    extend_persistent(e, &key);
}

/// A single request may not exceed 35% of the initial goal, whatever has been raised.
pub fn within_withdrawal_cap(initial_goal: i128, requested: i128) -> Result<bool, CrowdfundError> {
    let requested_bps = requested
        .checked_mul(BASIS_POINTS)
        .ok_or(CrowdfundError::ArithmeticError)?;
    let cap_bps = initial_goal
        .checked_mul(WITHDRAWAL_CAP_BPS)
        .ok_or(CrowdfundError::ArithmeticError)?;
    Ok(requested_bps <= cap_bps)
}

/// Weight `voter` holds in `vote_id`, fixed at the moment that vote opened.
pub fn snapshot_vote_weight(e: &Env, campaign: &Campaign, vote_id: VoteId, voter: &Address) -> i128 {
    let donor = load_donor(e, campaign.id, voter);
    if !donor.exists || donor.exited || donor.first_vote_id > vote_id {
        return 0;
    }

    snapshot_weight(e, campaign.id, vote_id, voter).unwrap_or(donor.total_donated)
}

pub struct Outcome {
    pub passed: bool,
    pub auto_passed: bool,
}

// Silence passes, and ties go to the creator.
pub fn decide(vote: &Vote) -> Outcome {
    if vote.participation_weight == 0 {
        return Outcome {
            passed: true,
            auto_passed: true,
        };
    }

    Outcome {
        passed: vote.yes_weight >= vote.no_weight,
        auto_passed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::{Env, String};

    fn tallied(yes: i128, no: i128) -> Vote {
        let env = Env::default();
        Vote {
            id: 1,
            evidence_reference: String::from_str(&env, "ipfs://proof"),
            requested_amount: 10,
            snapshot_total_raised: 100,
            yes_weight: yes,
            no_weight: no,
            participation_weight: yes + no,
            start_at: 0,
            end_at: 3600,
            resolved: false,
            passed: false,
            voided: false,
        }
    }

    #[test]
    fn test_decide_rules() {
        let silent = decide(&tallied(0, 0));
        assert!(silent.passed && silent.auto_passed);

        let tie = decide(&tallied(5, 5));
        assert!(tie.passed && !tie.auto_passed);

        assert!(decide(&tallied(6, 4)).passed);
        assert!(!decide(&tallied(4, 6)).passed);
    }

    #[test]
    fn test_withdrawal_cap_boundary() {
        assert_eq!(within_withdrawal_cap(100_000_000, 35_000_000), Ok(true));
        assert_eq!(within_withdrawal_cap(100_000_000, 35_000_001), Ok(false));
        assert_eq!(
            within_withdrawal_cap(i128::MAX, 1),
            Err(CrowdfundError::ArithmeticError)
        );
    }
}
