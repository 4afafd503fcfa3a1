use soroban_sdk::{contracterror, contracttype, Address, String};

// Storage keys for instance data
#[derive(Clone)]
#[contracttype]
pub enum DataKey {
    Token,
    CampaignCount,
}

// Storage keys for persistent data
#[derive(Clone)]
#[contracttype]
pub enum PersistentKey {
    Campaign(CampaignId),
    Donor(CampaignId, Address),
    DonorAt(CampaignId, u32), // (CampaignID, arena index) -> donor address
    Vote(CampaignId, VoteId),
    Ballot(CampaignId, VoteId, Address),
    Snapshot(CampaignId, VoteId, Address), // weight held when the vote opened
}

pub type CampaignId = u32;
pub type VoteId = u32;

// Campaign lifecycle, numbered as clients display it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[contracttype]
pub enum CampaignState {
    Active,
    VotingActive,
    RefundMode,
    Successful,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq)]
#[contracttype]
pub struct Campaign {
    pub id: CampaignId,
    pub creator: Address,
    pub title: String,
    pub description: String,
    pub initial_goal: i128,
    pub emergency_timeout: u64,        // Seconds after created_at
    pub created_at: u64,
    pub total_raised: i128,
    pub total_withdrawn: i128,
    pub total_refunded: i128,
    pub state: CampaignState,
    pub active_vote_id: VoteId,        // 0 when no vote is open
    pub pending_approved_withdrawal: i128,
    pub pending_approved_vote_id: VoteId,
    pub next_vote_id: VoteId,
    pub latest_passed_vote_id: VoteId,
    pub donor_count: u32,
    pub dissent_exit_enabled: bool,
    pub exited_raised: i128,           // Donations of donors who left through dissent exit
    pub exited_withdrawn: i128,        // Withdrawals those donors bore before leaving
}

impl Campaign {
    /// Value currently held for this campaign.
    pub fn custody_balance(&self) -> i128 {
        self.total_raised - self.total_withdrawn - self.total_refunded
    }

    pub fn pool_raised(&self) -> i128 {
        self.total_raised - self.exited_raised
    }

    pub fn pool_withdrawn(&self) -> i128 {
        self.total_withdrawn - self.exited_withdrawn
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, CampaignState::Active | CampaignState::VotingActive)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[contracttype]
pub struct Donor {
    pub total_donated: i128,
    pub total_refunded: i128,
    pub withdrawn_share: i128,         // Stored only once exited, derived from the pool otherwise
    pub exists: bool,
    pub first_vote_id: VoteId,         // Earliest vote this donor holds weight in
    pub exited: bool,
}

impl Donor {
    pub fn empty() -> Self {
        Donor {
            total_donated: 0,
            total_refunded: 0,
            withdrawn_share: 0,
            exists: false,
            first_vote_id: 0,
            exited: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[contracttype]
pub struct Vote {
    pub id: VoteId,
    pub evidence_reference: String,    // IPFS URI or similar, never interpreted
    pub requested_amount: i128,
    pub snapshot_total_raised: i128,
    pub yes_weight: i128,
    pub no_weight: i128,
    pub participation_weight: i128,
    pub start_at: u64,
    pub end_at: u64,
    pub resolved: bool,
    pub passed: bool,
    pub voided: bool,                  // Closed by cancellation or emergency refund
}

#[derive(Clone, Debug, PartialEq)]
#[contracttype]
pub struct Ballot {
    pub support: bool,
    pub weight: i128,
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum CrowdfundError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    CampaignNotFound = 3,
    VoteNotFound = 4,
    InvalidGoal = 5,
    InvalidTimeout = 6,
    InvalidAmount = 7,
    InvalidDuration = 8,
    InvalidEvidence = 9,
    /// Donation outside Active / VotingActive.
    DonationsClosed = 10,
    CampaignNotActive = 11,
    VoteAlreadyActive = 12,
    NoActiveVote = 13,
    /// Request above 35% of the initial goal.
    ExceedsWithdrawalCap = 14,
    VotingClosed = 15,
    /// Only the creator may finalize before the deadline.
    VotingPeriodNotEnded = 16,
    NoVotingWeight = 17,
    AlreadyVoted = 18,
    NoPendingWithdrawal = 19,
    PendingWithdrawalExists = 20,
    InsufficientCustody = 21,
    RefundsNotOpen = 22,
    ExceedsRefundable = 23,
    CannotCancelAfterWithdrawal = 24,
    CampaignClosed = 25,
    EmergencyTimeoutNotReached = 26,
    DissentExitDisabled = 27,
    DissentExitLocked = 28,
    NotADissenter = 29,
    DonorExited = 30,
    CustodyNotEmpty = 31,
    ArithmeticError = 32,
    /// Refund page of zero donors or above MAX_REFUND_BATCH.
    InvalidBatch = 33,
}

// Constants
pub const BASIS_POINTS: i128 = 10000; // 100% in basis points
pub const WITHDRAWAL_CAP_BPS: i128 = 3500; // 35% of the initial goal per request
pub const MAX_REFUND_BATCH: u32 = 25; // donors paid per refund_donors call
pub const TTL_INSTANCE: u32 = 17280 * 30; // 30 days
pub const TTL_PERSISTENT: u32 = 17280 * 90; // 90 days
