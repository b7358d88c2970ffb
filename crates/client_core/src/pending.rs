//! Per-action in-flight flags.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use shared::domain::ActionKind;
use tracing::trace;

#[derive(Default)]
pub struct PendingFlags {
    flags: [AtomicBool; 4],
    runs: [AtomicU64; 4],
}

impl PendingFlags {
    /// `None` while the same action is still in flight.
    pub fn acquire(&self, action: ActionKind) -> Option<BusyGuard<'_>> {
        let index = action.index();
        self.flags[index]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        trace!(action = %action, "pending flag set");
        Some(BusyGuard {
            flag: &self.flags[index],
            runs: &self.runs[index],
            action,
        })
    }

    pub fn is_pending(&self, action: ActionKind) -> bool {
        self.flags[action.index()].load(Ordering::Acquire)
    }

    /// Number of invocations that have released their flag.
    pub fn completed_runs(&self, action: ActionKind) -> u64 {
        self.runs[action.index()].load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> PendingSnapshot {
        PendingSnapshot {
            generate_keypair: self.is_pending(ActionKind::GenerateKeypair),
            fund_account: self.is_pending(ActionKind::FundAccount),
            create_liquidity_pool: self.is_pending(ActionKind::CreateLiquidityPool),
            withdraw_from_pool: self.is_pending(ActionKind::WithdrawFromPool),
        }
    }
}

/// Clears its action's flag when dropped, whichever way the action exits.
pub struct BusyGuard<'a> {
    flag: &'a AtomicBool,
    runs: &'a AtomicU64,
    action: ActionKind,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.runs.fetch_add(1, Ordering::AcqRel);
        self.flag.store(false, Ordering::Release);
        trace!(action = %self.action, "pending flag cleared");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingSnapshot {
    pub generate_keypair: bool,
    pub fund_account: bool,
    pub create_liquidity_pool: bool,
    pub withdraw_from_pool: bool,
}

impl PendingSnapshot {
    pub fn get(&self, action: ActionKind) -> bool {
        match action {
            ActionKind::GenerateKeypair => self.generate_keypair,
            ActionKind::FundAccount => self.fund_account,
            ActionKind::CreateLiquidityPool => self.create_liquidity_pool,
            ActionKind::WithdrawFromPool => self.withdraw_from_pool,
        }
    }

    pub fn any(&self) -> bool {
        ActionKind::ALL.iter().any(|action| self.get(*action))
    }
}
