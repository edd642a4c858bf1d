// Concurrency Tests
// Many tasks hammering the shared ledger and fund handles at once

use fundledger::access::{CallContext, PauseSwitch, RoleRegistry};
use fundledger::fund::{FundIntake, InMemoryToken, IntakeConfig, ValueTransfer};
use fundledger::identity::{Address, ExternalRef};
use fundledger::ledger::{AmendRequest, ContributionLedger};
use fundledger::service::{SharedFundIntake, SharedLedger};
use std::sync::Arc;

const TASKS: u64 = 16;
const ROUNDS: u64 = 25;

// ============================================================================
// SHARED LEDGER
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_keep_totals_consistent() {
    let writer = Address::random();
    let roles = Arc::new(RoleRegistry::with_admin(writer));
    let pause = Arc::new(PauseSwitch::new());
    let ledger = SharedLedger::new(ContributionLedger::new());
    let accounts: Arc<Vec<Address>> = Arc::new((0..4).map(|_| Address::random()).collect());

    let mut handles = Vec::new();
    for task in 0..TASKS {
        let ledger = ledger.clone();
        let roles = Arc::clone(&roles);
        let pause = Arc::clone(&pause);
        let accounts = Arc::clone(&accounts);

        handles.push(tokio::spawn(async move {
            for round in 0..ROUNDS {
                let ctx = CallContext::new(writer, round, roles.as_ref(), pause.as_ref());
                let account = accounts[((task + round) % 4) as usize];
                ledger
                    .append(&ctx, account, task + 1, round, ExternalRef::ZERO, "")
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Each task appends task + 1 exactly ROUNDS times
    let expected: u64 = (1..=TASKS).map(|amount| amount * ROUNDS).sum();
    assert_eq!(ledger.grand_total().await, expected);

    let mut sum = 0;
    let mut entries = 0;
    for account in accounts.iter() {
        sum += ledger.total_of(account).await;
        entries += ledger.history(account).await.len() as u64;
    }
    assert_eq!(sum, expected);
    assert_eq!(entries, TASKS * ROUNDS);
    assert!(ledger.reconcile().await.unwrap().is_balanced());
    assert_eq!(ledger.poll_events().await.len() as u64, TASKS * ROUNDS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_amends_against_appends() {
    let writer = Address::random();
    let roles = Arc::new(RoleRegistry::with_admin(writer));
    let pause = Arc::new(PauseSwitch::new());
    let ledger = SharedLedger::default();
    let alice = Address::random();

    {
        let ctx = CallContext::new(writer, 0, roles.as_ref(), pause.as_ref());
        for _ in 0..TASKS {
            ledger.append(&ctx, alice, 10, 0, ExternalRef::ZERO, "seed").await.unwrap();
        }
    }

    let mut handles = Vec::new();
    for task in 0..TASKS {
        let ledger = ledger.clone();
        let roles = Arc::clone(&roles);
        let pause = Arc::clone(&pause);

        handles.push(tokio::spawn(async move {
            let ctx = CallContext::new(writer, task, roles.as_ref(), pause.as_ref());
            // Every task owns one seeded entry and rewrites it to 1
            let request = AmendRequest::new(task as usize, 1, task, ExternalRef::ZERO);
            ledger.amend(&ctx, alice, request).await.unwrap();
            ledger.append(&ctx, alice, 5, task, ExternalRef::ZERO, "late").await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let expected = TASKS + TASKS * 5;
    assert_eq!(ledger.total_of(&alice).await, expected);
    assert_eq!(ledger.grand_total().await, expected);
    assert_eq!(ledger.history(&alice).await.len() as u64, TASKS * 2);
}

// ============================================================================
// SHARED FUND INTAKE
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_contributions_match_custody() {
    let admin = Address::random();
    let treasury = Address::random();
    let roles = Arc::new(RoleRegistry::with_admin(admin));
    let pause = Arc::new(PauseSwitch::new());

    let intake = FundIntake::new(
        IntakeConfig::new(Address::random())
            .with_treasury_wallet(treasury)
            .with_max_contribution(50),
    )
    .unwrap();
    let custody = intake.custody();

    // Each contributor can afford exactly ROUNDS contributions of 10
    let contributors: Vec<Address> = (0..TASKS).map(|_| Address::random()).collect();
    let mut token = InMemoryToken::new();
    for who in &contributors {
        token.mint(*who, ROUNDS * 10).unwrap();
        token.approve(*who, custody, ROUNDS * 10);
    }
    let fund = SharedFundIntake::new(intake, token);

    let mut handles = Vec::new();
    for who in contributors.clone() {
        let fund = fund.clone();
        let roles = Arc::clone(&roles);
        let pause = Arc::clone(&pause);

        handles.push(tokio::spawn(async move {
            let ctx = CallContext::new(who, 1, roles.as_ref(), pause.as_ref());
            let mut accepted: u64 = 0;
            // Two extra attempts per contributor must fail on balance
            for _ in 0..ROUNDS + 2 {
                if fund.contribute(&ctx, 10).await.is_ok() {
                    accepted += 1;
                }
            }
            accepted
        }));
    }

    let mut accepted: u64 = 0;
    for handle in handles {
        accepted += handle.await.unwrap();
    }

    assert_eq!(accepted, TASKS * ROUNDS);
    assert_eq!(fund.total_contributed().await, TASKS * ROUNDS * 10);
    assert_eq!(fund.custody_balance().await, TASKS * ROUNDS * 10);
    for who in &contributors {
        assert_eq!(fund.contributed_of(who).await, ROUNDS * 10);
        assert_eq!(fund.with_transfer(|t| t.balance_of(who)).await, 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_withdrawals_race_contributions() {
    let admin = Address::random();
    let treasury = Address::random();
    let roles = Arc::new(RoleRegistry::with_admin(admin));
    let pause = Arc::new(PauseSwitch::new());

    let intake =
        FundIntake::new(IntakeConfig::new(Address::random()).with_treasury_wallet(treasury))
            .unwrap();
    let custody = intake.custody();
    let donor = Address::random();
    let mut token = InMemoryToken::new();
    token.mint(donor, 1_000).unwrap();
    token.approve(donor, custody, 1_000);
    let fund = SharedFundIntake::new(intake, token);

    let contributing = {
        let fund = fund.clone();
        let roles = Arc::clone(&roles);
        let pause = Arc::clone(&pause);
        tokio::spawn(async move {
            let ctx = CallContext::new(donor, 1, roles.as_ref(), pause.as_ref());
            for _ in 0..100 {
                fund.contribute(&ctx, 10).await.unwrap();
            }
        })
    };

    let withdrawing = {
        let fund = fund.clone();
        let roles = Arc::clone(&roles);
        let pause = Arc::clone(&pause);
        tokio::spawn(async move {
            let ctx = CallContext::new(admin, 1, roles.as_ref(), pause.as_ref());
            let mut withdrawn: u64 = 0;
            for _ in 0..200 {
                if fund.emergency_withdraw(&ctx, treasury, 7).await.is_ok() {
                    withdrawn += 7;
                }
                tokio::task::yield_now().await;
            }
            withdrawn
        })
    };

    contributing.await.unwrap();
    let withdrawn = withdrawing.await.unwrap();

    // Withdrawals never touch the contribution counters
    assert_eq!(fund.total_contributed().await, 1_000);
    assert_eq!(fund.custody_balance().await, 1_000 - withdrawn);
    assert_eq!(fund.with_transfer(|t| t.balance_of(&treasury)).await, withdrawn);
}
