// Contribution Ledger Tests
// Append, amend, overwrite and the read paths

use fundledger::access::{AccessError, CallContext, Capability, PauseSwitch, RoleRegistry};
use fundledger::identity::{Address, ExternalRef, Keypair};
use fundledger::ledger::{
    AmendRequest, ContributionLedger, EntryKind, LedgerError, LedgerEvent,
};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

struct Fixture {
    writer: Address,
    roles: RoleRegistry,
    pause: PauseSwitch,
    ledger: ContributionLedger,
}

impl Fixture {
    fn new() -> Self {
        let writer = Keypair::generate().address();
        let mut roles = RoleRegistry::new();
        roles.grant(writer, Capability::LedgerWriter);
        Self {
            writer,
            roles,
            pause: PauseSwitch::new(),
            ledger: ContributionLedger::new(),
        }
    }

    fn append(&mut self, account: Address, amount: u64) -> Result<usize, LedgerError> {
        let ctx = CallContext::new(self.writer, 100, &self.roles, &self.pause);
        self.ledger
            .append(&ctx, account, amount, 100, ExternalRef::digest(b"tx"), "note")
    }

    fn amend(&mut self, account: Address, request: AmendRequest) -> Result<(), LedgerError> {
        let ctx = CallContext::new(self.writer, 200, &self.roles, &self.pause);
        self.ledger.amend(&ctx, account, request)
    }

    fn overwrite(&mut self, account: Address, total: u64) -> Result<(), LedgerError> {
        let ctx = CallContext::new(self.writer, 300, &self.roles, &self.pause);
        self.ledger.overwrite_total(&ctx, account, total, "correction")
    }

    fn history_sum(&self, account: &Address) -> u64 {
        self.ledger.history(account).iter().map(|e| e.amount()).sum()
    }
}

// ============================================================================
// APPEND
// ============================================================================

#[test]
fn test_new_ledger_is_empty() {
    let ledger = ContributionLedger::new();
    let alice = Address::random();

    assert_eq!(ledger.grand_total(), 0);
    assert_eq!(ledger.total_of(&alice), 0);
    assert_eq!(ledger.history_len(&alice), 0);
    assert!(ledger.history(&alice).is_empty());
    assert_eq!(ledger.account_count(), 0);
}

#[test]
fn test_append_returns_sequential_indices() {
    let mut f = Fixture::new();
    let alice = Address::random();

    assert_eq!(f.append(alice, 10).unwrap(), 0);
    assert_eq!(f.append(alice, 20).unwrap(), 1);
    assert_eq!(f.append(alice, 30).unwrap(), 2);
    assert_eq!(f.ledger.history_len(&alice), 3);
}

#[test]
fn test_append_records_entry_fields() {
    let mut f = Fixture::new();
    let alice = Address::random();
    let reference = ExternalRef::digest(b"invoice-17");

    let ctx = CallContext::new(f.writer, 999, &f.roles, &f.pause);
    f.ledger
        .append(&ctx, alice, 75, 1234, reference, "first payment")
        .unwrap();

    let entry = f.ledger.entry(&alice, 0).unwrap();
    assert_eq!(entry.amount(), 75);
    assert_eq!(entry.recorded_at(), 1234);
    assert_eq!(entry.external_ref(), &reference);
    assert_eq!(entry.kind(), EntryKind::Created);
    assert_eq!(entry.note(), "first payment");
}

#[test]
fn test_append_rejects_null_account() {
    let mut f = Fixture::new();

    assert_eq!(f.append(Address::NULL, 10), Err(LedgerError::InvalidAccount));
    assert_eq!(f.ledger.grand_total(), 0);
    assert_eq!(f.ledger.account_count(), 0);
}

#[test]
fn test_append_rejects_zero_amount() {
    let mut f = Fixture::new();
    let alice = Address::random();

    assert_eq!(f.append(alice, 0), Err(LedgerError::NonPositiveAmount));
    assert_eq!(f.ledger.history_len(&alice), 0);
}

#[test]
fn test_append_does_not_check_reference_uniqueness() {
    let mut f = Fixture::new();
    let alice = Address::random();

    f.append(alice, 1).unwrap();
    f.append(alice, 1).unwrap();

    let history = f.ledger.history(&alice);
    assert_eq!(history[0].external_ref(), history[1].external_ref());
}

#[test]
fn test_append_overflow_is_rejected() {
    let mut f = Fixture::new();
    let alice = Address::random();
    let bob = Address::random();

    f.append(alice, u64::MAX).unwrap();
    assert!(matches!(f.append(bob, 1), Err(LedgerError::Arithmetic(_))));
    assert_eq!(f.ledger.total_of(&bob), 0);
    assert_eq!(f.ledger.grand_total(), u64::MAX);
}

// ============================================================================
// AMEND
// ============================================================================

#[test]
fn test_amend_increase_and_decrease() {
    let mut f = Fixture::new();
    let alice = Address::random();
    f.append(alice, 100).unwrap();
    f.append(alice, 50).unwrap();

    f.amend(alice, AmendRequest::new(1, 80, 0, ExternalRef::ZERO)).unwrap();
    assert_eq!(f.ledger.total_of(&alice), 180);
    assert_eq!(f.ledger.grand_total(), 180);

    f.amend(alice, AmendRequest::new(0, 10, 0, ExternalRef::ZERO)).unwrap();
    assert_eq!(f.ledger.total_of(&alice), 90);
    assert_eq!(f.ledger.grand_total(), 90);
}

#[test]
fn test_amend_same_amount_only_touches_metadata() {
    let mut f = Fixture::new();
    let alice = Address::random();
    f.append(alice, 100).unwrap();

    let reference = ExternalRef::digest(b"replacement");
    f.amend(alice, AmendRequest::new(0, 100, 0, reference)).unwrap();

    let entry = f.ledger.entry(&alice, 0).unwrap();
    assert_eq!(f.ledger.total_of(&alice), 100);
    assert_eq!(entry.external_ref(), &reference);
    assert_eq!(entry.kind(), EntryKind::Amended);
}

#[test]
fn test_amend_uses_invocation_clock_not_requested_clock() {
    let mut f = Fixture::new();
    let alice = Address::random();
    f.append(alice, 100).unwrap();

    f.amend(alice, AmendRequest::new(0, 120, 55, ExternalRef::ZERO)).unwrap();

    // Fixture::amend runs at clock 200
    assert_eq!(f.ledger.entry(&alice, 0).unwrap().recorded_at(), 200);
}

#[test]
fn test_amend_keeps_note_unless_replaced() {
    let mut f = Fixture::new();
    let alice = Address::random();
    f.append(alice, 100).unwrap();

    f.amend(alice, AmendRequest::new(0, 101, 0, ExternalRef::ZERO)).unwrap();
    assert_eq!(f.ledger.entry(&alice, 0).unwrap().note(), "note");

    f.amend(
        alice,
        AmendRequest::new(0, 102, 0, ExternalRef::ZERO).with_note("revised"),
    )
    .unwrap();
    assert_eq!(f.ledger.entry(&alice, 0).unwrap().note(), "revised");
}

#[test]
fn test_amend_does_not_reorder_history() {
    let mut f = Fixture::new();
    let alice = Address::random();
    for amount in [1, 2, 3] {
        f.append(alice, amount).unwrap();
    }

    f.amend(alice, AmendRequest::new(1, 20, 0, ExternalRef::ZERO)).unwrap();

    let amounts: Vec<u64> = f.ledger.history(&alice).iter().map(|e| e.amount()).collect();
    assert_eq!(amounts, vec![1, 20, 3]);
}

#[test]
fn test_amend_index_equal_to_length_fails() {
    let mut f = Fixture::new();
    let alice = Address::random();
    f.append(alice, 10).unwrap();
    f.append(alice, 20).unwrap();

    assert_eq!(
        f.amend(alice, AmendRequest::new(2, 5, 0, ExternalRef::ZERO)),
        Err(LedgerError::IndexOutOfRange { index: 2, len: 2 })
    );
    assert!(f.amend(alice, AmendRequest::new(1, 5, 0, ExternalRef::ZERO)).is_ok());
}

#[test]
fn test_amend_unknown_account_fails() {
    let mut f = Fixture::new();
    assert_eq!(
        f.amend(Address::random(), AmendRequest::new(0, 5, 0, ExternalRef::ZERO)),
        Err(LedgerError::IndexOutOfRange { index: 0, len: 0 })
    );
    assert_eq!(f.ledger.account_count(), 0);
}

#[test]
fn test_amend_to_zero_is_allowed() {
    let mut f = Fixture::new();
    let alice = Address::random();
    f.append(alice, 40).unwrap();

    f.amend(alice, AmendRequest::new(0, 0, 0, ExternalRef::ZERO)).unwrap();
    assert_eq!(f.ledger.total_of(&alice), 0);
    assert_eq!(f.ledger.grand_total(), 0);
    assert_eq!(f.ledger.history_len(&alice), 1);
}

// ============================================================================
// OVERWRITE
// ============================================================================

#[test]
fn test_overwrite_leaves_history_untouched() {
    let mut f = Fixture::new();
    let alice = Address::random();
    f.append(alice, 100).unwrap();
    let before = f.ledger.history(&alice);

    f.overwrite(alice, 7).unwrap();

    assert_eq!(f.ledger.history(&alice), before);
    assert_eq!(f.ledger.total_of(&alice), 7);
    assert_ne!(f.ledger.total_of(&alice), f.history_sum(&alice));
}

#[test]
fn test_overwrite_unknown_account_creates_total_without_history() {
    let mut f = Fixture::new();
    let alice = Address::random();

    f.overwrite(alice, 500).unwrap();

    assert_eq!(f.ledger.total_of(&alice), 500);
    assert_eq!(f.ledger.grand_total(), 500);
    assert_eq!(f.ledger.history_len(&alice), 0);
}

#[test]
fn test_overwrite_upward_adjusts_grand_total() {
    let mut f = Fixture::new();
    let alice = Address::random();
    let bob = Address::random();
    f.append(alice, 10).unwrap();
    f.append(bob, 20).unwrap();

    f.overwrite(alice, 1_000).unwrap();

    assert_eq!(f.ledger.grand_total(), 1_020);
}

#[test]
fn test_append_after_overwrite_builds_on_overwritten_total() {
    let mut f = Fixture::new();
    let alice = Address::random();
    f.append(alice, 100).unwrap();
    f.overwrite(alice, 10).unwrap();

    f.append(alice, 5).unwrap();

    assert_eq!(f.ledger.total_of(&alice), 15);
    assert_eq!(f.history_sum(&alice), 105);
    assert_eq!(f.ledger.grand_total(), 15);
}

// ============================================================================
// GATES
// ============================================================================

#[test]
fn test_mutations_require_writer_capability() {
    let mut f = Fixture::new();
    let outsider = Address::random();
    let alice = Address::random();
    f.append(alice, 10).unwrap();

    let ctx = CallContext::new(outsider, 1, &f.roles, &f.pause);
    let expected = Err(LedgerError::Access(AccessError::Unauthorized {
        caller: outsider,
        capability: Capability::LedgerWriter,
    }));

    assert_eq!(
        f.ledger.append(&ctx, alice, 1, 1, ExternalRef::ZERO, "").map(|_| ()),
        expected
    );
    assert_eq!(
        f.ledger.amend(&ctx, alice, AmendRequest::new(0, 1, 1, ExternalRef::ZERO)),
        expected
    );
    assert_eq!(f.ledger.overwrite_total(&ctx, alice, 1, ""), expected);
    assert_eq!(f.ledger.total_of(&alice), 10);
}

#[test]
fn test_mutations_rejected_while_halted() {
    let mut f = Fixture::new();
    let alice = Address::random();
    f.append(alice, 10).unwrap();
    f.pause.halt();

    assert_eq!(f.append(alice, 1), Err(LedgerError::Access(AccessError::Halted)));
    assert_eq!(
        f.amend(alice, AmendRequest::new(0, 1, 0, ExternalRef::ZERO)),
        Err(LedgerError::Access(AccessError::Halted))
    );
    assert_eq!(f.overwrite(alice, 1), Err(LedgerError::Access(AccessError::Halted)));

    f.pause.resume();
    assert!(f.append(alice, 1).is_ok());
    assert_eq!(f.ledger.total_of(&alice), 11);
}

// ============================================================================
// READS
// ============================================================================

#[test]
fn test_history_is_a_copy() {
    let mut f = Fixture::new();
    let alice = Address::random();
    f.append(alice, 10).unwrap();

    let snapshot = f.ledger.history(&alice);
    f.amend(alice, AmendRequest::new(0, 99, 0, ExternalRef::ZERO)).unwrap();

    assert_eq!(snapshot[0].amount(), 10);
    assert_eq!(f.ledger.history(&alice)[0].amount(), 99);
}

#[test]
fn test_entry_out_of_range() {
    let mut f = Fixture::new();
    let alice = Address::random();
    f.append(alice, 10).unwrap();

    assert_eq!(
        f.ledger.entry(&alice, 1),
        Err(LedgerError::IndexOutOfRange { index: 1, len: 1 })
    );
}

#[test]
fn test_accounts_are_listed_sorted() {
    let mut f = Fixture::new();
    let mut expected: Vec<Address> = (0..5).map(|_| Address::random()).collect();
    for account in &expected {
        f.append(*account, 1).unwrap();
    }
    expected.sort();

    assert_eq!(f.ledger.accounts(), expected);
}

// ============================================================================
// EVENTS
// ============================================================================

#[test]
fn test_events_carry_operation_parameters() {
    let mut f = Fixture::new();
    let alice = Address::random();
    f.append(alice, 100).unwrap();
    f.amend(alice, AmendRequest::new(0, 150, 77, ExternalRef::ZERO)).unwrap();
    f.overwrite(alice, 20).unwrap();

    let events = f.ledger.poll_events();
    assert_eq!(events.len(), 3);
    assert_eq!(
        events[0],
        LedgerEvent::EntryAppended {
            account: alice,
            index: 0,
            amount: 100,
            recorded_at: 100,
            external_ref: ExternalRef::digest(b"tx"),
            note: "note".into(),
        }
    );
    assert_eq!(
        events[1],
        LedgerEvent::EntryAmended {
            account: alice,
            index: 0,
            old_amount: 100,
            new_amount: 150,
            requested_clock: 77,
            recorded_at: 200,
            external_ref: ExternalRef::ZERO,
            note: "note".into(),
        }
    );
    assert_eq!(
        events[2],
        LedgerEvent::TotalOverwritten {
            account: alice,
            old_total: 150,
            new_total: 20,
            note: "correction".into(),
        }
    );
    assert!(f.ledger.poll_events().is_empty());
}

#[test]
fn test_failed_operations_emit_nothing() {
    let mut f = Fixture::new();
    let alice = Address::random();

    let _ = f.append(alice, 0);
    let _ = f.amend(alice, AmendRequest::new(3, 1, 0, ExternalRef::ZERO));
    f.pause.halt();
    let _ = f.overwrite(alice, 1);

    assert!(f.ledger.poll_events().is_empty());
}
