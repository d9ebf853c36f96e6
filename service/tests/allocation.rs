//! Allocation of donations through the whole [`Service`], racing callers
//! included.

use std::{future::Future, sync::Arc, time::Duration};

use common::{Clock as _, Date, DateTime, ManualClock};
use jsonwebtoken::DecodingKey;
use service::{
    command::{
        self, accept_donation, accept_donation_partially, complete_donation,
        donate, lock_donation, remove_donation, remove_inventory,
        revoke_donation_acceptance, set_pickup_location,
    },
    domain::{
        donation::{self, AcceptedLine, Address, Latitude, Longitude},
        inventory,
        user::{self, Caller},
        Donation,
    },
    infra::Memory,
    ledger, query, read, Command as _, Config, Service,
};
use tokio::{sync::Barrier, task::JoinHandle};

type TestService = Service<Memory, ManualClock>;

const LOCK_TTL: Duration = Duration::from_secs(10 * 60);

fn setup() -> (TestService, ManualClock) {
    let clock = ManualClock::new(
        DateTime::from_unix_timestamp(1_760_000_000).unwrap(),
    );
    let service = Service::with_clock(
        Config {
            jwt_decoding_key: DecodingKey::from_secret(b"secret"),
            donation_lock_ttl: LOCK_TTL,
        },
        Memory::new(),
        clock.clone(),
    );
    (service, clock)
}

fn donor() -> Caller {
    Caller::donor(user::Id::new())
}

fn recipient() -> Caller {
    Caller::recipient(user::Id::new())
}

async fn stock(
    service: &TestService,
    donor: Caller,
    name: &str,
    quantity: u32,
) -> inventory::Entry {
    service
        .execute(command::AddInventoryEntry {
            caller: donor,
            name: inventory::Name::new(name).unwrap(),
            expiry_date: Date::from_calendar_date(2026, 11, 1).unwrap(),
            quantity: quantity.into(),
            category: inventory::Category::Grocery,
        })
        .await
        .unwrap()
}

fn line(entry: &inventory::Entry, quantity: u32) -> ledger::Line {
    ledger::Line {
        entry_id: entry.id,
        quantity: quantity.into(),
    }
}

async fn donate(
    service: &TestService,
    donor: Caller,
    lines: Vec<ledger::Line>,
) -> Donation {
    service
        .execute(command::Donate {
            caller: donor,
            lines,
        })
        .await
        .unwrap()
}

async fn quantity(service: &TestService, entry: &inventory::Entry) -> u32 {
    service
        .execute(query::inventory::ById::by(entry.id))
        .await
        .unwrap()
        .map_or(0, |e| e.quantity.into())
}

async fn stored(
    service: &TestService,
    id: donation::Id,
) -> Option<read::Donation> {
    service
        .execute(query::donation::ById::by(id))
        .await
        .unwrap()
}

fn quantities(donation: &Donation) -> Vec<u32> {
    donation.items.iter().map(|i| i.quantity.into()).collect()
}

fn everything(donation: &Donation) -> Vec<AcceptedLine> {
    donation
        .items
        .iter()
        .map(|i| AcceptedLine {
            inventory_id: i.inventory_id,
            available: i.quantity,
            accepted: i.quantity,
        })
        .collect()
}

fn pickup() -> donation::Pickup {
    donation::Pickup {
        lat: Latitude::new(52.52).unwrap(),
        lng: Longitude::new(13.405).unwrap(),
        address: Address::new("Alexanderplatz 1, Berlin").unwrap(),
    }
}

/// Accepts the whole `donation` either fully or partially, returning the
/// accepted quantity, or [`None`] if another recipient was first.
async fn accept_whole(
    service: &TestService,
    caller: Caller,
    donation: &Donation,
    partially: bool,
) -> Option<u64> {
    if partially {
        match service
            .execute(command::AcceptDonationPartially {
                caller,
                donation_id: donation.id,
                lines: everything(donation),
            })
            .await
        {
            Ok(out) => {
                assert!(out.residual.is_none());
                out.accepted.as_ref().map(Donation::total_quantity)
            }
            Err(e) => {
                assert!(
                    matches!(
                        e.as_ref(),
                        accept_donation_partially::ExecutionError::AlreadyAccepted(_)
                            | accept_donation_partially::ExecutionError::DonationNotExists(_),
                    ),
                    "{e:?}",
                );
                None
            }
        }
    } else {
        match service
            .execute(command::AcceptDonation {
                caller,
                donation_id: donation.id,
            })
            .await
        {
            Ok(accepted) => Some(accepted.total_quantity()),
            Err(e) => {
                assert!(
                    matches!(
                        e.as_ref(),
                        accept_donation::ExecutionError::AlreadyAccepted(_)
                            | accept_donation::ExecutionError::DonationNotExists(_),
                    ),
                    "{e:?}",
                );
                None
            }
        }
    }
}

/// Spawns every provided call on its own task, releasing them all at once.
fn race<T, F, Fut>(calls: Vec<F>) -> Vec<JoinHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let start = Arc::new(Barrier::new(calls.len()));
    calls
        .into_iter()
        .map(|call| {
            let start = Arc::clone(&start);
            tokio::spawn(async move {
                _ = start.wait().await;
                call().await
            })
        })
        .collect()
}

async fn finished<T>(tasks: Vec<JoinHandle<T>>) -> Vec<T> {
    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        results.push(task.await.unwrap());
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn exactly_one_of_concurrent_accepts_succeeds() {
    let (service, _) = setup();
    let service = Arc::new(service);
    let donor = donor();
    let rice = stock(&service, donor, "Rice", 4).await;
    let donation = donate(&service, donor, vec![line(&rice, 4)]).await;

    let results = finished(race(
        (0..8)
            .map(|_| {
                let (service, caller) = (Arc::clone(&service), recipient());
                move || async move {
                    service
                        .execute(command::AcceptDonation {
                            caller,
                            donation_id: donation.id,
                        })
                        .await
                }
            })
            .collect(),
    ))
    .await;

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(
            err.as_ref(),
            accept_donation::ExecutionError::AlreadyAccepted(_),
        ));
    }

    let winner = results.into_iter().find_map(Result::ok).unwrap();
    let stored = stored(&service, donation.id).await.unwrap();
    assert_eq!(stored.status, donation::Status::Accepted);
    assert_eq!(stored.accepted_by, winner.accepted_by);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_partial_and_full_accepts_allocate_once() {
    let (service, _) = setup();
    let service = Arc::new(service);
    let donor = donor();
    let (rice, beans) = (
        stock(&service, donor, "Rice", 100).await,
        stock(&service, donor, "Beans", 100).await,
    );

    for _ in 0..20 {
        let donation =
            donate(&service, donor, vec![line(&rice, 5), line(&beans, 3)])
                .await;

        let results = finished(race(
            (0..6)
                .map(|n| {
                    let (service, caller) = (Arc::clone(&service), recipient());
                    let donation = donation.clone();
                    move || async move {
                        let partially = n % 2 == 1;
                        accept_whole(&service, caller, &donation, partially)
                            .await
                            .map(|total| (caller.id, total))
                    }
                })
                .collect(),
        ))
        .await;

        let winners = results.iter().flatten().collect::<Vec<_>>();
        assert_eq!(winners.len(), 1, "{results:?}");
        let (winner, total) = *winners[0];
        assert_eq!(total, donation.total_quantity());

        let allocated = service
            .execute(query::donations::accepted_by(winner))
            .await
            .unwrap();
        assert_eq!(allocated.len(), 1);
        assert_eq!(
            allocated[0]
                .items
                .iter()
                .map(|i| u64::from(u32::from(i.quantity)))
                .sum::<u64>(),
            donation.total_quantity(),
        );
        let available = service
            .execute(query::donations::available_for(recipient().id))
            .await
            .unwrap();
        assert!(available.is_empty(), "{available:?}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_debits_never_overdraw() {
    let (service, _) = setup();
    let service = Arc::new(service);
    let donor = donor();
    let soup = stock(&service, donor, "Soup", 10).await;

    let results = finished(race(
        (0..6)
            .map(|_| {
                let (service, lines) =
                    (Arc::clone(&service), vec![line(&soup, 3)]);
                move || async move {
                    service
                        .execute(command::Donate {
                            caller: donor,
                            lines,
                        })
                        .await
                }
            })
            .collect(),
    ))
    .await;

    let donated = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(Donation::total_quantity)
        .sum::<u64>();
    assert_eq!(donated, 9);
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(
            err.as_ref(),
            donate::ExecutionError::Ledger(
                ledger::ExecutionError::InsufficientStock(_),
            ),
        ));
    }
    assert_eq!(quantity(&service, &soup).await, 1);
}

#[tokio::test]
async fn donation_records_debited_quantities() {
    let (service, _) = setup();
    let donor = donor();
    let (rice, beans) = (
        stock(&service, donor, "Rice", 7).await,
        stock(&service, donor, "Beans", 3).await,
    );

    let donation = donate(
        &service,
        donor,
        vec![line(&rice, 2), line(&beans, 3), line(&rice, 3)],
    )
    .await;

    assert_eq!(donation.status, donation::Status::NotAccepted);
    assert_eq!(quantities(&donation), [5, 3]);
    assert_eq!(quantity(&service, &rice).await, 2);
    assert_eq!(quantity(&service, &beans).await, 0);

    let listed = service
        .execute(query::inventory::List::by(donor.id))
        .await
        .unwrap();
    assert_eq!(listed.iter().map(|e| e.id).collect::<Vec<_>>(), [rice.id]);
}

#[tokio::test]
async fn failed_donation_leaves_stock_intact() {
    let (service, _) = setup();
    let donor = donor();
    let (rice, beans) = (
        stock(&service, donor, "Rice", 5).await,
        stock(&service, donor, "Beans", 1).await,
    );

    let err = service
        .execute(command::Donate {
            caller: donor,
            lines: vec![line(&rice, 2), line(&beans, 3)],
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        donate::ExecutionError::Ledger(
            ledger::ExecutionError::InsufficientStock(_),
        ),
    ));
    assert_eq!(quantity(&service, &rice).await, 5);
    assert_eq!(quantity(&service, &beans).await, 1);
    let listed = service
        .execute(query::donations::for_donor(donor.id))
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn donating_foreign_stock_fails() {
    let (service, _) = setup();
    let owner = donor();
    let rice = stock(&service, owner, "Rice", 5).await;

    let err = service
        .execute(command::Donate {
            caller: donor(),
            lines: vec![line(&rice, 1)],
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        donate::ExecutionError::Ledger(
            ledger::ExecutionError::EntryNotExists(id),
        ) if *id == rice.id,
    ));
    assert_eq!(quantity(&service, &rice).await, 5);
}

#[tokio::test]
async fn partial_acceptance_conserves_quantity() {
    let (service, _) = setup();
    let (donor, a) = (donor(), recipient());
    let (rice, beans) = (
        stock(&service, donor, "Rice", 5).await,
        stock(&service, donor, "Beans", 3).await,
    );
    let donation =
        donate(&service, donor, vec![line(&rice, 5), line(&beans, 3)]).await;
    _ = service
        .execute(command::RejectDonation {
            caller: a,
            donation_id: donation.id,
        })
        .await
        .unwrap();

    let out = service
        .execute(command::AcceptDonationPartially {
            caller: a,
            donation_id: donation.id,
            lines: vec![
                AcceptedLine {
                    inventory_id: rice.id,
                    available: 5.into(),
                    accepted: 1.into(),
                },
                AcceptedLine {
                    inventory_id: beans.id,
                    available: 3.into(),
                    accepted: 2.into(),
                },
            ],
        })
        .await
        .unwrap();

    let (accepted, residual) = (out.accepted.unwrap(), out.residual.unwrap());
    assert_eq!(quantities(&accepted), [1, 2]);
    assert_eq!(quantities(&residual), [4, 1]);
    assert_eq!(
        accepted.total_quantity() + residual.total_quantity(),
        donation.total_quantity(),
    );
    assert_eq!(residual.id, donation.id);

    // The residual is visible again to the recipient who rejected it.
    let available = service
        .execute(query::donations::available_for(a.id))
        .await
        .unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].id, donation.id);
    let mine = service
        .execute(query::donations::accepted_by(a.id))
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, accepted.id);
    assert_eq!(AsRef::<str>::as_ref(&mine[0].items[0].name), "Rice");
}

#[tokio::test]
async fn accepting_everything_partially_removes_original() {
    let (service, _) = setup();
    let (donor, a) = (donor(), recipient());
    let rice = stock(&service, donor, "Rice", 5).await;
    let donation = donate(&service, donor, vec![line(&rice, 5)]).await;

    let out = service
        .execute(command::AcceptDonationPartially {
            caller: a,
            donation_id: donation.id,
            lines: vec![AcceptedLine {
                inventory_id: rice.id,
                available: 5.into(),
                accepted: 5.into(),
            }],
        })
        .await
        .unwrap();

    assert!(out.residual.is_none());
    assert!(stored(&service, donation.id).await.is_none());
    let accepted = out.accepted.unwrap();
    assert_eq!(quantities(&accepted), [5]);
    // Stock is not restored.
    assert_eq!(quantity(&service, &rice).await, 0);
}

#[tokio::test]
async fn lock_expires_after_ttl() {
    let (service, clock) = setup();
    let (donor, a, b) = (donor(), recipient(), recipient());
    let rice = stock(&service, donor, "Rice", 2).await;
    let donation = donate(&service, donor, vec![line(&rice, 2)]).await;
    let try_lock = |caller| {
        service.execute(command::LockDonation {
            caller,
            donation_id: donation.id,
        })
    };

    _ = try_lock(a).await.unwrap();

    clock.advance(Duration::from_secs(9 * 60));
    let err = try_lock(b).await.unwrap_err();
    assert!(matches!(
        err.as_ref(),
        lock_donation::ExecutionError::Locked(_),
    ));

    clock.advance(Duration::from_secs(2 * 60));
    let locked = try_lock(b).await.unwrap();
    assert_eq!(locked.lock.map(|l| l.locked_by), Some(b.id));
}

#[tokio::test]
async fn lock_of_accepted_donation_fails() {
    let (service, _) = setup();
    let (donor, a) = (donor(), recipient());
    let rice = stock(&service, donor, "Rice", 2).await;
    let donation = donate(&service, donor, vec![line(&rice, 2)]).await;
    _ = service
        .execute(command::AcceptDonation {
            caller: a,
            donation_id: donation.id,
        })
        .await
        .unwrap();

    let err = service
        .execute(command::LockDonation {
            caller: recipient(),
            donation_id: donation.id,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_ref(),
        lock_donation::ExecutionError::AlreadyAccepted(_),
    ));
}

#[tokio::test]
async fn unlock_is_idempotent() {
    let (service, _) = setup();
    let (donor, a, b) = (donor(), recipient(), recipient());
    let rice = stock(&service, donor, "Rice", 2).await;
    let donation = donate(&service, donor, vec![line(&rice, 2)]).await;
    let unlock = || {
        service.execute(command::UnlockDonation {
            caller: a,
            donation_id: donation.id,
        })
    };

    unlock().await.unwrap();
    _ = service
        .execute(command::LockDonation {
            caller: a,
            donation_id: donation.id,
        })
        .await
        .unwrap();
    unlock().await.unwrap();
    unlock().await.unwrap();

    assert!(!stored(&service, donation.id).await.unwrap().is_locked());
    _ = service
        .execute(command::LockDonation {
            caller: b,
            donation_id: donation.id,
        })
        .await
        .unwrap();
    // Unlocking a vanished donation is fine too.
    service
        .execute(command::UnlockDonation {
            caller: a,
            donation_id: donation::Id::new(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn accept_is_refused_under_foreign_lock() {
    let (service, _) = setup();
    let (donor, a, b) = (donor(), recipient(), recipient());
    let rice = stock(&service, donor, "Rice", 2).await;
    let donation = donate(&service, donor, vec![line(&rice, 2)]).await;
    _ = service
        .execute(command::LockDonation {
            caller: a,
            donation_id: donation.id,
        })
        .await
        .unwrap();

    let err = service
        .execute(command::AcceptDonation {
            caller: b,
            donation_id: donation.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        accept_donation::ExecutionError::Locked(_),
    ));

    let accepted = service
        .execute(command::AcceptDonation {
            caller: a,
            donation_id: donation.id,
        })
        .await
        .unwrap();
    assert_eq!(accepted.accepted_by, Some(a.id));
    assert!(accepted.lock.is_none());
}

#[tokio::test]
async fn rejection_hides_donation_from_recipient_only() {
    let (service, _) = setup();
    let (donor, a, b) = (donor(), recipient(), recipient());
    let rice = stock(&service, donor, "Rice", 2).await;
    let donation = donate(&service, donor, vec![line(&rice, 2)]).await;

    for _ in 0..2 {
        let rejected = service
            .execute(command::RejectDonation {
                caller: a,
                donation_id: donation.id,
            })
            .await
            .unwrap();
        assert_eq!(rejected.rejected_by.len(), 1);
        assert_eq!(rejected.status, donation::Status::NotAccepted);
    }

    let for_a = service
        .execute(query::donations::unaccepted_for(a.id))
        .await
        .unwrap();
    assert!(for_a.is_empty());
    let for_b = service
        .execute(query::donations::available_for(b.id))
        .await
        .unwrap();
    assert_eq!(for_b.len(), 1);
}

#[tokio::test]
async fn removing_donation_restores_stock() {
    let (service, _) = setup();
    let (donor, a) = (donor(), recipient());
    let rice = stock(&service, donor, "Rice", 4).await;
    let donation = donate(&service, donor, vec![line(&rice, 3)]).await;
    let remove = || {
        service.execute(command::RemoveDonation {
            caller: donor,
            donation_id: donation.id,
        })
    };

    _ = service
        .execute(command::LockDonation {
            caller: a,
            donation_id: donation.id,
        })
        .await
        .unwrap();
    let err = remove().await.unwrap_err();
    assert!(matches!(
        err.as_ref(),
        remove_donation::ExecutionError::Locked(_),
    ));

    service
        .execute(command::UnlockDonation {
            caller: a,
            donation_id: donation.id,
        })
        .await
        .unwrap();
    let removed = remove().await.unwrap();

    assert_eq!(removed.id, donation.id);
    assert!(stored(&service, donation.id).await.is_none());
    assert_eq!(quantity(&service, &rice).await, 4);
}

#[tokio::test]
async fn only_acceptor_completes_donation() {
    let (service, clock) = setup();
    let (donor, a) = (donor(), recipient());
    let rice = stock(&service, donor, "Rice", 2).await;
    let donation = donate(&service, donor, vec![line(&rice, 2)]).await;
    let complete = |caller| {
        service.execute(command::CompleteDonation {
            caller,
            donation_id: donation.id,
        })
    };

    let err = complete(a).await.unwrap_err();
    assert!(matches!(
        err.as_ref(),
        complete_donation::ExecutionError::NotAccepted(_),
    ));

    _ = service
        .execute(command::AcceptDonation {
            caller: a,
            donation_id: donation.id,
        })
        .await
        .unwrap();
    let err = complete(recipient()).await.unwrap_err();
    assert!(matches!(
        err.as_ref(),
        complete_donation::ExecutionError::NotAcceptor(_),
    ));

    clock.advance(Duration::from_secs(3600));
    let completed = complete(a).await.unwrap();
    assert_eq!(completed.status, donation::Status::Completed);
    assert_eq!(
        completed.picked_up_at.map(|at| at.coerce()),
        Some(clock.now()),
    );

    let err = service
        .execute(command::RevokeDonationAcceptance {
            caller: a,
            donation_id: donation.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        revoke_donation_acceptance::ExecutionError::AlreadyCompleted(_),
    ));

    let history = service
        .execute(query::donations::completed_for(a.id))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn donor_locks_out_second_reviewer_then_splits_and_revokes() {
    let (service, clock) = setup();
    let (donor, a, b) = (donor(), recipient(), recipient());
    let (rice, beans) = (
        stock(&service, donor, "Rice", 5).await,
        stock(&service, donor, "Beans", 3).await,
    );

    let donation =
        donate(&service, donor, vec![line(&rice, 5), line(&beans, 3)]).await;
    assert_eq!(donation.status, donation::Status::NotAccepted);
    assert_eq!(quantity(&service, &rice).await, 0);
    assert_eq!(quantity(&service, &beans).await, 0);

    _ = service
        .execute(command::LockDonation {
            caller: a,
            donation_id: donation.id,
        })
        .await
        .unwrap();
    clock.advance(Duration::from_secs(60));
    let err = service
        .execute(command::LockDonation {
            caller: b,
            donation_id: donation.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        lock_donation::ExecutionError::Locked(_),
    ));

    let out = service
        .execute(command::AcceptDonationPartially {
            caller: a,
            donation_id: donation.id,
            lines: vec![
                AcceptedLine {
                    inventory_id: rice.id,
                    available: 5.into(),
                    accepted: 3.into(),
                },
                AcceptedLine {
                    inventory_id: beans.id,
                    available: 3.into(),
                    accepted: 3.into(),
                },
            ],
        })
        .await
        .unwrap();
    let (accepted, residual) = (out.accepted.unwrap(), out.residual.unwrap());
    assert_eq!(accepted.status, donation::Status::Accepted);
    assert_eq!(accepted.accepted_by, Some(a.id));
    assert_eq!(quantities(&accepted), [3, 3]);
    assert_eq!(residual.status, donation::Status::NotAccepted);
    assert_eq!(residual.items.len(), 1);
    assert_eq!(residual.items[0].inventory_id, rice.id);
    assert_eq!(quantities(&residual), [2]);
    assert!(residual.lock.is_none());

    let revoked = service
        .execute(command::RevokeDonationAcceptance {
            caller: a,
            donation_id: accepted.id,
        })
        .await
        .unwrap();
    assert_eq!(revoked.status, donation::Status::NotAccepted);
    assert_eq!(revoked.accepted_by, None);

    let stored = stored(&service, accepted.id).await.unwrap();
    assert_eq!(stored.status, donation::Status::NotAccepted);
    assert_eq!(stored.accepted_by, None);
}

#[tokio::test]
async fn split_donation_keeps_pickup_location() {
    let (service, _) = setup();
    let (donor, a) = (donor(), recipient());
    let rice = stock(&service, donor, "Rice", 4).await;
    let donation = donate(&service, donor, vec![line(&rice, 4)]).await;
    _ = service
        .execute(command::SetPickupLocation {
            caller: donor,
            donation_id: donation.id,
            pickup: pickup(),
        })
        .await
        .unwrap();

    let out = service
        .execute(command::AcceptDonationPartially {
            caller: a,
            donation_id: donation.id,
            lines: vec![AcceptedLine {
                inventory_id: rice.id,
                available: 4.into(),
                accepted: 1.into(),
            }],
        })
        .await
        .unwrap();

    let (accepted, residual) = (out.accepted.unwrap(), out.residual.unwrap());
    assert_eq!(accepted.pickup, Some(pickup()));
    assert_eq!(residual.pickup, Some(pickup()));
    let stored = stored(&service, accepted.id).await.unwrap();
    assert_eq!(stored.pickup, Some(pickup()));
}

#[tokio::test]
async fn only_owner_sets_pickup_before_acceptance() {
    let (service, _) = setup();
    let (donor, a) = (donor(), recipient());
    let rice = stock(&service, donor, "Rice", 2).await;
    let donation = donate(&service, donor, vec![line(&rice, 2)]).await;
    let set = |caller| {
        service.execute(command::SetPickupLocation {
            caller,
            donation_id: donation.id,
            pickup: pickup(),
        })
    };

    let err = set(self::donor()).await.unwrap_err();
    assert!(matches!(
        err.as_ref(),
        set_pickup_location::ExecutionError::NotOwner(_),
    ));
    let err = set(a).await.unwrap_err();
    assert!(matches!(
        err.as_ref(),
        set_pickup_location::ExecutionError::Role(_),
    ));

    // Moving the pickup place is fine until the donation is accepted.
    _ = set(donor).await.unwrap();
    let updated = set(donor).await.unwrap();
    assert_eq!(updated.pickup, Some(pickup()));

    _ = service
        .execute(command::AcceptDonation {
            caller: a,
            donation_id: donation.id,
        })
        .await
        .unwrap();
    let err = set(donor).await.unwrap_err();
    assert!(matches!(
        err.as_ref(),
        set_pickup_location::ExecutionError::AlreadyAccepted(_),
    ));
}

#[test]
fn pickup_coordinates_are_range_checked() {
    assert!(Latitude::new(90.0).is_some());
    assert!(Latitude::new(-90.0).is_some());
    assert!(Latitude::new(90.5).is_none());
    assert!(Longitude::new(-180.0).is_some());
    assert!(Longitude::new(180.1).is_none());
    assert!(Longitude::new(f64::NAN).is_none());
    assert!(Address::new("").is_none());
}

#[tokio::test]
async fn removing_inventory_is_all_or_nothing() {
    let (service, _) = setup();
    let donor = donor();
    let (rice, beans) = (
        stock(&service, donor, "Rice", 5).await,
        stock(&service, donor, "Beans", 1).await,
    );
    let remove = |caller, lines| {
        service.execute(command::RemoveInventory { caller, lines })
    };

    let err = remove(donor, vec![line(&rice, 2), line(&beans, 3)])
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        remove_inventory::ExecutionError::Ledger(
            ledger::ExecutionError::InsufficientStock(_),
        ),
    ));
    assert_eq!(quantity(&service, &rice).await, 5);
    assert_eq!(quantity(&service, &beans).await, 1);

    let err = remove(self::donor(), vec![line(&rice, 1)])
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        remove_inventory::ExecutionError::Ledger(
            ledger::ExecutionError::EntryNotExists(id),
        ) if *id == rice.id,
    ));

    _ = remove(donor, vec![line(&rice, 2), line(&beans, 1)])
        .await
        .unwrap();
    assert_eq!(quantity(&service, &rice).await, 3);
    assert_eq!(quantity(&service, &beans).await, 0);
}

#[tokio::test]
async fn partial_accept_ignores_foreign_lock() {
    let (service, _) = setup();
    let (donor, a, b) = (donor(), recipient(), recipient());
    let rice = stock(&service, donor, "Rice", 4).await;
    let donation = donate(&service, donor, vec![line(&rice, 4)]).await;
    _ = service
        .execute(command::LockDonation {
            caller: a,
            donation_id: donation.id,
        })
        .await
        .unwrap();

    let out = service
        .execute(command::AcceptDonationPartially {
            caller: b,
            donation_id: donation.id,
            lines: vec![AcceptedLine {
                inventory_id: rice.id,
                available: 4.into(),
                accepted: 3.into(),
            }],
        })
        .await
        .unwrap();

    let accepted = out.accepted.unwrap();
    assert_eq!(accepted.accepted_by, Some(b.id));
    assert_eq!(quantities(&accepted), [3]);
    assert_eq!(quantities(&out.residual.unwrap()), [1]);
}

#[tokio::test]
async fn stale_lock_does_not_block_accept() {
    let (service, clock) = setup();
    let (donor, a, b) = (donor(), recipient(), recipient());
    let rice = stock(&service, donor, "Rice", 2).await;
    let donation = donate(&service, donor, vec![line(&rice, 2)]).await;
    _ = service
        .execute(command::LockDonation {
            caller: a,
            donation_id: donation.id,
        })
        .await
        .unwrap();

    clock.advance(Duration::from_secs(11 * 60));
    let accepted = service
        .execute(command::AcceptDonation {
            caller: b,
            donation_id: donation.id,
        })
        .await
        .unwrap();

    assert_eq!(accepted.accepted_by, Some(b.id));
    assert!(accepted.lock.is_none());
    let stored = stored(&service, donation.id).await.unwrap();
    assert_eq!(stored.status, donation::Status::Accepted);
    assert!(!stored.is_locked());
}
