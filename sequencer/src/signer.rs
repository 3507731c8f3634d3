//! The sequenced signer and its dispatch slots.

use capmint_types::{Address, SequenceNumber};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Owns the sequence counter of one signing identity.
///
/// The counter holds the next number to hand out. It is seeded once at
/// startup from the ledger's view of the identity and afterwards only
/// moves through [`SequencedSigner::acquire`].
///
/// The counter sits behind a `tokio::sync::Mutex`, which is fair: waiters
/// are admitted in the order they called `acquire`. The lock stays held for
/// as long as the returned [`SequenceSlot`] lives, so at most one number is
/// in flight towards the ledger at any time.
pub struct SequencedSigner {
    identity: Address,
    seed: SequenceNumber,
    counter: Arc<Mutex<SequenceNumber>>,
    stats: Arc<SlotStats>,
}

#[derive(Default)]
struct SlotStats {
    dispatched: AtomicU64,
    released: AtomicU64,
    /// Lock-free copy of the counter, updated on every transition.
    next: AtomicU64,
}

impl SequencedSigner {
    /// Create a signer whose first handed-out number is `seed`.
    pub fn new(identity: Address, seed: SequenceNumber) -> Self {
        tracing::info!(%identity, %seed, "sequence counter seeded");
        let stats = SlotStats {
            next: AtomicU64::new(seed.value()),
            ..SlotStats::default()
        };
        Self {
            identity,
            seed,
            counter: Arc::new(Mutex::new(seed)),
            stats: Arc::new(stats),
        }
    }

    pub fn identity(&self) -> &Address {
        &self.identity
    }

    pub fn seed(&self) -> SequenceNumber {
        self.seed
    }

    /// Take the next sequence number.
    ///
    /// Waits until every earlier slot has been committed or released. The
    /// counter is advanced before this returns; the returned slot keeps the
    /// critical section open until it is committed (number dispatched) or
    /// released (abandoned before dispatch).
    ///
    /// # Panics
    ///
    /// Panics if the counter would overflow. A corrupted counter would
    /// silently desynchronize from the ledger, so the process must stop and
    /// resynchronize on restart.
    pub async fn acquire(&self) -> SequenceSlot {
        let mut guard = Arc::clone(&self.counter).lock_owned().await;
        let number = *guard;
        let Some(next) = number.checked_next() else {
            tracing::error!(identity = %self.identity, %number, "sequence counter exhausted");
            panic!("sequence counter exhausted for {}", self.identity);
        };
        *guard = next;
        self.stats.next.store(next.value(), Ordering::Relaxed);
        tracing::debug!(identity = %self.identity, sequence = %number, "sequence number acquired");

        SequenceSlot {
            guard: Some(guard),
            dispatching: false,
            number,
            identity: self.identity,
            stats: Arc::clone(&self.stats),
        }
    }

    /// The next number that will be handed out.
    ///
    /// Waits behind any slot currently in flight.
    pub async fn current(&self) -> SequenceNumber {
        *self.counter.lock().await
    }

    /// The next number, if no slot is in flight right now.
    pub fn try_current(&self) -> Option<SequenceNumber> {
        self.counter.try_lock().ok().map(|guard| *guard)
    }

    /// The next number as of the last acquire, commit or release.
    ///
    /// Never waits. While a slot is in flight this already counts that
    /// slot's number as used.
    pub fn next_hint(&self) -> SequenceNumber {
        SequenceNumber::new(self.stats.next.load(Ordering::Relaxed))
    }

    /// Number of slots committed since startup.
    pub fn dispatched_count(&self) -> u64 {
        self.stats.dispatched.load(Ordering::Relaxed)
    }

    /// Number of slots given back before dispatch since startup.
    pub fn released_count(&self) -> u64 {
        self.stats.released.load(Ordering::Relaxed)
    }
}

/// Exclusive right to one sequence number.
///
/// While a slot is alive no other caller can acquire a number, which is what
/// keeps ledger dispatch in sequence order. Finish it with exactly one of:
/// - [`SequenceSlot::commit`] once the transaction was handed to the ledger
///   client, whatever the ledger answered;
/// - [`SequenceSlot::release`] if the transaction was abandoned before
///   dispatch. The counter goes back to this number, leaving no gap.
///
/// Dropping an unfinished slot behaves like `release`, unless
/// [`SequenceSlot::mark_dispatching`] was called: from then on the number
/// may already be on its way to the ledger and a drop commits it.
pub struct SequenceSlot {
    guard: Option<OwnedMutexGuard<SequenceNumber>>,
    dispatching: bool,
    number: SequenceNumber,
    identity: Address,
    stats: Arc<SlotStats>,
}

impl SequenceSlot {
    pub fn number(&self) -> SequenceNumber {
        self.number
    }

    pub fn identity(&self) -> &Address {
        &self.identity
    }

    /// The transaction carrying this number is about to be handed to the
    /// ledger client. Dropping the slot after this point no longer rolls
    /// the counter back.
    pub fn mark_dispatching(&mut self) {
        self.dispatching = true;
    }

    pub fn is_dispatching(&self) -> bool {
        self.dispatching
    }

    /// The number was dispatched; it is permanently used.
    pub fn commit(mut self) {
        self.finish_commit();
    }

    fn finish_commit(&mut self) {
        if self.guard.take().is_some() {
            self.stats.dispatched.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(identity = %self.identity, sequence = %self.number, "sequence slot committed");
        }
    }

    /// The number was never dispatched; hand it back.
    pub fn release(mut self) {
        self.roll_back();
    }

    fn roll_back(&mut self) {
        if let Some(mut guard) = self.guard.take() {
            // Still inside the critical section: nobody has seen `number + 1`.
            *guard = self.number;
            self.stats.next.store(self.number.value(), Ordering::Relaxed);
            self.stats.released.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(identity = %self.identity, sequence = %self.number, "sequence number released");
        }
    }
}

impl Drop for SequenceSlot {
    fn drop(&mut self) {
        if self.guard.is_none() {
            return;
        }
        if self.dispatching {
            tracing::warn!(
                identity = %self.identity,
                sequence = %self.number,
                "sequence slot dropped during dispatch, keeping number spent"
            );
            self.finish_commit();
        } else {
            tracing::warn!(
                identity = %self.identity,
                sequence = %self.number,
                "sequence slot dropped before dispatch, rolling back"
            );
            self.roll_back();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn signer(seed: u64) -> SequencedSigner {
        SequencedSigner::new(Address::from_bytes([0x11; 20]), SequenceNumber::new(seed))
    }

    #[tokio::test]
    async fn sequential_acquisitions_count_up_from_seed() {
        let signer = signer(10);
        for expected in 10..15 {
            let slot = signer.acquire().await;
            assert_eq!(slot.number(), SequenceNumber::new(expected));
            slot.commit();
        }
        assert_eq!(signer.current().await, SequenceNumber::new(15));
        assert_eq!(signer.dispatched_count(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_acquisitions_form_contiguous_range() {
        let signer = Arc::new(signer(10));
        let mut handles = Vec::new();
        for _ in 0..200 {
            let signer = Arc::clone(&signer);
            handles.push(tokio::spawn(async move {
                let slot = signer.acquire().await;
                let n = slot.number().value();
                tokio::task::yield_now().await;
                slot.commit();
                n
            }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap());
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (10..210).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn dispatch_order_matches_number_order() {
        let signer = Arc::new(signer(0));
        let dispatched = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for _ in 0..100 {
            let signer = Arc::clone(&signer);
            let dispatched = Arc::clone(&dispatched);
            handles.push(tokio::spawn(async move {
                let slot = signer.acquire().await;
                tokio::task::yield_now().await;
                dispatched.lock().unwrap().push(slot.number().value());
                slot.commit();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let dispatched = dispatched.lock().unwrap().clone();
        assert_eq!(dispatched, (0..100).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn release_leaves_no_gap() {
        let signer = signer(7);
        let slot = signer.acquire().await;
        assert_eq!(slot.number(), SequenceNumber::new(7));
        slot.release();

        let slot = signer.acquire().await;
        assert_eq!(slot.number(), SequenceNumber::new(7));
        slot.commit();
        assert_eq!(signer.released_count(), 1);
        assert_eq!(signer.dispatched_count(), 1);
    }

    #[tokio::test]
    async fn dropped_slot_rolls_back() {
        let signer = signer(3);
        {
            let _slot = signer.acquire().await;
        }
        assert_eq!(signer.current().await, SequenceNumber::new(3));
    }

    #[tokio::test]
    async fn slot_dropped_during_dispatch_stays_spent() {
        let signer = signer(3);
        {
            let mut slot = signer.acquire().await;
            slot.mark_dispatching();
        }
        assert_eq!(signer.current().await, SequenceNumber::new(4));
        assert_eq!(signer.dispatched_count(), 1);
        assert_eq!(signer.released_count(), 0);
    }

    #[tokio::test]
    async fn aborted_task_mid_dispatch_does_not_reissue_number() {
        let signer = Arc::new(signer(20));
        let holder = {
            let signer = Arc::clone(&signer);
            tokio::spawn(async move {
                let mut slot = signer.acquire().await;
                slot.mark_dispatching();
                tokio::time::sleep(Duration::from_secs(60)).await;
                slot.commit();
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        holder.abort();
        let _ = holder.await;

        assert_eq!(signer.acquire().await.number(), SequenceNumber::new(21));
    }

    #[tokio::test]
    async fn next_hint_never_waits_on_in_flight_slot() {
        let signer = signer(8);
        assert_eq!(signer.next_hint(), SequenceNumber::new(8));

        let slot = signer.acquire().await;
        assert!(signer.try_current().is_none());
        assert_eq!(signer.next_hint(), SequenceNumber::new(9));
        slot.release();
        assert_eq!(signer.next_hint(), SequenceNumber::new(8));

        signer.acquire().await.commit();
        assert_eq!(signer.next_hint(), SequenceNumber::new(9));
    }

    #[tokio::test]
    async fn committed_number_is_never_reissued() {
        let signer = signer(3);
        signer.acquire().await.commit();
        let slot = signer.acquire().await;
        assert_eq!(slot.number(), SequenceNumber::new(4));
    }

    #[tokio::test]
    async fn acquire_waits_for_in_flight_slot() {
        let signer = Arc::new(signer(0));
        let first = signer.acquire().await;
        assert!(signer.try_current().is_none());

        let waiter = {
            let signer = Arc::clone(&signer);
            tokio::spawn(async move { signer.acquire().await.number() })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        first.commit();
        assert_eq!(waiter.await.unwrap(), SequenceNumber::new(1));
    }

    #[tokio::test]
    async fn aborted_task_holding_slot_gives_number_back() {
        let signer = Arc::new(signer(50));
        let holder = {
            let signer = Arc::clone(&signer);
            tokio::spawn(async move {
                let _slot = signer.acquire().await;
                tokio::time::sleep(Duration::from_secs(60)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        holder.abort();
        let _ = holder.await;

        assert_eq!(signer.current().await, SequenceNumber::new(50));
    }

    #[tokio::test]
    #[should_panic(expected = "sequence counter exhausted")]
    async fn overflow_is_fatal() {
        let signer = signer(u64::MAX);
        let _ = signer.acquire().await;
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any mix of commits and releases leaves the counter at
            /// seed + number of commits, and committed numbers are exactly
            /// seed..seed+commits in order.
            #[test]
            fn commits_and_releases(seed in 0u64..1_000_000, ops in prop::collection::vec(any::<bool>(), 0..64)) {
                let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
                let (committed, current) = rt.block_on(async {
                    let signer = signer(seed);
                    let mut committed = Vec::new();
                    for commit in &ops {
                        let slot = signer.acquire().await;
                        if *commit {
                            committed.push(slot.number().value());
                            slot.commit();
                        } else {
                            slot.release();
                        }
                    }
                    (committed, signer.current().await.value())
                });
                let commits = ops.iter().filter(|c| **c).count() as u64;
                prop_assert_eq!(current, seed + commits);
                prop_assert_eq!(committed, (seed..seed + commits).collect::<Vec<_>>());
            }
        }
    }
}
