use log::{error, trace};
use rand::{Rng, SeedableRng, XorShiftRng};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Priority given to the temporary node that drives a join. It is below every issuable priority.
pub const JOIN_SENTINEL: u64 = 0;

/// Priority given to the temporary node that drives a split. It is above every issuable priority.
pub const SPLIT_SENTINEL: u64 = u64::MAX;

/// Capacity of a bounded pool created through `PriorityAllocator::default_pool`.
pub const DEFAULT_POOL_CAPACITY: u64 = 65535;

/// Number of consecutive colliding draws after which the random priority space is considered
/// exhausted.
pub const MAX_DRAW_ATTEMPTS: usize = 64;

/// An allocator shared by every map that may exchange nodes with one another.
pub type SharedAllocator = Rc<RefCell<PriorityAllocator>>;

thread_local! {
    static DEFAULT_ALLOCATOR: SharedAllocator = Rc::new(RefCell::new(PriorityAllocator::new()));
}

/// Returns the allocator used by `TreapMap::new` on the current thread.
pub fn default_allocator() -> SharedAllocator {
    DEFAULT_ALLOCATOR.with(Rc::clone)
}

enum Source {
    Random { live: HashSet<u64> },
    Pool { unused: Vec<u64> },
}

/// Issues node priorities that are unique among all live nodes drawing from the same allocator.
///
/// The random allocator draws 64-bit values and retries on collision, so the relative order of
/// any two priorities is uniformly random and independent of the keys. The pool allocator hands
/// out a pre-shuffled, bounded range and never recycles a priority.
///
/// Neither allocator ever issues `JOIN_SENTINEL` or `SPLIT_SENTINEL`.
///
/// # Examples
///
/// ```
/// use treap_map::treap::PriorityAllocator;
///
/// let mut allocator = PriorityAllocator::with_seed([1, 2, 3, 4]);
/// let a = allocator.allocate();
/// let b = allocator.allocate();
/// assert_ne!(a, b);
/// assert_eq!(allocator.live(), 2);
///
/// allocator.release(a);
/// assert_eq!(allocator.live(), 1);
/// ```
pub struct PriorityAllocator {
    rng: XorShiftRng,
    source: Source,
}

impl PriorityAllocator {
    /// Constructs a random allocator seeded from the operating system.
    pub fn new() -> Self {
        PriorityAllocator {
            rng: rand::weak_rng(),
            source: Source::Random { live: HashSet::new() },
        }
    }

    /// Constructs a random allocator with a fixed seed.
    ///
    /// # Panics
    ///
    /// Panics if every word of `seed` is zero.
    pub fn with_seed(seed: [u32; 4]) -> Self {
        PriorityAllocator {
            rng: XorShiftRng::from_seed(seed),
            source: Source::Random { live: HashSet::new() },
        }
    }

    /// Constructs an allocator that hands out the priorities `1..=capacity` in a random order.
    /// Once `capacity` priorities have been issued, further allocations panic.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_map::treap::PriorityAllocator;
    ///
    /// let mut allocator = PriorityAllocator::with_pool(2);
    /// let a = allocator.allocate();
    /// let b = allocator.allocate();
    /// assert!(a >= 1 && a <= 2);
    /// assert_eq!(a + b, 3);
    /// ```
    pub fn with_pool(capacity: u64) -> Self {
        assert!(
            capacity < SPLIT_SENTINEL,
            "Error: pool capacity overlaps the split sentinel.",
        );
        let mut rng = rand::weak_rng();
        let mut unused: Vec<u64> = (1..=capacity).collect();
        rng.shuffle(&mut unused);
        PriorityAllocator {
            rng,
            source: Source::Pool { unused },
        }
    }

    /// Constructs a pool allocator holding `DEFAULT_POOL_CAPACITY` priorities.
    pub fn default_pool() -> Self {
        Self::with_pool(DEFAULT_POOL_CAPACITY)
    }

    /// Wraps this allocator so that it can be shared between maps.
    pub fn into_shared(self) -> SharedAllocator {
        Rc::new(RefCell::new(self))
    }

    /// Returns a priority that no live node of this allocator currently holds.
    ///
    /// # Panics
    ///
    /// Panics if the priority space is exhausted.
    pub fn allocate(&mut self) -> u64 {
        let PriorityAllocator { rng, source } = self;
        match source {
            Source::Random { live } => {
                for _ in 0..MAX_DRAW_ATTEMPTS {
                    let priority = rng.next_u64();
                    if priority == JOIN_SENTINEL || priority == SPLIT_SENTINEL {
                        continue;
                    }
                    if live.insert(priority) {
                        return priority;
                    }
                    trace!("priority {} already live, drawing again", priority);
                }
                error!(
                    "no free priority after {} draws with {} live priorities",
                    MAX_DRAW_ATTEMPTS,
                    live.len(),
                );
                panic!("Error: priority space exhausted.");
            }
            Source::Pool { unused } => match unused.pop() {
                Some(priority) => priority,
                None => {
                    error!("priority pool exhausted");
                    panic!("Error: priority pool exhausted.");
                }
            },
        }
    }

    /// Marks a priority as no longer held by a live node. Pool priorities are never reissued.
    pub fn release(&mut self, priority: u64) {
        if let Source::Random { live } = &mut self.source {
            live.remove(&priority);
        }
    }

    /// Returns the number of priorities currently held by live nodes, or `0` for a pool
    /// allocator, which does not track releases.
    pub fn live(&self) -> usize {
        match &self.source {
            Source::Random { live } => live.len(),
            Source::Pool { .. } => 0,
        }
    }

    /// Returns the number of priorities a pool allocator can still issue, or `None` for a random
    /// allocator.
    pub fn remaining(&self) -> Option<usize> {
        match &self.source {
            Source::Random { .. } => None,
            Source::Pool { unused } => Some(unused.len()),
        }
    }
}

impl Default for PriorityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
