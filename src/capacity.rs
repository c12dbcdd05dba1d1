use crate::config::GrowthCheck;
use crate::config::TableConfig;
use crate::error::GrowError;

/// Load factor above which the table grows unless configured otherwise.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.75;

/// Smallest capacity a table is ever created with.
const MIN_CAPACITY: usize = 2;

/// Candidates below this are tested by trial division, larger ones by
/// Miller-Rabin.
const TRIAL_DIVISION_LIMIT: u64 = 1 << 32;

/// Returns `true` if `n` is prime.
///
/// Trial division up to `sqrt(n)` for `n < 2^32`. Above that a deterministic
/// Miller-Rabin test keeps the prime search cheap when a small load factor
/// asks for a very large table.
///
/// # Examples
///
/// ```rust
/// use chain_hash::capacity::is_prime;
///
/// assert!(is_prime(13));
/// assert!(!is_prime(26));
/// assert!(!is_prime(1));
/// ```
pub fn is_prime(n: usize) -> bool {
    let n = n as u64;
    if n < TRIAL_DIVISION_LIMIT {
        trial_division(n)
    } else {
        miller_rabin(n)
    }
}

fn trial_division(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    let mut i = 3;
    while i <= n / i {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    (a as u128 * b as u128 % m as u128) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut acc = 1;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    acc
}

/// Deterministic for every `n < 3.3 * 10^24`, so for all of `u64`.
fn miller_rabin(n: u64) -> bool {
    const BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

    if n % 2 == 0 {
        return false;
    }
    let s = (n - 1).trailing_zeros();
    let d = (n - 1) >> s;

    'bases: for a in BASES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'bases;
            }
        }
        return false;
    }
    true
}

/// Returns the smallest prime greater than or equal to `n`, or `None` if no
/// such prime fits in a `usize`.
pub fn checked_next_prime(n: usize) -> Option<usize> {
    let mut candidate = n;
    loop {
        if is_prime(candidate) {
            return Some(candidate);
        }
        candidate = candidate.checked_add(1)?;
    }
}

/// Returns the smallest prime greater than or equal to `n`.
///
/// # Panics
///
/// Panics if there is no prime between `n` and `usize::MAX`. Use
/// [`checked_next_prime`] when `n` is not known to be small.
///
/// # Examples
///
/// ```rust
/// use chain_hash::capacity::next_prime;
///
/// assert_eq!(next_prime(13), 13);
/// assert_eq!(next_prime(26), 29);
/// assert_eq!(next_prime(0), 2);
/// ```
pub fn next_prime(n: usize) -> usize {
    match checked_next_prime(n) {
        Some(prime) => prime,
        None => panic!("no prime >= {n} fits in usize"),
    }
}

/// Returns `true` when `count / capacity` exceeds `threshold`.
///
/// The caller picks which count to pass; see [`GrowthCheck`].
pub fn should_grow(count: usize, capacity: usize, threshold: f64) -> bool {
    count as f64 / capacity as f64 > threshold
}

/// Capacity the table grows to from `capacity`: the next prime after doubling.
///
/// Returns `None` if doubling overflows or no larger prime fits in a `usize`.
pub fn grow_target(capacity: usize) -> Option<usize> {
    capacity.checked_mul(2).and_then(checked_next_prime)
}

/// Capacity decisions for a single table, derived from a validated
/// [`TableConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityPolicy {
    initial_capacity: usize,
    max_load_factor: f64,
    growth_check: GrowthCheck,
    max_capacity: Option<usize>,
}

impl CapacityPolicy {
    /// Builds a policy from a configuration that has already passed
    /// [`TableConfig::validate`].
    pub(crate) fn from_validated(config: &TableConfig, initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            max_load_factor: config.max_load_factor,
            growth_check: config.growth_check,
            max_capacity: config.max_capacity,
        }
    }

    /// Rounds a requested capacity up to the prime the table will start with.
    ///
    /// Returns `None` if no prime at or above the request fits in a `usize`.
    pub fn round_initial(requested: usize) -> Option<usize> {
        checked_next_prime(requested.max(MIN_CAPACITY))
    }

    /// The prime capacity a new table starts with.
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// The configured load factor threshold.
    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    /// The configured growth check mode.
    pub fn growth_check(&self) -> GrowthCheck {
        self.growth_check
    }

    /// Whether a table holding `len` records in `capacity` buckets must grow
    /// before accepting another record.
    pub fn needs_growth(&self, len: usize, capacity: usize) -> bool {
        let count = match self.growth_check {
            GrowthCheck::Projected => len.saturating_add(1),
            GrowthCheck::Current => len,
        };
        should_grow(count, capacity, self.max_load_factor)
    }

    /// The capacity one growth step takes `capacity` to.
    pub fn next_capacity(&self, capacity: usize) -> Result<usize, GrowError> {
        let target = grow_target(capacity).ok_or(GrowError::CapacityOverflow { capacity })?;
        match self.max_capacity {
            Some(limit) if target > limit => Err(GrowError::CapacityLimit {
                requested: target,
                limit,
            }),
            _ => Ok(target),
        }
    }

    /// The capacity a table holding `len` records in `capacity` buckets grows
    /// to before accepting another record.
    ///
    /// Applies [`next_capacity`](Self::next_capacity) until the growth check
    /// passes, so a small load factor can skip several primes at once. Fails
    /// as soon as a step overflows or passes the configured maximum.
    pub fn grow_capacity(&self, len: usize, capacity: usize) -> Result<usize, GrowError> {
        let mut target = self.next_capacity(capacity)?;
        while self.needs_growth(len, target) {
            target = self.next_capacity(target)?;
        }
        Ok(target)
    }
}
