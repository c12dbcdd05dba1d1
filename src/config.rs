use crate::capacity::DEFAULT_MAX_LOAD_FACTOR;
use crate::error::ConfigError;

/// Capacity a table starts with when none is requested.
pub const DEFAULT_CAPACITY: usize = 17;

/// Which record count the growth check compares against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrowthCheck {
    /// Grow when the table would exceed the threshold after the pending
    /// insert. The load factor never exceeds the threshold once an insert
    /// completes.
    #[default]
    Projected,
    /// Grow when the table already exceeds the threshold before the pending
    /// insert. A table can sit one record above the threshold until the next
    /// insert grows it.
    Current,
}

/// Construction-time settings for a [`HashTable`](crate::HashTable).
///
/// # Examples
///
/// ```rust
/// use chain_hash::GrowthCheck;
/// use chain_hash::TableConfig;
///
/// let config = TableConfig::default()
///     .initial_capacity(13)
///     .max_load_factor(0.5)
///     .growth_check(GrowthCheck::Current);
/// assert!(config.validate().is_ok());
///
/// assert!(TableConfig::default().max_load_factor(0.0).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    pub(crate) initial_capacity: usize,
    pub(crate) max_load_factor: f64,
    pub(crate) growth_check: GrowthCheck,
    pub(crate) max_capacity: Option<usize>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            growth_check: GrowthCheck::default(),
            max_capacity: None,
        }
    }
}

impl TableConfig {
    /// Requested starting capacity, rounded up to a prime on construction.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Load factor threshold that triggers a rehash.
    pub fn max_load_factor(mut self, max_load_factor: f64) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    /// See [`GrowthCheck`].
    pub fn growth_check(mut self, growth_check: GrowthCheck) -> Self {
        self.growth_check = growth_check;
        self
    }

    /// Upper bound on the number of buckets. Inserts that would need to grow
    /// past it fail with
    /// [`GrowError::CapacityLimit`](crate::GrowError::CapacityLimit).
    pub fn max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = Some(max_capacity);
        self
    }

    /// Checks that the settings describe a usable table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_load_factor.is_finite() || self.max_load_factor <= 0.0 {
            return Err(ConfigError::InvalidLoadFactor(self.max_load_factor));
        }

        if let Some(limit) = self.max_capacity {
            if limit == 0 {
                return Err(ConfigError::ZeroMaxCapacity);
            }
            if self.initial_capacity > limit {
                return Err(ConfigError::InitialExceedsMax {
                    initial: self.initial_capacity,
                    limit,
                });
            }
        }

        Ok(())
    }
}
