/// Configuration for a shelf adapter
#[derive(Debug, Clone)]
pub struct ShelfConfig {
    /// Storage capacity reported in usage summaries
    pub capacity_bytes: u64,

    /// Default cap applied to list queries that set no explicit limit.
    /// `None` leaves the cap to the underlying store.
    pub default_list_limit: Option<usize>,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: crate::usage::DEFAULT_CAPACITY_BYTES,
            default_list_limit: None,
        }
    }
}

impl ShelfConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reported storage capacity
    pub fn with_capacity_bytes(mut self, bytes: u64) -> Self {
        self.capacity_bytes = bytes;
        self
    }

    /// Set a default list limit
    pub fn with_default_list_limit(mut self, limit: usize) -> Self {
        self.default_list_limit = Some(limit);
        self
    }
}
