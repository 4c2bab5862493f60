pub mod consensus {
    //!
    //! A module for constants which directly impact consensus.
    //!

    use crate::KType;
    use blockdag_math::Uint256;

    /// The only header version currently accepted
    pub const BLOCK_VERSION: u16 = 1;

    //
    // ~~~~~~~~~~~~~~~~~~~~~~~~~ Ghostdag ~~~~~~~~~~~~~~~~~~~~~~~~~
    //

    /// Default K for 1 BPS networks
    pub const DEFAULT_GHOSTDAG_K: KType = 18;

    //
    // ~~~~~~~~~~~~~~~~~~ Timestamp deviation & Median time ~~~~~~~~~~~~~~~~~~
    //

    /// Timestamp deviation tolerance, expressed in block time units
    pub const TIMESTAMP_DEVIATION_TOLERANCE: u64 = 132;

    /// Number of selected-chain timestamps used for the past median time. Must be odd
    pub const PAST_MEDIAN_TIME_WINDOW_SIZE: usize = 2 * TIMESTAMP_DEVIATION_TOLERANCE as usize - 1;

    //
    // ~~~~~~~~~~~~~~~~~~~~~~~~~ Max difficulty target ~~~~~~~~~~~~~~~~~~~~~~~~~
    //

    /// Highest proof of work difficulty target a block can have for all networks.
    /// This value is: 2^255 - 1.
    pub const MAX_DIFFICULTY_TARGET: Uint256 =
        Uint256([18446744073709551615, 18446744073709551615, 18446744073709551615, 9223372036854775807]);

    /// Compact form of [`MAX_DIFFICULTY_TARGET`]
    pub const MAX_DIFFICULTY_BITS: u32 = 0x207fffff;

    //
    // ~~~~~~~~~~~~~~~~~~~ Difficulty Adjustment Algorithm (DAA) ~~~~~~~~~~~~~~~~~~~
    //

    /// Difficulty adjustment window size corresponding to ~46 minutes with 1 BPS
    pub const DEFAULT_DIFFICULTY_WINDOW_SIZE: usize = 2641;

    /// Target time per block (in seconds)
    pub const DEFAULT_TARGET_TIME_PER_BLOCK: u64 = 1;

    //
    // ~~~~~~~~~~~~~~~~~~~ Finality & Parents ~~~~~~~~~~~~~~~~~~~
    //

    /// ~1 day worth of blocks at 1 BPS
    pub const DEFAULT_FINALITY_INTERVAL: u64 = 86400;

    pub const DEFAULT_MAX_BLOCK_PARENTS: u8 = 10;
}

pub mod perf {
    //!
    //! A module for performance critical constants which depend on consensus parameters.
    //! The constants in this module should all be revisited if mainnet consensus parameters change.
    //!

    /// The default target depth for reachability reindexes.
    pub const DEFAULT_REINDEX_DEPTH: u64 = 100;

    /// The default slack interval used by the reachability
    /// algorithm to encounter for blocks out of the selected chain.
    pub const DEFAULT_REINDEX_SLACK: u64 = 1 << 12;

    #[derive(Clone, Debug)]
    pub struct PerfParams {
        /// Depth below the virtual selected tip at which the reachability reindex root is kept
        pub reindex_depth: u64,

        /// Interval slack reserved for each chain block when the reindex root advances
        pub reindex_slack: u64,

        /// Preferred cache size for persisted block node records. Zero means reads always hit the db
        pub block_nodes_cache_size: u64,
    }

    pub const PERF_PARAMS: PerfParams =
        PerfParams { reindex_depth: DEFAULT_REINDEX_DEPTH, reindex_slack: DEFAULT_REINDEX_SLACK, block_nodes_cache_size: 0 };
}
