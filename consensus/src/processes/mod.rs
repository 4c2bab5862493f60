pub mod difficulty;
pub mod ghostdag;
pub mod past_median_time;
pub mod reachability;
pub mod selected_chain;
pub mod sync;
pub mod window;
