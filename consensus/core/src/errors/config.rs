use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration: ghostdag k must be positive")]
    ZeroGhostdagK,

    #[error("Configuration: difficulty window size must be positive")]
    ZeroDifficultyWindow,

    #[error("Configuration: target time per block must be positive")]
    ZeroTargetTimePerBlock,

    #[error("Configuration: finality interval must be positive")]
    ZeroFinalityInterval,

    #[error("Configuration: past median time window size {0} must be odd")]
    EvenPastMedianTimeWindow(usize),

    #[error("Configuration: max block parents must be positive")]
    ZeroMaxBlockParents,

    #[error("Configuration: max difficulty bits {0:#010x} do not encode the max difficulty target (expected {1:#010x})")]
    MismatchedMaxDifficultyBits(u32, u32),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
