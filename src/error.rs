// Wand — Error Types

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WandError {
    /// Build-time sizing defect: the base advertising data leaves no room for
    /// the gesture payload in either buffer.
    #[error(
        "manufacturer data ({needed} bytes) fits neither advertising data \
         ({adv_len}/{adv_max} used) nor scan response ({scan_rsp_len}/{scan_rsp_max} used)"
    )]
    ManufacturerDataDoesNotFit {
        needed: usize,
        adv_len: usize,
        adv_max: usize,
        scan_rsp_len: usize,
        scan_rsp_max: usize,
    },

    #[error("timer queue full ({capacity} pending timers)")]
    TimerQueueFull { capacity: usize },
}

pub type WandResult<T> = Result<T, WandError>;
