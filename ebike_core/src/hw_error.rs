//! Maps `Box<dyn Error>` from trait boundaries to typed `AssistError`.
//!
//! The traits in `ebike_traits` return `Box<dyn Error + Send + Sync>`; with the
//! `hardware-errors` feature the concrete `ebike_hardware::error::HwError` is recognised
//! and mapped precisely.

use crate::error::AssistError;

/// Map a trait-boundary error to a typed `AssistError`.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> AssistError {
    #[cfg(feature = "hardware-errors")]
    {
        use ebike_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => AssistError::Timeout,
                other => AssistError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        AssistError::Timeout
    } else {
        AssistError::Hardware(s)
    }
}
