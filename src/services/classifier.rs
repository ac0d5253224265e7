//! Email status classification from cell background color
//!
//! The sheet producer marks emails by painting the cell:
//! - pure red (only the red channel set) → invalid
//! - yellow (red and green set, no blue) → catch-all
//! - anything else, including no fill → valid

use crate::types::{CellColor, EmailStatus};

/// Classify an email cell by its background color
pub fn classify(color: Option<CellColor>) -> EmailStatus {
    let Some(color) = color else {
        return EmailStatus::Valid;
    };

    let red = is_set(color.red);
    let green = is_set(color.green);
    let blue = is_set(color.blue);

    if red && !green && !blue {
        EmailStatus::Invalid
    } else if red && green && !blue {
        EmailStatus::CatchAll
    } else {
        EmailStatus::Valid
    }
}

fn is_set(channel: f64) -> bool {
    channel != 0.0 && !channel.is_nan()
}
