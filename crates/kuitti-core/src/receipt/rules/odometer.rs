//! Odometer reading extraction and self-repair.

use super::patterns::{
    ODOMETER_KM_SUFFIX, ODOMETER_LABELED, ODOMETER_LABEL_BLOCK, ODOMETER_OWN_LINE,
};

/// Extract the raw odometer reading in kilometers.
///
/// Repair of OCR digit insertions happens at reconciliation time, not here;
/// this returns what the paper says.
pub fn extract_odometer(text: &str) -> Option<i64> {
    for pattern in [
        &*ODOMETER_LABEL_BLOCK,
        &*ODOMETER_LABELED,
        &*ODOMETER_OWN_LINE,
        &*ODOMETER_KM_SUFFIX,
    ] {
        if let Some(caps) = pattern.captures(text) {
            if let Ok(km) = caps[1].parse::<i64>() {
                return Some(km);
            }
        }
    }
    None
}

/// Repair a reading that carries one spurious leading digit.
///
/// OCR on dot-matrix receipts occasionally reads a stray mark as an extra
/// leading digit (2387551 for 387551). If the reading exceeds the plausible
/// range for the vehicle, strip one leading digit and accept the result only
/// if it lands inside [min_km, max_km]; otherwise keep the original.
pub fn repair_reading(km: i64, min_km: i64, max_km: i64) -> i64 {
    if km <= max_km {
        return km;
    }
    let digits = km.to_string();
    if digits.len() < 2 {
        return km;
    }
    match digits[1..].parse::<i64>() {
        Ok(stripped) if stripped >= min_km && stripped <= max_km => stripped,
        _ => km,
    }
}
