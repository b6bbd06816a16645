//! Primary/secondary composition shared by the three curve services.

use std::fmt::Display;

use tracing::warn;

/// Run `primary`; if it fails, log the failure and run `secondary` instead.
///
/// The primary error never reaches the caller. Only the secondary's own
/// failure (if it can fail at all) is returned.
pub fn with_fallback<T, P, S, PE, SE>(label: &str, primary: P, secondary: S) -> Result<T, SE>
where
    P: FnOnce() -> Result<T, PE>,
    S: FnOnce() -> Result<T, SE>,
    PE: Display,
{
    match primary() {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(curve = label, error = %e, "remote computation failed; using local fallback");
            secondary()
        }
    }
}
