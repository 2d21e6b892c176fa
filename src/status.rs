//! Access-point liveness query.

use crate::settings::Settings;

/// True iff the hostapd pid file exists.
///
/// A marker file left behind by an unclean shutdown yields a false positive;
/// there is no staleness check.
pub fn is_access_point_active(settings: &Settings) -> bool {
    settings.hostapd_pid_path.is_file()
}
