use log::debug;

use crate::clock::Clock;
use crate::database::models::UserRecord;

/// Whether the expiry timestamp of a record has passed
pub fn is_password_expired(record: &UserRecord, now: i64) -> bool {
    record.password_expiry_date > 0 && record.password_expiry_date < now
}

/// Whether the user has to change the password before continuing.
///
/// True when the forced-change flag is set or the password has expired.
pub fn must_change_password(record: &UserRecord, clock: &dyn Clock) -> bool {
    let result = record.must_change_password || is_password_expired(record, clock.timestamp());
    if result {
        debug!("User {} must change the password", record.uid);
    }
    result
}
