//! Date normalization for the two shapes the legacy exports use.

/// Parse a legacy date field into ISO `YYYY-MM-DD`.
///
/// Recognized shapes: `DD.MM.YYYY` (zero-padded on output) and
/// `YYYY-MM-DD` with an optional trailing hour component that is
/// discarded. Anything else, including the empty string, is absent
/// rather than an error; blank and placeholder dates are routine in
/// these dumps.
pub fn parse_legacy_date(raw: &str) -> Option<String> {
    let d = raw.trim();
    if d.is_empty() {
        return None;
    }
    if d.contains('.') {
        let parts: Vec<&str> = d.split('.').collect();
        if parts.len() == 3 {
            let (dd, mm, yyyy) = (parts[0], parts[1], parts[2]);
            return Some(format!("{}-{:0>2}-{:0>2}", yyyy, mm, dd));
        }
        return None;
    }
    if d.contains('-') {
        return d.split(' ').next().map(str::to_string);
    }
    None
}

/// Combine the raw date and time fields of a vote-event row into an ISO
/// datetime (`YYYY-MM-DDTHH:MM:00`), or a bare date when no usable time
/// is present.
pub fn vote_start_datetime(date_raw: &str, time_raw: &str) -> Option<String> {
    let d = date_raw.trim();
    let t = time_raw.trim();
    if d.is_empty() {
        return None;
    }
    if d.contains('.') {
        let parts: Vec<&str> = d.split('.').collect();
        if parts.len() != 3 {
            return None;
        }
        let iso = format!("{}-{:0>2}-{:0>2}", parts[2], parts[1], parts[0]);
        if !t.is_empty() && t.contains(':') {
            return Some(format!("{}T{}:00", iso, t));
        }
        return Some(iso);
    }
    None
}

/// Add `years` to an ISO date, clamping Feb 29 to Feb 28 when the
/// target year is not a leap year.
pub fn add_years_clamped(iso: &str, years: i32) -> Option<String> {
    let mut parts = iso.splitn(3, '-');
    let yyyy: i32 = parts.next()?.parse().ok()?;
    let mm: u32 = parts.next()?.parse().ok()?;
    let dd: u32 = parts.next()?.parse().ok()?;
    let target = yyyy + years;
    let dd = if mm == 2 && dd == 29 && !is_leap_year(target) {
        28
    } else {
        dd
    };
    Some(format!("{:04}-{:02}-{:02}", target, mm, dd))
}

fn is_leap_year(y: i32) -> bool {
    (y % 4 == 0 && y % 100 != 0) || y % 400 == 0
}
