/// Product identity shared across crates
pub const PRODUCT_NAME: &str = "kairos";
pub const PRODUCT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `PRODID` written into calendars produced by this workspace.
pub const PRODID: &str = const_str::concat!("-//", PRODUCT_NAME, "//", PRODUCT_VERSION, "//EN");

/// iCalendar `VERSION` value.
pub const ICALENDAR_VERSION: &str = "2.0";
