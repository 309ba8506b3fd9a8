//! Error codes a device reports with an `E:` reply.
//!
//! The catalog is fixed by the instrument firmware. Codes missing from it
//! are passed through to the caller unchanged.

/// `(code, message)` pairs, ordered by code.
pub const DEVICE_ERRORS: &[(&str, &str)] = &[
    ("000001", "Parity error"),
    ("000002", "Input buffer overflow (too many characters)"),
    ("000003", "Framing error (data length, number of stop bits)"),
    ("000010", "<CR> or <LF> missing"),
    ("000011", ": missing"),
    ("000012", "Invalid number of characters (between : and <CR><LF>)"),
    ("000020", "Unknown command"),
    ("000021", "Unknown command"),
    ("000022", "Invalid value"),
    ("000023", "Invalid value"),
    ("000030", "Value out of range"),
    ("000041", "Command not applicable for hardware configuration"),
    ("000080", "Command not accepted due to local operation"),
    (
        "000082",
        "Command not accepted due to synchronization, CLOSED or OPEN by digital input, safety mode or fatal error",
    ),
];

/// Human-readable message for a device error code.
///
/// Devices terminate the code with `:` (`E:000030:`); the trailing colon
/// and surrounding whitespace are ignored for the lookup.
pub fn describe_device_error(code: &str) -> Option<&'static str> {
    let code = code.trim();
    let code = code.strip_suffix(':').unwrap_or(code);
    DEVICE_ERRORS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, message)| *message)
}
