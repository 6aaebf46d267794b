//! Unit validators for batch quantities.
//!
//! The batch format only accepts CPU in milli-units (`500m`) and memory in
//! mebibytes (`256Mi`). Anything else is rejected before a request is built.

/// Returns true iff `value` matches `^[0-9]+m$`.
pub fn is_milli_cpu(value: &str) -> bool {
    value
        .strip_suffix('m')
        .is_some_and(all_ascii_digits)
}

/// Returns true iff `value` matches `^[0-9]+Mi$`.
pub fn is_mebibyte_memory(value: &str) -> bool {
    value
        .strip_suffix("Mi")
        .is_some_and(all_ascii_digits)
}

fn all_ascii_digits(digits: &str) -> bool {
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
