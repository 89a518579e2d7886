//! Command-line front end
//!
//! Drives a [`ConnectionController`](crate::connect::ConnectionController)
//! from the terminal against the wallets described in the registry file.

pub mod commands;

/// Keep the first `head` and last `tail` characters of `s`
///
/// Strings that would not get shorter are returned unchanged.
pub fn truncate_middle(s: &str, head: usize, tail: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= head + tail + 1 {
        return s.to_string();
    }

    let start: String = chars[..head].iter().collect();
    let end: String = chars[chars.len() - tail..].iter().collect();
    format!("{}…{}", start, end)
}

/// Address as shown in account lists
pub fn short_address(address: &str) -> String {
    truncate_middle(address, 8, 4)
}
