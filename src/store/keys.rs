//! Key namespace for rooms and their messages
//!
//! ```text
//! room:<room_id>:meta
//! room:<room_id>:message:<message_id>
//! ```

const ROOM_PREFIX: &str = "room:";
const META_SUFFIX: &str = ":meta";
const MESSAGE_SEGMENT: &str = ":message:";

pub fn room_meta_key(room_id: &str) -> String {
    format!("{ROOM_PREFIX}{room_id}{META_SUFFIX}")
}

pub fn room_message_key(room_id: &str, message_id: &str) -> String {
    format!("{ROOM_PREFIX}{room_id}{MESSAGE_SEGMENT}{message_id}")
}

/// Glob matching every message key of one room
pub fn room_message_pattern(room_id: &str) -> String {
    format!("{ROOM_PREFIX}{room_id}{MESSAGE_SEGMENT}*")
}

/// Recovers `(room_id, message_id)` from a message key.
///
/// Anything outside the room message namespace yields `None`, including
/// room metadata keys and bare `message:<id>` keys.
pub fn parse_room_message_key(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_prefix(ROOM_PREFIX)?;
    let (room_id, message_id) = rest.split_once(MESSAGE_SEGMENT)?;

    if room_id.is_empty() || message_id.is_empty() || room_id.contains(':') {
        return None;
    }

    Some((room_id, message_id))
}

/// Minimal glob matcher supporting `*` only, as used by [`room_message_pattern`]
pub(crate) fn glob_matches(pattern: &str, candidate: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = candidate.strip_prefix(first) else {
        return false;
    };

    let remaining: Vec<&str> = parts.collect();
    let Some((last, middle)) = remaining.split_last() else {
        // no wildcard at all
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(index) => rest = &rest[index + part.len()..],
            None => return false,
        }
    }

    rest.ends_with(last)
}
