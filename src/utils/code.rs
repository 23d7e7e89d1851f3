use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

pub const ROOM_CODE_LENGTH: usize = 6;

/// Uppercase letters and digits without the look-alikes I, O, 0 and 1.
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

static ROOM_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-HJ-NP-Z2-9]{6}$").expect("room code pattern is valid")
});

pub fn generate_room_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Uppercases and trims user input; `None` if it cannot be a room code.
pub fn normalize_room_code(input: &str) -> Option<String> {
    let code = input.trim().to_uppercase();
    ROOM_CODE_RE.is_match(&code).then_some(code)
}
