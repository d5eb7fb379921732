use uuid::Uuid;

use crate::game::GameError;

pub const MAX_PLAYER_NAME_LEN: usize = 20;

/// Two pet-name words run together and upper-cased, e.g. `HAPPYOTTER`
pub fn generate_room_code() -> String {
    petname::Petnames::default()
        .generate_one(2, "")
        .to_uppercase()
}

pub fn generate_player_id() -> String {
    Uuid::new_v4().to_string()
}

/// Room codes are matched case-insensitively
pub fn normalize_room_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Trims the name and checks it is 1 to 20 characters long
pub fn validate_player_name(name: &str) -> Result<String, GameError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_PLAYER_NAME_LEN {
        return Err(GameError::InvalidPlayerName);
    }
    Ok(trimmed.to_string())
}
