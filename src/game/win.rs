use crate::collab::{check_syntax, SyntaxError};
use crate::room::{KnownBug, Room, RoundArtifact, Winner};

pub const SABOTEUR_VOTED_OUT: &str = "Saboteur was voted out";
pub const FIXERS_ELIMINATED: &str = "All fixers eliminated or only 2 players remain";
pub const SABOTEUR_LEFT: &str = "Saboteur left the game";

/// Saboteur is still in play and the fixers can no longer out-vote them:
/// every fixer is disabled, or only the saboteur and one other player remain.
pub fn saboteur_wins(room: &Room) -> bool {
    let Some(saboteur) = room.saboteur_id.as_deref().and_then(|id| room.player(id)) else {
        return false;
    };
    if saboteur.disabled {
        return false;
    }

    let enabled_fixers = room
        .fixer_ids
        .iter()
        .filter(|id| room.player(id).is_some_and(|p| !p.disabled))
        .count();

    enabled_fixers == 0 || room.enabled_count() == 2
}

/// Saboteur has been disabled or is no longer in the room
pub fn fixers_win(room: &Room) -> bool {
    match room.saboteur_id.as_deref() {
        Some(id) => room.player(id).map_or(true, |p| p.disabled),
        None => false,
    }
}

/// Result of inspecting a round's final code
#[derive(Debug, Clone, PartialEq)]
pub enum CodeVerdict {
    Clean,
    ResidualBug(KnownBug),
    SyntaxError(SyntaxError),
}

impl CodeVerdict {
    pub fn is_clean(&self) -> bool {
        matches!(self, CodeVerdict::Clean)
    }

    pub fn winner(&self) -> Winner {
        if self.is_clean() {
            Winner::Fixers
        } else {
            Winner::Saboteur
        }
    }

    pub fn reason(&self) -> String {
        match self {
            CodeVerdict::Clean => "All bugs fixed".to_string(),
            CodeVerdict::ResidualBug(bug) => format!("Bug survived: {}", bug.description),
            CodeVerdict::SyntaxError(err) => format!("Code has a syntax error: {err}"),
        }
    }
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Checks the final text for any known bug signature, then for syntax
/// errors. Whitespace is ignored when matching signatures.
pub fn inspect_code(artifact: &RoundArtifact, final_text: &str) -> CodeVerdict {
    let compact = strip_whitespace(final_text);
    if let Some(bug) = artifact
        .known_bugs
        .iter()
        .find(|bug| compact.contains(&strip_whitespace(&bug.signature)))
    {
        return CodeVerdict::ResidualBug(bug.clone());
    }

    match check_syntax(final_text) {
        Ok(()) => CodeVerdict::Clean,
        Err(err) => CodeVerdict::SyntaxError(err),
    }
}
