use game_types::{GameError, Statement};

pub const MAX_STATEMENT_TEXT: usize = 200;
pub const MAX_STATEMENT_DESCRIPTION: usize = 1000;

/// Reject malformed statements before any mutation happens.
pub fn validate_statement(label: &str, statement: &Statement) -> Result<(), GameError> {
    if statement.text.trim().is_empty() {
        return Err(GameError::validation(format!(
            "{} statement text must not be empty",
            label
        )));
    }
    if statement.text.chars().count() > MAX_STATEMENT_TEXT {
        return Err(GameError::validation(format!(
            "{} statement text must be at most {} characters",
            label, MAX_STATEMENT_TEXT
        )));
    }
    if let Some(description) = &statement.description {
        if description.chars().count() > MAX_STATEMENT_DESCRIPTION {
            return Err(GameError::validation(format!(
                "{} statement description must be at most {} characters",
                label, MAX_STATEMENT_DESCRIPTION
            )));
        }
    }
    Ok(())
}

pub fn validate_statements(
    truth1: &Statement,
    truth2: &Statement,
    lie: &Statement,
) -> Result<(), GameError> {
    validate_statement("First truth", truth1)?;
    validate_statement("Second truth", truth2)?;
    validate_statement("Lie", lie)?;
    Ok(())
}

pub fn validate_guess_index(guess_index: u8) -> Result<(), GameError> {
    if guess_index > 2 {
        return Err(GameError::validation(format!(
            "Guess index must be 0, 1 or 2, got {}",
            guess_index
        )));
    }
    Ok(())
}
