//! Identifier and size validation for command declarations and GUI construction.
//!
//! Everything here runs at configuration time so mistakes fail fast instead of
//! surfacing on the first invocation.

/// Validation errors with messages suitable for configuration diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("command name is empty")]
    EmptyName,

    #[error("command name is too long (maximum {max} characters)")]
    NameTooLong { max: usize },

    #[error("command name contains invalid characters: {chars}")]
    InvalidNameCharacters { chars: String },

    #[error("permission node '{node}' is malformed: {reason}")]
    InvalidPermissionNode { node: String, reason: String },

    #[error("container size {size} is invalid: {reason}")]
    InvalidContainerSize { size: usize, reason: String },
}

/// Slots in one container row.
pub const ROW_SIZE: usize = 9;
/// Largest container (six rows).
pub const MAX_ROWS: usize = 6;
const MAX_NAME_LEN: usize = 32;

/// Validate and normalise (lowercase) a command name or alias.
///
/// Allowed: ASCII letters, digits, `-` and `_`.
pub fn validate_command_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong { max: MAX_NAME_LEN });
    }
    let bad: String = trimmed
        .chars()
        .filter(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        .collect();
    if !bad.is_empty() {
        return Err(ValidationError::InvalidNameCharacters { chars: bad });
    }
    Ok(trimmed.to_ascii_lowercase())
}

/// Validate a dotted permission node such as `kit.menu.open` or `kit.admin.*`.
pub fn validate_permission_node(node: &str) -> Result<(), ValidationError> {
    let fail = |reason: &str| ValidationError::InvalidPermissionNode {
        node: node.to_string(),
        reason: reason.to_string(),
    };
    if node.is_empty() {
        return Err(fail("empty"));
    }
    let segments: Vec<&str> = node.split('.').collect();
    let last = segments.len() - 1;
    for (i, seg) in segments.iter().enumerate() {
        if seg.is_empty() {
            return Err(fail("empty segment"));
        }
        if *seg == "*" {
            if i != last {
                return Err(fail("wildcard must be the final segment"));
            }
            continue;
        }
        if !seg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(fail("segments may only contain letters, digits, '-' and '_'"));
        }
    }
    Ok(())
}

/// Chest-style containers: whole rows, one to six of them.
pub fn validate_chest_size(size: usize) -> Result<(), ValidationError> {
    if size == 0 || size % ROW_SIZE != 0 || size > ROW_SIZE * MAX_ROWS {
        return Err(ValidationError::InvalidContainerSize {
            size,
            reason: format!("must be a multiple of {} up to {}", ROW_SIZE, ROW_SIZE * MAX_ROWS),
        });
    }
    Ok(())
}

/// Paginated containers need at least one content row above the control row.
pub fn validate_paged_size(size: usize) -> Result<(), ValidationError> {
    validate_chest_size(size)?;
    if size < ROW_SIZE * 2 {
        return Err(ValidationError::InvalidContainerSize {
            size,
            reason: "paginated GUIs need at least two rows".to_string(),
        });
    }
    Ok(())
}
