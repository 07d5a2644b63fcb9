use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelInputError {
    #[error("channel name is empty")]
    Empty,
    #[error("not a channel handle or channel url: {0}")]
    Unrecognized(String),
}

/// Accepts `name`, `@name`, or a channel page url such as
/// `https://www.youtube.com/@name/live` and returns the bare handle.
pub fn parse_channel_input(input: &str) -> Result<String, ChannelInputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ChannelInputError::Empty);
    }

    if looks_like_url(trimmed) {
        return handle_from_url(trimmed)
            .ok_or_else(|| ChannelInputError::Unrecognized(trimmed.to_string()));
    }

    let handle = trimmed.strip_prefix('@').unwrap_or(trimmed);
    if is_valid_handle(handle) {
        Ok(handle.to_string())
    } else {
        Err(ChannelInputError::Unrecognized(trimmed.to_string()))
    }
}

fn looks_like_url(input: &str) -> bool {
    input.contains("://") || input.contains('/')
}

fn handle_from_url(input: &str) -> Option<String> {
    let parsed = Url::parse(input)
        .or_else(|_| Url::parse(&format!("https://{input}")))
        .ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    if host != "youtube.com" && !host.ends_with(".youtube.com") {
        return None;
    }
    let first = parsed.path_segments()?.next()?;
    let handle = first.strip_prefix('@')?;
    is_valid_handle(handle).then(|| handle.to_string())
}

fn is_valid_handle(handle: &str) -> bool {
    !handle.is_empty()
        && handle
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
