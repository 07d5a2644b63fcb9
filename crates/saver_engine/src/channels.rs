use std::collections::BTreeMap;

use crate::{EngineError, Quality};

/// A tracked channel and its recording preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Stable lookup key.
    pub name: String,
    /// Display-only label.
    pub alias: Option<String>,
    pub quality: Quality,
}

impl ChannelConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            quality: Quality::default(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = normalize_alias(Some(alias.into()));
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

pub fn validate_channel_name(name: &str) -> Result<(), EngineError> {
    let valid = !name.is_empty()
        && name.trim() == name
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '\\' | '?' | '#'));
    if valid {
        Ok(())
    } else {
        Err(EngineError::InvalidChannelName(name.to_string()))
    }
}

fn normalize_alias(alias: Option<String>) -> Option<String> {
    alias
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
}

/// In-memory map of tracked channels keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelRegistry {
    channels: BTreeMap<String, ChannelConfig>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, config: ChannelConfig) -> Result<(), EngineError> {
        validate_channel_name(&config.name)?;
        if self.channels.contains_key(&config.name) {
            return Err(EngineError::ChannelExists(config.name));
        }
        let config = ChannelConfig {
            alias: normalize_alias(config.alias),
            ..config
        };
        self.channels.insert(config.name.clone(), config);
        Ok(())
    }

    pub fn update(
        &mut self,
        name: &str,
        alias: Option<String>,
        quality: Quality,
    ) -> Result<(), EngineError> {
        let config = self
            .channels
            .get_mut(name)
            .ok_or_else(|| EngineError::UnknownChannel(name.to_string()))?;
        config.alias = normalize_alias(alias);
        config.quality = quality;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<ChannelConfig, EngineError> {
        self.channels
            .remove(name)
            .ok_or_else(|| EngineError::UnknownChannel(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&ChannelConfig> {
        self.channels.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Snapshot of channel names, safe to iterate while the registry changes.
    pub fn names(&self) -> Vec<String> {
        self.channels.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelConfig> {
        self.channels.values()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
