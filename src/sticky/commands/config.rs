use crate::commands::{CmdMessage, CmdResult, StickyPaths};
use crate::config::StickyConfig;
use crate::error::Result;

/// `sticky config [key [value]]`.
#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

pub fn run(paths: &StickyPaths, action: ConfigAction) -> Result<CmdResult> {
    let config = StickyConfig::load(&paths.data_dir)?;
    match action {
        ConfigAction::ShowAll => Ok(CmdResult::default().with_config(config)),
        ConfigAction::ShowKey(key) => Ok(single(match config.get(&key) {
            Some(value) => CmdMessage::info(value),
            None => CmdMessage::error(format!("Unknown config key: {}", key)),
        })),
        ConfigAction::Set(key, value) => update(paths, config, &key, &value),
    }
}

/// A rejected value leaves `config.json` untouched.
fn update(
    paths: &StickyPaths,
    mut config: StickyConfig,
    key: &str,
    value: &str,
) -> Result<CmdResult> {
    if let Err(e) = config.set(key, value) {
        return Ok(single(CmdMessage::error(format!("Couldn't set {}: {}", key, e))));
    }
    config.save(&paths.data_dir)?;

    // values are normalized on the way in, e.g. a trailing slash on api-url
    let stored = config.get(key).unwrap_or_else(|| value.to_string());
    let mut result = CmdResult::default().with_config(config);
    result.add_message(CmdMessage::success(format!("Saved {} = {}", key, stored)));
    Ok(result)
}

fn single(message: CmdMessage) -> CmdResult {
    let mut result = CmdResult::default();
    result.add_message(message);
    result
}
