use crate::error::Result;
use crate::model::NoteWindow;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const SETTINGS_FILENAME: &str = "settings.json";

/// State that survives restarts: the Joplin token and the open windows.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default)]
    pub windows: Vec<NoteWindow>,
}

impl Settings {
    pub fn load<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let path = data_dir.as_ref().join(SETTINGS_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Writes to a temporary file first so a crash never leaves half a file.
    pub fn save<P: AsRef<Path>>(&self, data_dir: P) -> Result<()> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;

        let path = data_dir.join(SETTINGS_FILENAME);
        let tmp = data_dir.join(format!("{}.tmp", SETTINGS_FILENAME));
        fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}
