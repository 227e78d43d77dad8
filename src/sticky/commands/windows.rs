use crate::commands::note::NoteView;
use crate::commands::{CmdMessage, CmdResult, StickyPaths};
use crate::error::{Result, StickyError};
use crate::model::NoteWindow;
use crate::settings::Settings;

/// How far a clone is shifted from its original.
const CLONE_OFFSET: i32 = 20;

/// Window operations, addressed by 1-based index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowAction {
    List,
    New,
    Clone(usize),
    Close(usize),
    CloseAll,
    ToggleBody(usize),
    /// `None` hides every window.
    Hide(Option<usize>),
    /// `None` shows every window.
    Show(Option<usize>),
}

/// Applies one action to the persisted windows and saves them.
pub fn run(paths: &StickyPaths, action: WindowAction) -> Result<CmdResult> {
    let mut settings = Settings::load(&paths.data_dir)?;
    let mut result = CmdResult::default();

    let message = match action {
        WindowAction::List => None,
        WindowAction::New => Some(format!("Opened window {}", new_window(&mut settings))),
        WindowAction::Clone(index) => {
            let clone = clone_window(&mut settings, index)?;
            Some(format!("Cloned window {} as {}", index, clone))
        }
        WindowAction::Close(index) => {
            let closed = close_window(&mut settings, index)?;
            Some(format!("Closed window {} ({})", index, closed.title))
        }
        WindowAction::CloseAll => Some(format!("Closed {} windows", close_all(&mut settings))),
        WindowAction::ToggleBody(index) => {
            let shown = toggle_body(&mut settings, index)?;
            let state = if shown { "shown" } else { "collapsed" };
            Some(format!("Window {} body {}", index, state))
        }
        WindowAction::Hide(Some(index)) => {
            set_visible(&mut settings, index, false)?;
            Some(format!("Hid window {}", index))
        }
        WindowAction::Hide(None) => Some(format!(
            "Hid {} windows",
            set_all_visible(&mut settings, false)
        )),
        WindowAction::Show(Some(index)) => {
            set_visible(&mut settings, index, true)?;
            Some(format!("Showing window {}", index))
        }
        WindowAction::Show(None) => Some(format!(
            "Showing {} windows",
            set_all_visible(&mut settings, true)
        )),
    };

    if let Some(message) = message {
        settings.save(&paths.data_dir)?;
        result.add_message(CmdMessage::success(message));
    }
    Ok(result.with_windows(settings.windows))
}

fn slot(index: usize, len: usize) -> Result<usize> {
    if index == 0 || index > len {
        return Err(StickyError::Api(format!(
            "Window {} does not exist ({} open)",
            index, len
        )));
    }
    Ok(index - 1)
}

/// Window at a 1-based index.
pub fn get(settings: &Settings, index: usize) -> Result<&NoteWindow> {
    let i = slot(index, settings.windows.len())?;
    Ok(&settings.windows[i])
}

fn get_mut(settings: &mut Settings, index: usize) -> Result<&mut NoteWindow> {
    let i = slot(index, settings.windows.len())?;
    Ok(&mut settings.windows[i])
}

/// Opens a blank window and returns its index.
pub fn new_window(settings: &mut Settings) -> usize {
    settings.windows.push(NoteWindow::default());
    settings.windows.len()
}

/// Duplicates a window, shifted down and right so both stay visible.
pub fn clone_window(settings: &mut Settings, index: usize) -> Result<usize> {
    let original = get(settings, index)?;
    let clone = NoteWindow {
        geometry: original.geometry.offset(CLONE_OFFSET, CLONE_OFFSET),
        visible: true,
        ..original.clone()
    };
    settings.windows.push(clone);
    Ok(settings.windows.len())
}

pub fn close_window(settings: &mut Settings, index: usize) -> Result<NoteWindow> {
    let i = slot(index, settings.windows.len())?;
    Ok(settings.windows.remove(i))
}

pub fn close_all(settings: &mut Settings) -> usize {
    let closed = settings.windows.len();
    settings.windows.clear();
    closed
}

/// Collapses a window to its title bar, or restores the height it had.
/// Returns whether the body is now visible.
pub fn toggle_body(settings: &mut Settings, index: usize) -> Result<bool> {
    let window = get_mut(settings, index)?;
    if window.body_visible {
        window.height_before = window.geometry.height;
        window.geometry.height = 0;
        window.body_visible = false;
    } else {
        window.geometry.height = window.height_before;
        window.body_visible = true;
    }
    Ok(window.body_visible)
}

pub fn set_visible(settings: &mut Settings, index: usize, visible: bool) -> Result<()> {
    get_mut(settings, index)?.visible = visible;
    Ok(())
}

/// Shows or hides every window; returns how many changed.
pub fn set_all_visible(settings: &mut Settings, visible: bool) -> usize {
    let mut changed = 0;
    for window in settings.windows.iter_mut().filter(|w| w.visible != visible) {
        window.visible = visible;
        changed += 1;
    }
    changed
}

/// Points a window at a note and caches its rendered content.
pub fn bind_note(settings: &mut Settings, index: usize, view: &NoteView) -> Result<()> {
    let window = get_mut(settings, index)?;
    window.note_id = Some(view.id.clone());
    window.title = view.title.clone();
    window.content = view.html.clone();
    Ok(())
}
