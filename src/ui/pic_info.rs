/// Saved picture screen
///
/// Shown once a save has been registered. Offers to open the picture in
/// the system viewer or to share its reference via the clipboard.

use iced::widget::{button, column, container, row, text};
use iced::{Alignment, Element, Length};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::warn;

use crate::state::data::PersistedArtifact;
use crate::Message;

pub fn view(artifact: &PersistedArtifact) -> Element<'_, Message> {
    let uri = artifact
        .external_uri
        .as_ref()
        .map(|uri| uri.to_string())
        .unwrap_or_else(|| "(none)".to_string());

    let actions = row![
        button("Back").on_press(Message::CloseInfo).padding(10),
        button("View").on_press(Message::ViewSaved).padding(10),
        button("Share").on_press(Message::ShareSaved).padding(10),
    ]
    .spacing(10);

    let content = column![
        text("Lolcat saved!").size(32),
        text(format!("File name: {}", artifact.file_path.display())).size(16),
        text(format!("File URI: {}", uri)).size(16),
        actions,
    ]
    .spacing(16)
    .padding(40)
    .align_x(Alignment::Center);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

/// Text put on the clipboard by Share, if there is anything to share
pub fn share_text(artifact: &PersistedArtifact) -> Option<String> {
    artifact.external_uri.as_ref().map(|uri| uri.to_string())
}

/// Open a picture with the platform's default viewer
///
/// Resolves once the opener exits, so the child process is always reaped.
pub async fn open_in_viewer(path: PathBuf) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()));
    }

    let status = viewer_command(&path)
        .status()
        .await
        .map_err(|e| format!("Failed to open image viewer: {}", e))?;

    // explorer.exe reports 1 even when it worked
    if !status.success() {
        warn!("⚠️  Viewer for {} exited with {}", path.display(), status);
    }
    Ok(())
}

fn viewer_command(path: &Path) -> Command {
    #[cfg(target_os = "windows")]
    let mut command = Command::new("explorer");

    #[cfg(target_os = "macos")]
    let mut command = Command::new("open");

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let mut command = Command::new("xdg-open");

    command.arg(path);
    command
}
