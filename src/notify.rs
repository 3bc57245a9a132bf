//! Completion notices shown to the user.

use serde::Serialize;
use uuid::Uuid;

/// Title of the OS-level notification raised on success.
pub const COMPLETE_TITLE: &str = "Download Complete!";

/// A desktop notification for the browser to raise.
///
/// The id is the job id, so a page never shows the same notification twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub body: String,
}

impl Notification {
    /// Builds the notification for a finished job.
    #[must_use]
    pub fn download_complete(job_id: Uuid, output_folder: &str) -> Self {
        Self {
            id: job_id,
            title: COMPLETE_TITLE.to_string(),
            body: format!("Check the '{output_folder}' folder."),
        }
    }
}

/// In-page toast text for a finished job.
#[must_use]
pub fn toast_text(output_folder: &str) -> String {
    format!("Download complete! Check the '{output_folder}' folder.")
}
