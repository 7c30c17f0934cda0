//! Desktop notifications for alerts.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::monitor::alert::AlertEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    Critical,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopNotification {
    pub title: String,
    pub body: String,
    pub urgency: Urgency,
}

impl DesktopNotification {
    pub fn from_alert(event: &AlertEvent, urgency: Urgency) -> Self {
        Self {
            title: event.title(),
            body: event.body(),
            urgency,
        }
    }
}

/// Fire-and-forget notification delivery.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: DesktopNotification);
}

/// Delivers through the OS notification service.
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, notification: DesktopNotification) {
        let app_name = self.app_name.clone();
        tokio::spawn(async move {
            if let Err(e) = send_notification(&app_name, &notification).await {
                tracing::warn!(title = %notification.title, "failed to show notification: {:#}", e);
            }
        });
    }
}

/// Show a notification and wait for the OS command to finish.
pub async fn send_notification(app_name: &str, notification: &DesktopNotification) -> Result<()> {
    let mut command = notification_command(app_name, notification)?;
    let output = command.output().await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("notification command failed: {}", stderr.trim());
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn notification_command(_app_name: &str, notification: &DesktopNotification) -> Result<Command> {
    let script = format!(
        r#"display notification "{}" with title "{}""#,
        escape_applescript(&notification.body),
        escape_applescript(&notification.title)
    );
    let mut command = Command::new("osascript");
    command.arg("-e").arg(script);
    Ok(command)
}

#[cfg(target_os = "linux")]
fn notification_command(app_name: &str, notification: &DesktopNotification) -> Result<Command> {
    let mut command = Command::new("notify-send");
    command
        .arg("--app-name")
        .arg(app_name)
        .arg("--urgency")
        .arg(notification.urgency.as_str())
        .arg(&notification.title)
        .arg(&notification.body);
    Ok(command)
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn notification_command(_app_name: &str, _notification: &DesktopNotification) -> Result<Command> {
    anyhow::bail!("desktop notifications are not supported on this platform")
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
