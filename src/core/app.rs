//! Main application orchestrator

use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::Stdout;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{ConfigWatcher, NotificationsConfig};
use crate::core::events::{Event, EventHandler, EventResult, KeyBindings};
use crate::core::state::{AppMode, AppState, NotificationLevel, StateStore};
use crate::monitor::alert::AlertEvent;
use crate::monitor::sampler::{SampleBatch, Sampler};
use crate::monitor::MetricsMonitor;
use crate::notify::{DesktopNotification, Notifier};
use crate::ui::renderer::Renderer;
use crate::ui::theme::Theme;

/// Owns all monitor state and reacts to events.
///
/// Only the event loop touches this, so samples are applied and alerts
/// evaluated strictly one tick at a time.
pub struct Controller {
    state: StateStore,
    monitor: MetricsMonitor,
    config: ConfigWatcher,
    sampler: Sampler,
    notifier: Arc<dyn Notifier>,
}

impl Controller {
    pub fn new(config: ConfigWatcher, sampler: Sampler, notifier: Arc<dyn Notifier>) -> Self {
        let current = config.current();
        let mut initial = AppState::new(Theme::from_name(&current.display.theme));
        initial.alerts_enabled = current.alerts.enabled;
        initial.desktop_notifications = current.notifications.desktop;

        let monitor = MetricsMonitor::new(
            current.sampling.primary_interval(),
            current.sampling.disk_interval(),
        );

        Self {
            state: StateStore::new(initial),
            monitor,
            config,
            sampler,
            notifier,
        }
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn handle_event(&mut self, event: Event) -> EventResult {
        match event {
            Event::Key(key) => self.handle_key(key),
            // layout is recomputed from the frame on the next draw
            Event::Resize => EventResult::Continue,
            Event::Tick => {
                self.state.update(|s| s.remove_expired_notifications());
                EventResult::Continue
            }
            Event::Sample(batch) => {
                self.handle_sample(batch, Instant::now());
                EventResult::Continue
            }
        }
    }

    pub fn handle_sample(&mut self, batch: SampleBatch, now: Instant) {
        match batch {
            SampleBatch::Primary(sample) => {
                let collapsed = sample.collapsed;
                self.monitor.apply_primary(*sample);
                if !collapsed {
                    self.run_alert_pass(now);
                }
            }
            SampleBatch::Disk(sample) => self.monitor.apply_disk(*sample),
        }

        let monitor = &self.monitor;
        self.state.update(|s| s.metrics.sync(monitor, now));
    }

    /// One alert evaluation against the freshest configuration.
    ///
    /// A configuration that cannot be read skips the pass entirely and
    /// leaves every alert state as it was.
    fn run_alert_pass(&mut self, now: Instant) {
        let config = match self.config.refresh() {
            Ok(config) => config.clone(),
            Err(e) => {
                tracing::warn!("skipping alert check, config unreadable: {:#}", e);
                return;
            }
        };

        self.state.update(|s| {
            s.alerts_enabled = config.alerts.enabled;
            s.desktop_notifications = config.notifications.desktop;
        });

        let events = self
            .monitor
            .evaluate_alerts(&config.alerts.to_alert_config(), now);
        for event in events {
            self.dispatch_alert(&event, &config.notifications);
        }
    }

    fn dispatch_alert(&self, event: &AlertEvent, settings: &NotificationsConfig) {
        let message = format!("{}: {}", event.title(), event.body());
        self.state.update(|s| s.add_notification(message, NotificationLevel::Warning));

        if settings.desktop {
            self.notifier
                .notify(DesktopNotification::from_alert(event, settings.urgency));
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> EventResult {
        if KeyBindings::quit().matches(&key) || KeyBindings::quit_alt().matches(&key) {
            return EventResult::Quit;
        }

        let mode = self.state.read().mode;
        match mode {
            AppMode::Dashboard => self.handle_dashboard_key(key),
            AppMode::Help => self.handle_help_key(key),
        }
        EventResult::Continue
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) {
        if KeyBindings::help().matches(&key) {
            self.set_mode(AppMode::Help);
        } else if KeyBindings::collapse().matches(&key) {
            let collapsed = !self.sampler.is_collapsed();
            self.sampler.set_collapsed(collapsed);
            self.state.update(|s| s.collapsed = collapsed);
        } else if KeyBindings::toggle_alerts().matches(&key) {
            let config = self.config.current_mut();
            config.alerts.enabled = !config.alerts.enabled;
            let enabled = config.alerts.enabled;
            self.toast(format!("Alerts {}", if enabled { "enabled" } else { "disabled" }));
            self.state.update(|s| s.alerts_enabled = enabled);
        } else if KeyBindings::toggle_notifications().matches(&key) {
            let config = self.config.current_mut();
            config.notifications.desktop = !config.notifications.desktop;
            let enabled = config.notifications.desktop;
            self.toast(format!(
                "Desktop notifications {}",
                if enabled { "enabled" } else { "disabled" }
            ));
            self.state.update(|s| s.desktop_notifications = enabled);
        }
    }

    fn handle_help_key(&mut self, key: KeyEvent) {
        if KeyBindings::escape().matches(&key) || KeyBindings::help().matches(&key) {
            self.set_mode(AppMode::Dashboard);
        }
    }

    fn set_mode(&self, mode: AppMode) {
        self.state.update(|s| s.mode = mode);
    }

    fn toast(&self, message: String) {
        self.state.update(|s| s.add_notification(message, NotificationLevel::Info));
    }
}

pub struct App {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    controller: Controller,
    sampler: Sampler,
}

impl App {
    pub fn new(config: ConfigWatcher, sampler: Sampler, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let backend = CrosstermBackend::new(std::io::stdout());
        let terminal = Terminal::new(backend)?;
        let controller = Controller::new(config, sampler.clone(), notifier);

        Ok(Self {
            terminal,
            controller,
            sampler,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.setup_terminal()?;

        let mut event_handler = EventHandler::new();
        event_handler.spawn_sources();

        let sampling = &self.controller.config.current().sampling;
        let sampler_handle = self.sampler.spawn(
            sampling.primary_interval(),
            sampling.disk_interval(),
            event_handler.sender(),
        );
        tracing::info!("sampling started");

        let result = self.event_loop(&mut event_handler).await;

        sampler_handle.shutdown().await;
        self.shutdown()?;
        result
    }

    fn setup_terminal(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::cursor::Hide,
        )?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show,
        )?;
        Ok(())
    }

    async fn event_loop(&mut self, event_handler: &mut EventHandler) -> Result<()> {
        self.render()?;
        while let Some(event) = event_handler.next().await {
            let redraw = matches!(event, Event::Tick | Event::Resize | Event::Key(_));
            match self.controller.handle_event(event) {
                EventResult::Continue => {}
                EventResult::Quit => break,
            }
            if redraw {
                self.render()?;
            }
        }
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let state = self.controller.state().read();
        self.terminal.draw(|frame| {
            Renderer::render(frame, &state);
        })?;
        Ok(())
    }
}
