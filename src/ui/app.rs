use crate::ai::attachment::{mime_for_name, ImageAttachment};
use crate::ai::client::{ClientError, RelayClient};
use crate::ai::session::{ChatSession, PendingTurn};
use crate::ai::{ChatBackend, Message};
use crate::config::AppConfig;
use crate::ui::chat::ChatComponent;
use crate::ui::components::{attachment_preview, input_row, ComposerAction, ImagePicker};
use crate::ui::settings::{render_settings, SettingsForm};
use eframe::egui;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

const CARD_MAX_WIDTH: f32 = 480.0;
const CARD_HEIGHT: f32 = 600.0;

pub struct PlantChatApp {
    session: ChatSession,
    client: Arc<dyn ChatBackend>,
    runtime: tokio::runtime::Handle,
    config: AppConfig,
    show_settings: bool,
    settings_form: SettingsForm,
    applied_theme: Option<Theme>,
    chat_view: ChatComponent,
    image_picker: ImagePicker,
    // In-flight request
    pending: Option<PendingTurn>,
    reply_rx: Option<mpsc::Receiver<Result<Message, ClientError>>>,
    notice: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl PlantChatApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Result<Self, ClientError> {
        let client = RelayClient::new(&config)?;
        tracing::info!("Chat endpoint: {}", client.url());

        Ok(Self {
            session: ChatSession::with_model(config.model.clone()),
            client: Arc::new(client),
            runtime: tokio::runtime::Handle::current(),
            settings_form: SettingsForm::from_config(&config),
            config,
            show_settings: false,
            applied_theme: None,
            chat_view: ChatComponent::default(),
            image_picker: ImagePicker::default(),
            pending: None,
            reply_rx: None,
            notice: None,
        })
    }

    fn send_message(&mut self, ctx: &egui::Context) {
        let Some(turn) = self.session.begin_send() else {
            return;
        };

        let client = Arc::clone(&self.client);
        let request = turn.request.clone();
        let (tx, rx) = mpsc::channel(1);
        let ctx = ctx.clone();

        self.runtime.spawn(async move {
            let outcome = client.send(&request).await;
            let _ = tx.send(outcome).await;
            ctx.request_repaint();
        });

        // A reply clears the draft, so no picking while the request is out.
        self.image_picker.close();
        self.pending = Some(turn);
        self.reply_rx = Some(rx);
        self.notice = None;
    }

    fn poll_reply(&mut self) {
        let Some(rx) = self.reply_rx.as_mut() else {
            return;
        };

        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(ClientError::Cancelled),
        };

        self.reply_rx = None;
        if let Some(turn) = self.pending.take() {
            self.session.finish_send(turn, outcome);
        }
    }

    fn attach(&mut self, attachment: ImageAttachment) {
        let name = attachment.file_name.clone();
        if self.session.attach(attachment) {
            tracing::info!("Attached image {}", name);
            self.notice = None;
        } else {
            tracing::debug!("Ignored image {} while a request is in flight", name);
            self.notice = Some("Wait for the reply before attaching an image".to_string());
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        if self.session.is_loading() {
            return;
        }

        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().find(|f| {
            let name = f
                .path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| f.name.clone());
            mime_for_name(&name).is_some()
        }) else {
            return;
        };

        let result = match (&file.path, &file.bytes) {
            (Some(path), _) => ImageAttachment::from_path(path),
            (None, Some(bytes)) => ImageAttachment::from_bytes(file.name.clone(), bytes.clone()),
            (None, None) => return,
        };

        match result {
            Ok(attachment) => self.attach(attachment),
            Err(e) => {
                tracing::warn!("Rejected dropped file: {}", e);
                self.notice = Some(e.to_string());
            }
        }
    }

    fn apply_theme(&mut self, ctx: &egui::Context) {
        if self.applied_theme.as_ref() == Some(&self.config.theme) {
            return;
        }
        ctx.set_visuals(match self.config.theme {
            Theme::Dark => egui::Visuals::dark(),
            Theme::Light => egui::Visuals::light(),
        });
        self.applied_theme = Some(self.config.theme.clone());
    }

    fn apply_config(&mut self, config: AppConfig) {
        match RelayClient::new(&config) {
            Ok(client) => {
                tracing::info!("Chat endpoint: {}", client.url());
                self.client = Arc::new(client);
            }
            Err(e) => {
                tracing::error!("Failed to rebuild client: {}", e);
                self.notice = Some(e.to_string());
                return;
            }
        }
        self.session.set_model(config.model.clone());
        self.config = config;
    }

    fn render_card(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let loading = self.session.is_loading();
        let can_send = self.session.can_send();

        egui::TopBottomPanel::bottom("composer")
            .frame(egui::Frame::none().inner_margin(16.0))
            .show_separator_line(true)
            .show_inside(ui, |ui| {
                if let Some(notice) = &self.notice {
                    ui.colored_label(egui::Color32::LIGHT_RED, notice);
                }

                let mut clear_image = false;
                if let Some(attachment) = &self.session.draft.attachment {
                    clear_image = attachment_preview(ui, attachment);
                    ui.add_space(8.0);
                }
                if clear_image {
                    self.session.draft.attachment = None;
                }

                match input_row(ui, &mut self.session.draft, loading, can_send) {
                    ComposerAction::Send => self.send_message(ctx),
                    ComposerAction::PickImage => self.image_picker.open(),
                    ComposerAction::None => {}
                }
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().inner_margin(egui::Margin::symmetric(20.0, 0.0)))
            .show_inside(ui, |ui| {
                self.chat_view.render(ui, self.session.entries(), loading);
            });
    }
}

impl eframe::App for PlantChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_theme(ctx);
        self.poll_reply();
        self.handle_dropped_files(ctx);

        if let Some(attachment) = self.image_picker.show(ctx) {
            self.attach(attachment);
        }

        if self.show_settings {
            let mut open = true;
            let mut saved = None;
            egui::Window::new("Settings")
                .collapsible(false)
                .resizable(true)
                .default_size([400.0, 300.0])
                .open(&mut open)
                .show(ctx, |ui| {
                    saved = render_settings(ui, &mut self.settings_form, &self.config);
                });
            if let Some(config) = saved {
                self.apply_config(config);
            }
            self.show_settings = open;
        }

        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::none().inner_margin(8.0))
            .show(ctx, |ui| {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("⚙ Settings").clicked() {
                        self.settings_form = SettingsForm::from_config(&self.config);
                        self.show_settings = !self.show_settings;
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(16.0);
                ui.label(egui::RichText::new("Fix your plant!").size(32.0).strong());
                ui.add_space(24.0);

                let width = ui.available_width().min(CARD_MAX_WIDTH);
                let height = (ui.available_height() - 16.0).clamp(240.0, CARD_HEIGHT);

                egui::Frame::none()
                    .fill(ui.visuals().panel_fill)
                    .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
                    .rounding(16.0)
                    .shadow(egui::epaint::Shadow {
                        offset: [0.0, 4.0].into(),
                        blur: 16.0,
                        spread: 0.0,
                        color: egui::Color32::from_rgba_unmultiplied(0, 0, 0, 60),
                    })
                    .show(ui, |ui| {
                        ui.set_width(width);
                        ui.set_height(height);
                        self.render_card(ctx, ui);
                    });
            });
        });
    }
}
