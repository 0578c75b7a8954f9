use crate::ai::attachment::{extension_for_mime, ImageAttachment};
use crate::ai::session::Draft;
use crate::utils::{format_file_size, truncate_string};
use eframe::egui;
use std::path::PathBuf;

const PREVIEW_HEIGHT: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerAction {
    None,
    Send,
    PickImage,
}

/// Thumbnail of the pending image. Returns true when the user removed it.
pub fn attachment_preview(ui: &mut egui::Ui, attachment: &ImageAttachment) -> bool {
    let mut removed = false;
    ui.horizontal(|ui| {
        let uri = format!(
            "bytes://pending/{}.{}",
            attachment.id,
            extension_for_mime(attachment.mime)
        );
        ui.add(
            egui::Image::from_bytes(uri, egui::load::Bytes::Shared(attachment.bytes.clone()))
                .max_height(PREVIEW_HEIGHT)
                .rounding(4.0),
        );
        ui.label(
            egui::RichText::new(format!(
                "{} ({})",
                truncate_string(&attachment.file_name, 32),
                format_file_size(attachment.size() as u64)
            ))
            .size(12.0)
            .color(ui.visuals().weak_text_color()),
        );
        if ui.small_button("✕").on_hover_text("Remove image").clicked() {
            removed = true;
        }
    });
    removed
}

/// Attach button, text field and send button.
pub fn input_row(ui: &mut egui::Ui, draft: &mut Draft, loading: bool, can_send: bool) -> ComposerAction {
    let mut action = ComposerAction::None;

    ui.horizontal(|ui| {
        if ui
            .add_enabled(!loading, egui::Button::new("📷"))
            .on_hover_text("Attach an image")
            .clicked()
        {
            action = ComposerAction::PickImage;
        }

        let field_width = (ui.available_width() - 44.0).max(80.0);
        let response = ui.add_enabled(
            !loading,
            egui::TextEdit::singleline(&mut draft.input)
                .hint_text("Type your query...")
                .desired_width(field_width),
        );

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) && !loading {
            action = ComposerAction::Send;
            response.request_focus();
        }

        if loading {
            ui.add(egui::Spinner::new().size(24.0));
        } else if ui
            .add_enabled(can_send, egui::Button::new("➤").min_size([32.0, 28.0].into()))
            .on_hover_text("Send")
            .clicked()
        {
            action = ComposerAction::Send;
        }
    });

    action
}

/// Small window asking for an image path. Files can also be dropped on the window.
#[derive(Default)]
pub struct ImagePicker {
    open: bool,
    path: String,
    error: Option<String>,
}

impl ImagePicker {
    pub fn open(&mut self) {
        self.open = true;
        self.error = None;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.path.clear();
        self.error = None;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn show(&mut self, ctx: &egui::Context) -> Option<ImageAttachment> {
        if !self.open {
            return None;
        }

        let mut picked = None;
        let mut keep_open = true;
        egui::Window::new("Attach image")
            .collapsible(false)
            .resizable(false)
            .open(&mut keep_open)
            .show(ctx, |ui| {
                ui.label("Path to an image file (png, jpg, gif, webp, bmp):");
                let response = ui.text_edit_singleline(&mut self.path);
                let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

                if let Some(err) = &self.error {
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }

                ui.horizontal(|ui| {
                    if ui.button("Attach").clicked() || submitted {
                        match self.load() {
                            Ok(attachment) => picked = Some(attachment),
                            Err(e) => self.error = Some(e),
                        }
                    }
                    if ui.button("Cancel").clicked() {
                        self.open = false;
                    }
                });
            });

        if picked.is_some() || !keep_open {
            self.open = false;
            self.path.clear();
        }
        picked
    }

    fn load(&self) -> Result<ImageAttachment, String> {
        let trimmed = self.path.trim().trim_matches('"');
        if trimmed.is_empty() {
            return Err("Enter a file path".to_string());
        }
        ImageAttachment::from_path(&PathBuf::from(trimmed)).map_err(|e| e.to_string())
    }
}
