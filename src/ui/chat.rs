use crate::ai::attachment::{decode_data_url, extension_for_mime};
use crate::ai::{display_items, ChatEntry, DisplayItem};
use eframe::egui;
use egui::load::Bytes;
use std::collections::HashMap;

const BUBBLE_WIDTH_RATIO: f32 = 0.7;

pub const USER_BUBBLE: egui::Color32 = egui::Color32::from_rgb(25, 118, 210);
pub const ASSISTANT_BUBBLE: egui::Color32 = egui::Color32::from_rgb(66, 66, 66);

/// Renders the transcript. Decoded image bytes are cached per part so data
/// URLs are only base64-decoded once.
#[derive(Default)]
pub struct ChatComponent {
    images: HashMap<String, Option<Bytes>>,
}

impl ChatComponent {
    pub fn render(&mut self, ui: &mut egui::Ui, entries: &[ChatEntry], loading: bool) {
        egui::ScrollArea::vertical()
            .stick_to_bottom(true)
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                ui.add_space(20.0);

                if entries.is_empty() {
                    ui.vertical_centered(|ui| {
                        ui.add_space(80.0);
                        ui.label(
                            egui::RichText::new("Start the conversation!")
                                .size(16.0)
                                .color(ui.visuals().weak_text_color()),
                        );
                    });
                }

                for entry in entries {
                    self.render_message_bubble(ui, entry);
                    ui.add_space(12.0);
                }

                if loading {
                    render_typing_indicator(ui);
                }
            });
    }

    fn render_message_bubble(&mut self, ui: &mut egui::Ui, entry: &ChatEntry) {
        let is_user = entry.message.is_user();
        let max_width = ui.available_width() * BUBBLE_WIDTH_RATIO;
        let layout = if is_user {
            egui::Layout::right_to_left(egui::Align::TOP)
        } else {
            egui::Layout::left_to_right(egui::Align::TOP)
        };

        ui.with_layout(layout, |ui| {
            egui::Frame::none()
                .fill(if is_user { USER_BUBBLE } else { ASSISTANT_BUBBLE })
                .rounding(18.0)
                .inner_margin(egui::Margin::symmetric(16.0, 10.0))
                .shadow(egui::epaint::Shadow {
                    offset: [0.0, 2.0].into(),
                    blur: 8.0,
                    spread: 0.0,
                    color: egui::Color32::from_rgba_unmultiplied(0, 0, 0, 34),
                })
                .show(ui, |ui| {
                    ui.set_max_width(max_width);
                    ui.vertical(|ui| {
                        for (idx, item) in display_items(&entry.message.content).into_iter().enumerate() {
                            match item {
                                DisplayItem::Text(text) => {
                                    ui.label(egui::RichText::new(text).size(16.0).color(egui::Color32::WHITE));
                                }
                                DisplayItem::Image(url) => {
                                    self.render_image(ui, &entry.id, idx, url, max_width);
                                }
                                DisplayItem::Raw(json) => {
                                    ui.label(egui::RichText::new(json).monospace().color(egui::Color32::WHITE));
                                }
                            }
                        }

                        ui.add_space(4.0);
                        ui.label(
                            egui::RichText::new(entry.timestamp.with_timezone(&chrono::Local).format("%H:%M").to_string())
                                .size(10.0)
                                .color(egui::Color32::from_rgb(200, 200, 200)),
                        );
                    });
                });
        });
    }

    fn render_image(&mut self, ui: &mut egui::Ui, entry_id: &str, idx: usize, url: &str, max_width: f32) {
        ui.add_space(8.0);

        if !url.starts_with("data:") {
            ui.add(egui::Image::new(url.to_string()).max_width(max_width).rounding(4.0));
            return;
        }

        let key = format!("{}/{}", entry_id, idx);
        let decoded = self
            .images
            .entry(key)
            .or_insert_with(|| match decode_data_url(url) {
                Some((_, bytes)) => Some(Bytes::Shared(bytes.into())),
                None => {
                    tracing::warn!("Could not decode image in message {}", entry_id);
                    None
                }
            })
            .clone();

        match decoded {
            Some(bytes) => {
                let ext = image_extension(url);
                let uri = format!("bytes://chat/{}/{}.{}", entry_id, idx, ext);
                ui.add(egui::Image::from_bytes(uri, bytes).max_width(max_width).rounding(4.0));
            }
            None => {
                ui.label(egui::RichText::new("[image could not be displayed]").italics());
            }
        }
    }
}

fn image_extension(data_url: &str) -> &'static str {
    let mime = data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split(';').next())
        .unwrap_or_default();
    extension_for_mime(mime)
}

fn render_typing_indicator(ui: &mut egui::Ui) {
    let time = ui.input(|i| i.time) as f32;

    ui.horizontal(|ui| {
        egui::Frame::none()
            .fill(ASSISTANT_BUBBLE)
            .rounding(18.0)
            .inner_margin(14.0)
            .show(ui, |ui| {
                let (rect, _) = ui.allocate_exact_size([30.0, 10.0].into(), egui::Sense::hover());
                for i in 0..3 {
                    let phase = (time * 3.0 + i as f32 * 0.6).sin();
                    let center = egui::pos2(rect.left() + 5.0 + i as f32 * 10.0, rect.center().y + phase * 2.5);
                    ui.painter().circle_filled(center, 3.0, egui::Color32::from_gray(190));
                }
            });
    });
    ui.ctx().request_repaint();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extension_follows_mime() {
        assert_eq!(image_extension("data:image/jpeg;base64,AAAA"), "jpg");
        assert_eq!(image_extension("data:image/webp;base64,AAAA"), "webp");
        assert_eq!(image_extension("data:;base64,AAAA"), "png");
    }
}
