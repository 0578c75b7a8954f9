use crate::config::AppConfig;
use crate::ui::app::Theme;
use eframe::egui;

/// Editable copy of the config; nothing changes until "Save Settings".
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsForm {
    pub api_url: String,
    pub referer: String,
    pub model: String,
    pub request_timeout_secs: u64,
    pub theme: Theme,
    pub error: Option<String>,
}

impl SettingsForm {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            referer: config.referer.clone().unwrap_or_default(),
            model: config.model.clone().unwrap_or_default(),
            request_timeout_secs: config.request_timeout_secs,
            theme: config.theme.clone(),
            error: None,
        }
    }

    /// Applies the form on top of `base`. Blank optional fields become `None`.
    pub fn apply(&self, base: &AppConfig) -> AppConfig {
        let optional = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };

        AppConfig {
            api_url: self.api_url.trim().to_string(),
            referer: optional(&self.referer),
            model: optional(&self.model),
            request_timeout_secs: self.request_timeout_secs,
            theme: self.theme.clone(),
            ..base.clone()
        }
    }
}

/// Returns the config to adopt when the user saved a valid form.
pub fn render_settings(ui: &mut egui::Ui, form: &mut SettingsForm, current: &AppConfig) -> Option<AppConfig> {
    ui.heading("Connection");
    ui.separator();
    ui.add_space(10.0);

    egui::Grid::new("connection_settings")
        .num_columns(2)
        .spacing([12.0, 8.0])
        .show(ui, |ui| {
            ui.label("API URL:");
            ui.text_edit_singleline(&mut form.api_url);
            ui.end_row();

            ui.label("Referer:");
            ui.add(egui::TextEdit::singleline(&mut form.referer).hint_text("optional"));
            ui.end_row();

            ui.label("Model:");
            ui.add(egui::TextEdit::singleline(&mut form.model).hint_text("relay default"));
            ui.end_row();

            ui.label("Timeout (s):");
            ui.add(egui::Slider::new(&mut form.request_timeout_secs, 1..=600));
            ui.end_row();
        });

    ui.add_space(20.0);

    ui.heading("Appearance");
    ui.separator();
    ui.add_space(10.0);

    ui.horizontal(|ui| {
        ui.label("Theme:");
        egui::ComboBox::from_label("")
            .selected_text(format!("{:?}", form.theme))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut form.theme, Theme::Dark, "Dark");
                ui.selectable_value(&mut form.theme, Theme::Light, "Light");
            });
    });

    ui.add_space(20.0);

    if let Some(err) = &form.error {
        ui.colored_label(egui::Color32::LIGHT_RED, err);
        ui.add_space(6.0);
    }

    if ui.button("Save Settings").clicked() {
        let updated = form.apply(current);
        if let Err(e) = updated.validate() {
            form.error = Some(e.to_string());
            return None;
        }
        if let Err(e) = updated.save() {
            tracing::error!("Failed to save settings: {}", e);
            form.error = Some(format!("Applied, but could not save: {}", e));
        } else {
            form.error = None;
        }
        return Some(updated);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_fields_become_none() {
        let base = AppConfig {
            referer: Some("http://old".into()),
            ..AppConfig::default()
        };
        let mut form = SettingsForm::from_config(&base);
        form.referer = "   ".into();
        form.model = " gpt-4o-mini ".into();
        form.api_url = " http://localhost:8080 ".into();

        let applied = form.apply(&base);
        assert!(applied.referer.is_none());
        assert_eq!(applied.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(applied.api_url, "http://localhost:8080");
        assert_eq!(applied.window_size, base.window_size);
    }

    #[test]
    fn form_round_trips_config() {
        let config = AppConfig {
            model: Some("gpt-4o".into()),
            theme: Theme::Light,
            ..AppConfig::default()
        };
        assert_eq!(SettingsForm::from_config(&config).apply(&config), config);
    }
}
