use std::path::PathBuf;
use std::sync::Arc;

use download_session::{DialogKind, Session, SessionView, StartForm, Wake};
use eframe::egui;
use media_downloader::{FormatChoice, YtDlp};
use rfd::FileDialog;
use tokio::runtime::Runtime;

use crate::config::Config;

/// Form state plus the run coordinator. Lives on the UI thread.
pub struct DownloaderApp {
    url: String,
    folder: String,
    choice: FormatChoice,
    session: Session,
    view: SessionView,
    // Hosts the worker task; dropped with the window
    _runtime: Runtime,
}

impl DownloaderApp {
    pub fn new(cc: &eframe::CreationContext<'_>, runtime: Runtime, config: Config) -> Self {
        let ctx = cc.egui_ctx.clone();
        let wake: Wake = Arc::new(move || ctx.request_repaint());
        let session = Session::new(
            runtime.handle().clone(),
            Arc::new(YtDlp::new(config.yt_dlp)),
            wake,
        );

        Self {
            url: String::new(),
            folder: config.folder.display().to_string(),
            choice: FormatChoice::Best,
            session,
            view: SessionView::default(),
            _runtime: runtime,
        }
    }

    fn start(&mut self) {
        let form = StartForm {
            url: self.url.clone(),
            folder: PathBuf::from(self.folder.trim()),
            choice: self.choice,
        };
        if let Err(e) = self.session.start(&form, &mut self.view) {
            tracing::warn!("Not starting: {}", e);
            self.view.reject(&e);
        }
    }

    fn browse(&mut self) {
        if let Some(folder) = FileDialog::new().set_directory(&self.folder).pick_folder() {
            self.folder = folder.display().to_string();
        }
    }

    fn form(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("form")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                ui.label("Playlist/Video URL:");
                let url = ui.add(
                    egui::TextEdit::singleline(&mut self.url).desired_width(f32::INFINITY),
                );
                if url.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    self.start();
                }
                ui.end_row();

                ui.label("Download Folder:");
                ui.horizontal(|ui| {
                    ui.text_edit_singleline(&mut self.folder);
                    if ui.button("Browse").clicked() {
                        self.browse();
                    }
                });
                ui.end_row();

                ui.label("Format:");
                ui.horizontal(|ui| {
                    for choice in FormatChoice::ALL {
                        ui.radio_value(&mut self.choice, choice, choice.label());
                    }
                });
                ui.end_row();

                ui.label("Progress:");
                if self.view.is_busy() {
                    ui.add(egui::Spinner::new());
                } else {
                    ui.label("");
                }
                ui.end_row();
            });
    }

    fn dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = self.view.dialog().cloned() else {
            return;
        };

        let color = match dialog.kind {
            DialogKind::Info => ctx.style().visuals.text_color(),
            DialogKind::Warning => ctx.style().visuals.warn_fg_color,
            DialogKind::Error => ctx.style().visuals.error_fg_color,
        };

        let mut dismissed = false;
        egui::Window::new(dialog.title.as_str())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.colored_label(color, dialog.message.as_str());
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            });

        if dismissed {
            self.view.dismiss_dialog();
        }
    }
}

fn log_panel(ui: &mut egui::Ui, lines: &[String]) {
    ui.label("Log:");
    let row_height = ui.text_style_height(&egui::TextStyle::Monospace);
    // Progress adds a line per update; only lay out what is visible
    egui::ScrollArea::vertical()
        .stick_to_bottom(true)
        .auto_shrink([false; 2])
        .show_rows(ui, row_height, lines.len(), |ui, rows| {
            for line in &lines[rows] {
                ui.monospace(line.as_str());
            }
        });
}

impl eframe::App for DownloaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply whatever the worker posted since the last frame
        self.session.pump(&mut self.view);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.set_enabled(self.view.dialog().is_none());

            self.form(ui);

            ui.add_space(8.0);
            ui.vertical_centered(|ui| {
                let download = egui::Button::new("Download");
                if ui.add_enabled(self.view.start_enabled(), download).clicked() {
                    self.start();
                }
            });
            ui.add_space(8.0);

            log_panel(ui, self.view.log());
        });

        self.dialog(ctx);
    }
}
