#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use std::{path::Path, sync::mpsc, time::Duration};

use anyhow::{Context, Result};
use crop_studio::{
    AspectRatio, CropSession, CroppedImage, CropperSettings, ImageSource, LoadMessage,
    LoadOutcome, SessionPhase, default_settings_path, init_logging,
};
use eframe::egui;
use log::{LevelFilter, error, info, warn};

const IMAGE_FILTER: &[&str] = &["png", "jpg", "jpeg", "bmp"];

struct ImageCropper {
    settings: CropperSettings,
    aspect_ratio: AspectRatio,
    session: Option<CropSession>,
    texture: Option<egui::TextureHandle>,
    result: Option<CroppedImage>,
    result_texture: Option<egui::TextureHandle>,
    status: Option<String>,
    load_tx: mpsc::Sender<LoadMessage>,
    load_rx: mpsc::Receiver<LoadMessage>,
}

impl ImageCropper {
    fn new(_cc: &eframe::CreationContext<'_>, settings: CropperSettings) -> Self {
        let (load_tx, load_rx) = mpsc::channel();
        Self {
            aspect_ratio: settings.default_aspect_ratio,
            settings,
            session: None,
            texture: None,
            result: None,
            result_texture: None,
            status: None,
            load_tx,
            load_rx,
        }
    }

    fn open_source(&mut self, source: ImageSource) {
        let session = self
            .session
            .get_or_insert_with(|| CropSession::new(self.settings.clone(), self.aspect_ratio));
        session.load(source, self.load_tx.clone());
        self.texture = None;
        self.status = Some("Loading image…".to_owned());
    }

    fn poll_loads(&mut self, ctx: &egui::Context) {
        while let Ok(message) = self.load_rx.try_recv() {
            let Some(session) = self.session.as_mut() else {
                continue;
            };
            match session.finish_load(message) {
                LoadOutcome::Applied => self.status = None,
                LoadOutcome::Failed(err) => {
                    self.status = Some(format!("Failed to load image: {err}"));
                }
                LoadOutcome::Stale => {}
            }
        }
        if matches!(
            self.session.as_ref().map(CropSession::phase),
            Some(SessionPhase::Loading { .. })
        ) {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }

    /// Uploads the overlay canvas when the session repainted it.
    fn sync_texture(&mut self, ctx: &egui::Context) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.needs_repaint() && self.texture.is_some() {
            return;
        }
        let Some(canvas) = session.render() else {
            return;
        };
        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [canvas.width() as _, canvas.height() as _],
            canvas.as_raw(),
        );
        match &mut self.texture {
            Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("crop-canvas", color_image, egui::TextureOptions::LINEAR))
            }
        }
    }

    fn apply_crop(&mut self, ctx: &egui::Context) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        match session.commit() {
            Ok(output) => {
                let color_image = egui::ColorImage::from_rgba_unmultiplied(
                    [output.width as _, output.height as _],
                    output.pixels.as_raw(),
                );
                self.result_texture = Some(ctx.load_texture(
                    "crop-result",
                    color_image,
                    egui::TextureOptions::LINEAR,
                ));
                self.status = Some(format!("Cropped to {}x{}", output.width, output.height));
                self.result = Some(output);
                self.close_session();
            }
            Err(err) => {
                // session stays open so the user can retry
                self.status = Some(format!("Crop failed: {err}"));
            }
        }
    }

    fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel();
        }
        self.texture = None;
    }

    fn save_result(&mut self) {
        let Some(result) = &self.result else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name("cropped.png")
            .save_file()
        else {
            return;
        };
        match result.save(&path) {
            Ok(()) => {
                info!("Saved crop to {}", path.display());
                self.status = Some(format!("Saved {}", path.display()));
            }
            Err(err) => {
                error!("Failed to save image: {err}");
                self.status = Some(format!("Failed to save image: {err}"));
            }
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            if ui.button("Open Image").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Image", IMAGE_FILTER)
                    .pick_file()
                {
                    self.open_source(ImageSource::Path(path));
                }
            }

            if self.session.is_some() {
                ui.label("Aspect Ratio:");
                let mut selected = self.aspect_ratio;
                egui::ComboBox::from_id_salt("params_aspect_ratio")
                    .selected_text(selected.to_string())
                    .show_ui(ui, |ui| {
                        for ratio in AspectRatio::ALL {
                            ui.selectable_value(&mut selected, ratio, ratio.label());
                        }
                    });
                if selected != self.aspect_ratio {
                    if let Some(session) = self.session.as_mut() {
                        session.change_aspect_ratio(selected);
                        self.aspect_ratio = session.aspect_ratio();
                    }
                }

                let ready = self.session.as_ref().is_some_and(CropSession::is_ready);
                if ui.add_enabled(ready, egui::Button::new("Apply Crop")).clicked() {
                    self.apply_crop(ctx);
                }
                if ui.button("Cancel").clicked() {
                    self.close_session();
                    self.status = None;
                }
            } else if self.result.is_some() {
                if ui.button("Save Result").clicked() {
                    self.save_result();
                }
                if ui.button("Crop Again").clicked() {
                    if let Some(result) = &self.result {
                        let bytes = result.png.clone();
                        self.open_source(ImageSource::Bytes(bytes));
                    }
                }
            }
        });

        if let Some(status) = &self.status {
            ui.label(status);
        }
        ui.separator();
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let Some(texture) = &self.texture else {
            return;
        };
        const PADDING: f32 = 20.0;
        let available_size = ui.available_size();
        let max_size = available_size - egui::vec2(PADDING * 2.0, PADDING * 2.0);
        let canvas_size = texture.size_vec2();

        // Fit the canvas into the panel while maintaining aspect ratio
        let scale = (max_size.x / canvas_size.x).min(max_size.y / canvas_size.y);
        let display_size = canvas_size * scale.max(0.0);
        let total_display_size = display_size + egui::vec2(PADDING * 2.0, PADDING * 2.0);

        let x_offset = (available_size.x - total_display_size.x) / 2.0;
        let y_offset = (available_size.y - total_display_size.y) / 2.0;
        let start_pos = ui.cursor().min + egui::vec2(x_offset.max(0.0), y_offset.max(0.0));
        let target_rect = egui::Rect::from_min_size(start_pos, total_display_size);

        let response = ui.allocate_rect(target_rect, egui::Sense::drag());
        let painter = ui.painter_at(target_rect);
        let image_rect = egui::Rect::from_min_size(
            target_rect.min + egui::vec2(PADDING, PADDING),
            display_size,
        );

        painter.image(
            texture.id(),
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let Some(session) = self.session.as_mut() else {
            return;
        };
        let to_local = |pos: egui::Pos2| (pos - image_rect.min).to_pos2();

        if response.drag_started() {
            let origin = ui
                .input(|i| i.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos());
            if let Some(pos) = origin {
                session.pointer_down(to_local(pos), display_size);
            }
        }
        if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                session.pointer_move(to_local(pos), display_size);
            }
        }
        if response.drag_stopped() {
            session.pointer_up();
        }
    }
}

impl eframe::App for ImageCropper {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle dropped files
        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        if let Some(path) = dropped {
            self.open_source(ImageSource::Path(path));
        }

        self.poll_loads(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.toolbar(ui, ctx);
            self.sync_texture(ctx);

            if self.session.is_some() {
                self.canvas(ui);
            } else if let Some(texture) = &self.result_texture {
                let size = texture.size_vec2();
                let scale = (ui.available_width() / size.x)
                    .min(ui.available_height() / size.y)
                    .min(1.0);
                ui.centered_and_justified(|ui| {
                    ui.image((texture.id(), size * scale));
                });
            } else {
                ui.centered_and_justified(|ui| {
                    ui.label("Open or drop an image to start cropping");
                });
            }
        });
    }
}

fn load_settings(path: &Path) -> Result<CropperSettings> {
    CropperSettings::load_or_default(path)
        .with_context(|| format!("failed to load settings from {}", path.display()))
}

fn main() -> eframe::Result {
    let path = default_settings_path();
    let settings = match load_settings(&path) {
        Ok(settings) => {
            init_logging(settings.log_filter());
            settings
        }
        Err(err) => {
            init_logging(LevelFilter::Info);
            warn!("{err:#}; using default settings");
            CropperSettings::default()
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([800.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Crop Studio",
        options,
        Box::new(|cc| Ok(Box::new(ImageCropper::new(cc, settings)))),
    )
}
