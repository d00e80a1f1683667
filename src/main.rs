//! TikTok downloader: fetch video metadata through a no-watermark
//! extraction API and save either variant of the video.

// Upstream request and status check
mod api;
// Uploader avatar fetching
mod avatar;
// Config file loading
mod config;
// Download streaming and browser fallback
mod downloader;
// Error enum shared by fetch and download
mod error;
// Data models for videos and download tasks
mod model;
// Payload field mapping
mod normalize;
// Progress math for downloads
mod progress;
// Form state machine
mod state;
#[cfg(test)]
mod test_support;
// Input URL checks
mod validate;

use api::fetch_video_info;
use config::Config;
use downloader::{open_external, spawn_download, DownloadEvent};
use error::AppResult;
use model::{DownloadKind, DownloadStatus, DownloadTask, VideoInfo};
use state::{truncate_title, FormState, TITLE_PREVIEW_CHARS};

use eframe::{egui, App, Frame};
use egui::{ColorImage, TextureOptions, Visuals};
use once_cell::sync::OnceCell;
use rfd::FileDialog;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::{
    runtime::Runtime,
    sync::mpsc::{unbounded_channel, UnboundedReceiver},
};
use tracing::{error, info};

// Global Tokio runtime stored in a OnceCell for lazy init
static RUNTIME: OnceCell<Runtime> = OnceCell::new();

fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| Runtime::new().expect("failed to start tokio runtime"))
}

/// Program entry point: sets up logging, config and runtime, then opens the window
fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::fmt::init();
    info!("Starting up...");

    let config = Config::new();
    runtime();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 640.0]),
        ..Default::default()
    };
    eframe::run_native(
        "TikTok Downloader",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(Visuals::dark());
            Box::new(DownloaderApp::new(config))
        }),
    )
}

/// Application state for the GUI
struct DownloaderApp {
    config: Config,
    client: reqwest::Client,
    form: FormState,
    /// Pending metadata fetch, if one is in flight
    fetch_rx: Option<UnboundedReceiver<AppResult<VideoInfo>>>,
    /// Destination folder for downloads
    download_folder: String,
    /// Downloads shown in the side panel
    downloads: Vec<DownloadTask>,
    /// Update channels keyed by file name
    download_rxs: HashMap<String, UnboundedReceiver<DownloadEvent>>,
    /// Avatar texture for the video currently shown, keyed by its URL
    avatar: Option<(String, egui::TextureHandle)>,
    /// Avatar URL whose fetch is already running or done
    avatar_requested: Option<String>,
    /// Incoming avatar fetch results (url, image)
    avatar_results: Arc<Mutex<Vec<(String, ColorImage)>>>,
}

impl DownloaderApp {
    fn new(config: Config) -> Self {
        Self {
            download_folder: config.download.folder.clone(),
            config,
            client: reqwest::Client::new(),
            form: FormState::default(),
            fetch_rx: None,
            downloads: Vec::new(),
            download_rxs: HashMap::new(),
            avatar: None,
            avatar_requested: None,
            avatar_results: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn submit(&mut self, ctx: &egui::Context) {
        let Some(url) = self.form.begin_fetch() else {
            return;
        };
        let (tx, rx) = unbounded_channel();
        self.fetch_rx = Some(rx);

        let client = self.client.clone();
        let api = self.config.api.clone();
        let ctx = ctx.clone();
        runtime().spawn(async move {
            let result = fetch_video_info(&client, &api, &url).await;
            if let Err(e) = &result {
                error!(error = %e, "fetch failed");
            }
            // Receiver is gone if the window closed meanwhile.
            let _ = tx.send(result);
            ctx.request_repaint();
        });
    }

    fn start_download(&mut self, kind: DownloadKind) {
        let Some(url) = self.form.download_url(kind) else {
            return;
        };
        let Some(video) = self.form.video() else {
            return;
        };
        let Some(file_name) = kind.file_name(&self.config.download.filename_prefix, &video.id) else {
            return;
        };
        if self.download_rxs.contains_key(&file_name) {
            self.form.set_notice(format!("{file_name} is already downloading"));
            return;
        }
        info!(%file_name, %kind, "starting download");

        self.downloads.retain(|t| t.file_name != file_name);
        self.downloads.push(DownloadTask {
            file_name: file_name.clone(),
            title: video.title.clone(),
            status: DownloadStatus::Downloading,
            progress: 0.0,
        });

        let (tx, rx) = unbounded_channel();
        self.download_rxs.insert(file_name.clone(), rx);
        runtime().spawn(spawn_download(
            self.client.clone(),
            url,
            self.download_folder.clone(),
            file_name,
            tx,
            open_external,
        ));
    }

    fn poll_fetch(&mut self) {
        let Some(rx) = self.fetch_rx.as_mut() else {
            return;
        };
        if let Ok(result) = rx.try_recv() {
            self.form.finish_fetch(result);
            self.fetch_rx = None;
        }
    }

    fn poll_downloads(&mut self) {
        let mut finished = Vec::new();
        for (name, rx) in self.download_rxs.iter_mut() {
            while let Ok(event) = rx.try_recv() {
                let Some(task) = self.downloads.iter_mut().find(|t| &t.file_name == name) else {
                    continue;
                };
                match event {
                    // Only update if progress increased
                    DownloadEvent::Progress(p) if p > task.progress => task.progress = p,
                    DownloadEvent::Progress(_) => {}
                    DownloadEvent::Done(path) => {
                        task.progress = 1.0;
                        task.status = DownloadStatus::Done(path);
                        finished.push(name.clone());
                    }
                    DownloadEvent::Failed(msg) => {
                        task.status = DownloadStatus::Failed(msg.clone());
                        self.form.set_notice(msg);
                        finished.push(name.clone());
                    }
                }
            }
        }
        for name in finished {
            self.download_rxs.remove(&name);
        }
    }

    fn poll_avatar(&mut self, ctx: &egui::Context) {
        let Some(video) = self.form.video() else {
            self.avatar = None;
            self.avatar_requested = None;
            return;
        };
        let wanted = video.uploader.profile_picture.clone();

        {
            let mut pending = self.avatar_results.lock().unwrap_or_else(|e| e.into_inner());
            for (url, img) in pending.drain(..) {
                if url == wanted {
                    let tex = ctx.load_texture(&url, img, TextureOptions::default());
                    self.avatar = Some((url, tex));
                }
            }
        }

        if self.avatar_requested.as_deref() != Some(wanted.as_str()) {
            self.avatar = None;
            self.avatar_requested = Some(wanted.clone());
            let results = Arc::clone(&self.avatar_results);
            let ctx = ctx.clone();
            runtime().spawn_blocking(move || {
                if let Some(img) = avatar::fetch_avatar(&wanted) {
                    results
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .push((wanted, img));
                    ctx.request_repaint();
                }
            });
        }
    }

    fn downloads_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Downloads");
        ui.separator();

        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                let mut to_remove = vec![];
                for task in &self.downloads {
                    let status_text = match &task.status {
                        DownloadStatus::Downloading => "⬇️ Downloading".to_string(),
                        DownloadStatus::Done(path) => format!("✅ Saved to {}", path.display()),
                        DownloadStatus::Failed(msg) => format!("⚠ {msg}"),
                    };
                    ui.group(|ui| {
                        ui.label(&task.title);
                        ui.small(&task.file_name);
                        ui.label(status_text);
                        ui.add(egui::ProgressBar::new(task.progress).show_percentage());
                        if !matches!(task.status, DownloadStatus::Downloading) {
                            ui.horizontal(|ui| {
                                if ui.button("Open Folder").clicked() {
                                    // Folder the file was saved in, not the current field value
                                    let folder = match &task.status {
                                        DownloadStatus::Done(path) => path
                                            .parent()
                                            .map(|p| p.display().to_string())
                                            .unwrap_or_else(|| self.download_folder.clone()),
                                        _ => self.download_folder.clone(),
                                    };
                                    open_external(&folder);
                                }
                                if ui.add(egui::Button::new("❌").fill(egui::Color32::RED)).clicked() {
                                    to_remove.push(task.file_name.clone());
                                }
                            });
                        }
                    });
                }
                if !to_remove.is_empty() {
                    self.downloads.retain(|t| !to_remove.contains(&t.file_name));
                }
            });
    }

    fn form_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("TikTok Downloader");
        ui.label("Paste TikTok URL here:");

        ui.horizontal(|ui| {
            let input = ui.add(
                egui::TextEdit::singleline(&mut self.form.url_input)
                    .hint_text("https://www.tiktok.com/@user/video/...")
                    .desired_width(420.0),
            );
            if input.changed() {
                self.form.input_edited();
            }
            let enter = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            let loading = self.form.is_loading();
            let clicked = if loading {
                ui.add(egui::Spinner::new());
                ui.add_enabled(false, egui::Button::new("Fetching..."));
                false
            } else {
                ui.button("Fetch").clicked()
            };
            if clicked || (enter && !loading) {
                self.submit(ui.ctx());
            }
        });

        ui.horizontal(|ui| {
            ui.label("Download folder:");
            ui.text_edit_singleline(&mut self.download_folder);
            if ui.button("Browse…").clicked() {
                if let Some(folder) = FileDialog::new().set_directory(&self.download_folder).pick_folder() {
                    self.download_folder = folder.display().to_string();
                }
            }
        });

        if let Some(msg) = self.form.error() {
            ui.add_space(6.0);
            ui.colored_label(egui::Color32::LIGHT_RED, msg);
        }

        if let Some(video) = self.form.video().cloned() {
            ui.add_space(12.0);
            self.video_panel(ui, &video);
        }
    }

    fn video_panel(&mut self, ui: &mut egui::Ui, video: &VideoInfo) {
        ui.group(|ui| {
            ui.heading("Video Information");

            ui.label(egui::RichText::new("Title").weak());
            ui.horizontal_wrapped(|ui| {
                ui.label(truncate_title(&video.title, self.form.show_full_title));
                if video.title.chars().count() > TITLE_PREVIEW_CHARS {
                    let toggle = if self.form.show_full_title { "Show Less" } else { "Show More" };
                    if ui.link(toggle).clicked() {
                        self.form.show_full_title = !self.form.show_full_title;
                    }
                }
            });

            ui.label(egui::RichText::new("Video ID").weak());
            ui.horizontal(|ui| {
                ui.monospace(&video.id);
                if ui.small_button("Copy").clicked() {
                    ui.ctx().output_mut(|o| o.copied_text = video.id.clone());
                }
            });

            ui.label(egui::RichText::new("Uploader").weak());
            ui.horizontal(|ui| {
                if let Some((_, tex)) = &self.avatar {
                    ui.add(egui::Image::new(tex).fit_to_exact_size(egui::vec2(48.0, 48.0)));
                }
                ui.strong(&video.uploader.username);
            });

            ui.label(egui::RichText::new("Music").weak());
            ui.label(&video.music.song_name);
            ui.small(&video.music.artist);

            ui.label(egui::RichText::new("Duration").weak());
            ui.monospace(&video.duration);

            ui.separator();
            ui.label("Download Options");
            ui.horizontal(|ui| {
                for (kind, label) in [
                    (DownloadKind::NoWatermark, "No Watermark\nHD Quality"),
                    (DownloadKind::WithWatermark, "With Watermark\nOriginal"),
                    (DownloadKind::AudioOnly, "Audio Only\nComing Soon..."),
                ] {
                    let enabled = self.form.is_download_enabled(kind);
                    if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
                        self.start_download(kind);
                    }
                }
            });
        });
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for DownloaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_fetch();
        self.poll_downloads();
        self.poll_avatar(ctx);

        egui::SidePanel::right("downloads_panel").show(ctx, |ui| self.downloads_panel(ui));
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| self.form_panel(ui));
        });

        // Request periodic repaint while anything is in flight
        if self.form.is_loading() || !self.download_rxs.is_empty() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
