//! Barwave - a real-time 3D audio spectrum visualizer
//!
//! Tracks flow through a three-band equalizer into an analysis tap; every
//! display frame copies the tap's magnitudes into a row of colored bars.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use barwave::audio::{Band, Player};
use barwave::camera::CameraRig;
use barwave::cli::Args;
use barwave::hud::Hud;
use barwave::params::{AnalyserConfig, BarLayout, EqParams, RenderConfig};
use barwave::playlist::Playlist;
use barwave::rendering::{RenderSystem, Uniforms};
use barwave::viz::BarField;

const WINDOW_TITLE: &str = "Barwave";

/// Gain change per EQ keypress (dB)
const GAIN_STEP_DB: f32 = 1.0;

/// Main application state
struct App {
    args: Args,

    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Audio and visualization
    player: Option<Player>,
    hud: Option<Hud>,
    bars: BarField,
    camera: CameraRig,
    playlist: Playlist,

    // Configuration
    render_config: RenderConfig,
}

impl App {
    fn new(args: Args) -> Self {
        let layout = BarLayout::default();
        let render_config = RenderConfig::default();

        let camera = CameraRig::new(&render_config, &layout);
        let bars = BarField::new(layout);
        let playlist = Playlist::new(args.playlist_dir.clone());

        Self {
            args,
            window: None,
            render_system: None,
            player: None,
            hud: None,
            bars,
            camera,
            playlist,
            render_config,
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        // Create window
        let window_attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .expect("failed to create window"),
        );

        // Open the output device and start the (silent) stream
        let player = Player::new(AnalyserConfig::default(), EqParams::default())
            .expect("failed to initialize audio");
        let bin_count = player.bin_count();

        // Initialize rendering system
        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            bin_count as u32,
        ))
        .expect("failed to initialize rendering");

        let size = window.inner_size();
        self.camera.set_viewport(size.width, size.height);
        self.bars.rebuild(bin_count, size.width as f32);

        self.hud = Some(Hud::new(Arc::clone(&window), WINDOW_TITLE));
        self.window = Some(window);
        self.render_system = Some(render_system);
        self.player = Some(player);

        if let Some(path) = self.args.track.take() {
            self.load_track_from(&path);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.on_key(code, event.repeat, event_loop);
                }
            }
            WindowEvent::DroppedFile(path) => self.load_track_from(&path),
            WindowEvent::Resized(size) => self.on_resized(size.width, size.height),
            WindowEvent::RedrawRequested => self.render_frame(),
            _ => {}
        }
    }
}

impl App {
    fn on_key(&mut self, code: KeyCode, repeat: bool, event_loop: &ActiveEventLoop) {
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Space if !repeat => self.toggle_playback(),
            KeyCode::KeyT if !repeat => self.cycle_test_track(),
            KeyCode::KeyR if !repeat => self.reset_eq(),
            KeyCode::KeyQ => self.adjust_gain(Band::Bass, GAIN_STEP_DB),
            KeyCode::KeyA => self.adjust_gain(Band::Bass, -GAIN_STEP_DB),
            KeyCode::KeyW => self.adjust_gain(Band::Mid, GAIN_STEP_DB),
            KeyCode::KeyS => self.adjust_gain(Band::Mid, -GAIN_STEP_DB),
            KeyCode::KeyE => self.adjust_gain(Band::Treble, GAIN_STEP_DB),
            KeyCode::KeyD => self.adjust_gain(Band::Treble, -GAIN_STEP_DB),
            _ => {}
        }
    }

    fn toggle_playback(&mut self) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        if player.is_playing() {
            player.pause();
        } else if player.has_track() {
            if let Err(e) = player.play() {
                log::error!("play failed: {e:#}");
            }
        }
    }

    /// Load an audio file, leaving it paused at the start
    fn load_track_from(&mut self, path: &Path) {
        let (Some(player), Some(hud)) = (self.player.as_mut(), self.hud.as_mut()) else {
            return;
        };
        match player.load_path(path) {
            Ok(()) => {
                log::info!("loaded {}", path.display());
                hud.notify("AUDIO LOADED");
            }
            Err(e) => {
                log::warn!("{e}");
                hud.notify("LOAD FAILED");
            }
        }
    }

    /// Load the playlist's current entry, auto-playing on success, and
    /// advance the cursor (it moves even on failure, so a broken file does
    /// not wedge the rotation)
    fn cycle_test_track(&mut self) {
        let entry = self.playlist.advance();
        let (Some(player), Some(hud)) = (self.player.as_mut(), self.hud.as_mut()) else {
            return;
        };

        let ext = Path::new(entry.file).extension().and_then(|e| e.to_str());
        let result = self
            .playlist
            .read(&entry)
            .and_then(|bytes| player.load(&bytes, ext));

        match result {
            Ok(()) => {
                if let Err(e) = player.play() {
                    log::error!("play failed: {e:#}");
                }
                hud.notify(&format!("LOADED: {}", entry.name));
            }
            Err(e) => {
                log::warn!("{e}");
                hud.notify(&format!("LOAD FAILED: {}", entry.name));
            }
        }
    }

    fn reset_eq(&mut self) {
        let (Some(player), Some(hud)) = (self.player.as_mut(), self.hud.as_mut()) else {
            return;
        };
        player.reset_gains();
        hud.notify("EQ RESET");
    }

    fn adjust_gain(&mut self, band: Band, delta_db: f32) {
        let (Some(player), Some(hud)) = (self.player.as_mut(), self.hud.as_mut()) else {
            return;
        };
        let effective = player.set_gain(band, player.gain_db(band) + delta_db);
        hud.notify(&format!("{} {:+.0} DB", band.label(), effective));
    }

    fn on_resized(&mut self, width: u32, height: u32) {
        if let Some(render_system) = self.render_system.as_mut() {
            render_system.resize(width, height);
        }
        self.camera.set_viewport(width, height);

        // Spacing depends on viewport width, so the row is rebuilt wholesale
        if let Some(player) = &self.player {
            self.bars.rebuild(player.bin_count(), width as f32);
        }
    }

    /// Advance one display frame: drain the tap, move the bars, render
    fn render_frame(&mut self) {
        let (Some(player), Some(hud), Some(render_system)) = (
            self.player.as_mut(),
            self.hud.as_mut(),
            self.render_system.as_mut(),
        ) else {
            return;
        };

        if player.poll_ended() {
            log::debug!("track finished");
        }

        hud.tick();
        if player.is_playing() {
            hud.set_status(&format!(
                "{} / {}",
                fmt_time(player.position_s()),
                fmt_time(player.duration_s())
            ));
        }

        let snapshot = player.snapshot();
        self.bars.update_frame(snapshot);

        let uniforms = Uniforms::new(self.camera.view_proj(self.bars.len(), self.bars.spacing()));
        render_system.update_instances(self.bars.instances());
        render_system.update_uniforms(&uniforms);

        if let Err(e) = render_system.render() {
            log::error!("Render error: {:?}", e);
        }
    }
}

/// mm:ss for the title-bar position readout
fn fmt_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();

    println!("Barwave - 3D audio spectrum visualizer");
    println!("  SPACE        play / pause");
    println!("  T            cycle test tracks");
    println!("  Q/A W/S E/D  bass / mid / treble gain");
    println!("  R            reset EQ");
    println!("  ESC          quit");
    println!("Drop an audio file onto the window to load it.\n");

    let mut app = App::new(args);
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
