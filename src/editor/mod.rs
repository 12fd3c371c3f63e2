//! Editing session: owns the surface, the active tool and the undo history.

pub mod handles;
pub mod scale;
pub mod surface;
pub mod tools;

use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbaImage;
use thiserror::Error;

use crate::config::EditorConfig;
use crate::geometry::{Point, Size};
use crate::history::{HistoryError, HistoryStack};
use crate::input::{
    resolve_shortcut, InputContext, PointerEvent, PointerHub, ShortcutAction, ShortcutKey,
    ShortcutModifiers,
};
use crate::render::{EncodedImage, ExtractionError, RenderResult, RenderSurface};
use crate::source::{load_image, ImageFetcher, ImageSource, LoadError};
use crate::state::{StateError, StateMachine, ToolEvent, ToolState};
use crate::storage::{cache_busted_locator, MediaStorage, MediaUpload, StorageError};

pub use scale::{compute_initial_scale, InitialScale, Rotation, Scale, ScaleModel};
pub use surface::{BlurPatch, ImageSurface, RestoredState};
pub use tools::{BlurTool, CropTool, ResizeTool, StageLayout, ToolKind};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("export failed: {0}")]
    Export(#[from] ExtractionError),
    #[error("storage error while {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: StorageError,
    },
}

pub type EditorResult<T> = std::result::Result<T, EditorError>;

/// Caption metadata that travels with a saved image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageCaption {
    pub caption: Option<String>,
    pub alt_text: Option<String>,
}

/// Result of a successful save, ready for the host document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub locator: String,
    /// `locator` with a timestamp query parameter so the host reloads it.
    pub display_url: String,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
pub struct EditorSession {
    surface: ImageSurface,
    history: HistoryStack,
    machine: StateMachine,
    crop: CropTool,
    resize: ResizeTool,
    blur: BlurTool,
    window: PointerHub,
    config: EditorConfig,
}

impl EditorSession {
    pub fn open<F: ImageFetcher>(
        source: &ImageSource,
        fetcher: &F,
        container_width: f64,
        config: EditorConfig,
    ) -> EditorResult<Self> {
        let loaded = load_image(source, fetcher)?;
        Ok(Self::with_bitmap(
            loaded.bitmap,
            loaded.tainted,
            container_width,
            config,
        ))
    }

    pub fn from_image(bitmap: RgbaImage, container_width: f64, config: EditorConfig) -> Self {
        Self::with_bitmap(bitmap, false, container_width, config)
    }

    fn with_bitmap(
        bitmap: RgbaImage,
        tainted: bool,
        container_width: f64,
        config: EditorConfig,
    ) -> Self {
        let natural = Size::new(f64::from(bitmap.width()), f64::from(bitmap.height()));
        let initial = compute_initial_scale(natural, container_width, config.min_display_width);
        tracing::info!(
            width = bitmap.width(),
            height = bitmap.height(),
            display_width = initial.display.width,
            display_height = initial.display.height,
            tainted,
            "editor session opened"
        );
        Self {
            surface: ImageSurface::new(bitmap, initial, tainted),
            history: HistoryStack::new(config.history_capacity),
            machine: StateMachine::new(),
            crop: CropTool::new(config.crop_options()),
            resize: ResizeTool::new(config.resize_options()),
            blur: BlurTool::new(config.blur_options()),
            window: PointerHub::new(),
            config,
        }
    }

    pub fn surface(&self) -> &ImageSurface {
        &self.surface
    }

    pub fn state(&self) -> ToolState {
        self.machine.state()
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    /// Window-level pointer target. Drag sessions register their release
    /// listeners here.
    pub fn window(&self) -> &PointerHub {
        &self.window
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn crop_tool(&self) -> &CropTool {
        &self.crop
    }

    pub fn resize_tool(&self) -> &ResizeTool {
        &self.resize
    }

    pub fn blur_tool(&self) -> &BlurTool {
        &self.blur
    }

    pub fn set_keep_aspect_ratio(&mut self, keep: bool) {
        self.resize.set_keep_aspect_ratio(keep);
    }

    /// Stops whatever tool is active and starts `tool`.
    pub fn switch_tool(&mut self, tool: ToolKind) -> EditorResult<ToolState> {
        self.stop_active_tool();
        let state = self.machine.transition(ToolEvent::Activate(tool))?;
        let display = self.surface.display_size();
        match tool {
            ToolKind::Crop => self.crop.start(display),
            ToolKind::Resize => self.resize.start(display),
            ToolKind::Blur => self.blur.enable(),
        }
        Ok(state)
    }

    /// Applies the crop or resize overlay. Returns `false` when the commit
    /// was a no-op, in which case no history entry is recorded.
    pub fn commit_tool(&mut self) -> EditorResult<bool> {
        let state = self.machine.state();
        self.machine.transition(ToolEvent::Commit)?;
        let applied = match state {
            ToolState::Cropping => self.commit_crop(),
            ToolState::Resizing => self.commit_resize(),
            ToolState::None | ToolState::Blurring => Ok(false),
        };
        if applied.is_err() {
            self.crop.cancel();
            self.resize.cancel();
        }
        applied
    }

    fn commit_crop(&mut self) -> EditorResult<bool> {
        if self.crop.natural_region(self.surface.model()).is_none() {
            self.crop.cancel();
            return Ok(false);
        }
        let crop = &mut self.crop;
        self.history.wrap(&mut self.surface, |surface| {
            if let Some(cropped) = crop.commit(surface) {
                surface.replace_bitmap(cropped);
            }
        })?;
        let natural = self.surface.natural_size();
        tracing::info!(width = natural.width, height = natural.height, "crop applied");
        Ok(true)
    }

    fn commit_resize(&mut self) -> EditorResult<bool> {
        let Some(size) = self.resize.commit() else {
            return Ok(false);
        };
        self.history
            .wrap(&mut self.surface, |surface| surface.set_display_size(size))?;
        tracing::info!(width = size.width, height = size.height, "resize applied");
        Ok(true)
    }

    /// Leaves the active tool without applying it. Returns `false` when no
    /// tool was active.
    pub fn cancel_tool(&mut self) -> EditorResult<bool> {
        if self.machine.state() == ToolState::None {
            return Ok(false);
        }
        self.stop_active_tool();
        self.machine.transition(ToolEvent::Cancel)?;
        Ok(true)
    }

    pub fn rotate(&mut self) -> EditorResult<StageLayout> {
        self.cancel_overlay()?;
        let layout = self.history.wrap(&mut self.surface, tools::rotate)?;
        tracing::info!(degrees = self.surface.rotation().degrees(), "rotation applied");
        Ok(layout)
    }

    /// Restores the most recent history entry. Returns `false` when there
    /// was nothing to undo.
    pub fn undo(&mut self) -> EditorResult<bool> {
        self.cancel_overlay()?;
        let surface = &mut self.surface;
        let restored = self.history.restore(|state| surface.restore(state))?;
        if restored {
            if self.blur.is_painting() {
                // The stroke's own entry may be the one just popped.
                self.blur.rearm_history();
            }
            tracing::info!(remaining = self.history.len(), "undo applied");
        } else {
            tracing::debug!("undo stack empty");
        }
        Ok(restored)
    }

    pub fn pointer_down(&mut self, point: Point) -> EditorResult<bool> {
        self.window.dispatch(PointerEvent::Down(point));
        match self.machine.state() {
            ToolState::Cropping => Ok(self.crop.pointer_down(&self.window, point)),
            ToolState::Resizing => Ok(self.resize.pointer_down(&self.window, point)),
            ToolState::Blurring => {
                if !self.blur.pointer_down(&self.window) {
                    return Ok(false);
                }
                self.paint(point)?;
                Ok(true)
            }
            ToolState::None => Ok(false),
        }
    }

    pub fn pointer_move(&mut self, point: Point) -> EditorResult<bool> {
        self.window.dispatch(PointerEvent::Move(point));
        match self.machine.state() {
            ToolState::Cropping => Ok(self.crop.pointer_move(point)),
            ToolState::Resizing => Ok(self.resize.pointer_move(point)),
            ToolState::Blurring if self.blur.is_painting() => self.paint(point),
            ToolState::Blurring | ToolState::None => Ok(false),
        }
    }

    /// Delivers a release anywhere in the window, ending any drag or stroke.
    pub fn pointer_up(&mut self, point: Point) -> bool {
        self.window.dispatch(PointerEvent::Up(point));
        let crop = self.crop.pointer_released();
        let resize = self.resize.pointer_released();
        let blur = self.blur.pointer_released();
        if blur {
            self.surface.settle_patches();
        }
        crop || resize || blur
    }

    fn paint(&mut self, point: Point) -> EditorResult<bool> {
        if self
            .blur
            .brush_region(point, self.surface.model())
            .is_none()
        {
            return Ok(false);
        }
        let blur = &self.blur;
        if blur.needs_history() {
            self.history
                .wrap(&mut self.surface, |surface| blur.paint_at(point, surface))?;
            self.blur.mark_recorded();
            tracing::info!("blur stroke started");
        } else {
            blur.paint_at(point, &mut self.surface);
        }
        Ok(true)
    }

    /// Resolves a key press and applies it. `Save` and `CancelSession` are
    /// returned for the host to carry out since they end or leave the
    /// session.
    pub fn handle_shortcut(
        &mut self,
        key: ShortcutKey,
        modifiers: ShortcutModifiers,
    ) -> EditorResult<Option<ShortcutAction>> {
        let state = self.machine.state();
        let context = InputContext {
            overlay_active: state.has_overlay(),
            blur_enabled: state == ToolState::Blurring,
        };
        let Some(action) = resolve_shortcut(key, modifiers, context) else {
            return Ok(None);
        };
        match action {
            ShortcutAction::ApplyTool => {
                self.commit_tool()?;
            }
            ShortcutAction::CancelTool => {
                self.cancel_tool()?;
            }
            ShortcutAction::Undo => {
                self.undo()?;
            }
            ShortcutAction::Rotate => {
                self.rotate()?;
            }
            ShortcutAction::EnterCrop => {
                self.switch_tool(ToolKind::Crop)?;
            }
            ShortcutAction::EnterResize => {
                self.switch_tool(ToolKind::Resize)?;
            }
            ShortcutAction::EnterBlur => {
                self.switch_tool(ToolKind::Blur)?;
            }
            ShortcutAction::Save | ShortcutAction::CancelSession => {}
        }
        Ok(Some(action))
    }

    /// Renders the current state at display size and encodes it.
    pub fn export<R: RenderSurface>(&self, renderer: &R) -> RenderResult<EncodedImage> {
        renderer.extract(&self.surface).inspect_err(|err| {
            tracing::warn!(%err, "export failed");
        })
    }

    /// Exports and hands the image to `storage`. Failures go to `on_error`
    /// and yield `None`.
    pub fn save<R, S>(
        &self,
        renderer: &R,
        storage: &S,
        caption: ImageCaption,
        on_error: impl FnOnce(EditorError),
    ) -> Option<SavedImage>
    where
        R: RenderSurface,
        S: MediaStorage,
    {
        match self.try_save(renderer, storage, caption) {
            Ok(saved) => {
                tracing::info!(locator = %saved.locator, "image saved");
                Some(saved)
            }
            Err(err) => {
                on_error(err);
                None
            }
        }
    }

    fn try_save<R: RenderSurface, S: MediaStorage>(
        &self,
        renderer: &R,
        storage: &S,
        caption: ImageCaption,
    ) -> EditorResult<SavedImage> {
        let encoded = self.export(renderer)?;
        let mime = encoded.mime_type();
        let upload = MediaUpload {
            bytes: encoded.bytes,
            mime: mime.to_string(),
            caption: caption.caption,
            alt_text: caption.alt_text,
        };
        let locator = storage
            .store(&upload)
            .map_err(|source| EditorError::Storage {
                operation: "storing edited image",
                source,
            })?;
        let now_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        Ok(SavedImage {
            display_url: cache_busted_locator(&locator, now_millis),
            locator,
            mime,
            width: encoded.width,
            height: encoded.height,
        })
    }

    /// Discards the session. Nothing is stored and every listener goes away
    /// with the tools.
    pub fn cancel(self) {
        tracing::info!(
            pending_undo = self.history.len(),
            "editor session cancelled"
        );
    }

    fn stop_active_tool(&mut self) {
        match self.machine.state().tool() {
            Some(ToolKind::Crop) => self.crop.cancel(),
            Some(ToolKind::Resize) => self.resize.cancel(),
            Some(ToolKind::Blur) => {
                self.blur.disable();
                self.surface.settle_patches();
            }
            None => {}
        }
    }

    /// Overlay rectangles are in display space, so they are dropped before
    /// anything changes the display frame. The blur brush stays enabled.
    fn cancel_overlay(&mut self) -> EditorResult<()> {
        if self.machine.state().has_overlay() {
            self.stop_active_tool();
            self.machine.transition(ToolEvent::Cancel)?;
        }
        Ok(())
    }
}
