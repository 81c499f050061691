//! Game host: owns the clock, the viewport, and the loaded scene
//!
//! The host is deliberately windowing-agnostic. The embedding
//! application owns the OS loop and calls [`Game::tick`] once per
//! iteration with the current input snapshot and a drawing surface;
//! the host advances the timer, updates the scene, then renders it.

use thiserror::Error;

use crate::foundation::time::{FrameTime, Timer};
use crate::input::InputState;
use crate::render::DrawSurface;
use crate::scene::{Scene, SceneError};
use crate::settings::GameSettings;
use crate::spatial::QuadTreeConfig;

/// Smallest viewport dimension the host accepts, in pixels
pub const MINIMUM_VIEWPORT_SIZE: f32 = 1.0;

/// Errors produced while driving the game loop
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    /// `tick` was called with no scene loaded
    #[error("no scene is loaded")]
    NoSceneLoaded,

    /// The loaded scene rejected a frame call
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Pixel dimensions of the area the game presents into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in pixels, always at least [`MINIMUM_VIEWPORT_SIZE`]
    pub width: f32,
    /// Height in pixels, always at least [`MINIMUM_VIEWPORT_SIZE`]
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl Viewport {
    /// Create a viewport, clamping both dimensions to the minimum size
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(MINIMUM_VIEWPORT_SIZE),
            height: height.max(MINIMUM_VIEWPORT_SIZE),
        }
    }

    /// Width divided by height
    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }
}

/// Host state shared with the scene at initialization
#[derive(Debug, Clone, Default)]
pub struct GameContext {
    /// Current presentation viewport
    pub viewport: Viewport,
    /// Tuning for the per-frame spatial index
    pub quad_tree: QuadTreeConfig,
}

/// Top-level game host.
///
/// Exactly one scene is active at a time; loading a new scene replaces
/// and drops the previous one.
pub struct Game {
    settings: GameSettings,
    context: GameContext,
    timer: Timer,
    scene: Option<Scene>,
}

impl Game {
    /// Create a host from validated settings
    pub fn new(settings: GameSettings) -> Self {
        let context = GameContext {
            viewport: Viewport::new(settings.viewport_width(), settings.viewport_height()),
            quad_tree: settings.quad_tree(),
        };
        log::info!(
            "Game host created: viewport {}x{}",
            context.viewport.width,
            context.viewport.height
        );
        Self {
            settings,
            context,
            timer: Timer::new(),
            scene: None,
        }
    }

    /// Settings the host was created with
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Host state snapshot shared with scenes
    pub fn context(&self) -> &GameContext {
        &self.context
    }

    /// Current presentation viewport
    pub fn viewport(&self) -> Viewport {
        self.context.viewport
    }

    /// Scene currently loaded, if any
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Mutable access to the loaded scene
    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    /// Load a scene, initializing it against this host's context.
    ///
    /// The previously loaded scene, if any, is dropped.
    pub fn load_scene(&mut self, mut scene: Scene) {
        scene.initialize(&self.context);
        if self.scene.replace(scene).is_some() {
            log::info!("Replaced previously loaded scene");
        }
    }

    /// Unload the current scene, leaving the host idle
    pub fn unload_scene(&mut self) -> Option<Scene> {
        self.scene.take()
    }

    /// Resize the presentation viewport, forwarding to the loaded scene
    pub fn resize_viewport(&mut self, width: f32, height: f32) {
        let viewport = Viewport::new(width, height);
        self.context.viewport = viewport;
        if let Some(scene) = self.scene.as_mut() {
            scene.set_viewport(viewport);
        }
    }

    /// Run one frame: advance the clock, update the scene, render it.
    ///
    /// Returns the timing snapshot the frame ran with.
    pub fn tick(
        &mut self,
        input: &InputState,
        surface: &mut dyn DrawSurface,
    ) -> Result<FrameTime, GameError> {
        let scene = self.scene.as_mut().ok_or(GameError::NoSceneLoaded)?;
        self.timer.update();
        let frame = self.timer.frame_time();
        scene.update(&frame, input)?;
        scene.render(&frame, surface)?;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::NullSurface;
    use approx::assert_relative_eq;

    #[test]
    fn viewport_clamps_to_minimum_size() {
        let viewport = Viewport::new(0.0, -50.0);
        assert_relative_eq!(viewport.width, MINIMUM_VIEWPORT_SIZE);
        assert_relative_eq!(viewport.height, MINIMUM_VIEWPORT_SIZE);
        assert_relative_eq!(Viewport::new(1920.0, 1080.0).aspect_ratio(), 16.0 / 9.0);
    }

    #[test]
    fn tick_without_a_scene_fails() {
        let mut game = Game::new(GameSettings::default());
        let mut surface = NullSurface;
        assert_eq!(
            game.tick(&InputState::new(), &mut surface),
            Err(GameError::NoSceneLoaded)
        );
    }

    #[test]
    fn loading_a_scene_initializes_it() {
        let mut game = Game::new(GameSettings::default());
        game.load_scene(Scene::new());
        assert!(game.scene().is_some_and(Scene::is_initialized));

        let mut surface = NullSurface;
        let frame = game.tick(&InputState::new(), &mut surface).unwrap();
        assert!(frame.delta >= 0.0);
    }

    #[test]
    fn resizing_forwards_to_the_loaded_scene() {
        let mut game = Game::new(GameSettings::default());
        game.load_scene(Scene::new());
        game.resize_viewport(640.0, 480.0);
        assert_relative_eq!(game.viewport().width, 640.0);
        let scene_viewport = game.scene().map(Scene::viewport).unwrap();
        assert_relative_eq!(scene_viewport.height, 480.0);
    }

    #[test]
    fn loading_replaces_the_previous_scene() {
        let mut game = Game::new(GameSettings::default());
        let mut first = Scene::new();
        first.spawn("marker");
        game.load_scene(first);
        game.load_scene(Scene::new());
        assert!(game.scene().unwrap().find_entity("marker").is_none());
        assert!(game.unload_scene().is_some());
        assert!(game.scene().is_none());
    }
}
