//! Everything the window drives each frame, minus the window.
//!
//! [`Viewer`] owns the UI store, the orbit animation, the camera rig and the
//! pointer state. The winit handler feeds it input once per frame, steps it
//! on the fixed timestep and asks it for the draw list.

use glam::Vec2;
use orrery_config::Config;
use orrery_github::Flow;
use orrery_input::{Action, ActionResolver, ActionState, InputBinding, InputMap, KeyboardState, MouseState};
use orrery_system::camera_rig::{CameraRig, CameraView, MoveInput};
use orrery_system::orbit::{AsteroidBelt, OrbitState};
use orrery_system::panel;
use orrery_system::picking::{self, Ray};
use orrery_system::planets::PlanetId;
use orrery_system::scene::{self, DrawItem};
use orrery_system::store::{SolarSystemStore, UiState};
use tracing::{debug, info};
use winit::event::MouseButton;

pub struct Viewer {
    store: SolarSystemStore,
    orbit: OrbitState,
    rig: CameraRig,
    belt: AsteroidBelt,
    hovered: Option<PlanetId>,
    input_map: InputMap,
    actions: ActionState,
    viewport: (u32, u32),
}

impl Viewer {
    pub fn new(config: &Config, input_map: InputMap) -> Self {
        let scene = &config.scene;
        let mut rig = CameraRig::default();
        rig.speed = scene.camera_speed;
        rig.min_distance = scene.min_distance;
        rig.max_distance = scene.max_distance;
        rig.sensitivity = config.input.mouse_sensitivity;
        rig.invert_y = config.input.invert_y;
        rig.zoom_step = config.input.zoom_step;
        rig.fov_y = scene.fov_degrees.to_radians();
        rig.near = scene.near;
        rig.far = scene.far;
        let viewport = (config.window.width.max(1), config.window.height.max(1));
        rig.set_viewport_height(viewport.1);

        let mut store = SolarSystemStore::new();
        store.subscribe(
            |s: &UiState| s.selected,
            |selected: &Option<PlanetId>, _previous: &Option<PlanetId>| match selected {
                Some(id) => info!("\n{}", panel::planet_panel(id.record())),
                None => info!("Selection cleared"),
            },
        );
        store.set_camera_target(rig.target());

        let belt = AsteroidBelt::generate(scene.seed, scene.asteroid_count as usize);
        debug!("Asteroid belt: {} rocks", belt.asteroids.len());

        Self {
            store,
            orbit: OrbitState::new(),
            rig,
            belt,
            hovered: None,
            input_map,
            actions: ActionState::new(),
            viewport,
        }
    }

    pub fn state(&self) -> &UiState {
        self.store.state()
    }

    pub fn hovered(&self) -> Option<PlanetId> {
        self.hovered
    }

    pub fn orbit(&self) -> &OrbitState {
        &self.orbit
    }

    pub fn camera_view(&self) -> CameraView {
        self.rig.view()
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = (width, height);
        self.rig.set_viewport_height(height);
    }

    /// Apply one frame of input. Call before the fixed updates and before
    /// input transients are cleared. Returns the publishing flows the user
    /// asked for this frame.
    pub fn handle_input(&mut self, keyboard: &KeyboardState, mouse: &MouseState) -> Vec<Flow> {
        ActionResolver::resolve(&self.input_map, keyboard, mouse, &mut self.actions);

        let just = |action: Action| self.actions.action_just_activated(action);
        let toggles = [
            Action::TogglePause,
            Action::ToggleOrbits,
            Action::ToggleLabels,
            Action::ToggleHud,
            Action::ToggleRealTime,
            Action::CycleTimeScale,
            Action::ClearSelection,
        ];
        let fired: Vec<Action> = toggles.into_iter().filter(|a| just(*a)).collect();
        let flows: Vec<Flow> = [
            (Action::Publish, Flow::Publish),
            (Action::CreatePullRequest, Flow::PullRequest),
            (Action::UploadFiles, Flow::Upload),
        ]
        .into_iter()
        .filter(|(action, _)| just(*action))
        .map(|(_, flow)| flow)
        .collect();

        for action in fired {
            self.apply_command(action);
        }
        self.handle_pointer(mouse);
        flows
    }

    fn apply_command(&mut self, action: Action) {
        match action {
            Action::TogglePause => self.store.toggle_pause(),
            Action::ToggleOrbits => self.store.toggle_orbits(),
            Action::ToggleLabels => self.store.toggle_labels(),
            Action::ToggleHud => self.store.toggle_hud(),
            Action::ToggleRealTime => self.store.toggle_real_time(),
            Action::CycleTimeScale => {
                let scale = self.store.cycle_time_scale();
                info!("Time scale {}", panel::format_scale(scale));
            }
            Action::ClearSelection => self.store.select_planet(None),
            _ => return,
        }
        debug!(?action, "command");
    }

    fn handle_pointer(&mut self, mouse: &MouseState) {
        let delta = mouse.delta();
        if self.bound_buttons(Action::Orbit).any(|b| mouse.is_dragging(b)) {
            self.rig.orbit(delta.x, delta.y);
        } else if self.bound_buttons(Action::Pan).any(|b| mouse.is_dragging(b)) {
            self.rig.pan(delta.x, delta.y, self.viewport.1);
        }
        self.rig.zoom(mouse.scroll());

        let hovered = if mouse.is_cursor_in_window() {
            self.pick_at(mouse.position())
        } else {
            None
        };
        if hovered != self.hovered {
            debug!(planet = ?hovered.map(|id| id.record().name), "hover");
            self.hovered = hovered;
        }

        if self.bound_buttons(Action::Orbit).any(|b| mouse.clicked(b)) {
            if let Some(id) = self.hovered {
                self.store.toggle_selection(id);
            }
        }
    }

    fn bound_buttons(&self, action: Action) -> impl Iterator<Item = MouseButton> + '_ {
        self.input_map
            .get_bindings(&action)
            .iter()
            .filter_map(|binding| match binding {
                InputBinding::MouseButton(button) => Some(button.to_winit()),
                InputBinding::Key(_) => None,
            })
    }

    /// The planet under `cursor`, if any.
    pub fn pick_at(&self, cursor: Vec2) -> Option<PlanetId> {
        let (width, height) = self.viewport;
        let ray = Ray::from_screen(cursor, width, height, &self.rig.view());
        let targets = picking::planet_targets(&self.orbit, self.hovered, self.store.state().selected);
        picking::pick(&ray, &targets)
    }

    /// One fixed simulation step.
    pub fn fixed_update(&mut self, dt: f32) {
        let axis = |positive: Action, negative: Action| self.actions.axis(positive, negative);
        let moves = MoveInput {
            forward: axis(Action::MoveForward, Action::MoveBackward),
            leftward: axis(Action::MoveLeft, Action::MoveRight),
            up: axis(Action::MoveUp, Action::MoveDown),
            reset: self.actions.is_action_active(Action::ResetCamera),
        };
        self.rig.apply_moves(moves, dt);

        self.orbit.advance(dt, self.store.state());
        let positions: Vec<_> = self.orbit.planet_positions().collect();
        self.store.set_planet_positions(positions);
        self.store.set_camera_target(self.rig.target());
    }

    pub fn items(&self) -> Vec<DrawItem> {
        scene::compose(&self.orbit, self.store.state(), self.hovered, &self.belt)
    }

    /// Title text, or `None` while the HUD is hidden.
    pub fn hud(&self, fps: Option<f64>) -> Option<String> {
        let state = self.store.state();
        state
            .show_hud
            .then(|| panel::hud_line(state, self.hovered.map(|id| id.record().name), fps))
    }

    /// The info panel for the selection, or the controls panel.
    pub fn panel_text(&self) -> String {
        panel::active_panel(self.store.state())
    }
}
