use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::input::{EdgeTrigger, Toggle};

use super::camera::{Camera, CameraInput};
use super::config::SceneConfig;
use super::layout::{BoxLayout, LayoutError, LayoutParams};
use super::room::initial_view;

/// Keyboard and mouse state relevant to one update step.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Controls {
    pub camera: CameraInput,
    pub toggle_reflections: bool,
    pub regenerate: bool,
    pub toggle_counters: bool,
}

/// Everything the update step mutates. Rendering only reads it.
pub struct SceneState {
    pub camera: Camera,
    reflections: Toggle,
    counters: Toggle,
    regenerate: EdgeTrigger,
    params: LayoutParams,
    layout: BoxLayout,
    /// Bumped on every new layout so the renderer knows to re-upload.
    generation: u64,
    rng: StdRng,
}

impl SceneState {
    pub fn new(config: &SceneConfig) -> Result<Self, LayoutError> {
        let seed = config.seed.unwrap_or_else(rand::random);
        log::info!("layout seed {seed}");
        let mut rng = StdRng::seed_from_u64(seed);
        let layout = BoxLayout::generate(&config.layout, &mut rng)?;

        let (eye, target) = initial_view(&config.layout);
        Ok(Self {
            camera: Camera::looking_at(eye, target, config.camera_far),
            reflections: Toggle::new(true),
            counters: Toggle::new(false),
            regenerate: EdgeTrigger::default(),
            params: config.layout.clone(),
            layout,
            generation: 0,
            rng,
        })
    }

    /// Advances the scene by one fixed step of `dt` seconds.
    pub fn step(&mut self, controls: &Controls, dt: f32) -> Result<(), LayoutError> {
        self.camera.update(&controls.camera, dt);

        if self.reflections.update(controls.toggle_reflections) {
            log::debug!("reflections {}", on_off(self.reflections.get()));
        }
        if self.counters.update(controls.toggle_counters) {
            log::debug!("counters {}", on_off(self.counters.get()));
        }
        if self.regenerate.update(controls.regenerate) {
            self.layout = BoxLayout::generate(&self.params, &mut self.rng)?;
            self.generation += 1;
            log::info!("layout #{} with {} boxes", self.generation, self.layout.boxes.len());
        }
        Ok(())
    }

    pub fn reflections_enabled(&self) -> bool {
        self.reflections.get()
    }

    pub fn counters_visible(&self) -> bool {
        self.counters.get()
    }

    pub fn layout(&self) -> &BoxLayout {
        &self.layout
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

fn on_off(v: bool) -> &'static str {
    if v { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SceneState {
        let config = SceneConfig {
            seed: Some(11),
            ..SceneConfig::default()
        };
        SceneState::new(&config).unwrap()
    }

    fn run(state: &mut SceneState, controls: Controls, steps: usize) {
        for _ in 0..steps {
            state.step(&controls, 1.0 / 60.0).unwrap();
        }
    }

    #[test]
    fn starts_with_reflections_on_and_counters_hidden() {
        let s = state();
        assert!(s.reflections_enabled());
        assert!(!s.counters_visible());
        assert_eq!(s.generation(), 0);
    }

    #[test]
    fn holding_toggles_flips_once() {
        let mut s = state();
        let held = Controls {
            toggle_reflections: true,
            toggle_counters: true,
            ..Default::default()
        };
        run(&mut s, held, 20);
        assert!(!s.reflections_enabled());
        assert!(s.counters_visible());

        run(&mut s, Controls::default(), 1);
        run(&mut s, held, 5);
        assert!(s.reflections_enabled());
        assert!(!s.counters_visible());
    }

    #[test]
    fn holding_regenerate_builds_one_layout() {
        let mut s = state();
        let held = Controls {
            regenerate: true,
            ..Default::default()
        };
        run(&mut s, held, 10);
        assert_eq!(s.generation(), 1);

        run(&mut s, Controls::default(), 1);
        run(&mut s, held, 1);
        assert_eq!(s.generation(), 2);
        assert!(s.layout().grid.max_step() <= 1);
    }

    #[test]
    fn same_seed_reproduces_the_first_layout() {
        let a = state();
        let b = state();
        assert_eq!(a.layout().grid, b.layout().grid);
        assert_eq!(a.layout().boxes, b.layout().boxes);
    }

    #[test]
    fn camera_moves_with_controls() {
        let mut s = state();
        let start = s.camera.position;
        let controls = Controls {
            camera: CameraInput {
                up: true,
                ..Default::default()
            },
            ..Default::default()
        };
        run(&mut s, controls, 60);
        assert!((s.camera.position.y - start.y - s.camera.speed).abs() < 1e-3);
    }
}
