//! Headless view-mode simulator.
//!
//! Flies a vehicle along a climbing circle over an in-memory scene while the
//! view director cycles through modes, logging each transition and where the
//! external view ends up.
//!
//! Run with: cargo run -p view-director --bin view-mode-sim -- --mode spring-arm-chase
//! Example: cargo run -p view-director --bin view-mode-sim -- --cycle fpv,chase,manual,3 --no-backup

#[cfg(target_family = "wasm")]
fn main() {
    // No terminal to drive on the web.
}

#[cfg(not(target_family = "wasm"))]
fn main() -> std::process::ExitCode {
    sim::run()
}

#[cfg(not(target_family = "wasm"))]
mod sim {
    use std::{path::PathBuf, process::ExitCode};

    use clap::Parser;
    use glam::{Quat, Vec3};

    use view_director::{
        CameraSet, Pose, ViewMode, ViewModeSettings, ViewModeStateMachine,
        manual::PoseInput,
        scene::{CameraScene, MemoryScene, NodeId},
    };

    /// Simulation step (60 Hz).
    const FIXED_TIMESTEP: f32 = 1.0 / 60.0;
    /// Radius of the vehicle's circuit in meters.
    const CIRCUIT_RADIUS: f32 = 40.0;
    /// Angular speed around the circuit in radians per second.
    const CIRCUIT_RATE: f32 = 0.4;
    /// Climb rate in meters per second.
    const CLIMB_RATE: f32 = 1.5;

    /// Parse a mode name or raw index.
    fn parse_mode(s: &str) -> Result<ViewMode, String> {
        s.parse::<ViewMode>().map_err(|e| e.to_string())
    }

    #[derive(Parser)]
    #[command(about = "Headless view-mode director simulation")]
    struct CliArgs {
        /// Initial view mode.
        #[arg(long, value_enum, default_value_t = ViewMode::default())]
        mode: ViewMode,

        /// Modes to cycle through, by name or index (comma separated).
        #[arg(long, value_delimiter = ',', value_parser = parse_mode)]
        cycle: Vec<ViewMode>,

        /// Number of frames to simulate.
        #[arg(long, default_value_t = 960)]
        frames: u32,

        /// Frames between mode switches.
        #[arg(long, default_value_t = 120)]
        switch_every: u32,

        /// Chase follow distance in meters (overrides the settings file).
        #[arg(long)]
        follow_distance: Option<i32>,

        /// Enable chase rotation lag (overrides the settings file).
        #[arg(long)]
        rotation_lag: bool,

        /// JSON settings file.
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Leave the vehicle without a backup view.
        #[arg(long)]
        no_backup: bool,
    }

    /// Nodes of the simulated scene.
    struct Stage {
        scene: MemoryScene,
        rig: NodeId,
        vehicle: NodeId,
        cameras: CameraSet<NodeId>,
    }

    fn build_stage(with_backup: bool) -> Stage {
        let mut scene = MemoryScene::new();
        let home = scene.spawn("director", Pose::IDENTITY);
        let rig = scene.spawn_child("chase rig", home, Pose::IDENTITY);
        let external = scene.spawn_child(
            "external camera",
            home,
            Pose::new(Vec3::new(-12.0, 6.0, 8.0), Quat::from_rotation_y(-0.6)),
        );

        let vehicle = scene.spawn("vehicle", vehicle_pose(0.0));
        let fpv = scene.spawn_child(
            "fpv camera",
            vehicle,
            Pose::from_translation(Vec3::new(0.0, 0.3, -0.4)),
        );
        let front = scene.spawn_child(
            "front camera",
            vehicle,
            Pose::from_translation(Vec3::new(0.0, 0.1, -0.8)),
        );
        let backup = with_backup.then(|| {
            scene.spawn_child(
                "backup camera",
                vehicle,
                Pose::new(Vec3::new(0.0, 0.1, 0.8), Quat::from_rotation_y(std::f32::consts::PI)),
            )
        });

        Stage {
            scene,
            rig,
            vehicle,
            cameras: CameraSet {
                fpv: Some(fpv),
                front: Some(front),
                backup,
                external: Some(external),
            },
        }
    }

    /// Vehicle pose at time `t` on the climbing circuit, facing along its path.
    fn vehicle_pose(t: f32) -> Pose {
        let angle = t * CIRCUIT_RATE;
        let position = Vec3::new(
            CIRCUIT_RADIUS * angle.cos(),
            1.0 + CLIMB_RATE * t,
            CIRCUIT_RADIUS * angle.sin(),
        );
        // Tangent of the circle; forward is -Z.
        let tangent = Vec3::new(-angle.sin(), 0.0, angle.cos());
        let heading = Quat::from_rotation_y((-tangent.x).atan2(-tangent.z));
        Pose::new(position, heading)
    }

    fn load_settings(args: &CliArgs) -> Result<ViewModeSettings, String> {
        let mut settings = match &args.settings {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
                serde_json::from_str(&text)
                    .map_err(|e| format!("failed to parse {}: {e}", path.display()))?
            }
            None => ViewModeSettings::default(),
        };

        if let Some(follow_distance) = args.follow_distance {
            settings.follow_distance = follow_distance;
        }
        if args.rotation_lag {
            settings.rotation_lag_enabled = true;
        }
        Ok(settings)
    }

    /// Name of the view on screen, if any.
    fn displayed_view(scene: &MemoryScene, cameras: &CameraSet<NodeId>) -> String {
        cameras
            .present()
            .find(|(_, view)| scene.is_displayed(*view))
            .map_or_else(|| "nothing".to_string(), |(_, view)| scene.name(view).to_string())
    }

    pub fn run() -> ExitCode {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();

        let args = CliArgs::parse();
        let settings = match load_settings(&args) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::error!("{err}");
                return ExitCode::FAILURE;
            }
        };
        let cycle = if args.cycle.is_empty() {
            ViewMode::ALL.to_vec()
        } else {
            args.cycle.clone()
        };

        let Stage {
            mut scene,
            rig,
            vehicle,
            cameras,
        } = build_stage(!args.no_backup);

        let mut machine = ViewModeStateMachine::initialize(
            &mut scene,
            args.mode,
            rig,
            Some(vehicle),
            cameras,
            settings,
        );

        let switch_every = args.switch_every.max(1);
        let mut next = 0;
        let mut rejected = 0u32;

        for frame in 0..args.frames {
            #[allow(clippy::cast_precision_loss)]
            let t = frame as f32 * FIXED_TIMESTEP;
            scene.set_world_pose(vehicle, vehicle_pose(t));

            if frame > 0 && frame % switch_every == 0 {
                let mode = cycle[next % cycle.len()];
                next += 1;
                if machine.set_mode(&mut scene, mode).is_err() {
                    rejected += 1;
                }
            }

            // Drift forward and yaw slowly while in manual.
            if machine.mode() == ViewMode::Manual {
                machine.manual_mut().set_input(PoseInput {
                    translation: Vec3::NEG_Z,
                    rotation: Vec3::new(0.0, 0.2, 0.0),
                });
            } else {
                machine.manual_mut().set_input(PoseInput::default());
            }

            machine.tick(&mut scene, FIXED_TIMESTEP);

            if frame % switch_every == switch_every - 1 {
                let external = cameras
                    .external
                    .map(|view| scene.world_pose(view).translation);
                tracing::info!(
                    "frame {frame}: {} mode, showing {}, external at {:?}",
                    machine.mode(),
                    displayed_view(&scene, &cameras),
                    external
                );
            }
        }

        tracing::info!(
            "Simulated {} frames: {} notifications, {} rejected requests, final mode {}",
            args.frames,
            scene.notifications().len(),
            rejected,
            machine.mode()
        );
        ExitCode::SUCCESS
    }
}
