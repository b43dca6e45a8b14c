use bevy::prelude::*;
use bevy::window::WindowResolution;
use clap::Parser;
use real_water::cpu::layout::GenerationMode;
use real_water::{RealWaterPlugin, SimConfig, TimeStep};

// seconds the initial layout is shown before the simulation starts
const START_DELAY: f32 = 1.0;

/// GPU SPH water demo
#[derive(Parser, Debug)]
#[command(name = "real_water")]
#[command(about = "Three-pass SPH water simulation rendered as instanced billboards", long_about = None)]
struct Args {
    /// Initial layout: 0 random cube, 1 dense cube, 2 plane A, 3 plane B, 4 sparse cube
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(i32).range(0..=4))]
    mode: i32,

    /// Step by the default fixed 0.25 ms instead of the frame delta
    #[arg(long, conflicts_with = "fixed_step_ms")]
    fixed_step: bool,

    /// Step by a fixed number of milliseconds instead of the frame delta
    #[arg(long, value_name = "MS", value_parser = parse_step_millis)]
    fixed_step_ms: Option<f32>,
}

impl Args {
    fn generation_mode(&self) -> GenerationMode {
        GenerationMode::from_index(self.mode)
    }

    fn time_step(&self) -> TimeStep {
        match (self.fixed_step_ms, self.fixed_step) {
            (Some(millis), _) => TimeStep::Fixed { millis },
            (None, true) => TimeStep::DEFAULT_FIXED,
            (None, false) => TimeStep::WallClock,
        }
    }
}

fn parse_step_millis(s: &str) -> Result<f32, String> {
    let millis: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if millis.is_finite() && millis > 0.0 {
        Ok(millis)
    } else {
        Err(format!("step must be a positive number of milliseconds, got {millis}"))
    }
}

fn main() {
    let args = Args::parse();
    let mode = args.generation_mode();
    let time_step = args.time_step();

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Real Water".into(),
                resolution: WindowResolution::new(800.0, 800.0),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::Srgba(
            bevy::color::palettes::css::DARK_SLATE_GRAY,
        )))
        .insert_resource(SimConfig {
            generation_mode: mode,
            time_step,
            ..default()
        })
        .add_plugins(RealWaterPlugin)
        .add_systems(Startup, setup)
        .add_systems(Update, start_after_delay)
        .run();
}

fn setup(mut commands: Commands, config: Res<SimConfig>) {
    let eye = config.camera.eye;
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(eye.x, eye.y, eye.z).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    info!("starting with {}", config.generation_mode.label());
}

fn start_after_delay(time: Res<Time>, mut config: ResMut<SimConfig>) {
    if !config.running && time.elapsed_secs() > START_DELAY {
        config.running = true;
        info!("simulation started");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_sparse_cube_on_the_wall_clock() {
        let args = Args::try_parse_from(["real_water"]).unwrap();
        assert_eq!(args.generation_mode(), GenerationMode::SparseCube);
        assert_eq!(args.time_step(), TimeStep::WallClock);
    }

    #[test]
    fn reads_mode_and_step() {
        let args = Args::try_parse_from(["real_water", "--mode", "1", "--fixed-step-ms", "5"]).unwrap();
        assert_eq!(args.generation_mode(), GenerationMode::DenseCube);
        assert_eq!(args.time_step(), TimeStep::Fixed { millis: 5.0 });

        let args = Args::try_parse_from(["real_water", "--fixed-step"]).unwrap();
        assert_eq!(args.time_step(), TimeStep::DEFAULT_FIXED);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(Args::try_parse_from(["real_water", "--mode", "7"]).is_err());
        assert!(Args::try_parse_from(["real_water", "--mode", "abc"]).is_err());
        assert!(Args::try_parse_from(["real_water", "--fixed-step-ms", "abc"]).is_err());
        assert!(Args::try_parse_from(["real_water", "--fixed-step-ms", "-1"]).is_err());
        assert!(Args::try_parse_from(["real_water", "--fixed-step", "--fixed-step-ms", "1"]).is_err());
        assert!(Args::try_parse_from(["real_water", "3", "5"]).is_err());
    }
}
