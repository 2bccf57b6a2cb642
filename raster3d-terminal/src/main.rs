//! raster3d terminal demo - rotating cube or STL model
//!
//! Controls:
//!   - WASD / Arrow Keys: Rotate the model
//!   - E/R: Roll rotation
//!   - C: Toggle back-face culling
//!   - L: Toggle the wireframe overlay
//!   - Space: Pause the spin
//!   - Q/ESC: Quit
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use raster3d_core::{stl, Color, Mesh, Transform};
use raster3d_terminal::{fit_transform, AppConfig, TerminalApp};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "raster3d-terminal", version, about = "Software-rasterized 3D in the terminal")]
struct Args {
    /// STL file to display instead of the built-in cube
    stl: Option<PathBuf>,

    /// Edge length of the cube, or the size an STL model is fitted to
    #[arg(long, default_value_t = 2.0)]
    size: f32,

    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 60.0)]
    fov: f32,

    /// Camera distance from the model
    #[arg(long, default_value_t = 5.0)]
    distance: f32,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Draw back faces too
    #[arg(long)]
    no_cull: bool,

    /// Outline triangles and mark vertices over the filled faces
    #[arg(long)]
    wireframe: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = AppConfig {
        fps: args.fps,
        fov: args.fov,
        distance: args.distance,
        backface_culling: !args.no_cull,
        wireframe: args.wireframe,
    };

    let (mesh, transform) = match &args.stl {
        Some(path) => {
            let mesh = stl::load_stl(path, Color::rgb(180, 180, 200))
                .with_context(|| format!("failed to load {}", path.display()))?;
            let transform = fit_transform(&mesh, args.size);
            (mesh, transform)
        }
        None => (Mesh::cube(args.size), Transform::default()),
    };
    info!("rendering {} triangles", mesh.face_count());

    let mut app = TerminalApp::with_mesh(mesh, transform, &config)
        .context("failed to initialise the terminal")?;
    app.run().context("terminal renderer failed")?;

    Ok(())
}
