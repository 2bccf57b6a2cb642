//! Terminal front end for the raster3d software renderer
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color as TermColor, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use log::{debug, info};
use raster3d_core::{
    Camera, Color, FrameBuffer, FrameStats, Mesh, Quaternion, RenderOptions, Renderer, SceneNode,
    Spin, Transform, Vector3, Wireframe,
};
use std::io::{self, stdout, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

pub mod renderer;

pub use renderer::HalfBlockPresenter;

/// Background used when clearing frames
pub const CLEAR_COLOR: Color = Color::rgb(20, 20, 20);

/// Degrees turned per key press
const NUDGE_DEGREES: f32 = 5.0;

/// Runtime settings for [`TerminalApp`]
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub fps: u32,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Camera distance from the model along +Z
    pub distance: f32,
    pub backface_culling: bool,
    /// Outline drawn triangles and mark their vertices
    pub wireframe: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            fov: 60.0,
            distance: 5.0,
            backface_culling: true,
            wireframe: false,
        }
    }
}

/// Scale and centre a mesh so its largest extent equals `size`.
pub fn fit_transform(mesh: &Mesh, size: f32) -> Transform {
    let Some((lo, hi)) = mesh.bounds() else {
        return Transform::default();
    };
    let extent = hi - lo;
    let largest = extent.x.max(extent.y).max(extent.z);
    if largest <= 0.0 {
        return Transform::default();
    }

    let factor = size / largest;
    let centre = (lo + hi) * 0.5;
    Transform::from_position(-centre.x * factor, -centre.y * factor, -centre.z * factor)
        .with_scale(Vector3::new(factor, factor, factor))
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    scene: SceneNode,
    camera: Camera,
    renderer: Renderer,
    frame: FrameBuffer,
    presenter: HalfBlockPresenter,
    spin: Spin,
    target_frame_time: Duration,
    paused: bool,
    running: bool,
    last_frame: Instant,
    fps_window: Instant,
    frame_count: u32,
    fps: f32,
    stats: FrameStats,
}

impl TerminalApp {
    /// `model` hangs under a root pivot node that carries the spin.
    pub fn new(model: SceneNode, config: &AppConfig) -> io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        let presenter = HalfBlockPresenter::new(1, CLEAR_COLOR);
        let (width, height) = presenter.frame_size(cols, rows);

        let mut camera = Camera::for_viewport(width, height);
        camera.position = Vector3::new(0.0, 0.0, config.distance);
        camera.fov = config.fov.to_radians();

        let mut scene = SceneNode::default();
        scene.add_child(model);

        info!(
            "terminal {}x{} cells, frame {}x{} pixels, {} nodes",
            cols,
            rows,
            width,
            height,
            scene.node_count()
        );

        let now = Instant::now();
        Ok(Self {
            scene,
            camera,
            renderer: Renderer::new(RenderOptions {
                backface_culling: config.backface_culling,
                wireframe: config.wireframe.then(Self::wireframe_style),
            }),
            frame: FrameBuffer::new(width, height),
            presenter,
            spin: Spin::tumble(),
            target_frame_time: Duration::from_secs_f64(1.0 / config.fps.max(1) as f64),
            paused: false,
            running: true,
            last_frame: now,
            fps_window: now,
            frame_count: 0,
            fps: 0.0,
            stats: FrameStats::default(),
        })
    }

    /// Convenience for a single mesh placed with `transform`
    pub fn with_mesh(mesh: Mesh, transform: Transform, config: &AppConfig) -> io::Result<Self> {
        Self::new(SceneNode::with_mesh(Rc::new(mesh), transform), config)
    }

    /// Half-block pixels are coarse, so markers stay one pixel wide
    fn wireframe_style() -> Wireframe {
        Wireframe {
            vertex_radius: Some(0),
            ..Wireframe::default()
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        while self.running {
            let frame_start = Instant::now();
            let dt = (frame_start - self.last_frame).as_secs_f32();
            self.last_frame = frame_start;

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?)?;
            }

            self.update(dt);
            self.render()?;

            let elapsed = frame_start.elapsed();
            if elapsed < self.target_frame_time {
                std::thread::sleep(self.target_frame_time - elapsed);
            }

            self.frame_count += 1;
            let window = self.fps_window.elapsed().as_secs_f32();
            if window >= 0.5 {
                self.fps = self.frame_count as f32 / window;
                self.frame_count = 0;
                self.fps_window = Instant::now();
                debug!("{:.1} fps, {}", self.fps, self.stats);
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        match event {
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                self.handle_key(code)
            }
            Event::Resize(cols, rows) => {
                let (width, height) = self.presenter.frame_size(cols, rows);
                self.frame.resize(width, height);
                self.camera.aspect = width as f32 / height.max(1) as f32;
                execute!(stdout(), terminal::Clear(ClearType::All))?;
                debug!("resized to {}x{} pixels", width, height);
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) {
        let nudge = |axis: Vector3, degrees: f32| Quaternion::from_axis_angle(axis, degrees);
        let delta = match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
                None
            }
            KeyCode::Char('c') => {
                let options = &mut self.renderer.options;
                options.backface_culling = !options.backface_culling;
                None
            }
            KeyCode::Char('l') => {
                let wireframe = &mut self.renderer.options.wireframe;
                *wireframe = match wireframe {
                    Some(_) => None,
                    None => Some(Self::wireframe_style()),
                };
                None
            }
            KeyCode::Char(' ') => {
                self.paused = !self.paused;
                None
            }
            KeyCode::Char('w') | KeyCode::Up => Some(nudge(Vector3::X, -NUDGE_DEGREES)),
            KeyCode::Char('s') | KeyCode::Down => Some(nudge(Vector3::X, NUDGE_DEGREES)),
            KeyCode::Char('a') | KeyCode::Left => Some(nudge(Vector3::Y, -NUDGE_DEGREES)),
            KeyCode::Char('d') | KeyCode::Right => Some(nudge(Vector3::Y, NUDGE_DEGREES)),
            KeyCode::Char('e') => Some(nudge(Vector3::Z, NUDGE_DEGREES)),
            KeyCode::Char('r') => Some(nudge(Vector3::Z, -NUDGE_DEGREES)),
            _ => None,
        };

        if let Some(delta) = delta {
            self.pivot_mut().rotate(delta);
        }
    }

    fn update(&mut self, dt: f32) {
        if !self.paused {
            let step = self.spin.step(dt);
            self.pivot_mut().rotate(step);
        }
    }

    fn pivot_mut(&mut self) -> &mut Transform {
        &mut self.scene.transform
    }

    fn render(&mut self) -> io::Result<()> {
        self.frame.clear(CLEAR_COLOR);
        self.stats = self.renderer.render(&self.scene, &self.camera, &mut self.frame);

        let mut stdout = stdout();
        self.presenter.draw(&self.frame, &mut stdout)?;

        // Draw UI overlay
        let (width, _) = terminal::size()?;
        let on_off = |flag: bool| if flag { "on" } else { "off" };
        let options = &self.renderer.options;
        let hud = format!(
            "raster3d | FPS {:.1} | {} | cull={} wire={} | WASD/arrows rotate, E/R roll, C cull, L wireframe, space pause, Q quit",
            self.fps,
            self.stats,
            on_off(options.backface_culling),
            on_off(options.wireframe.is_some()),
        );
        let hud: String = hud.chars().take(width as usize).collect();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(TermColor::Yellow),
            Print(hud),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
