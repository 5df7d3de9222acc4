use iced::alignment::{Horizontal, Vertical};
use iced::widget::{button, canvas, column, container, row, scrollable, shader, stack, text};
use iced::{Alignment, Color, Element, Font, Length, Subscription, Task, Theme};

use std::sync::Arc;
use std::time::{Duration, Instant};

mod api;
mod config;
mod gpu;
mod state;
mod ui;

use api::models::{GeneratedImage, Scenario, World3D};
use api::{ApiClient, ApiError};
use config::Config;
use gpu::{OrbitCamera, SceneContent, WorldMesh};
use state::{DebugLog, Gallery};
use ui::panorama::{PanoramaRotation, PanoramaStrip};
use ui::world::{CameraMotion, WorldViewport};

/// Height of the main viewer surface, panorama and 3D alike
const VIEWER_HEIGHT: f32 = 450.0;

const MUTED: Color = Color::from_rgb(0.612, 0.639, 0.686);
const ERROR_TEXT: Color = Color::from_rgb(0.937, 0.267, 0.267);

/// Connectivity to the generation API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiStatus {
    Checking,
    Online,
    Offline,
}

/// Which viewer fills the main panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewMode {
    Panorama,
    World,
}

/// A downloaded panorama, probed for its native size
#[derive(Debug, Clone)]
struct PanoramaTexture {
    handle: iced::widget::image::Handle,
    width: f32,
    height: f32,
}

/// Download state of the current panorama
enum PanoramaAsset {
    None,
    Loading {
        image_id: String,
    },
    Ready {
        image_id: String,
        handle: iced::widget::image::Handle,
        width: f32,
        height: f32,
    },
}

/// Download state of the current 3D world
enum WorldAsset {
    None,
    Loading {
        world_id: String,
    },
    Ready {
        world_id: String,
        mesh: Arc<WorldMesh>,
        revision: u64,
    },
}

/// Abort handles for in-flight generation requests
///
/// A superseding request aborts the stale poll loop before starting
/// its own.
#[derive(Default)]
struct InFlight {
    image: Option<iced::task::Handle>,
    world: Option<iced::task::Handle>,
}

/// Main application state
struct IslandViewer {
    /// Shared HTTP client for the generation API
    client: ApiClient,
    api_status: ApiStatus,
    /// Verbatim last health response, or the failure reason
    last_health: Option<String>,
    images: Gallery<GeneratedImage>,
    worlds: Gallery<World3D>,
    scenario: Scenario,
    generating_image: bool,
    generating_world: bool,
    error: Option<String>,
    debug_log: DebugLog,
    debug_open: bool,
    view_mode: ViewMode,
    rotation: PanoramaRotation,
    panorama: PanoramaAsset,
    world_scene: WorldAsset,
    camera: OrbitCamera,
    /// Seconds of placeholder animation time
    clock: f32,
    /// Bumped whenever a new mesh arrives so the GPU re-uploads it
    mesh_revision: u64,
    jobs: InFlight,
    last_tick: Option<Instant>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// Animation frame for auto-rotation and the placeholder cube
    Tick(Instant),
    /// Health probe finished
    HealthChecked(Result<String, ApiError>),
    /// Startup gallery fetch finished
    GalleryLoaded(Result<Vec<GeneratedImage>, ApiError>),
    /// User picked a scenario
    ScenarioPicked(Scenario),
    /// User pressed Generate
    GeneratePressed,
    /// Panorama generation (including job polling) finished
    GenerationFinished(Result<GeneratedImage, ApiError>),
    /// User pressed Generate 3D World
    GenerateWorldPressed,
    /// World generation (including job polling) finished
    WorldGenerationFinished(Result<World3D, ApiError>),
    /// User selected a panorama in the gallery
    ImageSelected(String),
    /// User selected a world in the gallery
    WorldSelected(String),
    /// User pressed a gallery delete button
    DeleteImagePressed(String),
    /// Server confirmed (or refused) the delete
    ImageDeleted(String, Result<(), ApiError>),
    /// Panorama bytes arrived and were probed
    PanoramaFetched(String, Result<PanoramaTexture, ApiError>),
    /// GLB bytes arrived and were decoded
    WorldMeshFetched(String, Result<Arc<WorldMesh>, ApiError>),
    /// Lookup of a world's source panorama finished
    SourceImageFetched(Result<GeneratedImage, ApiError>),
    /// User toggled between the panorama and 3D views
    ViewModeChanged(ViewMode),
    /// User pressed Test connection
    TestConnectionPressed,
    /// User opened or closed the debug panel
    ToggleDebugPanel,
    /// Panorama drag began
    PanoramaDragStarted,
    /// Panorama drag moved by a horizontal delta
    PanoramaDragged(f32),
    /// Panorama drag ended
    PanoramaDragEnded,
    /// Camera gesture from the 3D viewport
    WorldCamera(CameraMotion),
}

impl IslandViewer {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = Config::from_env();
        println!("🏝️  Island Viewer starting (API at {})", config.api_url);

        let mut app = Self::with_client(ApiClient::new(&config));
        let base = app.client.base_url().to_string();
        app.debug_log.push(format!("API base URL: {base}"));

        let health = app.probe_health(true);
        let gallery = app.fetch_gallery();
        (app, Task::batch([health, gallery]))
    }

    /// Fresh state around a configured API client
    fn with_client(client: ApiClient) -> Self {
        IslandViewer {
            client,
            api_status: ApiStatus::Checking,
            last_health: None,
            images: Gallery::new(),
            worlds: Gallery::new(),
            scenario: Scenario::default(),
            generating_image: false,
            generating_world: false,
            error: None,
            debug_log: DebugLog::new(),
            debug_open: false,
            view_mode: ViewMode::Panorama,
            rotation: PanoramaRotation::default(),
            panorama: PanoramaAsset::None,
            world_scene: WorldAsset::None,
            camera: OrbitCamera::default(),
            clock: 0.0,
            mesh_revision: 0,
            jobs: InFlight::default(),
            last_tick: None,
        }
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick(now) => {
                let dt = self
                    .last_tick
                    .map(|previous| (now - previous).as_secs_f32().min(0.1))
                    .unwrap_or(0.016);
                self.last_tick = Some(now);

                match self.view_mode {
                    ViewMode::Panorama => self.rotation.tick(),
                    ViewMode::World => self.clock += dt,
                }

                Task::none()
            }

            Message::HealthChecked(Ok(body)) => {
                self.api_status = ApiStatus::Online;
                self.last_health = Some(body);
                self.debug_log.push("Health check OK");
                Task::none()
            }

            Message::HealthChecked(Err(err)) => {
                eprintln!("⚠️  API health check failed: {err}");
                self.api_status = ApiStatus::Offline;
                self.last_health = Some(err.to_string());
                self.debug_log.push(format!("Health check failed: {err}"));
                Task::none()
            }

            Message::GalleryLoaded(Ok(images)) => {
                println!("📷 Loaded {} panoramas from the gallery", images.len());
                self.debug_log
                    .push(format!("Gallery loaded ({} images)", images.len()));
                self.images.replace_all(images);
                self.load_current_panorama()
            }

            Message::GalleryLoaded(Err(err)) => {
                eprintln!("⚠️  Gallery fetch failed: {err}");
                self.debug_log.push(format!("Gallery fetch failed: {err}"));
                self.error = Some("Failed to fetch images".to_string());
                if err.is_connectivity() {
                    self.api_status = ApiStatus::Offline;
                    return self.probe_health(false);
                }
                Task::none()
            }

            Message::ScenarioPicked(scenario) => {
                // Locked while a request is in flight, like the form control
                if !self.generating_image {
                    self.scenario = scenario;
                }
                Task::none()
            }

            Message::GeneratePressed => {
                if self.generating_image || self.api_status == ApiStatus::Offline {
                    return Task::none();
                }

                self.generating_image = true;
                self.error = None;
                self.debug_log
                    .push(format!("POST /api/generate ({})", self.scenario.id()));

                if let Some(stale) = self.jobs.image.take() {
                    stale.abort();
                }

                let client = self.client.clone();
                let scenario = self.scenario;
                let (task, handle) = Task::perform(
                    async move { client.generate_panorama(scenario).await },
                    Message::GenerationFinished,
                )
                .abortable();
                self.jobs.image = Some(handle);
                task
            }

            Message::GenerationFinished(Ok(image)) => {
                self.generating_image = false;
                self.jobs.image = None;
                println!("✅ Panorama ready: {} ({})", image.id, image.scenario);
                self.debug_log.push(format!("Panorama {} ready", image.id));

                self.images.prepend_and_select(image);
                self.view_mode = ViewMode::Panorama;
                self.rotation = PanoramaRotation::default();
                self.load_current_panorama()
            }

            Message::GenerationFinished(Err(err)) => {
                self.generating_image = false;
                self.jobs.image = None;
                eprintln!("⚠️  Panorama generation failed: {err}");
                self.debug_log.push(format!("Generation failed: {err}"));
                self.error = Some(err.to_string());

                if err.is_connectivity() {
                    self.api_status = ApiStatus::Offline;
                    self.debug_log.push("Re-checking API health");
                    return self.probe_health(false);
                }
                Task::none()
            }

            Message::GenerateWorldPressed => {
                let Some(image_id) = self.images.current_id().map(str::to_string) else {
                    return Task::none();
                };
                if self.generating_world || self.api_status == ApiStatus::Offline {
                    return Task::none();
                }

                self.generating_world = true;
                self.error = None;
                self.debug_log
                    .push(format!("POST /api/generate-3d ({image_id})"));

                if let Some(stale) = self.jobs.world.take() {
                    stale.abort();
                }

                let client = self.client.clone();
                let (task, handle) = Task::perform(
                    async move { client.generate_world(&image_id).await },
                    Message::WorldGenerationFinished,
                )
                .abortable();
                self.jobs.world = Some(handle);
                task
            }

            Message::WorldGenerationFinished(Ok(world)) => {
                self.generating_world = false;
                self.jobs.world = None;
                println!("✅ 3D world ready: {}", world.id);
                self.debug_log.push(format!("World {} ready", world.id));

                self.worlds.prepend_and_select(world);
                self.view_mode = ViewMode::World;
                self.camera = OrbitCamera::default();
                self.load_current_world()
            }

            Message::WorldGenerationFinished(Err(err)) => {
                self.generating_world = false;
                self.jobs.world = None;
                eprintln!("⚠️  World generation failed: {err}");
                self.debug_log.push(format!("World generation failed: {err}"));
                self.error = Some(err.to_string());

                if err.is_connectivity() {
                    self.api_status = ApiStatus::Offline;
                    self.debug_log.push("Re-checking API health");
                    return self.probe_health(false);
                }
                Task::none()
            }

            Message::ImageSelected(id) => {
                let changed = self.images.current_id() != Some(id.as_str());
                if self.images.select(&id) {
                    self.view_mode = ViewMode::Panorama;
                    if changed {
                        self.rotation = PanoramaRotation::default();
                    }
                    return self.load_current_panorama();
                }
                Task::none()
            }

            Message::WorldSelected(id) => {
                if !self.worlds.select(&id) {
                    return Task::none();
                }
                self.view_mode = ViewMode::World;

                let loaded = match &self.world_scene {
                    WorldAsset::Loading { world_id } | WorldAsset::Ready { world_id, .. } => {
                        world_id == &id
                    }
                    WorldAsset::None => false,
                };
                if !loaded {
                    self.camera = OrbitCamera::default();
                }

                let mesh_task = self.load_current_world();

                // Keep the panorama side in sync with the world's source image
                let source = self.worlds.current().map(|world| world.image_id.clone());
                let image_task = match source {
                    Some(image_id) => {
                        if self.images.select(&image_id) {
                            self.load_current_panorama()
                        } else {
                            // Source panorama is not in the gallery (expired
                            // listing); fetch it individually
                            self.debug_log.push(format!("GET /api/images/{image_id}"));
                            let client = self.client.clone();
                            Task::perform(
                                async move { client.fetch_image(&image_id).await },
                                Message::SourceImageFetched,
                            )
                        }
                    }
                    None => Task::none(),
                };

                Task::batch([mesh_task, image_task])
            }

            Message::SourceImageFetched(Ok(image)) => {
                self.debug_log
                    .push(format!("Source panorama {} fetched", image.id));
                self.images.adopt_and_select(image);
                self.load_current_panorama()
            }

            Message::SourceImageFetched(Err(err)) => {
                self.debug_log
                    .push(format!("Source panorama lookup failed: {err}"));
                Task::none()
            }

            Message::DeleteImagePressed(id) => {
                self.debug_log.push(format!("DELETE /api/images/{id}"));
                let client = self.client.clone();
                let target = id.clone();
                Task::perform(
                    async move { client.delete_image(&target).await },
                    move |result| Message::ImageDeleted(id.clone(), result),
                )
            }

            Message::ImageDeleted(id, Ok(())) => {
                println!("🗑️  Deleted panorama {id}");
                self.debug_log.push(format!("Deleted image {id}"));

                self.images.remove(&id);
                self.worlds.retain(|world| world.image_id != id);
                if self.view_mode == ViewMode::World && self.worlds.current().is_none() {
                    self.view_mode = ViewMode::Panorama;
                }

                let panorama = self.load_current_panorama();
                let world = self.load_current_world();
                Task::batch([panorama, world])
            }

            Message::ImageDeleted(id, Err(err)) => {
                eprintln!("⚠️  Delete failed for {id}: {err}");
                self.debug_log.push(format!("Delete {id} failed: {err}"));
                self.error = Some(err.to_string());

                if err.is_connectivity() {
                    self.api_status = ApiStatus::Offline;
                    return self.probe_health(false);
                }
                Task::none()
            }

            Message::PanoramaFetched(id, result) => {
                let expected =
                    matches!(&self.panorama, PanoramaAsset::Loading { image_id } if *image_id == id);
                if !expected {
                    // A download for a superseded selection
                    return Task::none();
                }

                match result {
                    Ok(texture) => {
                        println!(
                            "🖼️  Panorama texture loaded ({}x{})",
                            texture.width, texture.height
                        );
                        self.panorama = PanoramaAsset::Ready {
                            image_id: id,
                            handle: texture.handle,
                            width: texture.width,
                            height: texture.height,
                        };
                    }
                    Err(err) => {
                        eprintln!("⚠️  Panorama download failed: {err}");
                        self.debug_log.push(format!("Panorama {id} failed: {err}"));
                        self.panorama = PanoramaAsset::None;
                        self.error = Some(err.to_string());
                    }
                }
                Task::none()
            }

            Message::WorldMeshFetched(id, result) => {
                let expected =
                    matches!(&self.world_scene, WorldAsset::Loading { world_id } if *world_id == id);
                if !expected {
                    return Task::none();
                }

                match result {
                    Ok(mesh) => {
                        self.mesh_revision += 1;
                        println!("✅ World mesh ready ({} vertices)", mesh.vertices.len());
                        self.debug_log.push(format!("World {id} mesh decoded"));
                        self.world_scene = WorldAsset::Ready {
                            world_id: id,
                            mesh,
                            revision: self.mesh_revision,
                        };
                    }
                    Err(err) => {
                        eprintln!("⚠️  World download failed: {err}");
                        self.debug_log.push(format!("World {id} failed: {err}"));
                        self.world_scene = WorldAsset::None;
                        self.error = Some(err.to_string());
                    }
                }
                Task::none()
            }

            Message::ViewModeChanged(mode) => {
                self.view_mode = mode;
                Task::none()
            }

            Message::TestConnectionPressed => {
                self.debug_log.push("Testing connection...");
                self.probe_health(true)
            }

            Message::ToggleDebugPanel => {
                self.debug_open = !self.debug_open;
                Task::none()
            }

            Message::PanoramaDragStarted => {
                self.rotation.begin_drag();
                Task::none()
            }

            Message::PanoramaDragged(delta_x) => {
                self.rotation.apply_drag(delta_x);
                Task::none()
            }

            Message::PanoramaDragEnded => {
                self.rotation.end_drag();
                Task::none()
            }

            Message::WorldCamera(motion) => {
                match motion {
                    CameraMotion::Orbit { dx, dy } => self.camera.orbit(dx, dy),
                    CameraMotion::Pan { dx, dy } => self.camera.pan(dx, dy),
                    CameraMotion::Zoom(lines) => self.camera.zoom(lines),
                }
                Task::none()
            }
        }
    }

    /// Fire a health probe; `announce` switches the badge to Checking
    fn probe_health(&mut self, announce: bool) -> Task<Message> {
        if announce {
            self.api_status = ApiStatus::Checking;
        }
        let client = self.client.clone();
        Task::perform(
            async move { client.check_health().await },
            Message::HealthChecked,
        )
    }

    fn fetch_gallery(&mut self) -> Task<Message> {
        self.debug_log.push("GET /api/images");
        let client = self.client.clone();
        Task::perform(
            async move { client.fetch_images().await },
            Message::GalleryLoaded,
        )
    }

    /// Start downloading the current panorama unless it is already here
    fn load_current_panorama(&mut self) -> Task<Message> {
        let (id, url) = match self.images.current() {
            Some(image) => (image.id.clone(), image.image_url.clone()),
            None => {
                self.panorama = PanoramaAsset::None;
                return Task::none();
            }
        };

        let already = match &self.panorama {
            PanoramaAsset::Loading { image_id } | PanoramaAsset::Ready { image_id, .. } => {
                image_id == &id
            }
            PanoramaAsset::None => false,
        };
        if already {
            return Task::none();
        }

        self.debug_log.push(format!("GET {url}"));
        self.panorama = PanoramaAsset::Loading {
            image_id: id.clone(),
        };

        let client = self.client.clone();
        Task::perform(fetch_panorama(client, url), move |result| {
            Message::PanoramaFetched(id.clone(), result)
        })
    }

    /// Start downloading and decoding the current world mesh
    fn load_current_world(&mut self) -> Task<Message> {
        let (id, url) = match self.worlds.current() {
            Some(world) => (world.id.clone(), world.world_url.clone()),
            None => {
                self.world_scene = WorldAsset::None;
                return Task::none();
            }
        };

        let already = match &self.world_scene {
            WorldAsset::Loading { world_id } | WorldAsset::Ready { world_id, .. } => {
                world_id == &id
            }
            WorldAsset::None => false,
        };
        if already {
            return Task::none();
        }

        self.debug_log.push(format!("GET {url}"));
        self.world_scene = WorldAsset::Loading {
            world_id: id.clone(),
        };

        let client = self.client.clone();
        Task::perform(fetch_world_mesh(client, url), move |result| {
            Message::WorldMeshFetched(id.clone(), result)
        })
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let header = container(
            column![
                text("Island Survival").size(40),
                text("Immersive 360° Panoramic Survival Scenarios")
                    .size(16)
                    .color(MUTED),
            ]
            .spacing(6)
            .align_x(Alignment::Center),
        )
        .width(Length::Fill)
        .center_x(Length::Fill);

        let viewer = match self.view_mode {
            ViewMode::Panorama => self.panorama_panel(),
            ViewMode::World => self.world_panel(),
        };

        let main_panel = column![self.mode_toggle(), viewer]
            .spacing(12)
            .width(Length::FillPortion(3));

        let sidebar = column![
            self.status_card(),
            ui::controls::generation_panel(
                self.scenario,
                self.generating_image,
                self.generating_world,
                self.images.current().is_some(),
                self.api_status,
            ),
            ui::gallery::image_gallery(&self.images),
            ui::gallery::world_gallery(&self.worlds),
        ]
        .spacing(16)
        .width(Length::FillPortion(1));

        let mut page = column![header].spacing(16).padding(24);

        if let Some(error) = &self.error {
            page = page.push(
                container(text(error).size(14).color(ERROR_TEXT))
                    .width(Length::Fill)
                    .padding(12)
                    .style(container::rounded_box),
            );
        }

        page = page.push(row![main_panel, sidebar].spacing(16));
        page = page.push(self.debug_panel());

        scrollable(page).into()
    }

    fn mode_toggle(&self) -> Element<Message> {
        let tab = |label: &'static str, mode: ViewMode| {
            button(text(label).size(14))
                .style(if self.view_mode == mode {
                    button::primary
                } else {
                    button::secondary
                })
                .on_press(Message::ViewModeChanged(mode))
        };

        row![
            tab("🖼️ Panorama", ViewMode::Panorama),
            tab("🧊 3D World", ViewMode::World),
        ]
        .spacing(8)
        .into()
    }

    fn panorama_panel(&self) -> Element<Message> {
        let surface: Element<Message> = match &self.panorama {
            PanoramaAsset::Ready {
                handle,
                width,
                height,
                ..
            } => {
                let strip = PanoramaStrip {
                    handle: handle.clone(),
                    image_size: (*width, *height),
                    rotation: self.rotation.offset(),
                };

                let hint = container(
                    container(text("Drag to look around").size(13))
                        .padding(8)
                        .style(container::dark),
                )
                .width(Length::Fill)
                .height(Length::Fill)
                .align_x(Horizontal::Right)
                .align_y(Vertical::Bottom)
                .padding(16);

                stack![
                    canvas(strip).width(Length::Fill).height(Length::Fill),
                    hint,
                ]
                .width(Length::Fill)
                .height(Length::Fixed(VIEWER_HEIGHT))
                .into()
            }
            PanoramaAsset::Loading { .. } => placeholder_panel("⏳ Loading panorama..."),
            PanoramaAsset::None => placeholder_panel("No panoramas generated yet"),
        };

        let mut panel = column![surface];
        if let Some(image) = self.images.current() {
            panel = panel.push(
                container(
                    column![
                        text(&image.scenario).size(18),
                        text(&image.prompt).size(13).color(MUTED),
                        text(image.created_label()).size(11).color(MUTED),
                    ]
                    .spacing(4),
                )
                .width(Length::Fill)
                .padding(16)
                .style(container::dark),
            );
        }

        container(panel)
            .width(Length::Fill)
            .style(container::rounded_box)
            .into()
    }

    fn world_panel(&self) -> Element<Message> {
        let content = match &self.world_scene {
            WorldAsset::Ready { mesh, revision, .. } => SceneContent::Mesh {
                mesh: mesh.clone(),
                revision: *revision,
            },
            _ => SceneContent::Placeholder { spin: self.clock },
        };

        let viewport = WorldViewport {
            camera: self.camera,
            content,
        };

        let controls_overlay = container(
            container(
                column![
                    text("Controls").size(14),
                    text("🖱️ Left Click + Drag: Rotate view").size(11).color(MUTED),
                    text("🖱️ Right Click + Drag: Pan camera").size(11).color(MUTED),
                    text("🖱️ Scroll: Zoom in/out").size(11).color(MUTED),
                ]
                .spacing(3),
            )
            .padding(10)
            .style(container::dark),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .align_y(Vertical::Bottom)
        .padding(16);

        let status_note = match &self.world_scene {
            WorldAsset::Loading { .. } => Some("⏳ Downloading world mesh..."),
            WorldAsset::None if self.generating_world => Some("⏳ Generating world..."),
            WorldAsset::None => Some("No world loaded - generate one from a panorama"),
            WorldAsset::Ready { .. } => None,
        };

        let mut layers = stack![
            shader(viewport).width(Length::Fill).height(Length::Fill),
            controls_overlay,
        ];

        if let Some(note) = status_note {
            layers = layers.push(
                container(
                    container(text(note).size(13)).padding(8).style(container::dark),
                )
                .padding(16),
            );
        }

        container(
            layers
                .width(Length::Fill)
                .height(Length::Fixed(VIEWER_HEIGHT)),
        )
        .width(Length::Fill)
        .style(container::rounded_box)
        .into()
    }

    fn status_card(&self) -> Element<Message> {
        let (badge, label) = match self.api_status {
            ApiStatus::Checking => ("🟡", "Checking API..."),
            ApiStatus::Online => ("🟢", "API Online"),
            ApiStatus::Offline => ("🔴", "API Offline"),
        };

        container(
            row![
                text(badge).size(13),
                text(label).size(14).width(Length::Fill),
                button(text("Test").size(12))
                    .style(button::secondary)
                    .on_press(Message::TestConnectionPressed),
            ]
            .spacing(8)
            .align_y(Alignment::Center),
        )
        .width(Length::Fill)
        .padding(12)
        .style(container::rounded_box)
        .into()
    }

    fn debug_panel(&self) -> Element<Message> {
        let toggle_label = if self.debug_open {
            "▼ Debug"
        } else {
            "▶ Debug"
        };
        let toggle = button(text(toggle_label).size(13))
            .style(button::secondary)
            .on_press(Message::ToggleDebugPanel);

        if !self.debug_open {
            return row![toggle].into();
        }

        let health = self
            .last_health
            .as_deref()
            .unwrap_or("No health response yet");

        let mut log = column![].spacing(2);
        if self.debug_log.is_empty() {
            log = log.push(text("No API activity yet").size(11).color(MUTED));
        }
        for entry in self.debug_log.entries() {
            log = log.push(
                text(format!("[{}] {}", entry.at, entry.text))
                    .size(11)
                    .font(Font::MONOSPACE)
                    .color(MUTED),
            );
        }

        container(
            column![
                row![
                    toggle,
                    button(text("Test connection").size(13))
                        .style(button::secondary)
                        .on_press(Message::TestConnectionPressed),
                ]
                .spacing(8),
                text("Last health check").size(12),
                container(text(health).size(11).font(Font::MONOSPACE).color(MUTED))
                    .width(Length::Fill)
                    .padding(8)
                    .style(container::dark),
                container(scrollable(log)).max_height(160),
            ]
            .spacing(8),
        )
        .width(Length::Fill)
        .padding(12)
        .style(container::rounded_box)
        .into()
    }

    /// Animation frames only run while something on screen moves
    fn subscription(&self) -> Subscription<Message> {
        let animating = match self.view_mode {
            ViewMode::Panorama => matches!(self.panorama, PanoramaAsset::Ready { .. }),
            ViewMode::World => !matches!(self.world_scene, WorldAsset::Ready { .. }),
        };

        if animating {
            iced::time::every(Duration::from_millis(16)).map(Message::Tick)
        } else {
            Subscription::none()
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Dark filler panel shown when the viewer has nothing to draw yet
fn placeholder_panel(message: &str) -> Element<'_, Message> {
    container(text(message).size(14).color(MUTED))
        .center_x(Length::Fill)
        .center_y(Length::Fixed(VIEWER_HEIGHT))
        .style(container::dark)
        .into()
}

fn main() -> iced::Result {
    iced::application(
        "Island Survival",
        IslandViewer::update,
        IslandViewer::view,
    )
    .subscription(IslandViewer::subscription)
    .theme(IslandViewer::theme)
    .centered()
    .run_with(IslandViewer::new)
}

/// Download the panorama and probe its native dimensions
///
/// The wrap math needs the size before iced decodes the texture, so the
/// bytes are decoded once here and handed to iced as-is.
async fn fetch_panorama(client: ApiClient, url: String) -> Result<PanoramaTexture, ApiError> {
    let bytes = client.fetch_asset(&url).await?;

    let probed = image::load_from_memory(&bytes)
        .map_err(|err| ApiError::Unexpected(format!("image decode failed: {err}")))?;
    let (width, height) = (probed.width() as f32, probed.height() as f32);

    Ok(PanoramaTexture {
        handle: iced::widget::image::Handle::from_bytes(bytes),
        width,
        height,
    })
}

/// Download the world GLB and decode it into GPU-ready buffers
async fn fetch_world_mesh(client: ApiClient, url: String) -> Result<Arc<WorldMesh>, ApiError> {
    let bytes = client.fetch_asset(&url).await?;

    let mesh = gpu::mesh::decode_glb(&bytes)
        .map_err(|err| ApiError::Unexpected(format!("world mesh decode failed: {err}")))?;

    Ok(Arc::new(mesh))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    fn sample_image(id: &str, scenario: &str) -> GeneratedImage {
        GeneratedImage {
            id: id.to_string(),
            prompt: format!("A {scenario} panorama"),
            image_url: format!("/images/{id}.png"),
            created_at: "2025-06-01T12:00:00".to_string(),
            scenario: scenario.to_string(),
        }
    }

    fn sample_world(id: &str, image_id: &str) -> World3D {
        World3D {
            id: id.to_string(),
            image_id: image_id.to_string(),
            world_url: format!("/worlds/{id}.glb"),
            created_at: "2025-06-01T12:30:00".to_string(),
            scenario: "beach".to_string(),
        }
    }

    fn test_app() -> IslandViewer {
        IslandViewer::with_client(ApiClient::new(&Config::default()))
    }

    #[test]
    fn test_gallery_load_selects_first_and_starts_download() {
        let mut app = test_app();

        let _ = app.update(Message::GalleryLoaded(Ok(vec![
            sample_image("img-1", "beach"),
            sample_image("img-2", "jungle"),
        ])));

        assert_eq!(app.images.current_id(), Some("img-1"));
        assert!(
            matches!(&app.panorama, PanoramaAsset::Loading { image_id } if image_id == "img-1")
        );
    }

    #[test]
    fn test_generation_success_prepends_and_selects() {
        let mut app = test_app();
        let _ = app.update(Message::GalleryLoaded(Ok(vec![sample_image(
            "img-old", "night",
        )])));

        app.generating_image = true;
        let _ = app.update(Message::GenerationFinished(Ok(sample_image(
            "img-new", "beach",
        ))));

        assert!(!app.generating_image);
        assert_eq!(app.images.len(), 2);
        assert_eq!(app.images.items()[0].id, "img-new");
        assert_eq!(app.images.current_id(), Some("img-new"));
        assert_eq!(app.view_mode, ViewMode::Panorama);
        assert!(
            matches!(&app.panorama, PanoramaAsset::Loading { image_id } if image_id == "img-new")
        );
    }

    #[test]
    fn test_generation_network_error_goes_offline() {
        let mut app = test_app();
        app.api_status = ApiStatus::Online;
        app.generating_image = true;

        let _ = app.update(Message::GenerationFinished(Err(ApiError::Network(
            "connection refused".to_string(),
        ))));

        assert!(!app.generating_image);
        assert_eq!(app.api_status, ApiStatus::Offline);
        assert!(app.error.is_some());
        // The silent health re-probe is on the log
        assert!(app
            .debug_log
            .entries()
            .any(|entry| entry.text.contains("Re-checking")));
    }

    #[test]
    fn test_server_error_does_not_go_offline() {
        let mut app = test_app();
        app.api_status = ApiStatus::Online;
        app.generating_image = true;

        let _ = app.update(Message::GenerationFinished(Err(ApiError::Server {
            status: 500,
            detail: "CUDA out of memory".to_string(),
        })));

        assert_eq!(app.api_status, ApiStatus::Online);
        assert!(app.error.as_deref().unwrap().contains("500"));
    }

    #[test]
    fn test_world_completion_switches_to_3d_view() {
        let mut app = test_app();
        let _ = app.update(Message::GalleryLoaded(Ok(vec![sample_image(
            "img-1", "beach",
        )])));

        app.generating_world = true;
        let _ = app.update(Message::WorldGenerationFinished(Ok(sample_world(
            "world-1", "img-1",
        ))));

        assert!(!app.generating_world);
        assert_eq!(app.view_mode, ViewMode::World);
        assert_eq!(app.worlds.current_id(), Some("world-1"));
        assert!(
            matches!(&app.world_scene, WorldAsset::Loading { world_id } if world_id == "world-1")
        );
    }

    #[test]
    fn test_delete_drops_derived_worlds() {
        let mut app = test_app();
        let _ = app.update(Message::GalleryLoaded(Ok(vec![
            sample_image("img-1", "beach"),
            sample_image("img-2", "jungle"),
        ])));
        app.worlds.prepend_and_select(sample_world("world-1", "img-1"));
        app.view_mode = ViewMode::World;

        let _ = app.update(Message::ImageDeleted("img-1".to_string(), Ok(())));

        assert_eq!(app.images.len(), 1);
        assert_eq!(app.images.current_id(), Some("img-2"));
        assert!(app.worlds.is_empty());
        // Nothing left to show in 3D
        assert_eq!(app.view_mode, ViewMode::Panorama);
    }

    #[test]
    fn test_scenario_change_ignored_while_generating() {
        let mut app = test_app();
        app.generating_image = true;

        let _ = app.update(Message::ScenarioPicked(Scenario::Beach));

        assert_eq!(app.scenario, Scenario::Random);

        app.generating_image = false;
        let _ = app.update(Message::ScenarioPicked(Scenario::Beach));
        assert_eq!(app.scenario, Scenario::Beach);
    }

    #[test]
    fn test_drag_pauses_auto_rotation() {
        let mut app = test_app();

        let _ = app.update(Message::PanoramaDragStarted);
        let _ = app.update(Message::PanoramaDragged(24.0));
        let _ = app.update(Message::Tick(Instant::now()));
        assert_eq!(app.rotation.offset(), 24.0);

        let _ = app.update(Message::PanoramaDragEnded);
        let _ = app.update(Message::Tick(Instant::now()));
        assert_eq!(app.rotation.offset(), 24.5);
    }

    #[test]
    fn test_camera_gestures_move_the_camera() {
        let mut app = test_app();
        let home = app.camera.eye();

        let _ = app.update(Message::WorldCamera(CameraMotion::Zoom(2.0)));
        let zoomed = app.camera.eye();
        assert!((zoomed - home).magnitude() > 1e-3);

        let _ = app.update(Message::WorldCamera(CameraMotion::Orbit {
            dx: 40.0,
            dy: 0.0,
        }));
        assert!((app.camera.eye() - zoomed).magnitude() > 1e-3);
    }

    #[test]
    fn test_health_results_update_the_badge() {
        let mut app = test_app();

        let _ = app.update(Message::HealthChecked(Ok("{\"status\": \"ok\"}".into())));
        assert_eq!(app.api_status, ApiStatus::Online);
        assert_eq!(app.last_health.as_deref(), Some("{\"status\": \"ok\"}"));

        let _ = app.update(Message::HealthChecked(Err(ApiError::Timeout)));
        assert_eq!(app.api_status, ApiStatus::Offline);
        assert!(app.last_health.as_deref().unwrap().contains("timed out"));
    }

    #[test]
    fn test_stale_panorama_download_is_ignored() {
        let mut app = test_app();
        app.panorama = PanoramaAsset::Loading {
            image_id: "img-b".to_string(),
        };

        let texture = PanoramaTexture {
            handle: iced::widget::image::Handle::from_bytes(vec![0u8; 4]),
            width: 2048.0,
            height: 1024.0,
        };
        let _ = app.update(Message::PanoramaFetched("img-a".to_string(), Ok(texture)));

        assert!(
            matches!(&app.panorama, PanoramaAsset::Loading { image_id } if image_id == "img-b")
        );
    }

    #[test]
    fn test_world_selection_aligns_source_image() {
        let mut app = test_app();
        let _ = app.update(Message::GalleryLoaded(Ok(vec![
            sample_image("img-1", "beach"),
            sample_image("img-2", "jungle"),
        ])));
        app.worlds.prepend_and_select(sample_world("world-2", "img-2"));
        app.worlds.prepend_and_select(sample_world("world-1", "img-1"));

        let _ = app.update(Message::WorldSelected("world-2".to_string()));

        assert_eq!(app.view_mode, ViewMode::World);
        assert_eq!(app.worlds.current_id(), Some("world-2"));
        assert_eq!(app.images.current_id(), Some("img-2"));
    }

    #[test]
    fn test_missing_source_image_is_adopted_after_fetch() {
        let mut app = test_app();
        let _ = app.update(Message::GalleryLoaded(Ok(vec![sample_image(
            "img-1", "beach",
        )])));

        let _ = app.update(Message::SourceImageFetched(Ok(sample_image(
            "img-archived",
            "ruins",
        ))));

        assert_eq!(app.images.len(), 2);
        assert_eq!(app.images.current_id(), Some("img-archived"));
        // Adopted items go to the back; the fetched list order is preserved
        assert_eq!(app.images.items()[1].id, "img-archived");
    }

    #[test]
    fn test_mesh_arrival_bumps_revision() {
        let mut app = test_app();
        app.world_scene = WorldAsset::Loading {
            world_id: "world-1".to_string(),
        };

        let mesh = Arc::new(WorldMesh {
            vertices: Vec::new(),
            indices: Vec::new(),
            bounds: gpu::mesh::Aabb::empty(),
            center: [0.0; 3],
            scale: 1.0,
        });
        let _ = app.update(Message::WorldMeshFetched("world-1".to_string(), Ok(mesh)));

        assert_eq!(app.mesh_revision, 1);
        assert!(
            matches!(&app.world_scene, WorldAsset::Ready { world_id, .. } if world_id == "world-1")
        );
    }
}
