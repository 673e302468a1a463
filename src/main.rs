use iced::widget::image::{Handle, Image};
use iced::widget::{button, canvas, column, container, row, stack, text, text_input};
use iced::{Alignment, ContentFit, Element, Length, Task, Theme};
use rfd::FileDialog;
use tracing::{debug, error, info, warn};

mod config;
mod persist;
mod photo;
mod render;
mod state;
mod ui;

use config::Settings;
use persist::{PersistenceCoordinator, SaveError, SavePhase, StorageVolume};
use photo::{LoadError, SourceImage};
use state::caption::{CaptionLayer, CaptionLine};
use state::data::{PersistedArtifact, PhotoUri};
use state::media_index::MediaIndex;
use state::session::Session;
use ui::caption_dialog::{self, CaptionDraft};
use ui::canvas::CaptionDragger;
use ui::menu::MenuState;
use ui::pic_info;

/// Photo formats offered in the picker
const PHOTO_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff"];

/// The photo being captioned
struct Photo {
    source: SourceImage,
    layer: CaptionLayer,
    /// Composite of `source` and `layer`, refreshed on every caption change
    preview: Handle,
}

impl Photo {
    fn new(source: SourceImage, layer: CaptionLayer) -> Self {
        let preview = preview_handle(&source, &layer);
        Self {
            source,
            layer,
            preview,
        }
    }

    fn refresh_preview(&mut self) {
        self.preview = preview_handle(&self.source, &self.layer);
    }
}

fn preview_handle(source: &SourceImage, layer: &CaptionLayer) -> Handle {
    let composite = render::render(source, layer);
    Handle::from_rgba(composite.width(), composite.height(), composite.into_raw())
}

/// Which screen fills the window
enum Screen {
    Editor,
    CaptionDialog(CaptionDraft),
    PicInfo,
}

/// Main application state
struct LolcatBuilder {
    settings: Settings,
    media_index: MediaIndex,
    coordinator: PersistenceCoordinator<MediaIndex>,
    photo: Option<Photo>,
    /// Photo currently being decoded, if any
    loading: Option<PhotoUri>,
    /// Captions waiting for a restored photo to finish loading
    pending_restore: Option<Session>,
    save_phase: SavePhase,
    /// Last picture written from the current photo
    saved: Option<PersistedArtifact>,
    screen: Screen,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    PickPhoto,
    PhotoLoaded(Result<SourceImage, LoadError>),
    OpenCaptionDialog,
    CaptionDraftChanged(CaptionLine, String),
    CaptionDialogOk,
    CaptionDialogCancel,
    /// A caption was dragged to a new anchor (image pixels)
    CaptionMoved(CaptionLine, i32, i32),
    Save,
    /// The file is on disk (or isn't); registration comes next
    SaveWritten(Result<PersistedArtifact, SaveError>),
    SaveRegistered(Result<PersistedArtifact, SaveError>),
    ClearCaptions,
    ClearPhoto,
    ViewSaved,
    ViewerExited(Result<(), String>),
    ShareSaved,
    CloseInfo,
    /// Startup cleanup of the media index finished
    IndexPruned(usize),
}

impl LolcatBuilder {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();

        let index_path = settings.media_index_path();
        let media_index = match MediaIndex::open(index_path.clone()) {
            Ok(index) => index,
            Err(e) => {
                // Saving still works, registration will report the problem
                error!("❌ Could not open media index: {}", e);
                MediaIndex::new(index_path)
            }
        };
        let volume = StorageVolume::new(settings.storage_root());
        info!(
            "🎨 Lolcat Builder initialized, saving to {}",
            volume.save_dir().display()
        );
        let coordinator = PersistenceCoordinator::new(volume, media_index.clone());

        let mut app = LolcatBuilder {
            settings,
            media_index,
            coordinator,
            photo: None,
            loading: None,
            pending_restore: None,
            save_phase: SavePhase::Idle,
            saved: None,
            screen: Screen::Editor,
            status: "Pick a photo to get started.".to_string(),
        };

        // Stats every indexed file, so keep it off the UI thread
        let prune = Task::perform(app.media_index.clone().prune_missing_async(), |result| {
            match result {
                Ok(removed) => Message::IndexPruned(removed),
                Err(e) => {
                    warn!("⚠️  Could not prune media index: {}", e);
                    Message::IndexPruned(0)
                }
            }
        });

        let restore = if app.settings.restore_session {
            app.restore_session()
        } else {
            Task::none()
        };

        (app, Task::batch([prune, restore]))
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        let saving = self.save_phase.is_in_flight();

        match message {
            Message::PickPhoto => {
                if saving {
                    return Task::none();
                }
                // Show the native file picker dialog
                let picked = FileDialog::new()
                    .set_title("Pick a photo to caption")
                    .add_filter("Images", &PHOTO_EXTENSIONS)
                    .pick_file();

                match picked {
                    Some(path) => self.load_photo(PhotoUri::from_path(&path)),
                    None => {
                        info!("Nothing picked");
                        self.status = "Nothing picked".to_string();
                        Task::none()
                    }
                }
            }
            Message::PhotoLoaded(result) => {
                self.on_photo_loaded(result);
                Task::none()
            }
            Message::OpenCaptionDialog => {
                let Some(photo) = self.photo.as_ref().filter(|_| !saving) else {
                    return Task::none();
                };
                self.screen = Screen::CaptionDialog(CaptionDraft::from_layer(&photo.layer));
                text_input::focus(caption_dialog::top_input_id())
            }
            Message::CaptionDraftChanged(line, value) => {
                if let Screen::CaptionDialog(draft) = &mut self.screen {
                    draft.edit(line, value);
                }
                Task::none()
            }
            Message::CaptionDialogOk => {
                let screen = std::mem::replace(&mut self.screen, Screen::Editor);
                if let (Screen::CaptionDialog(draft), Some(photo)) = (screen, self.photo.as_mut()) {
                    info!("Captions: '{}', '{}'", draft.top, draft.bottom);
                    draft.apply(&mut photo.layer);
                    photo.refresh_preview();
                    self.store_session();
                }
                Task::none()
            }
            Message::CaptionDialogCancel => {
                self.screen = Screen::Editor;
                Task::none()
            }
            Message::CaptionMoved(line, x, y) => {
                if let Some(photo) = self.photo.as_mut().filter(|_| !saving) {
                    if photo.layer.set_position(line, x, y) {
                        debug!("moved {:?} caption to ({}, {})", line, x, y);
                        photo.refresh_preview();
                        self.store_session();
                    }
                }
                Task::none()
            }
            Message::Save => self.start_save(),
            Message::SaveWritten(Ok(written)) => {
                self.set_phase(SavePhase::AwaitingRegistration);
                self.saved = Some(written.clone());
                self.status = "Scanning…".to_string();

                let coordinator = self.coordinator.clone();
                Task::perform(
                    async move { coordinator.register(written).await },
                    Message::SaveRegistered,
                )
            }
            Message::SaveRegistered(Ok(artifact)) => {
                self.set_phase(SavePhase::Succeeded);
                self.saved = Some(artifact);
                self.status = "Saved.".to_string();
                self.store_session();
                self.screen = Screen::PicInfo;
                Task::none()
            }
            Message::SaveWritten(Err(e)) | Message::SaveRegistered(Err(e)) => {
                self.on_save_failed(e);
                Task::none()
            }
            Message::ClearCaptions => {
                if let Some(photo) = self.photo.as_mut().filter(|_| !saving) {
                    photo.layer.clear();
                    photo.refresh_preview();
                    // Any picture saved so far no longer matches
                    self.saved = None;
                    self.store_session();
                }
                Task::none()
            }
            Message::ClearPhoto => {
                if !saving {
                    self.clear_photo();
                    self.status = "Pick a photo to get started.".to_string();
                    self.store_session();
                }
                Task::none()
            }
            Message::ViewSaved => self.view_saved(),
            Message::ViewerExited(Ok(())) => Task::none(),
            Message::ViewerExited(Err(e)) => {
                warn!("⚠️  {}", e);
                self.status = e;
                Task::none()
            }
            Message::ShareSaved => self.share_saved(),
            Message::CloseInfo => {
                self.screen = Screen::Editor;
                Task::none()
            }
            Message::IndexPruned(removed) => {
                debug!("media index pruned, {} stale entries", removed);
                Task::none()
            }
        }
    }

    fn set_phase(&mut self, phase: SavePhase) {
        debug!("save phase: {} -> {}", self.save_phase.label(), phase.label());
        self.save_phase = phase;
    }

    /// Which menu actions are available right now
    fn menu(&self) -> MenuState {
        MenuState::derive(
            self.photo.is_some(),
            self.photo
                .as_ref()
                .is_some_and(|photo| photo.layer.has_valid_caption()),
            self.save_phase.is_in_flight(),
        )
    }

    /// Drop the photo, its captions and any saved picture reference
    fn clear_photo(&mut self) {
        self.photo = None;
        self.loading = None;
        self.saved = None;
    }

    /// Start decoding `uri`; a new photo always starts out uncaptioned
    fn load_photo(&mut self, uri: PhotoUri) -> Task<Message> {
        info!("loadPhoto: uri = {}", uri);
        self.clear_photo();
        self.pending_restore = None;
        self.loading = Some(uri.clone());
        self.status = "Loading photo…".to_string();

        Task::perform(
            photo::load_photo(uri, self.media_index.clone()),
            Message::PhotoLoaded,
        )
    }

    fn on_photo_loaded(&mut self, result: Result<SourceImage, LoadError>) {
        match result {
            Ok(source) => {
                if self.loading.as_ref() != Some(source.uri()) {
                    debug!("dropping stale photo {}", source.uri());
                    return;
                }
                self.loading = None;

                let mut layer = CaptionLayer::new(source.width(), source.height());
                if let Some(session) = self.pending_restore.take() {
                    session.restore_captions(&mut layer);
                }
                self.photo = Some(Photo::new(source, layer));
                self.status = "Add some captions!".to_string();
                self.store_session();
            }
            Err(e) => {
                warn!("⚠️  Couldn't load photo: {}", e);
                self.loading = None;
                self.pending_restore = None;
                // A saved picture only makes sense next to its photo
                self.saved = None;
                self.store_session();
                self.status = "Couldn't load photo".to_string();
            }
        }
    }

    /// Kick off a save of the current composite
    fn start_save(&mut self) -> Task<Message> {
        if !self.menu().save {
            return Task::none();
        }
        let Some(photo) = self.photo.as_ref() else {
            return Task::none();
        };

        info!("saveImage()...");
        let composite = render::render(&photo.source, &photo.layer);
        self.set_phase(SavePhase::Writing);
        self.status = "Saving…".to_string();

        let coordinator = self.coordinator.clone();
        Task::perform(
            async move { coordinator.write(composite).await },
            Message::SaveWritten,
        )
    }

    fn on_save_failed(&mut self, e: SaveError) {
        error!("❌ {}", e);
        if matches!(e, SaveError::RegistrationFailed { .. }) {
            // The file is still there, just without a reference
            if let Some(saved) = self.saved.as_mut() {
                saved.external_uri = None;
            }
        } else {
            self.saved = None;
        }
        self.status = e.user_message().to_string();
        self.set_phase(SavePhase::Failed(e));
        self.store_session();
    }

    fn view_saved(&mut self) -> Task<Message> {
        let Some(uri) = self.saved.as_ref().and_then(|a| a.external_uri.clone()) else {
            self.status = "Can't view in image viewer: URI is null.".to_string();
            return Task::none();
        };

        let path = match self.media_index.resolve(&uri) {
            Ok(Some(path)) => path,
            Ok(None) => {
                self.status = format!("{} is no longer in the media index", uri);
                return Task::none();
            }
            Err(e) => {
                warn!("⚠️  Could not resolve {}: {}", uri, e);
                self.status = format!("Can't view {}", uri);
                return Task::none();
            }
        };

        info!("Starting viewer for {}", path.display());
        Task::perform(pic_info::open_in_viewer(path), Message::ViewerExited)
    }

    fn share_saved(&mut self) -> Task<Message> {
        match self.saved.as_ref().and_then(pic_info::share_text) {
            Some(contents) => {
                self.status = format!("Copied {} to the clipboard", contents);
                iced::clipboard::write(contents)
            }
            None => {
                self.status = "Can't share: URI is null.".to_string();
                Task::none()
            }
        }
    }

    /// Reload the photo and captions from the previous run
    fn restore_session(&mut self) -> Task<Message> {
        let path = self.settings.session_path();
        let session = match Session::load(&path) {
            Ok(Some(session)) => session,
            Ok(None) => return Task::none(),
            Err(e) => {
                warn!("⚠️  Ignoring session at {}: {}", path.display(), e);
                return Task::none();
            }
        };

        let Some(uri) = session.photo_uri.clone() else {
            return Task::none();
        };
        info!("- reloading state from {}", path.display());

        let task = self.load_photo(uri);
        self.saved = session.saved_artifact();
        self.pending_restore = Some(session);
        task
    }

    fn store_session(&self) {
        let photo_uri = self
            .photo
            .as_ref()
            .map(|photo| photo.source.uri())
            .or(self.loading.as_ref());
        let session = Session::capture(
            photo_uri,
            self.photo.as_ref().map(|photo| &photo.layer),
            self.saved.as_ref(),
        );

        if let Err(e) = session.store(&self.settings.session_path()) {
            warn!("⚠️  Could not store session: {}", e);
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        match &self.screen {
            Screen::CaptionDialog(draft) => caption_dialog::view(draft),
            Screen::PicInfo => match &self.saved {
                Some(artifact) => pic_info::view(artifact),
                None => self.editor(),
            },
            Screen::Editor => self.editor(),
        }
    }

    fn editor(&self) -> Element<Message> {
        let menu = self.menu();
        let action = |label: &'static str, enabled: bool, message: Message| {
            button(label)
                .on_press_maybe(enabled.then_some(message))
                .padding(10)
        };

        let toolbar = row![
            action("Pick photo", menu.pick, Message::PickPhoto),
            action("Add captions", menu.add_caption, Message::OpenCaptionDialog),
            action("Save", menu.save, Message::Save),
            action("Clear captions", menu.clear_caption, Message::ClearCaptions),
            action("Clear photo", menu.clear_photo, Message::ClearPhoto),
        ]
        .spacing(10);

        let preview: Element<Message> = match &self.photo {
            Some(photo) => {
                let dragger = CaptionDragger::new(&photo.layer, !self.save_phase.is_in_flight());
                stack![
                    Image::new(photo.preview.clone())
                        .content_fit(ContentFit::Contain)
                        .width(Length::Fill)
                        .height(Length::Fill),
                    canvas(dragger).width(Length::Fill).height(Length::Fill),
                ]
                .into()
            }
            None => container(text("No photo yet").size(24))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
        };

        column![toolbar, preview, text(&self.status).size(16)]
            .spacing(20)
            .padding(20)
            .align_x(Alignment::Center)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lolcat_builder=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> iced::Result {
    init_tracing();

    iced::application(
        "Lolcat Builder",
        LolcatBuilder::update,
        LolcatBuilder::view,
    )
    .theme(LolcatBuilder::theme)
    .centered()
    .run_with(LolcatBuilder::new)
}
