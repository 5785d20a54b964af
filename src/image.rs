//! Image handle: the shared result of a single image fetch.
//!
//! An [`Image`] is created optimistically when the source decides a fetch is
//! needed. It records the request geometry (extent, resolution, pixel
//! ratio), carries a single-shot loader that performs the actual fetch on a
//! background thread, and exposes a small state machine:
//!
//! ```text
//! Idle ──load()──► Loading ──► Loaded
//!                     │
//!                     └──────► Error
//! ```
//!
//! Callers observe completion through change listeners rather than blocking.
//! A handle that the source has replaced still completes into its own state;
//! nothing references it anymore, so stale completions are ignored by
//! construction rather than cancelled.

use std::sync::{Arc, Weak};

use base64::Engine;
use parking_lot::Mutex;
use tracing::warn;

use crate::extent::Extent;

/// Load state of an [`Image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    /// Created, fetch not yet issued.
    Idle,
    /// Fetch in flight.
    Loading,
    /// Payload decoded and ready for rendering.
    Loaded,
    /// Fetch or decode failed; see [`Image::error`].
    Error,
}

/// Single-shot fetch routine attached to an image at creation.
pub type Loader = Box<dyn FnOnce(&Image) + Send>;

/// Listener invoked on every state transition.
pub type ChangeListener = Box<dyn Fn(ImageState) + Send + Sync>;

/// Decoded/decoding payload behind the handle.
#[derive(Default)]
struct Payload {
    /// Source reference: the request URL or a base64 data URI.
    src: Option<String>,
    /// Decoded pixels, present once the state is `Loaded`.
    pixels: Option<image::DynamicImage>,
    /// Failure description, present once the state is `Error`.
    error: Option<String>,
}

/// Shared handle to a fetched (or in-flight) map image.
///
/// Handles are reference-counted; cache reuse is observable as pointer
/// identity (`Arc::ptr_eq`) of the returned handle.
pub struct Image {
    extent: Extent,
    resolution: f64,
    pixel_ratio: f64,
    state: Mutex<ImageState>,
    payload: Mutex<Payload>,
    loader: Mutex<Option<Loader>>,
    listeners: Mutex<Vec<ChangeListener>>,
    /// Back-reference handed to the loader thread.
    weak_self: Weak<Image>,
}

impl Image {
    /// Creates an idle image handle.
    ///
    /// `src` is the initial source reference (the request URL for
    /// load-function fetches, `None` for binary POST fetches whose data URI
    /// arrives with the response). The loader runs at most once, on the
    /// first call to [`Image::load`].
    pub fn new(
        extent: Extent,
        resolution: f64,
        pixel_ratio: f64,
        src: Option<String>,
        loader: Loader,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            extent,
            resolution,
            pixel_ratio,
            state: Mutex::new(ImageState::Idle),
            payload: Mutex::new(Payload {
                src,
                ..Payload::default()
            }),
            loader: Mutex::new(Some(loader)),
            listeners: Mutex::new(Vec::new()),
            weak_self: weak_self.clone(),
        })
    }

    /// Extent this image covers (the enlarged request extent).
    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    /// Resolution the image was requested at.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Pixel ratio the image was requested at.
    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Current load state.
    pub fn state(&self) -> ImageState {
        *self.state.lock()
    }

    /// Current source reference (URL or data URI), if any.
    pub fn src(&self) -> Option<String> {
        self.payload.lock().src.clone()
    }

    /// Decoded pixels, once loaded.
    pub fn pixels(&self) -> Option<image::DynamicImage> {
        self.payload.lock().pixels.clone()
    }

    /// Failure description, once errored.
    pub fn error(&self) -> Option<String> {
        self.payload.lock().error.clone()
    }

    /// Registers a listener for state transitions.
    ///
    /// Listeners fire for every transition from `Loading` onward; a listener
    /// registered after completion sees no events, so callers should check
    /// [`Image::state`] first.
    pub fn on_change(&self, listener: impl Fn(ImageState) + Send + Sync + 'static) {
        self.listeners.lock().push(Box::new(listener));
    }

    /// Issues the fetch on a background thread.
    ///
    /// The loader is single-shot: repeated calls after the first are no-ops,
    /// which also makes the completion a single event per handle.
    pub fn load(&self) {
        let Some(loader) = self.loader.lock().take() else {
            return;
        };
        let Some(image) = self.weak_self.upgrade() else {
            return;
        };
        self.transition(ImageState::Loading);
        std::thread::spawn(move || loader(&image));
    }

    /// Assigns a `data:image/<type>;base64,...` source reference and decodes
    /// it into pixels.
    ///
    /// Undecodable payloads surface as the `Error` state on this handle, not
    /// as a synchronous error to the fetch strategy.
    pub fn set_data_uri(&self, uri: &str) {
        self.payload.lock().src = Some(uri.to_string());
        match decode_data_uri(uri) {
            Ok(bytes) => self.set_raw_bytes(&bytes),
            Err(message) => self.fail(message),
        }
    }

    /// Decodes raw response bytes into pixels and completes the handle.
    pub fn set_raw_bytes(&self, bytes: &[u8]) {
        match image::load_from_memory(bytes) {
            Ok(pixels) => {
                self.payload.lock().pixels = Some(pixels);
                self.transition(ImageState::Loaded);
            }
            Err(e) => self.fail(format!("failed to decode image payload: {}", e)),
        }
    }

    /// Completes the handle with a failure.
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(error = %message, "image load failed");
        self.payload.lock().error = Some(message);
        self.transition(ImageState::Error);
    }

    fn transition(&self, state: ImageState) {
        *self.state.lock() = state;
        for listener in self.listeners.lock().iter() {
            listener(state);
        }
    }
}

/// Extracts the binary payload from a `data:image/...;base64,...` URI.
fn decode_data_uri(uri: &str) -> Result<Vec<u8>, String> {
    let rest = uri
        .strip_prefix("data:image/")
        .ok_or_else(|| format!("not an image data URI: {}", truncate(uri)))?;
    let (_, encoded) = rest
        .split_once(";base64,")
        .ok_or_else(|| format!("data URI is not base64-encoded: {}", truncate(uri)))?;
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| format!("invalid base64 payload: {}", e))
}

fn truncate(s: &str) -> &str {
    // Error messages only need the scheme and type prefix.
    match s.char_indices().nth(48) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
