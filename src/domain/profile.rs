//! The profile photo, stored as a base64 `data:` URL.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;
use tracing::{debug, warn};

use crate::collection::CollectionStore;
use crate::error::StoreError;
use crate::storage::KeyValueStore;

pub const IMAGE_KEY: &str = "userProfileImage";

/// Largest accepted upload, before encoding.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileImageError {
    #[error("image is {size} bytes, the limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("{0:?} is not an image type")]
    NotAnImage(String),
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileImage {
    mime: String,
    bytes: Vec<u8>,
}

impl ProfileImage {
    /// Accept an uploaded file. Rejects non-image types and files over 5 MiB.
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ProfileImageError> {
        let mime = mime.into();
        if !mime.starts_with("image/") {
            return Err(ProfileImageError::NotAnImage(mime));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ProfileImageError::TooLarge {
                size: bytes.len(),
                limit: MAX_IMAGE_BYTES,
            });
        }
        Ok(ProfileImage { mime, bytes })
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `data:image/png;base64,...`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }

    pub fn from_data_url(url: &str) -> Result<Self, ProfileImageError> {
        let invalid = |reason: &str| ProfileImageError::InvalidDataUrl(reason.to_string());
        let rest = url.strip_prefix("data:").ok_or_else(|| invalid("missing data: scheme"))?;
        let (header, payload) = rest.split_once(',').ok_or_else(|| invalid("missing payload"))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| invalid("payload is not base64"))?;
        let bytes = BASE64
            .decode(payload)
            .map_err(|e| ProfileImageError::InvalidDataUrl(e.to_string()))?;
        Self::new(mime, bytes)
    }
}

/// The header avatar. Uploads are previewed and only stored on save.
pub struct ProfilePhoto<S> {
    store: CollectionStore<S>,
    current: Option<ProfileImage>,
    preview: Option<ProfileImage>,
}

impl<S: KeyValueStore> ProfilePhoto<S> {
    /// Load the stored photo. An unreadable stored value is treated as no photo.
    pub fn open(storage: S) -> Self {
        let store = CollectionStore::new(storage);
        let current = store
            .load_value(IMAGE_KEY)
            .and_then(|url| match ProfileImage::from_data_url(&url) {
                Ok(image) => Some(image),
                Err(e) => {
                    warn!(key = IMAGE_KEY, error = %e, "ignoring stored profile image");
                    None
                }
            });
        ProfilePhoto {
            store,
            current,
            preview: None,
        }
    }

    pub fn current(&self) -> Option<&ProfileImage> {
        self.current.as_ref()
    }

    pub fn preview(&self) -> Option<&ProfileImage> {
        self.preview.as_ref()
    }

    /// Stage an upload for preview. Nothing is written.
    pub fn stage(&mut self, mime: &str, bytes: Vec<u8>) -> Result<(), ProfileImageError> {
        self.preview = Some(ProfileImage::new(mime, bytes)?);
        Ok(())
    }

    /// Store the staged image. Returns false when nothing was staged.
    pub fn save(&mut self) -> Result<bool, ProfileImageError> {
        let Some(image) = self.preview.take() else {
            return Ok(false);
        };
        if let Err(e) = self.store.save_value(IMAGE_KEY, &image.to_data_url()) {
            self.preview = Some(image);
            return Err(e.into());
        }
        debug!(bytes = image.bytes.len(), mime = %image.mime, "profile image saved");
        self.current = Some(image);
        Ok(true)
    }

    /// Drop the staged image.
    pub fn discard(&mut self) {
        self.preview = None;
    }
}
