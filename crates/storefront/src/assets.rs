//! In-memory association of cart entries with uploaded artwork.
//!
//! Binaries cannot be written to durable client storage, so each cart entry's
//! upload lives here, keyed by the entry's [`ItemId`], for the lifetime of the
//! session. Placements are kept alongside and are the only part the cart
//! store persists.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use casemandu_core::{ItemId, Placement};

/// An uploaded file: artwork for a cart entry or a payment screenshot.
///
/// Cheap to clone; the bytes are shared.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    file_name: String,
    content_type: Option<String>,
    bytes: Arc<[u8]>,
}

impl Upload {
    /// Wrap in-memory bytes as an upload.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: Arc::from(bytes.into()),
        }
    }

    /// Set the MIME type sent with the file.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read an upload from disk, inferring an image MIME type from the
    /// extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());

        let mut upload = Self::new(file_name, bytes);
        if let Some(mime) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(image_mime_for_extension)
        {
            upload = upload.with_content_type(mime);
        }
        Ok(upload)
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Never dump file contents into logs.
impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn image_mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Artwork and placement bound to one cart entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetBinding {
    pub binary: Option<Upload>,
    pub placement: Option<Placement>,
}

/// Mapping of cart-entry ID to its bound artwork.
///
/// Entries whose cart item is gone are harmless; they are dropped wholesale
/// by [`AssetStore::clear`].
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    bindings: BTreeMap<ItemId, AssetBinding>,
}

impl AssetStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind artwork and/or placement to `item_id`.
    ///
    /// `None` arguments leave any existing value in place.
    pub fn bind(&mut self, item_id: &ItemId, binary: Option<Upload>, placement: Option<Placement>) {
        if binary.is_none() && placement.is_none() {
            return;
        }
        let binding = self.bindings.entry(item_id.clone()).or_default();
        if binary.is_some() {
            binding.binary = binary;
        }
        if placement.is_some() {
            binding.placement = placement;
        }
    }

    /// The artwork and placement bound to `item_id`, either possibly absent.
    #[must_use]
    pub fn get(&self, item_id: &ItemId) -> (Option<&Upload>, Option<Placement>) {
        self.bindings
            .get(item_id)
            .map_or((None, None), |b| (b.binary.as_ref(), b.placement))
    }

    /// The artwork bound to `item_id`.
    #[must_use]
    pub fn custom_image(&self, item_id: &ItemId) -> Option<&Upload> {
        self.get(item_id).0
    }

    /// The placement bound to `item_id`, or the default placement.
    #[must_use]
    pub fn placement_or_default(&self, item_id: &ItemId) -> Placement {
        self.get(item_id).1.unwrap_or_default()
    }

    /// Remove and return everything bound to `item_id`.
    pub fn unbind(&mut self, item_id: &ItemId) -> Option<AssetBinding> {
        self.bindings.remove(item_id)
    }

    /// Drop every binding.
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Every bound placement, for persistence. Binaries are never included.
    #[must_use]
    pub fn placements(&self) -> Vec<(ItemId, Placement)> {
        self.bindings
            .iter()
            .filter_map(|(id, b)| b.placement.map(|p| (id.clone(), p)))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
