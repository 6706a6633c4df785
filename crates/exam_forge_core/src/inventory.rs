//! crates/exam_forge_core/src/inventory.rs
//!
//! Resource intake. Files are read independently and may finish in any order,
//! so every read is registered as a pending upload keyed by id and completed
//! against that id.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{
    PendingUpload, Resource, ResourceCategory, IMAGE_MIME_PREFIX, PDF_MIME_TYPE, TEXT_MIME_TYPE,
};

/// Binary iff the media type is an image or a PDF.
pub fn is_binary_media_type(mime_type: &str) -> bool {
    let mime_type = mime_type.trim().to_ascii_lowercase();
    mime_type.starts_with(IMAGE_MIME_PREFIX) || mime_type == PDF_MIME_TYPE
}

/// Drops a leading `data:<mime>;base64,` prefix if present.
pub fn strip_data_url_prefix(payload: &str) -> &str {
    if payload.starts_with("data:") {
        if let Some((_, data)) = payload.split_once(',') {
            return data;
        }
    }
    payload
}

impl Resource {
    /// Builds a resource from the bytes of a finished file read.
    ///
    /// Binary content is stored as base64. Bytes that already hold a base64
    /// data URL are kept as-is with the prefix stripped.
    pub fn from_file(upload: &PendingUpload, mime_type: Option<&str>, bytes: &[u8]) -> Self {
        let mime_type = mime_type
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(TEXT_MIME_TYPE)
            .to_string();
        let is_binary = is_binary_media_type(&mime_type);

        let content = if is_binary {
            match std::str::from_utf8(bytes) {
                Ok(text) if text.starts_with("data:") => strip_data_url_prefix(text).to_string(),
                _ => STANDARD.encode(bytes),
            }
        } else {
            String::from_utf8_lossy(bytes).into_owned()
        };

        Self {
            id: upload.id,
            category: upload.category,
            content,
            mime_type,
            name: upload.name.clone(),
            is_binary,
        }
    }

    /// A pasted text block. `None` when the text is blank.
    pub fn from_text(text: &str, category: ResourceCategory) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4(),
            category,
            content: text.to_string(),
            mime_type: TEXT_MIME_TYPE.to_string(),
            name: format!("Input Text ({})", category),
            is_binary: false,
        })
    }
}

/// The ordered resource collection plus the uploads still being read.
#[derive(Debug, Default, Clone)]
pub struct ResourceInventory {
    resources: Vec<Resource>,
    pending: Vec<PendingUpload>,
}

impl ResourceInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn pending(&self) -> &[PendingUpload] {
        &self.pending
    }

    pub fn get(&self, id: Uuid) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Adds pasted text as one resource. Blank text is ignored.
    pub fn submit_text(&mut self, text: &str, category: ResourceCategory) -> Option<&Resource> {
        let resource = Resource::from_text(text, category)?;
        self.resources.push(resource);
        self.resources.last()
    }

    /// Registers a file read. The category is captured now, not at completion.
    pub fn begin_upload(&mut self, name: impl Into<String>, category: ResourceCategory) -> PendingUpload {
        let upload = PendingUpload {
            id: Uuid::new_v4(),
            name: name.into(),
            category,
        };
        self.pending.push(upload.clone());
        upload
    }

    /// Applies a finished read. Returns `false` if no pending upload has this
    /// id, in which case the resource is discarded.
    pub fn complete_upload(&mut self, resource: Resource) -> bool {
        let Some(pos) = self.pending.iter().position(|p| p.id == resource.id) else {
            warn!(upload_id = %resource.id, "Completed upload has no pending entry");
            return false;
        };
        self.pending.remove(pos);
        debug!(upload_id = %resource.id, name = %resource.name, "Upload completed");
        self.resources.push(resource);
        true
    }

    pub fn fail_upload(&mut self, id: Uuid) -> Option<PendingUpload> {
        let pos = self.pending.iter().position(|p| p.id == id)?;
        Some(self.pending.remove(pos))
    }

    /// Removes exactly the resource with `id`, keeping the others in order.
    pub fn remove(&mut self, id: Uuid) -> Option<Resource> {
        let pos = self.resources.iter().position(|r| r.id == id)?;
        Some(self.resources.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(inventory: &mut ResourceInventory, name: &str) -> PendingUpload {
        inventory.begin_upload(name, ResourceCategory::Textbook)
    }

    #[test]
    fn classifies_images_and_pdfs_as_binary() {
        assert!(is_binary_media_type("image/png"));
        assert!(is_binary_media_type("image/jpeg"));
        assert!(is_binary_media_type("application/pdf"));
        assert!(!is_binary_media_type("text/plain"));
        assert!(!is_binary_media_type("text/markdown"));
        assert!(!is_binary_media_type("application/json"));
    }

    #[test]
    fn media_type_case_is_ignored() {
        assert!(is_binary_media_type("IMAGE/PNG"));
        assert!(is_binary_media_type(" Application/PDF "));
        assert!(!is_binary_media_type("TEXT/PLAIN"));
    }

    #[test]
    fn strips_data_url_prefix() {
        assert_eq!(strip_data_url_prefix("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_url_prefix("AAAA"), "AAAA");
    }

    #[test]
    fn binary_file_is_base64_encoded() {
        let mut inventory = ResourceInventory::new();
        let pending = upload(&mut inventory, "scan.pdf");
        let resource = Resource::from_file(&pending, Some("application/pdf"), b"%PDF-1.7");

        assert!(resource.is_binary);
        assert_eq!(resource.content, STANDARD.encode(b"%PDF-1.7"));
        assert_eq!(resource.name, "scan.pdf");
    }

    #[test]
    fn data_url_payload_is_stored_without_prefix() {
        let pending = PendingUpload {
            id: Uuid::new_v4(),
            name: "diagram.png".into(),
            category: ResourceCategory::Sample,
        };
        let resource = Resource::from_file(&pending, Some("image/png"), b"data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(resource.content, "iVBORw0KGgo=");
        assert_eq!(resource.category, ResourceCategory::Sample);
    }

    #[test]
    fn text_file_is_read_verbatim_and_defaults_media_type() {
        let mut inventory = ResourceInventory::new();
        let pending = upload(&mut inventory, "notes");
        let resource = Resource::from_file(&pending, None, "Photosynthesis".as_bytes());

        assert!(!resource.is_binary);
        assert_eq!(resource.mime_type, "text/plain");
        assert_eq!(resource.content, "Photosynthesis");
    }

    #[test]
    fn text_submission_is_never_binary() {
        let mut inventory = ResourceInventory::new();
        let resource = inventory
            .submit_text("Mitochondria are organelles.", ResourceCategory::Specification)
            .cloned()
            .unwrap();

        assert!(!resource.is_binary);
        assert_eq!(resource.mime_type, "text/plain");
        assert_eq!(resource.name, "Input Text (SPECIFICATION)");
        assert_eq!(inventory.resources().len(), 1);
    }

    #[test]
    fn blank_text_submission_is_ignored() {
        let mut inventory = ResourceInventory::new();
        assert!(inventory.submit_text("   \n\t", ResourceCategory::Textbook).is_none());
        assert!(inventory.is_empty());
    }

    #[test]
    fn uploads_complete_out_of_order_by_id() {
        let mut inventory = ResourceInventory::new();
        let first = upload(&mut inventory, "first.txt");
        let second = upload(&mut inventory, "second.txt");
        assert_eq!(inventory.pending().len(), 2);

        assert!(inventory.complete_upload(Resource::from_file(&second, None, b"two")));
        assert_eq!(inventory.pending(), &[first.clone()]);
        assert!(inventory.complete_upload(Resource::from_file(&first, None, b"one")));

        let names: Vec<_> = inventory.resources().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["second.txt", "first.txt"]);
        assert!(inventory.pending().is_empty());
    }

    #[test]
    fn completion_without_pending_entry_is_discarded() {
        let mut inventory = ResourceInventory::new();
        let stray = PendingUpload {
            id: Uuid::new_v4(),
            name: "stray".into(),
            category: ResourceCategory::Textbook,
        };
        assert!(!inventory.complete_upload(Resource::from_file(&stray, None, b"x")));
        assert!(inventory.is_empty());
    }

    #[test]
    fn failed_upload_leaves_pending_list() {
        let mut inventory = ResourceInventory::new();
        let pending = upload(&mut inventory, "broken.png");
        assert_eq!(inventory.fail_upload(pending.id), Some(pending));
        assert!(inventory.pending().is_empty());
        assert!(inventory.is_empty());
    }

    #[test]
    fn remove_keeps_relative_order() {
        let mut inventory = ResourceInventory::new();
        let ids: Vec<Uuid> = ["a", "b", "c", "d"]
            .iter()
            .map(|t| inventory.submit_text(t, ResourceCategory::Textbook).unwrap().id)
            .collect();

        let removed = inventory.remove(ids[1]).unwrap();
        assert_eq!(removed.content, "b");

        let remaining: Vec<_> = inventory.resources().iter().map(|r| r.id).collect();
        assert_eq!(remaining, vec![ids[0], ids[2], ids[3]]);
        assert!(inventory.remove(ids[1]).is_none());
    }
}
