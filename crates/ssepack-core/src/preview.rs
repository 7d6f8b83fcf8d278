//! Attachment previews
//!
//! Preview records are derived from the attachment list and recomputed only when
//! the list fingerprint changes. Image previews hold a handle into a
//! `PreviewArena`; every recomputation is a new generation, and the previous
//! generation is revoked right after the new list is committed.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Cursor;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::attachment::{list_fingerprint, Attachment};

/// Revocable reference to transient display data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreviewHandle {
    generation: u64,
    slot: u32,
}

impl PreviewHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn uri(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preview://{}/{}", self.generation, self.slot)
    }
}

/// Display data behind a live handle
#[derive(Debug, Clone)]
pub struct PreviewResource {
    pub data: Bytes,
    pub mime: String,
    /// Pixel size, when the image header could be read
    pub dimensions: Option<(u32, u32)>,
}

/// Owner of every live preview resource of one composer
#[derive(Debug, Default)]
pub struct PreviewArena {
    live: BTreeMap<PreviewHandle, PreviewResource>,
    allocated: u64,
    revoked: u64,
}

impl PreviewArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, generation: u64, slot: u32, file: &Attachment) -> PreviewHandle {
        let handle = PreviewHandle { generation, slot };
        let dimensions = read_dimensions(file);
        self.live.insert(
            handle,
            PreviewResource {
                data: file.data().clone(),
                mime: file.mime().to_string(),
                dimensions,
            },
        );
        self.allocated += 1;
        debug!(%handle, name = file.name(), "Preview allocated");
        handle
    }

    /// Revoke one handle; false if it was not live
    pub fn revoke(&mut self, handle: PreviewHandle) -> bool {
        if self.live.remove(&handle).is_some() {
            self.revoked += 1;
            true
        } else {
            false
        }
    }

    /// Revoke every live handle of `generation`, returning how many were revoked
    pub fn revoke_generation(&mut self, generation: u64) -> usize {
        let stale: Vec<PreviewHandle> = self
            .live
            .keys()
            .filter(|h| h.generation == generation)
            .copied()
            .collect();
        for handle in &stale {
            self.revoke(*handle);
        }
        stale.len()
    }

    pub fn revoke_all(&mut self) -> usize {
        let count = self.live.len();
        self.revoked += count as u64;
        self.live.clear();
        count
    }

    pub fn resolve(&self, handle: PreviewHandle) -> Option<&PreviewResource> {
        self.live.get(&handle)
    }

    pub fn is_live(&self, handle: PreviewHandle) -> bool {
        self.live.contains_key(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Total handles ever allocated
    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    /// Total handles ever revoked
    pub fn revoked(&self) -> u64 {
        self.revoked
    }
}

fn read_dimensions(file: &Attachment) -> Option<(u32, u32)> {
    let reader = image::ImageReader::new(Cursor::new(file.data().as_ref()))
        .with_guessed_format()
        .ok()?;
    match reader.into_dimensions() {
        Ok(dims) => Some(dims),
        Err(e) => {
            warn!(name = file.name(), error = %e, "Could not read preview dimensions");
            None
        }
    }
}

/// One derived preview per attachment
#[derive(Debug, Clone)]
pub struct PreviewRecord {
    pub attachment: Attachment,
    pub is_image: bool,
    /// Present only for images
    pub resource: Option<PreviewHandle>,
}

/// Preview list memoized by the attachment list fingerprint
#[derive(Debug, Default)]
pub struct Previews {
    key: Option<String>,
    generation: u64,
    records: Vec<PreviewRecord>,
    arena: PreviewArena,
}

impl Previews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute if the list fingerprint changed. Returns true when recomputed.
    pub fn sync(&mut self, files: &[Attachment]) -> bool {
        let key = list_fingerprint(files);
        if self.key.as_deref() == Some(key.as_str()) {
            return false;
        }

        let previous = self.generation;
        self.generation += 1;
        let generation = self.generation;

        let records: Vec<PreviewRecord> = files
            .iter()
            .enumerate()
            .map(|(slot, file)| {
                let is_image = file.is_image();
                let resource =
                    is_image.then(|| self.arena.allocate(generation, slot as u32, file));
                PreviewRecord {
                    attachment: file.clone(),
                    is_image,
                    resource,
                }
            })
            .collect();

        // Commit first, then retire the outgoing generation
        let outgoing = std::mem::replace(&mut self.records, records);
        self.key = Some(key);
        let revoked = self.arena.revoke_generation(previous);
        drop(outgoing);

        debug!(
            generation,
            records = self.records.len(),
            revoked,
            "Preview list recomputed"
        );
        true
    }

    pub fn records(&self) -> &[PreviewRecord] {
        &self.records
    }

    pub fn arena(&self) -> &PreviewArena {
        &self.arena
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Revoke everything and forget the memo
    pub fn teardown(&mut self) {
        let revoked = self.arena.revoke_all();
        self.records.clear();
        self.key = None;
        if revoked > 0 {
            debug!(revoked, "Previews torn down");
        }
    }
}

impl Drop for Previews {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn at(name: &str, mime: &str, ms: i64) -> Attachment {
        Attachment::with_last_modified(
            name,
            mime,
            vec![1u8, 2, 3],
            DateTime::from_timestamp_millis(ms).unwrap(),
        )
    }

    fn png(name: &str) -> Attachment {
        let mut data = Vec::new();
        image::RgbaImage::new(4, 3)
            .write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)
            .unwrap();
        Attachment::with_last_modified(
            name,
            "image/png",
            data,
            DateTime::from_timestamp_millis(1).unwrap(),
        )
    }

    fn image_count(files: &[Attachment]) -> usize {
        files.iter().filter(|f| f.is_image()).count()
    }

    #[test]
    fn test_images_get_handles_documents_do_not() {
        let files = vec![png("a.png"), at("doc.pdf", "application/pdf", 1)];
        let mut previews = Previews::new();
        assert!(previews.sync(&files));

        let records = previews.records();
        assert!(records[0].is_image);
        let handle = records[0].resource.unwrap();
        assert!(!records[1].is_image);
        assert!(records[1].resource.is_none());

        let resource = previews.arena().resolve(handle).unwrap();
        assert_eq!(resource.mime, "image/png");
        assert_eq!(resource.dimensions, Some((4, 3)));
    }

    #[test]
    fn test_same_fingerprint_does_not_recompute() {
        let files = vec![at("a.png", "image/png", 1)];
        let mut previews = Previews::new();
        assert!(previews.sync(&files));
        let handle = previews.records()[0].resource.unwrap();

        // A fresh clone with identical name/size/mtime is the same list
        assert!(!previews.sync(&files.clone()));
        assert!(previews.arena().is_live(handle));
        assert_eq!(previews.arena().allocated(), 1);
    }

    #[test]
    fn test_live_handles_track_list_changes() {
        let a = at("a.png", "image/png", 1);
        let b = at("b.jpg", "image/jpeg", 2);
        let doc = at("c.pdf", "application/pdf", 3);

        let steps: Vec<Vec<Attachment>> = vec![
            vec![a.clone()],
            vec![a.clone(), doc.clone()],
            vec![a.clone(), doc.clone(), b.clone()],
            vec![doc.clone(), b.clone()],
            vec![b.clone(), b.clone()],
            vec![],
        ];

        let mut previews = Previews::new();
        let mut previous_handles: Vec<PreviewHandle> = Vec::new();
        for files in steps {
            previews.sync(&files);
            assert_eq!(previews.arena().live_count(), image_count(&files));
            for handle in &previous_handles {
                assert!(!previews.arena().is_live(*handle));
            }
            previous_handles = previews
                .records()
                .iter()
                .filter_map(|r| r.resource)
                .collect();
        }

        let arena = previews.arena();
        assert_eq!(arena.allocated(), arena.revoked());
    }

    #[test]
    fn test_teardown_revokes_all() {
        let mut previews = Previews::new();
        previews.sync(&[at("a.png", "image/png", 1), at("b.png", "image/png", 2)]);
        assert_eq!(previews.arena().live_count(), 2);

        previews.teardown();
        assert_eq!(previews.arena().live_count(), 0);
        assert_eq!(previews.arena().revoked(), 2);
        assert!(previews.records().is_empty());
    }

    #[test]
    fn test_handle_uri() {
        let mut arena = PreviewArena::new();
        let handle = arena.allocate(3, 1, &at("a.png", "image/png", 1));
        assert_eq!(handle.uri(), "preview://3/1");
        assert!(arena.revoke(handle));
        assert!(!arena.revoke(handle));
    }
}
