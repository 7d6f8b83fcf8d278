//! Attachment owner on the terminal side
//!
//! Sends are queued in an outbox and drained by the app after the key that
//! produced them has been handled.

use ssepack_core::{Attachment, AttachmentList, ComposerHost, SendPayload};
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct SessionHost {
    files: AttachmentList,
    outbox: Vec<SendPayload>,
}

impl SessionHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &AttachmentList {
        &self.files
    }

    pub fn take_outbox(&mut self) -> Vec<SendPayload> {
        std::mem::take(&mut self.outbox)
    }
}

impl ComposerHost for SessionHost {
    fn attachments(&self) -> &[Attachment] {
        self.files.as_slice()
    }

    fn files_added(&mut self, files: Vec<Attachment>) {
        for file in &files {
            info!(name = file.name(), mime = file.mime(), size = file.size(), "Attached");
        }
        self.files.extend(files);
    }

    fn remove_file(&mut self, index: usize) {
        if let Some(file) = self.files.remove(index) {
            debug!(name = file.name(), "Removed attachment");
        }
    }

    fn clear_files(&mut self) {
        self.files.clear();
    }

    fn send(&mut self, payload: SendPayload) {
        self.outbox.push(payload);
    }
}
