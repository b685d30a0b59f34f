//! The staging engine: validated pending files and the submit transaction.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;

use crate::config::StagingConfig;
use crate::error::{Rejection, SubmitError, TransferError};
use crate::notify::{NotificationPort, Severity};

use super::file::{FileIdentity, RawFile, StagedFile, StagedFileInfo};
use super::preview::{PreviewDescriptor, PreviewProvider};
use super::validate;

/// Transfers a batch of staged files somewhere.
///
/// The engine awaits this and never sees the wire format.
#[async_trait(?Send)]
pub trait Uploader {
    async fn upload(&self, files: &[RawFile]) -> Result<(), TransferError>;
}

/// Summary of a batch handed to the uploader successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub file_count: usize,
    pub total_bytes: u64,
    /// Identities of the uploaded files, in batch order
    pub identities: Vec<FileIdentity>,
    serials: Vec<u64>,
}

type SubmitListener = Box<dyn Fn(&StagingEngine, &SubmitReceipt)>;

/// Resets the `uploading` flag when dropped, whatever way submit exits.
struct UploadGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> UploadGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for UploadGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
        log::trace!("📤 Upload flag released");
    }
}

/// Holds accepted-but-unsubmitted files and drives their submission.
///
/// All methods take `&self`: the engine lives in a single-threaded UI and
/// must stay observable (see [`is_uploading`](Self::is_uploading)) while a
/// submit is suspended on the uploader.
pub struct StagingEngine {
    config: StagingConfig,
    files: RefCell<Vec<StagedFile>>,
    uploading: Cell<bool>,
    next_serial: Cell<u64>,
    uploader: Rc<dyn Uploader>,
    notifier: Rc<dyn NotificationPort>,
    previews: Rc<dyn PreviewProvider>,
    listeners: RefCell<Vec<SubmitListener>>,
}

impl StagingEngine {
    pub fn new(
        config: StagingConfig,
        uploader: Rc<dyn Uploader>,
        notifier: Rc<dyn NotificationPort>,
        previews: Rc<dyn PreviewProvider>,
    ) -> Self {
        Self {
            config,
            files: RefCell::new(Vec::new()),
            uploading: Cell::new(false),
            next_serial: Cell::new(0),
            uploader,
            notifier,
            previews,
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Validate and stage a batch of candidate files.
    ///
    /// Each failing file is reported to the user and skipped; the rest of the
    /// batch is still staged, appended in input order. A file whose identity
    /// is already staged replaces the existing entry in place.
    ///
    /// Returns the rejections, in input order.
    pub fn accept(&self, raw_files: impl IntoIterator<Item = RawFile>) -> Vec<Rejection> {
        let mut rejections = Vec::new();

        for raw in raw_files {
            if let Err(rejection) = validate::check(&raw, &self.config) {
                log::warn!("📥 Rejected {}: {}", raw.name, rejection);
                self.notifier.notify(&rejection.to_string(), Severity::Warning);
                rejections.push(rejection);
                continue;
            }

            let identity = self.config.identity_policy.identity_of(&raw);
            let serial = self.next_serial.get();
            self.next_serial.set(serial + 1);
            let mut files = self.files.borrow_mut();

            match files.iter_mut().find(|f| f.identity == identity) {
                Some(existing) => {
                    log::info!("📥 Replacing staged file {}", identity);
                    existing.preview.release(self.previews.as_ref());
                    *existing = StagedFile::new(identity, serial, raw);
                }
                None => {
                    log::info!("📥 Staged {} ({} bytes)", raw.name, raw.size);
                    files.push(StagedFile::new(identity, serial, raw));
                }
            }
        }

        rejections
    }

    /// Drop the staged file with this identity. Returns false if absent.
    pub fn remove(&self, identity: &FileIdentity) -> bool {
        let mut files = self.files.borrow_mut();
        let Some(pos) = files.iter().position(|f| &f.identity == identity) else {
            return false;
        };

        let mut removed = files.remove(pos);
        removed.preview.release(self.previews.as_ref());
        log::info!("📥 Removed staged file {}", identity);
        true
    }

    /// Empty the staging set. Returns how many files were dropped.
    pub fn remove_all(&self) -> usize {
        let mut drained: Vec<StagedFile> = self.files.borrow_mut().drain(..).collect();
        for file in &mut drained {
            file.preview.release(self.previews.as_ref());
        }

        if !drained.is_empty() {
            log::info!("📥 Cleared {} staged files", drained.len());
        }
        drained.len()
    }

    /// Drop the files a successful submit uploaded.
    ///
    /// Files staged while that upload was in flight stay, including ones
    /// that replaced an uploaded file under the same identity.
    pub fn remove_submitted(&self, receipt: &SubmitReceipt) -> usize {
        let mut files = self.files.borrow_mut();
        let mut removed = 0;

        files.retain_mut(|file| {
            if !receipt.serials.contains(&file.serial) {
                return true;
            }
            file.preview.release(self.previews.as_ref());
            removed += 1;
            false
        });

        if removed > 0 {
            log::info!("📥 Cleared {} uploaded files", removed);
        }
        removed
    }

    /// Preview for a staged file, creating its handle on first request.
    ///
    /// Returns `None` if nothing is staged under `identity`. Non-image files,
    /// and images whose handle cannot be created, get the document marker.
    pub fn preview(&self, identity: &FileIdentity) -> Option<PreviewDescriptor> {
        let mut files = self.files.borrow_mut();
        let file = files.iter_mut().find(|f| &f.identity == identity)?;

        if !file.raw.is_image() {
            return Some(PreviewDescriptor::Document);
        }

        match file.preview.get_or_create(self.previews.as_ref(), &file.raw) {
            Ok(url) => Some(PreviewDescriptor::Image {
                url,
                alt: file.raw.name.clone(),
            }),
            Err(e) => {
                log::warn!("🖼️ {} for {}", e, file.raw.name);
                Some(PreviewDescriptor::Document)
            }
        }
    }

    /// Snapshot of the staged files, in order.
    pub fn files(&self) -> Vec<StagedFileInfo> {
        self.files.borrow().iter().map(StagedFileInfo::from).collect()
    }

    pub fn contains(&self, identity: &FileIdentity) -> bool {
        self.files.borrow().iter().any(|f| &f.identity == identity)
    }

    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }

    /// True while a submit is waiting on the uploader.
    pub fn is_uploading(&self) -> bool {
        self.uploading.get()
    }

    /// Caption for the submit button.
    pub fn submit_label(&self) -> &'static str {
        if self.is_uploading() {
            "Uploading..."
        } else {
            "Browse Images"
        }
    }

    /// Register a callback run after every successful submit.
    ///
    /// The engine does not clear itself on success; subscribers decide,
    /// usually with [`remove_submitted`](Self::remove_submitted).
    pub fn on_submit_succeeded(
        &self,
        listener: impl Fn(&StagingEngine, &SubmitReceipt) + 'static,
    ) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    /// Hand the staged batch to the uploader.
    ///
    /// Fails without calling the uploader when nothing is staged or another
    /// submit is in flight. On uploader failure the staged files are kept for
    /// a retry. The `uploading` flag is reset on every exit path.
    pub async fn submit(&self) -> Result<SubmitReceipt, SubmitError> {
        let (batch, identities, serials) = {
            let files = self.files.borrow();
            let batch: Vec<RawFile> = files.iter().map(|f| f.raw.clone()).collect();
            let identities: Vec<FileIdentity> = files.iter().map(|f| f.identity.clone()).collect();
            let serials: Vec<u64> = files.iter().map(|f| f.serial).collect();
            (batch, identities, serials)
        };

        if batch.is_empty() {
            let err = SubmitError::EmptySubmission;
            log::warn!("📤 {}", err);
            self.notifier.notify(&err.to_string(), Severity::Warning);
            return Err(err);
        }

        if self.uploading.get() {
            let err = SubmitError::Busy;
            log::warn!("📤 {}", err);
            self.notifier.notify(&err.to_string(), Severity::Warning);
            return Err(err);
        }

        let receipt = SubmitReceipt {
            file_count: batch.len(),
            total_bytes: batch.iter().map(|f| f.size).sum(),
            identities,
            serials,
        };

        let result = {
            let _guard = UploadGuard::acquire(&self.uploading);
            log::info!(
                "📤 Uploading {} files ({} bytes)",
                receipt.file_count,
                receipt.total_bytes
            );
            self.uploader.upload(&batch).await
        };

        match result {
            Ok(()) => {
                log::info!("📤 Upload of {} files complete", receipt.file_count);
                self.notify_submit_succeeded(&receipt);
                Ok(receipt)
            }
            Err(e) => {
                log::error!("📤 Error uploading files: {}", e);
                let err = SubmitError::Transfer(e);
                self.notifier.notify(&err.to_string(), Severity::Error);
                Err(err)
            }
        }
    }

    fn notify_submit_succeeded(&self, receipt: &SubmitReceipt) {
        // Listeners may touch the engine (and even subscribe), so none of its
        // cells stay borrowed while they run.
        let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        for listener in &listeners {
            listener(self, receipt);
        }

        let mut slot = self.listeners.borrow_mut();
        let added = std::mem::replace(&mut *slot, listeners);
        slot.extend(added);
    }
}

impl Drop for StagingEngine {
    fn drop(&mut self) {
        for file in self.files.get_mut().iter_mut() {
            file.preview.release(self.previews.as_ref());
        }
    }
}

impl std::fmt::Debug for StagingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingEngine")
            .field("config", &self.config)
            .field("files", &self.files)
            .field("uploading", &self.uploading)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemoryNotifier;
    use crate::staging::MemoryPreviewProvider;
    use crate::staging::file::IdentityPolicy;
    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    /// Records every batch and optionally fails.
    #[derive(Default)]
    struct RecordingUploader {
        batches: RefCell<Vec<Vec<String>>>,
        fail: bool,
    }

    #[async_trait(?Send)]
    impl Uploader for RecordingUploader {
        async fn upload(&self, files: &[RawFile]) -> Result<(), TransferError> {
            self.batches
                .borrow_mut()
                .push(files.iter().map(|f| f.name.clone()).collect());
            if self.fail {
                Err(TransferError::other("server unavailable"))
            } else {
                Ok(())
            }
        }
    }

    /// Stays pending until opened.
    #[derive(Default)]
    struct GatedUploader {
        open: Cell<bool>,
        calls: Cell<usize>,
    }

    #[async_trait(?Send)]
    impl Uploader for GatedUploader {
        async fn upload(&self, _files: &[RawFile]) -> Result<(), TransferError> {
            self.calls.set(self.calls.get() + 1);
            std::future::poll_fn(|_| {
                if self.open.get() {
                    Poll::Ready(())
                } else {
                    Poll::Pending
                }
            })
            .await;
            Ok(())
        }
    }

    struct Harness {
        engine: StagingEngine,
        notifier: Rc<MemoryNotifier>,
        previews: Rc<MemoryPreviewProvider>,
    }

    fn harness_with(uploader: Rc<dyn Uploader>, config: StagingConfig) -> Harness {
        let notifier = Rc::new(MemoryNotifier::new());
        let previews = Rc::new(MemoryPreviewProvider::new());
        let engine = StagingEngine::new(config, uploader, notifier.clone(), previews.clone());
        Harness {
            engine,
            notifier,
            previews,
        }
    }

    fn harness(uploader: Rc<dyn Uploader>) -> Harness {
        harness_with(uploader, StagingConfig::default())
    }

    fn image(name: &str, size: usize) -> RawFile {
        RawFile::new(name, "image/png", vec![0u8; size])
    }

    fn names(engine: &StagingEngine) -> Vec<String> {
        engine.files().into_iter().map(|f| f.name).collect()
    }

    #[test]
    fn test_accept_filters_and_reports_each_rejection() {
        let h = harness(Rc::new(RecordingUploader::default()));

        let rejections = h.engine.accept(vec![
            image("a.png", 10),
            RawFile::new("notes.txt", "text/plain", vec![1u8; 3]),
            RawFile::from_parts("huge.jpg", "image/jpeg", 20_000_001, Vec::new()),
            image("b.png", 20),
        ]);

        assert_eq!(names(&h.engine), vec!["a.png", "b.png"]);
        assert_eq!(rejections.len(), 2);
        assert_eq!(
            h.notifier.messages(),
            vec![
                "File notes.txt is not an image file.",
                "File huge.jpg is too large. Maximum size is 20 MB.",
            ]
        );
    }

    #[test]
    fn test_accept_appends_to_existing_set() {
        let h = harness(Rc::new(RecordingUploader::default()));
        h.engine.accept(vec![image("a.png", 1)]);
        h.engine.accept(vec![image("b.png", 1), image("c.png", 1)]);

        assert_eq!(names(&h.engine), vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_same_name_supersedes_in_place() {
        let h = harness(Rc::new(RecordingUploader::default()));
        h.engine
            .accept(vec![image("a.png", 1), image("b.png", 1), image("c.png", 1)]);
        let old_preview = h.engine.preview(&"b.png".into());

        h.engine.accept(vec![image("b.png", 99)]);

        let files = h.engine.files();
        assert_eq!(names(&h.engine), vec!["a.png", "b.png", "c.png"]);
        assert_eq!(files[1].size, 99);

        // The replaced file's preview was revoked
        let Some(PreviewDescriptor::Image { url, .. }) = old_preview else {
            panic!("expected image preview");
        };
        assert!(!h.previews.is_live(&url));
    }

    #[test]
    fn test_composite_identity_keeps_same_named_files() {
        let config = StagingConfig {
            identity_policy: IdentityPolicy::Composite,
            ..StagingConfig::default()
        };
        let h = harness_with(Rc::new(RecordingUploader::default()), config);

        h.engine.accept(vec![image("a.png", 1), image("a.png", 2)]);
        assert_eq!(h.engine.len(), 2);
    }

    #[test]
    fn test_remove_then_readd_yields_single_member() {
        let h = harness(Rc::new(RecordingUploader::default()));
        h.engine.accept(vec![image("a.png", 1), image("b.png", 1)]);

        assert!(h.engine.remove(&"a.png".into()));
        h.engine.accept(vec![image("a.png", 1)]);

        let count = h
            .engine
            .files()
            .iter()
            .filter(|f| f.identity.as_str() == "a.png")
            .count();
        assert_eq!(count, 1);
        assert_eq!(names(&h.engine), vec!["b.png", "a.png"]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let h = harness(Rc::new(RecordingUploader::default()));
        h.engine.accept(vec![image("a.png", 1)]);

        assert!(!h.engine.remove(&"missing.png".into()));
        assert_eq!(h.engine.len(), 1);
    }

    #[test]
    fn test_remove_releases_preview() {
        let h = harness(Rc::new(RecordingUploader::default()));
        h.engine.accept(vec![image("a.png", 1)]);
        h.engine.preview(&"a.png".into());
        assert_eq!(h.previews.live_count(), 1);

        h.engine.remove(&"a.png".into());
        assert_eq!(h.previews.live_count(), 0);
        assert_eq!(h.previews.revoked_count(), 1);
    }

    #[test]
    fn test_remove_all_empties_and_invalidates_previews() {
        let h = harness(Rc::new(RecordingUploader::default()));
        h.engine
            .accept(vec![image("a.png", 1), image("b.png", 1), image("c.png", 1)]);
        h.engine.preview(&"a.png".into());
        h.engine.preview(&"c.png".into());

        assert_eq!(h.engine.remove_all(), 3);
        assert!(h.engine.is_empty());
        assert_eq!(h.previews.live_count(), 0);
        assert_eq!(h.previews.revoked_count(), 2);

        // Clearing an empty set is fine
        assert_eq!(h.engine.remove_all(), 0);
    }

    #[test]
    fn test_previews_are_lazy_and_reused() {
        let h = harness(Rc::new(RecordingUploader::default()));
        h.engine.accept(vec![image("a.png", 1), image("b.png", 1)]);
        assert_eq!(h.previews.live_count(), 0);

        let first = h.engine.preview(&"a.png".into());
        let second = h.engine.preview(&"a.png".into());
        assert_eq!(first, second);
        assert_eq!(h.previews.live_count(), 1);

        assert_eq!(h.engine.preview(&"missing.png".into()), None);
    }

    #[test]
    fn test_non_image_preview_is_document_marker() {
        let config = StagingConfig {
            mime_prefix: String::new(),
            ..StagingConfig::default()
        };
        let h = harness_with(Rc::new(RecordingUploader::default()), config);
        h.engine
            .accept(vec![RawFile::new("doc.pdf", "application/pdf", vec![0u8; 4])]);

        assert_eq!(
            h.engine.preview(&"doc.pdf".into()),
            Some(PreviewDescriptor::Document)
        );
        assert_eq!(h.previews.live_count(), 0);
    }

    #[test]
    fn test_drop_releases_outstanding_previews() {
        let previews = Rc::new(MemoryPreviewProvider::new());
        {
            let engine = StagingEngine::new(
                StagingConfig::default(),
                Rc::new(RecordingUploader::default()),
                Rc::new(MemoryNotifier::new()),
                previews.clone(),
            );
            engine.accept(vec![image("a.png", 1)]);
            engine.preview(&"a.png".into());
            assert_eq!(previews.live_count(), 1);
        }
        assert_eq!(previews.live_count(), 0);
    }

    #[test]
    fn test_submit_empty_never_calls_uploader() {
        let uploader = Rc::new(RecordingUploader::default());
        let h = harness(uploader.clone());

        let result = pollster::block_on(h.engine.submit());

        assert!(matches!(result, Err(SubmitError::EmptySubmission)));
        assert!(uploader.batches.borrow().is_empty());
        assert_eq!(h.notifier.messages(), vec!["Please select files to upload."]);
        assert!(!h.engine.is_uploading());
    }

    #[test]
    fn test_submit_passes_ordered_batch_and_keeps_files() {
        let uploader = Rc::new(RecordingUploader::default());
        let h = harness(uploader.clone());
        h.engine.accept(vec![image("b.png", 5), image("a.png", 7)]);

        let receipt = pollster::block_on(h.engine.submit()).unwrap();

        assert_eq!(receipt.file_count, 2);
        assert_eq!(receipt.total_bytes, 12);
        assert_eq!(
            receipt.identities,
            vec![FileIdentity::from("b.png"), FileIdentity::from("a.png")]
        );
        assert_eq!(*uploader.batches.borrow(), vec![vec!["b.png", "a.png"]]);
        // Clearing is left to the host
        assert_eq!(h.engine.len(), 2);
        assert!(!h.engine.is_uploading());
    }

    #[test]
    fn test_submit_failure_keeps_set_and_resets_flag() {
        let uploader = Rc::new(RecordingUploader {
            fail: true,
            ..RecordingUploader::default()
        });
        let h = harness(uploader.clone());
        h.engine.accept(vec![image("a.png", 1), image("b.png", 1)]);
        let before = h.engine.files();

        let result = pollster::block_on(h.engine.submit());

        assert!(matches!(result, Err(SubmitError::Transfer(_))));
        assert_eq!(h.engine.files(), before);
        assert!(!h.engine.is_uploading());
        assert_eq!(h.notifier.notices().last().unwrap().severity, Severity::Error);
    }

    #[test]
    fn test_listeners_run_only_on_success() {
        let ok = Rc::new(RecordingUploader::default());
        let h = harness(ok);
        h.engine.on_submit_succeeded(|engine, receipt| {
            engine.remove_submitted(receipt);
        });
        h.engine.accept(vec![image("a.png", 1)]);

        pollster::block_on(h.engine.submit()).unwrap();
        assert!(h.engine.is_empty());

        let failing = Rc::new(RecordingUploader {
            fail: true,
            ..RecordingUploader::default()
        });
        let h = harness(failing);
        h.engine.on_submit_succeeded(|engine, receipt| {
            engine.remove_submitted(receipt);
        });
        h.engine.accept(vec![image("a.png", 1)]);

        let _ = pollster::block_on(h.engine.submit());
        assert_eq!(h.engine.len(), 1);
    }

    #[test]
    fn test_uploading_visible_while_suspended_and_reentry_refused() {
        let uploader = Rc::new(GatedUploader::default());
        let h = harness(uploader.clone());
        h.engine.accept(vec![image("a.png", 1)]);
        let mut cx = Context::from_waker(Waker::noop());

        let mut first = pin!(h.engine.submit());
        assert!(first.as_mut().poll(&mut cx).is_pending());
        assert!(h.engine.is_uploading());
        assert_eq!(h.engine.submit_label(), "Uploading...");

        let second = pollster::block_on(h.engine.submit());
        assert!(matches!(second, Err(SubmitError::Busy)));
        assert_eq!(uploader.calls.get(), 1);

        uploader.open.set(true);
        assert!(matches!(first.as_mut().poll(&mut cx), Poll::Ready(Ok(_))));
        assert!(!h.engine.is_uploading());
        assert_eq!(h.engine.submit_label(), "Browse Images");
    }

    #[test]
    fn test_files_staged_during_upload_survive_clearing() {
        let uploader = Rc::new(GatedUploader::default());
        let h = harness(uploader.clone());
        h.engine.on_submit_succeeded(|engine, receipt| {
            engine.remove_submitted(receipt);
        });
        h.engine.accept(vec![image("one.png", 1), image("two.png", 1)]);
        let mut cx = Context::from_waker(Waker::noop());

        let mut pending = pin!(h.engine.submit());
        assert!(pending.as_mut().poll(&mut cx).is_pending());

        // A new file and a replacement arrive mid-flight
        h.engine.accept(vec![image("three.png", 1), image("two.png", 9)]);

        uploader.open.set(true);
        let Poll::Ready(Ok(receipt)) = pending.as_mut().poll(&mut cx) else {
            panic!("expected upload to finish");
        };

        assert_eq!(receipt.file_count, 2);
        assert_eq!(names(&h.engine), vec!["two.png", "three.png"]);
        assert_eq!(h.engine.files()[0].size, 9);
    }

    #[test]
    fn test_cancelled_submit_releases_flag() {
        let uploader = Rc::new(GatedUploader::default());
        let h = harness(uploader);
        h.engine.accept(vec![image("a.png", 1)]);
        let mut cx = Context::from_waker(Waker::noop());

        {
            let mut pending = Box::pin(h.engine.submit());
            assert!(pending.as_mut().poll(&mut cx).is_pending());
            assert!(h.engine.is_uploading());
        }

        assert!(!h.engine.is_uploading());
        assert_eq!(h.engine.len(), 1);
    }
}
