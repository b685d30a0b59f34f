//! Page controller: composes the staging engine, the carousel and the API.
//!
//! Owns the list of published image URLs. After a successful upload or
//! delete it refetches the list and hands it to the carousel.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::api::{
    ApiError, DocumentApi, DocumentUploader, HttpDocumentApi, ResourceId, ResourceRecord, sort_by_seq,
};
use crate::carousel::CarouselController;
use crate::config::AppConfig;
use crate::error::SubmitError;
use crate::notify::{NotificationPort, Severity};
use crate::staging::{PreviewProvider, StagingEngine, SubmitReceipt};

pub struct PageController {
    api: Rc<dyn DocumentApi>,
    notifier: Rc<dyn NotificationPort>,
    records: RefCell<Vec<ResourceRecord>>,
    images: RefCell<Vec<String>>,
    placeholders: Vec<String>,
    carousel: RefCell<CarouselController>,
    staging: StagingEngine,
}

impl PageController {
    pub fn new(
        config: &AppConfig,
        api: Rc<dyn DocumentApi>,
        notifier: Rc<dyn NotificationPort>,
        previews: Rc<dyn PreviewProvider>,
    ) -> Self {
        let staging = StagingEngine::new(
            config.staging.clone(),
            Rc::new(DocumentUploader::new(api.clone())),
            notifier.clone(),
            previews,
        );
        // Uploaded files are on the server now
        staging.on_submit_succeeded(|engine, receipt| {
            engine.remove_submitted(receipt);
        });

        let placeholders = config.carousel.placeholder_slides.clone();
        let carousel = CarouselController::new(placeholders.clone(), &config.carousel);

        Self {
            api,
            notifier,
            records: RefCell::new(Vec::new()),
            images: RefCell::new(Vec::new()),
            placeholders,
            carousel: RefCell::new(carousel),
            staging,
        }
    }

    /// Build a page talking HTTP to the configured server.
    pub fn connect(
        config: &AppConfig,
        notifier: Rc<dyn NotificationPort>,
        previews: Rc<dyn PreviewProvider>,
    ) -> Result<Self, ApiError> {
        let api = HttpDocumentApi::new(&config.server)?;
        log::info!(
            "🌐 Station {} at {}",
            api.station_id(),
            config.server.address
        );
        Ok(Self::new(config, Rc::new(api), notifier, previews))
    }

    pub fn staging(&self) -> &StagingEngine {
        &self.staging
    }

    pub fn carousel(&self) -> Ref<'_, CarouselController> {
        self.carousel.borrow()
    }

    pub fn carousel_mut(&self) -> RefMut<'_, CarouselController> {
        self.carousel.borrow_mut()
    }

    /// Published image URLs, ordered by `seq`.
    pub fn images(&self) -> Vec<String> {
        self.images.borrow().clone()
    }

    /// Published records, ordered by `seq`.
    pub fn records(&self) -> Vec<ResourceRecord> {
        self.records.borrow().clone()
    }

    /// What the carousel should show: the published images, or the
    /// placeholder banners while nothing is published.
    pub fn carousel_slides(&self) -> Vec<String> {
        let images = self.images.borrow();
        if images.is_empty() {
            self.placeholders.clone()
        } else {
            images.clone()
        }
    }

    /// Refetch the published list. On failure the previous list is kept.
    pub async fn refresh(&self) -> Result<usize, ApiError> {
        let mut records = match self.api.list_resources().await {
            Ok(records) => records,
            Err(e) => {
                log::error!("🌐 Error fetching images: {}", e);
                self.notifier
                    .notify(&format!("Failed to load images: {}", e), Severity::Error);
                return Err(e);
            }
        };

        sort_by_seq(&mut records);
        let urls: Vec<String> = records.iter().map(|r| r.url.clone()).collect();
        let count = urls.len();

        *self.records.borrow_mut() = records;
        *self.images.borrow_mut() = urls;
        let slides = self.carousel_slides();
        self.carousel.borrow_mut().set_slides(slides);

        Ok(count)
    }

    /// Delete one published resource, then refetch.
    pub async fn delete_resource(&self, id: &ResourceId) -> Result<(), ApiError> {
        if let Err(e) = self.api.delete_resource(id).await {
            log::error!("🌐 Error deleting resource {}: {}", id, e);
            self.notifier
                .notify(&format!("Failed to delete image: {}", e), Severity::Error);
            return Err(e);
        }

        // A failed refetch is reported by refresh itself
        let _ = self.refresh().await;
        Ok(())
    }

    /// Delete every published resource that carries an id, then refetch once.
    ///
    /// Returns how many deletions succeeded.
    pub async fn delete_all(&self) -> usize {
        let ids: Vec<ResourceId> = self
            .records
            .borrow()
            .iter()
            .filter_map(|r| r.id.clone())
            .collect();

        let mut deleted = 0;
        for id in &ids {
            match self.api.delete_resource(id).await {
                Ok(()) => deleted += 1,
                Err(e) => log::error!("🌐 Error deleting resource {}: {}", id, e),
            }
        }

        if deleted < ids.len() {
            self.notifier.notify(
                &format!("Failed to delete {} of {} images.", ids.len() - deleted, ids.len()),
                Severity::Error,
            );
        }

        let _ = self.refresh().await;
        deleted
    }

    /// Upload the staged files. On success the uploaded files leave staging
    /// and the list is refetched.
    pub async fn submit_staged(&self) -> Result<SubmitReceipt, SubmitError> {
        let receipt = self.staging.submit().await?;
        let _ = self.refresh().await;
        Ok(receipt)
    }
}

impl std::fmt::Debug for PageController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageController")
            .field("images", &self.images)
            .field("carousel", &self.carousel)
            .field("staging", &self.staging)
            .finish_non_exhaustive()
    }
}
