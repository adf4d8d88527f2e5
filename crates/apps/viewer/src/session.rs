//! The interactive map session: layer bootstrap, event routing, filter sync
//! and the download trigger.

use std::path::PathBuf;

use foundation::{GeoBox, ImageFeature, LonLat, SequenceId};
use layers::imagery::{
    BASE_LAYER, BASE_SOURCE_ID, IMAGE_SOURCE_LAYER, IMAGERY_SOURCE_ID, apply_filters,
    imagery_layers,
};
use layers::query::query_images;
use layers::{
    Cursor, FilterConfig, LayerFilters, LayerSpec, RenderSurface, SourceSpec, build_filters,
};
use runtime::{DownloadJob, DownloadProgress, Event, EventBus, EventKind, JobSlot, JobStatus};
use scene::{BoxDrawController, ModeChange, SelectionEvent, SelectionState, SuspendedNavigation};
use streaming::protocol::tiles_url_with_token;
use streaming::{ArchiveSink, DownloadError, DownloadReport, ImageryApi, SequenceDownloader};
use tracing::{debug, error, info, warn};

use crate::config::{ViewerConfig, Viewport};
use crate::controls::Controls;
use crate::error::ViewerError;

const BASE_TILE_SIZE: u32 = 256;
const IMAGERY_MIN_ZOOM: u8 = 6;
const IMAGERY_MAX_ZOOM: u8 = 14;

/// Everything the host forwards from the map engine and the control panel.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    PointerDown(LonLat),
    PointerMove(LonLat),
    PointerUp(LonLat),
    /// A click, with the features the engine hit on the interactive layers.
    Click { features: Vec<ImageFeature> },
    Hover { over_feature: bool },
    ToggleDrawBox,
    TogglePanosOnly,
    ViewportChanged(Viewport),
}

#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub report: DownloadReport,
}

pub struct MapSession<S: RenderSurface> {
    surface: S,
    imagery_enabled: bool,
    selection: SelectionState,
    draw: BoxDrawController,
    suspended: Option<SuspendedNavigation>,
    filter_config: FilterConfig,
    filters: LayerFilters,
    events: EventBus,
    jobs: JobSlot,
    /// Sequence of the download in progress; still set on the next call if
    /// the download future was dropped before it settled.
    in_flight: Option<SequenceId>,
    viewport: Viewport,
}

impl<S: RenderSurface> MapSession<S> {
    /// Registers the base map and, with an access token, the street-imagery
    /// overlay, then moves to the configured viewport.
    pub fn new(mut surface: S, config: &ViewerConfig) -> Result<Self, ViewerError> {
        let mut events = EventBus::new();

        surface.add_source(
            BASE_SOURCE_ID,
            SourceSpec::RasterTiles {
                tiles: config.base_imagery_url.clone(),
                tile_size: BASE_TILE_SIZE,
                attribution: Some(config.base_attribution.clone()),
            },
        )?;
        surface.add_layer(LayerSpec::raster(BASE_LAYER, BASE_SOURCE_ID))?;

        let filter_config = FilterConfig::default();
        let filters = build_filters(filter_config.panos_only, None);

        let imagery_enabled = match config.access_token.as_deref() {
            Some(token) => {
                surface.add_source(
                    IMAGERY_SOURCE_ID,
                    SourceSpec::VectorTiles {
                        tiles: tiles_url_with_token(&config.tiles_url, token),
                        min_zoom: IMAGERY_MIN_ZOOM,
                        max_zoom: IMAGERY_MAX_ZOOM,
                    },
                )?;
                for layer in imagery_layers(&filters) {
                    surface.add_layer(layer)?;
                }
                true
            }
            None => {
                info!("no Mapillary access token configured, street imagery disabled");
                events.emit(
                    EventKind::ImageryDisabled,
                    "Street imagery is unavailable: no access token configured",
                );
                false
            }
        };

        surface.set_center(config.viewport.center);
        surface.set_zoom(config.viewport.zoom);

        Ok(Self {
            surface,
            imagery_enabled,
            selection: SelectionState::Idle,
            draw: BoxDrawController::new(),
            suspended: None,
            filter_config,
            filters,
            events,
            jobs: JobSlot::new(),
            in_flight: None,
            viewport: config.viewport,
        })
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn imagery_enabled(&self) -> bool {
        self.imagery_enabled
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn committed_box(&self) -> Option<GeoBox> {
        self.draw.committed()
    }

    pub fn panos_only(&self) -> bool {
        self.filter_config.panos_only
    }

    pub fn filters(&self) -> &LayerFilters {
        &self.filters
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn last_download_status(&self) -> Option<JobStatus> {
        self.jobs.last_status()
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.report_interrupted_download();
        self.events.drain()
    }

    /// Posts the failure notice for a download whose future was dropped
    /// midway. The job itself was already marked failed by its guard.
    fn report_interrupted_download(&mut self) {
        if let Some(sequence_id) = self.in_flight.take() {
            error!("download of sequence {sequence_id} was interrupted");
            self.events.emit(
                EventKind::DownloadFailed,
                format!("Download of sequence {sequence_id} was interrupted"),
            );
        }
    }

    /// Single entry point for surface and control events.
    pub fn dispatch(&mut self, event: SurfaceEvent) -> Result<(), ViewerError> {
        self.report_interrupted_download();
        let drawing = self.selection.is_drawing_box();
        match event {
            SurfaceEvent::PointerDown(at) if drawing => {
                self.draw.on_pointer_down(&mut self.surface, at);
            }
            SurfaceEvent::PointerMove(at) if drawing => {
                self.draw.on_pointer_move(&mut self.surface, at);
            }
            SurfaceEvent::PointerUp(at) if drawing => {
                if let Some(b) = self.draw.on_pointer_up(&mut self.surface, at) {
                    debug!(
                        "box committed: {},{} .. {},{}",
                        b.min_lon, b.min_lat, b.max_lon, b.max_lat
                    );
                    self.apply(SelectionEvent::DragReleased)?;
                }
            }
            SurfaceEvent::PointerDown(_)
            | SurfaceEvent::PointerMove(_)
            | SurfaceEvent::PointerUp(_) => {}
            SurfaceEvent::Click { features } => {
                let hit = features
                    .into_iter()
                    .filter(|f| self.is_eligible(f))
                    .map(|f| f.sequence_id)
                    .find(|id| !id.is_empty());
                if let Some(sequence_id) = hit {
                    self.apply(SelectionEvent::FeatureClicked(sequence_id))?;
                }
            }
            SurfaceEvent::Hover { over_feature } => {
                if !drawing {
                    let cursor = if over_feature {
                        Cursor::Pointer
                    } else {
                        Cursor::Default
                    };
                    self.surface.set_cursor(cursor);
                }
            }
            SurfaceEvent::ToggleDrawBox => self.apply(SelectionEvent::ToggleDrawBox)?,
            SurfaceEvent::TogglePanosOnly => {
                let panos_only = self.filter_config.toggle_panos_only();
                debug!("panos only: {panos_only}");
                self.refresh_filters()?;
            }
            SurfaceEvent::ViewportChanged(viewport) => self.set_viewport(viewport),
        }
        Ok(())
    }

    /// Only features drawn on the imagery layers can be clicked.
    pub fn is_eligible(&self, feature: &ImageFeature) -> bool {
        self.imagery_enabled && self.filters.base.matches(feature)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport.center != self.viewport.center {
            self.surface.set_center(viewport.center);
        }
        if viewport.zoom != self.viewport.zoom {
            self.surface.set_zoom(viewport.zoom);
        }
        self.viewport = viewport;
    }

    /// Runs a selection event through the reducer and performs the side
    /// effects of the resulting mode change.
    fn apply(&mut self, event: SelectionEvent) -> Result<(), ViewerError> {
        let next = scene::reduce(&self.selection, &event);
        let change = ModeChange::between(&self.selection, &next);

        if change.entered_drawing {
            self.draw.begin(&mut self.surface);
            if self.suspended.is_none() {
                self.suspended = Some(scene::suspend_navigation(&mut self.surface));
            }
        }
        if change.exited_drawing {
            self.draw.abort_drag(&mut self.surface);
            self.restore_navigation();
        }

        self.selection = next;
        if change.selection_changed {
            self.refresh_filters()?;
        }
        Ok(())
    }

    fn restore_navigation(&mut self) {
        if let Some(saved) = self.suspended.take() {
            saved.restore(&mut self.surface);
        }
    }

    fn refresh_filters(&mut self) -> Result<(), ViewerError> {
        self.filters = build_filters(
            self.filter_config.panos_only,
            self.selection.selected_sequence(),
        );
        let applied = apply_filters(&mut self.surface, &self.filters)?;
        debug!("filters applied to {applied} layers");
        Ok(())
    }

    /// Loaded images of the selected sequence under the current filters,
    /// one per image id.
    pub fn selected_images(&self) -> Vec<ImageFeature> {
        if self.selection.selected_sequence().is_none() {
            return Vec::new();
        }
        query_images(
            &self.surface,
            IMAGERY_SOURCE_ID,
            IMAGE_SOURCE_LAYER,
            &self.filters.highlight,
        )
    }

    /// `None` without a selected sequence.
    pub fn selected_image_count(&self) -> Option<usize> {
        self.selection
            .selected_sequence()
            .map(|_| self.selected_images().len())
    }

    pub fn controls(&self, progress: Option<DownloadProgress>) -> Controls {
        Controls::compute(
            self.filter_config.panos_only,
            self.selection.is_drawing_box(),
            self.selected_image_count(),
            progress,
        )
    }

    /// Downloads the selected sequence and hands the archive to `sink`.
    ///
    /// Returns `Ok(None)` when there is nothing to download: no sequence is
    /// selected or none of its images pass the current filters. The job ends
    /// `Done` or `Failed` on every path, including when the returned future
    /// is dropped midway.
    pub async fn download_selected<A: ImageryApi>(
        &mut self,
        downloader: &SequenceDownloader<A>,
        sink: &mut dyn ArchiveSink,
        on_progress: impl FnMut(DownloadProgress),
    ) -> Result<Option<DownloadOutcome>, ViewerError> {
        self.report_interrupted_download();
        let Some(sequence_id) = self.selection.selected_sequence().cloned() else {
            debug!("download ignored: no sequence selected");
            return Ok(None);
        };
        let items = self.selected_images();
        if items.is_empty() {
            debug!("download ignored: sequence {sequence_id} has no matching images");
            return Ok(None);
        }

        self.events.emit(
            EventKind::DownloadStarted,
            format!(
                "Downloading {} images of sequence {sequence_id}",
                items.len()
            ),
        );

        self.in_flight = Some(sequence_id.clone());
        let mut guard = self.jobs.begin(DownloadJob::new(sequence_id.clone(), items));
        let result = run_and_save(downloader, guard.job_mut(), sink, on_progress).await;
        self.in_flight = None;

        match result {
            Ok(outcome) => {
                guard.finish();
                for failure in &outcome.report.failures {
                    self.events.emit(
                        EventKind::ItemFailed,
                        format!("Image {} skipped: {}", failure.image_id, failure.reason),
                    );
                }
                if !outcome.report.failures.is_empty() {
                    warn!(
                        "sequence {sequence_id}: {} images skipped",
                        outcome.report.failures.len()
                    );
                }
                self.events.emit(
                    EventKind::DownloadFinished,
                    format!("Saved {}", outcome.path.display()),
                );
                info!("saved {}", outcome.path.display());
                Ok(Some(outcome))
            }
            Err(err) => {
                guard.fail();
                error!("download of sequence {sequence_id} failed: {err}");
                self.events.emit(
                    EventKind::DownloadFailed,
                    format!("Download of sequence {sequence_id} failed: {err}"),
                );
                Err(err.into())
            }
        }
    }
}

async fn run_and_save<A: ImageryApi>(
    downloader: &SequenceDownloader<A>,
    job: &mut DownloadJob,
    sink: &mut dyn ArchiveSink,
    on_progress: impl FnMut(DownloadProgress),
) -> Result<DownloadOutcome, DownloadError> {
    let report = downloader.run(job, on_progress).await?;
    let path = sink
        .save(&report.file_name, &report.archive)
        .map_err(|source| DownloadError::Save {
            file_name: report.file_name.clone(),
            source,
        })?;
    Ok(DownloadOutcome { path, report })
}

impl<S: RenderSurface> Drop for MapSession<S> {
    fn drop(&mut self) {
        self.restore_navigation();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::io;
    use std::path::PathBuf;
    use std::time::Duration;

    use foundation::{ImageFeature, LonLat, SequenceId, normalize_box};
    use layers::imagery::{
        BASE_LAYER, HIGHLIGHT_LAYER, IMAGE_LAYER, IMAGE_SOURCE_LAYER, IMAGERY_SOURCE_ID,
        SEQUENCE_LAYER,
    };
    use layers::{Cursor, Gesture, HeadlessSurface, RenderSurface, build_filters};
    use pretty_assertions::assert_eq;
    use runtime::{DownloadProgress, EventKind, JobStatus};
    use scene::SelectionState;
    use scene::draw_box::{COMMITTED_OVERLAY_ID, PREVIEW_OVERLAY_ID};
    use streaming::{
        ApiError, ArchiveSink, BoxFuture, DownloadOptions, ImageryApi, MemorySink,
        SequenceDownloader,
    };

    use super::{MapSession, SurfaceEvent};
    use crate::config::{Viewport, ViewerConfig};
    use crate::error::ViewerError;

    fn loaded_surface() -> HeadlessSurface {
        let mut s = HeadlessSurface::new();
        s.load_features(
            IMAGERY_SOURCE_ID,
            IMAGE_SOURCE_LAYER,
            vec![
                ImageFeature::new("a1", "A").with_captured_at(20),
                ImageFeature::new("a2", "A").with_captured_at(10).with_pano(true),
                ImageFeature::new("a3", "A").with_captured_at(30),
                // Same image reported by a neighbouring tile.
                ImageFeature::new("a1", "A").with_captured_at(20),
                ImageFeature::new("b1", "B").with_pano(true),
            ],
        );
        s
    }

    fn config() -> ViewerConfig {
        ViewerConfig::default().with_access_token("MLY|test")
    }

    fn session() -> MapSession<HeadlessSurface> {
        MapSession::new(loaded_surface(), &config()).expect("session")
    }

    fn click(seq: &str) -> SurfaceEvent {
        SurfaceEvent::Click {
            features: vec![ImageFeature::new("x", seq)],
        }
    }

    fn navigation_enabled<S: RenderSurface>(s: &S) -> bool {
        Gesture::ALL.iter().all(|g| s.gesture_enabled(*g))
    }

    #[test]
    fn bootstrap_registers_layer_stack() {
        let m = session();
        assert!(m.imagery_enabled());
        assert_eq!(
            m.surface().layer_ids(),
            vec![BASE_LAYER, SEQUENCE_LAYER, IMAGE_LAYER, HIGHLIGHT_LAYER]
        );
        assert_eq!(
            m.surface().filter(HIGHLIGHT_LAYER),
            Some(&build_filters(false, None).highlight)
        );
        assert_eq!(m.surface().center(), LonLat::new(-0.09, 51.505));
        assert_eq!(m.surface().zoom(), 13.0);
        assert!(m.events().is_empty());
    }

    #[test]
    fn missing_token_disables_overlay() {
        let mut m = MapSession::new(loaded_surface(), &ViewerConfig::default()).expect("session");
        assert!(!m.imagery_enabled());
        assert_eq!(m.surface().layer_ids(), vec![BASE_LAYER]);
        assert_eq!(m.events()[0].kind, EventKind::ImageryDisabled);

        // No imagery layer is drawn, so nothing can be clicked.
        m.dispatch(click("A")).expect("click");
        assert_eq!(m.selection(), &SelectionState::Idle);
        assert_eq!(m.selected_image_count(), None);
        assert!(!m.controls(None).download.enabled);
    }

    #[test]
    fn hidden_features_cannot_be_selected() {
        let mut m = session();
        m.dispatch(SurfaceEvent::TogglePanosOnly).expect("toggle");

        // a1 is not a panorama and is filtered off the map.
        m.dispatch(SurfaceEvent::Click {
            features: vec![ImageFeature::new("a1", "A")],
        })
        .expect("click");
        assert_eq!(m.selection().selected_sequence(), None);

        // The first visible hit wins.
        m.dispatch(SurfaceEvent::Click {
            features: vec![
                ImageFeature::new("a1", "A"),
                ImageFeature::new("b1", "B").with_pano(true),
            ],
        })
        .expect("click");
        assert_eq!(m.selection().selected_sequence(), Some(&SequenceId::new("B")));
        assert_eq!(m.selected_image_count(), Some(1));
    }

    #[test]
    fn reselection_updates_highlight_and_count() {
        let mut m = session();
        assert_eq!(m.selected_image_count(), None);

        m.dispatch(click("A")).expect("click");
        assert_eq!(
            m.surface().filter(HIGHLIGHT_LAYER),
            Some(&build_filters(false, Some(&SequenceId::new("A"))).highlight)
        );
        assert_eq!(m.selected_image_count(), Some(3));

        m.dispatch(click("B")).expect("click");
        assert_eq!(
            m.selection(),
            &SelectionState::SequenceSelected(SequenceId::new("B"))
        );
        assert_eq!(
            m.surface().filter(HIGHLIGHT_LAYER),
            Some(&build_filters(false, Some(&SequenceId::new("B"))).highlight)
        );
        assert_eq!(m.selected_image_count(), Some(1));
        assert_eq!(m.controls(None).download.label, "Download 1 image");
    }

    #[test]
    fn click_on_empty_map_keeps_selection() {
        let mut m = session();
        m.dispatch(click("A")).expect("click");
        m.dispatch(SurfaceEvent::Click { features: vec![] })
            .expect("click");
        assert_eq!(m.selection().selected_sequence(), Some(&SequenceId::new("A")));
    }

    #[test]
    fn panos_toggle_refilters_layers_and_count() {
        let mut m = session();
        m.dispatch(click("A")).expect("click");
        m.dispatch(SurfaceEvent::TogglePanosOnly).expect("toggle");

        assert!(m.panos_only());
        assert_eq!(m.surface().filter(IMAGE_LAYER), Some(&build_filters(true, None).base));
        assert_eq!(m.surface().filter(SEQUENCE_LAYER), Some(&build_filters(true, None).base));
        assert_eq!(m.selected_image_count(), Some(1));

        m.dispatch(SurfaceEvent::TogglePanosOnly).expect("toggle");
        assert_eq!(m.selected_image_count(), Some(3));
    }

    #[test]
    fn clicks_are_ignored_while_drawing() {
        let mut m = session();
        m.dispatch(click("A")).expect("click");
        m.dispatch(SurfaceEvent::ToggleDrawBox).expect("toggle");
        assert!(m.selection().is_drawing_box());

        m.dispatch(click("B")).expect("click");
        assert!(m.selection().is_drawing_box());
        // Entering drawing dropped the selection.
        assert_eq!(m.selected_image_count(), None);
    }

    #[test]
    fn cancel_restores_navigation_and_cursor() {
        let mut m = session();
        m.dispatch(SurfaceEvent::Hover { over_feature: true })
            .expect("hover");
        assert_eq!(m.surface().cursor(), Cursor::Pointer);

        m.dispatch(SurfaceEvent::ToggleDrawBox).expect("toggle");
        assert!(!navigation_enabled(m.surface()));
        assert_eq!(m.surface().cursor(), Cursor::Crosshair);

        // Hover feedback is suppressed while drawing.
        m.dispatch(SurfaceEvent::Hover { over_feature: false })
            .expect("hover");
        assert_eq!(m.surface().cursor(), Cursor::Crosshair);

        m.dispatch(SurfaceEvent::PointerDown(LonLat::new(0.0, 0.0)))
            .expect("down");
        m.dispatch(SurfaceEvent::PointerMove(LonLat::new(1.0, 1.0)))
            .expect("move");
        assert!(m.surface().overlay(PREVIEW_OVERLAY_ID).is_some());

        m.dispatch(SurfaceEvent::ToggleDrawBox).expect("toggle");
        assert_eq!(m.selection(), &SelectionState::Idle);
        assert!(navigation_enabled(m.surface()));
        assert_eq!(m.surface().cursor(), Cursor::Pointer);
        assert!(m.surface().overlay(PREVIEW_OVERLAY_ID).is_none());
        assert_eq!(m.committed_box(), None);
    }

    #[test]
    fn drag_commits_box_and_returns_to_idle() {
        let mut m = session();
        m.dispatch(SurfaceEvent::ToggleDrawBox).expect("toggle");
        m.dispatch(SurfaceEvent::PointerDown(LonLat::new(2.0, 3.0)))
            .expect("down");
        m.dispatch(SurfaceEvent::PointerMove(LonLat::new(-1.0, 1.0)))
            .expect("move");
        m.dispatch(SurfaceEvent::PointerUp(LonLat::new(-2.0, 1.0)))
            .expect("up");

        let expected = normalize_box(LonLat::new(2.0, 3.0), LonLat::new(-2.0, 1.0));
        assert_eq!(m.selection(), &SelectionState::Idle);
        assert_eq!(m.committed_box(), Some(expected));
        assert!(m.surface().overlay(COMMITTED_OVERLAY_ID).is_some());
        assert!(m.surface().overlay(PREVIEW_OVERLAY_ID).is_none());
        assert!(navigation_enabled(m.surface()));

        // Selecting keeps the box; drawing again clears it.
        m.dispatch(click("A")).expect("click");
        assert_eq!(m.committed_box(), Some(expected));
        m.dispatch(SurfaceEvent::ToggleDrawBox).expect("toggle");
        assert_eq!(m.committed_box(), None);
        assert!(m.surface().overlay(COMMITTED_OVERLAY_ID).is_none());
    }

    #[test]
    fn pointer_events_outside_drawing_are_ignored() {
        let mut m = session();
        m.dispatch(SurfaceEvent::PointerDown(LonLat::new(0.0, 0.0)))
            .expect("down");
        m.dispatch(SurfaceEvent::PointerUp(LonLat::new(1.0, 1.0)))
            .expect("up");
        assert_eq!(m.committed_box(), None);
        assert_eq!(m.surface().overlay_count(), 0);
    }

    #[test]
    fn stray_pointer_up_keeps_drawing() {
        let mut m = session();
        m.dispatch(SurfaceEvent::ToggleDrawBox).expect("toggle");
        m.dispatch(SurfaceEvent::PointerUp(LonLat::new(1.0, 1.0)))
            .expect("up");
        assert!(m.selection().is_drawing_box());
        assert_eq!(m.committed_box(), None);
    }

    #[test]
    fn dropping_the_session_restores_navigation() {
        let mut surface = loaded_surface();
        surface.set_cursor(Cursor::Pointer);
        {
            let mut m = MapSession::new(&mut surface, &config()).expect("session");
            m.dispatch(SurfaceEvent::ToggleDrawBox).expect("toggle");
            assert_eq!(m.surface().cursor(), Cursor::Crosshair);
        }
        assert!(navigation_enabled(&surface));
        assert_eq!(surface.cursor(), Cursor::Pointer);
    }

    #[test]
    fn viewport_changes_move_the_map() {
        let mut m = session();
        m.dispatch(SurfaceEvent::ViewportChanged(Viewport {
            center: LonLat::new(2.35, 48.85),
            zoom: 15.0,
        }))
        .expect("viewport");
        assert_eq!(m.surface().center(), LonLat::new(2.35, 48.85));
        assert_eq!(m.surface().zoom(), 15.0);
        assert_eq!(m.viewport().zoom, 15.0);
    }

    #[derive(Default)]
    struct FakeApi {
        fail: HashSet<String>,
        stall: bool,
    }

    impl ImageryApi for FakeApi {
        fn resolve_download_url<'a>(
            &'a self,
            image_id: &'a str,
        ) -> BoxFuture<'a, Result<String, ApiError>> {
            Box::pin(async move {
                if self.stall {
                    std::future::pending::<()>().await;
                }
                if self.fail.contains(image_id) {
                    return Err(ApiError::NoDownloadUrl(image_id.to_string()));
                }
                Ok(format!("mem://{image_id}"))
            })
        }

        fn fetch_bytes<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, ApiError>> {
            Box::pin(async move { Ok(url.as_bytes().to_vec()) })
        }
    }

    struct BrokenSink;

    impl ArchiveSink for BrokenSink {
        fn save(&mut self, _file_name: &str, _bytes: &[u8]) -> io::Result<PathBuf> {
            Err(io::Error::other("disk full"))
        }
    }

    fn downloader(api: FakeApi) -> SequenceDownloader<FakeApi> {
        SequenceDownloader::new(api).with_options(DownloadOptions {
            item_delay: Duration::ZERO,
        })
    }

    #[tokio::test]
    async fn download_saves_archive_of_selected_sequence() {
        let mut m = session();
        m.dispatch(click("A")).expect("click");

        let mut sink = MemorySink::default();
        let mut progress: Vec<DownloadProgress> = Vec::new();
        let outcome = m
            .download_selected(
                &downloader(FakeApi::default()),
                &mut sink,
                |p| progress.push(p),
            )
            .await
            .expect("download")
            .expect("outcome");

        assert_eq!(
            outcome.report.entries,
            vec![
                "A_0001_a2.jpg".to_string(),
                "A_0002_a1.jpg".to_string(),
                "A_0003_a3.jpg".to_string(),
            ]
        );
        assert_eq!(sink.saved.len(), 1);
        assert_eq!(sink.saved[0].0, "mapillary_sequence_A.zip");
        assert_eq!(progress.last(), Some(&DownloadProgress { current: 3, total: 3 }));
        assert_eq!(m.last_download_status(), Some(JobStatus::Done));

        let kinds: Vec<EventKind> = m.drain_events().into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::DownloadStarted, EventKind::DownloadFinished]);
    }

    #[tokio::test]
    async fn partial_failure_still_finishes() {
        let mut m = session();
        m.dispatch(click("A")).expect("click");

        let api = FakeApi {
            fail: ["a1".to_string()].into_iter().collect(),
            ..FakeApi::default()
        };
        let mut sink = MemorySink::default();
        let outcome = m
            .download_selected(&downloader(api), &mut sink, |_| {})
            .await
            .expect("download")
            .expect("outcome");

        assert_eq!(outcome.report.entries.len(), 2);
        assert_eq!(m.last_download_status(), Some(JobStatus::Done));
        assert!(m.events().iter().any(|e| e.kind == EventKind::ItemFailed));
    }

    #[tokio::test]
    async fn download_without_selection_is_ignored() {
        let mut m = session();
        let mut sink = MemorySink::default();
        let outcome = m
            .download_selected(&downloader(FakeApi::default()), &mut sink, |_| {})
            .await
            .expect("download");
        assert!(outcome.is_none());
        assert!(sink.saved.is_empty());
        assert_eq!(m.last_download_status(), None);
    }

    #[tokio::test]
    async fn dropped_download_is_reported_on_next_call() {
        let mut m = session();
        m.dispatch(click("A")).expect("click");

        let stalled = downloader(FakeApi {
            stall: true,
            ..FakeApi::default()
        });
        let mut sink = MemorySink::default();
        let timed_out = tokio::time::timeout(
            Duration::from_millis(20),
            m.download_selected(&stalled, &mut sink, |_| {}),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(m.last_download_status(), Some(JobStatus::Failed));

        let kinds: Vec<EventKind> = m.drain_events().into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::DownloadStarted, EventKind::DownloadFailed]);

        // Reported once only.
        m.dispatch(SurfaceEvent::Hover { over_feature: false })
            .expect("hover");
        assert!(m.drain_events().is_empty());
        assert!(sink.saved.is_empty());
    }

    #[tokio::test]
    async fn save_failure_fails_the_job_and_allows_retry() {
        let mut m = session();
        m.dispatch(click("B")).expect("click");

        let err = m
            .download_selected(&downloader(FakeApi::default()), &mut BrokenSink, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ViewerError::Download(_)));
        assert_eq!(m.last_download_status(), Some(JobStatus::Failed));
        let failed = m
            .events()
            .iter()
            .find(|e| e.kind == EventKind::DownloadFailed)
            .expect("failure notice");
        assert!(failed.kind.requires_acknowledgement());

        let mut sink = MemorySink::default();
        let retry = m
            .download_selected(&downloader(FakeApi::default()), &mut sink, |_| {})
            .await
            .expect("retry");
        assert!(retry.is_some());
        assert_eq!(m.last_download_status(), Some(JobStatus::Done));
    }
}
