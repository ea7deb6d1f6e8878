//! The editing session.
//!
//! [`EditorSession`] owns one [`BannerWorkflow`] and the injected services.
//! User input is validated here, at the point of assignment; the core model
//! below it accepts any value. Results of async work (AI calls, uploads) are
//! folded in only if the workflow has not moved on since the request left.

use std::collections::BTreeMap;
use std::sync::Arc;

use banner_core::ai::{
    self, AiImageRequest, AiImageResponse, AiService, AiTextRequest, AiTextResponse, ImageStyle,
    TextTone,
};
use banner_core::config::{
    validate_background, validate_columns, BackgroundType, BannerConfig, ConfigPatch, ContentItem,
    ContentType,
};
use banner_core::error::CoreError;
use banner_core::export::{ExportFormat, ExportRequest, ExportResult, ExportService};
use banner_core::ids::{IdGenerator, SessionIdGenerator};
use banner_core::layout::{self, ContentPatch};
use banner_core::persistence::{
    join_path, unique_file_name, DocumentStore, FileStorage, ProgressCallback, UploadMetadata,
    UploadResult,
};
use banner_core::preview::{self, RenderTree};
use banner_core::types::EntityId;
use banner_core::workflow::{AsyncTicket, BannerWorkflow};
use banner_store::BannerRepo;

use crate::config::EditorConfig;

/// Custom metadata key recording the uploaded file's original name.
pub const ORIGINAL_NAME_KEY: &str = "originalName";

/// Where an upload will be stored and the metadata it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub path: String,
    pub metadata: UploadMetadata,
}

/// One user's banner editing session.
pub struct EditorSession<A, S, F> {
    workflow: BannerWorkflow,
    ids: Arc<dyn IdGenerator>,
    ai: A,
    store: S,
    files: F,
    config: EditorConfig,
}

impl<A, S, F> EditorSession<A, S, F>
where
    A: AiService,
    S: DocumentStore,
    F: FileStorage,
{
    /// A session over a blank banner.
    pub fn new(ai: A, store: S, files: F, config: EditorConfig) -> Self {
        Self {
            workflow: BannerWorkflow::default(),
            ids: Arc::new(SessionIdGenerator),
            ai,
            store,
            files,
            config,
        }
    }

    /// Seed the banner with `initial`. Reset returns here.
    pub fn with_initial(mut self, initial: ConfigPatch) -> Self {
        self.workflow = BannerWorkflow::new(initial);
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn workflow(&self) -> &BannerWorkflow {
        &self.workflow
    }

    pub fn banner(&self) -> &BannerConfig {
        self.workflow.config()
    }

    pub fn editor_config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn ai(&self) -> &A {
        &self.ai
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn files(&self) -> &F {
        &self.files
    }

    /// Render the current banner.
    pub fn preview(&self) -> RenderTree {
        preview::render(self.banner())
    }

    /// Items kept in the banner but outside the current columns.
    pub fn hidden_items(&self) -> Vec<&ContentItem> {
        layout::orphaned_items(&self.banner().content, self.banner().columns)
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Complete the current step and move on, without checking its gate.
    pub fn next_step(&mut self) {
        let from = self.current_step_id();
        self.workflow.advance();
        self.log_transition(&from, "next");
    }

    /// [`next_step`](Self::next_step) only if the current step's gate passes.
    pub fn try_next_step(&mut self) -> Result<(), CoreError> {
        if !self.workflow.can_proceed() {
            return Err(CoreError::Validation(format!(
                "Step '{}' is not complete",
                self.current_step_id()
            )));
        }
        self.next_step();
        Ok(())
    }

    pub fn previous_step(&mut self) {
        let from = self.current_step_id();
        self.workflow.retreat();
        self.log_transition(&from, "previous");
    }

    pub fn go_to_step(&mut self, step_id: &str) {
        let from = self.current_step_id();
        self.workflow.go_to(step_id);
        self.log_transition(&from, "go_to");
    }

    pub fn complete_step(&mut self, step_id: &str) {
        self.workflow.mark_completed(step_id);
    }

    pub fn can_proceed(&self) -> bool {
        self.workflow.can_proceed()
    }

    /// Discard all edits and go back to the first step.
    pub fn reset(&mut self) {
        self.workflow.reset();
        tracing::debug!(generation = self.workflow.generation(), "Workflow reset");
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    pub fn set_columns(&mut self, columns: u32) -> Result<(), CoreError> {
        validate_columns(columns)?;
        self.workflow.update_config(ConfigPatch::columns(columns));
        let hidden = self.hidden_items().len();
        if hidden > 0 {
            tracing::info!(columns, hidden, "Content hidden by column change");
        }
        Ok(())
    }

    pub fn set_background(
        &mut self,
        background_type: BackgroundType,
        value: impl Into<String>,
    ) -> Result<(), CoreError> {
        let value = value.into();
        validate_background(background_type, &value)?;
        self.workflow
            .update_config(ConfigPatch::background(background_type, value));
        Ok(())
    }

    /// Copy a template's layout into a fresh, unsaved banner.
    pub fn start_from_template(&mut self, template: &BannerConfig) {
        let seed = BannerConfig::seeded(ConfigPatch {
            id: None,
            columns: Some(template.columns),
            background_type: Some(template.background_type),
            background_value: Some(template.background_value.clone()),
            content: Some(template.content.clone()),
        });
        self.workflow.start_over(seed);
        tracing::info!(template_id = %template.id, "Started banner from template");
    }

    // -----------------------------------------------------------------------
    // Content
    // -----------------------------------------------------------------------

    pub fn add_text(&mut self, column: u32) -> Result<EntityId, CoreError> {
        self.ensure_column(column)?;
        let item = layout::new_text_item(self.ids.as_ref(), column);
        self.push_item(item)
    }

    pub fn add_image(&mut self, column: u32) -> Result<EntityId, CoreError> {
        self.ensure_column(column)?;
        let item = layout::new_image_item(self.ids.as_ref(), column);
        self.push_item(item)
    }

    /// Merge `patch` into an existing item. A new position must target an
    /// existing column.
    pub fn update_item(&mut self, item_id: &str, patch: ContentPatch) -> Result<(), CoreError> {
        self.ensure_item(item_id)?;
        if let Some(position) = &patch.position {
            self.ensure_column(position.column)?;
        }
        let content = layout::update_item(&self.banner().content, item_id, patch);
        self.workflow.update_config(ConfigPatch::content(content));
        Ok(())
    }

    /// Remove an item. Returns `false` if no item had that id.
    pub fn remove_item(&mut self, item_id: &str) -> bool {
        if layout::find_item(&self.banner().content, item_id).is_none() {
            return false;
        }
        let content = layout::remove_item(&self.banner().content, item_id);
        self.workflow.update_config(ConfigPatch::content(content));
        true
    }

    // -----------------------------------------------------------------------
    // AI text
    // -----------------------------------------------------------------------

    /// Build the request for optimizing a text item, plus the ticket its
    /// result must be presented with.
    pub fn begin_text_optimization(
        &self,
        item_id: &str,
        context: impl Into<String>,
        tone: Option<TextTone>,
    ) -> Result<(AsyncTicket, AiTextRequest), CoreError> {
        let item = self.ensure_item(item_id)?;
        if item.content_type != ContentType::Text {
            return Err(CoreError::Validation(format!(
                "Content item '{item_id}' is not a text item"
            )));
        }
        let mut request = AiTextRequest::new(item.content.clone(), context);
        if tone.is_some() {
            request.style = tone;
        }
        request.validate_request()?;
        Ok((self.workflow.ticket(), request))
    }

    /// Fold an optimization result into the banner.
    ///
    /// Stale tickets and failed calls leave the banner untouched.
    pub fn finish_text_optimization(
        &mut self,
        ticket: &AsyncTicket,
        item_id: &str,
        result: Result<AiTextResponse, CoreError>,
    ) -> Result<(), CoreError> {
        self.accept_ticket(ticket, "text optimization")?;
        let response = result.inspect_err(|e| {
            tracing::warn!(error = %e, item_id, "Text optimization failed");
        })?;
        let content = ai::apply_optimized_text(&self.banner().content, item_id, &response)?;
        self.workflow
            .apply_async(ticket, ConfigPatch::content(content))?;
        tracing::debug!(item_id, "Optimized text applied");
        Ok(())
    }

    pub async fn optimize_text(
        &mut self,
        item_id: &str,
        context: impl Into<String>,
        tone: Option<TextTone>,
    ) -> Result<(), CoreError> {
        let (ticket, request) = self.begin_text_optimization(item_id, context, tone)?;
        let result = self.ai.optimize_text(&request).await;
        self.finish_text_optimization(&ticket, item_id, result)
    }

    // -----------------------------------------------------------------------
    // AI image
    // -----------------------------------------------------------------------

    pub fn begin_image_generation(
        &self,
        prompt: impl Into<String>,
        column: u32,
        style: Option<ImageStyle>,
    ) -> Result<(AsyncTicket, AiImageRequest), CoreError> {
        self.ensure_column(column)?;
        let mut request = AiImageRequest::new(prompt);
        if style.is_some() {
            request.style = style;
        }
        request.validate_request()?;
        Ok((self.workflow.ticket(), request))
    }

    /// Add the generated image to `column`. Returns the new item id.
    pub fn finish_image_generation(
        &mut self,
        ticket: &AsyncTicket,
        column: u32,
        result: Result<AiImageResponse, CoreError>,
    ) -> Result<EntityId, CoreError> {
        self.accept_ticket(ticket, "image generation")?;
        let response = result.inspect_err(|e| {
            tracing::warn!(error = %e, "Image generation failed");
        })?;
        self.ensure_column(column)?;
        let item = ai::generated_image_item(self.ids.as_ref(), column, &response);
        self.ensure_unique_id(&item.id)?;
        let id = item.id.clone();
        let content = layout::add_item(&self.banner().content, item);
        self.workflow
            .apply_async(ticket, ConfigPatch::content(content))?;
        tracing::debug!(item_id = %id, column, "Generated image added");
        Ok(id)
    }

    pub async fn generate_image(
        &mut self,
        prompt: impl Into<String>,
        column: u32,
        style: Option<ImageStyle>,
    ) -> Result<EntityId, CoreError> {
        let (ticket, request) = self.begin_image_generation(prompt, column, style)?;
        let result = self.ai.generate_image(&request).await;
        self.finish_image_generation(&ticket, column, result)
    }

    // -----------------------------------------------------------------------
    // Uploads
    // -----------------------------------------------------------------------

    /// Reserve a storage path for an image destined for `column`, plus the
    /// ticket the finished upload must be presented with.
    pub fn begin_image_upload(
        &self,
        file_name: &str,
        column: u32,
    ) -> Result<(AsyncTicket, PendingUpload), CoreError> {
        self.ensure_column(column)?;
        Ok((self.workflow.ticket(), self.pending_upload(file_name)?))
    }

    /// Add an uploaded image to `column`. Returns the new item id.
    ///
    /// A stale ticket or a vanished column deletes the stored file again.
    pub async fn finish_image_upload(
        &mut self,
        ticket: &AsyncTicket,
        column: u32,
        result: Result<UploadResult, CoreError>,
    ) -> Result<EntityId, CoreError> {
        let upload = result.inspect_err(|e| {
            tracing::warn!(error = %e, "Image upload failed");
        })?;
        if let Err(e) = self
            .accept_ticket(ticket, "image upload")
            .and_then(|()| self.ensure_column(column))
        {
            self.discard_upload(&upload.path).await;
            return Err(e);
        }

        let mut item = layout::new_image_item(self.ids.as_ref(), column);
        item.content = upload.download_url;
        self.ensure_unique_id(&item.id)?;
        let id = item.id.clone();
        let content = layout::add_item(&self.banner().content, item);
        self.workflow
            .apply_async(ticket, ConfigPatch::content(content))?;
        tracing::debug!(item_id = %id, column, "Uploaded image added");
        Ok(id)
    }

    /// Upload an image file and add it to `column`. Returns the new item id.
    pub async fn upload_image(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
        column: u32,
        on_progress: Option<ProgressCallback>,
    ) -> Result<EntityId, CoreError> {
        let (ticket, pending) = self.begin_image_upload(file_name, column)?;
        let result = self.store_upload(&pending, bytes, on_progress).await;
        self.finish_image_upload(&ticket, column, result).await
    }

    pub fn begin_background_upload(&self, file_name: &str) -> Result<(AsyncTicket, PendingUpload), CoreError> {
        Ok((self.workflow.ticket(), self.pending_upload(file_name)?))
    }

    /// Make an uploaded image the banner background. Returns its URL.
    pub async fn finish_background_upload(
        &mut self,
        ticket: &AsyncTicket,
        result: Result<UploadResult, CoreError>,
    ) -> Result<String, CoreError> {
        let upload = result.inspect_err(|e| {
            tracing::warn!(error = %e, "Background upload failed");
        })?;
        if let Err(e) = self.accept_ticket(ticket, "background upload") {
            self.discard_upload(&upload.path).await;
            return Err(e);
        }
        self.workflow.apply_async(
            ticket,
            ConfigPatch::background(BackgroundType::Image, upload.download_url.clone()),
        )?;
        Ok(upload.download_url)
    }

    /// Upload an image and make it the banner background.
    pub async fn upload_background_image(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<String, CoreError> {
        let (ticket, pending) = self.begin_background_upload(file_name)?;
        let result = self.store_upload(&pending, bytes, None).await;
        self.finish_background_upload(&ticket, result).await
    }

    fn pending_upload(&self, file_name: &str) -> Result<PendingUpload, CoreError> {
        if file_name.trim().is_empty() {
            return Err(CoreError::Validation("File name must not be blank".to_string()));
        }
        Ok(PendingUpload {
            path: join_path(&self.config.media_prefix, &unique_file_name(file_name)),
            metadata: UploadMetadata {
                content_type: None,
                custom: BTreeMap::from([(ORIGINAL_NAME_KEY.to_string(), file_name.to_string())]),
            },
        })
    }

    async fn store_upload(
        &self,
        pending: &PendingUpload,
        bytes: Vec<u8>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<UploadResult, CoreError> {
        let metadata = Some(pending.metadata.clone());
        let upload = match on_progress {
            Some(callback) => {
                self.files
                    .upload_with_progress(&pending.path, bytes, metadata, callback)
                    .await?
            }
            None => self.files.upload(&pending.path, bytes, metadata).await?,
        };
        tracing::info!(path = %upload.path, size = upload.metadata.size, "Media uploaded");
        Ok(upload)
    }

    async fn discard_upload(&self, path: &str) {
        match self.files.delete(path).await {
            Ok(()) => tracing::info!(path, "Discarded stale upload"),
            Err(e) => tracing::warn!(error = %e, path, "Failed to delete discarded upload"),
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Save the banner, assigning an id on first save.
    pub async fn save(&mut self) -> Result<EntityId, CoreError> {
        let saved = BannerRepo::save(&self.store, &self.config.banner_collection, self.banner()).await?;
        if saved.id != self.banner().id {
            self.workflow.update_config(ConfigPatch::id(saved.id.clone()));
        }
        Ok(saved.id)
    }

    /// Replace the session's banner with a saved one and start over.
    pub async fn open(&mut self, banner_id: &str) -> Result<(), CoreError> {
        let banner = BannerRepo::find_by_id(&self.store, &self.config.banner_collection, banner_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "banner",
                id: banner_id.to_string(),
            })?;
        self.workflow.start_over(banner);
        tracing::info!(banner_id, "Banner opened");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    pub fn export_request(&self, format: ExportFormat) -> ExportRequest {
        ExportRequest::for_config(self.banner(), format)
    }

    pub async fn export<E: ExportService>(
        &self,
        exporter: &E,
        format: ExportFormat,
    ) -> Result<ExportResult, CoreError> {
        let request = self.export_request(format);
        let result = exporter.export(&request).await?;
        tracing::info!(
            banner_id = %request.banner_id,
            format = format.as_str(),
            download_url = %result.download_url,
            "Banner exported",
        );
        Ok(result)
    }

    // ---- private helpers ----

    fn current_step_id(&self) -> String {
        self.workflow
            .current()
            .map(|step| step.id.clone())
            .unwrap_or_default()
    }

    fn log_transition(&self, from: &str, action: &'static str) {
        tracing::debug!(
            action,
            from,
            to = %self.current_step_id(),
            generation = self.workflow.generation(),
            "Workflow step changed",
        );
    }

    fn ensure_column(&self, column: u32) -> Result<(), CoreError> {
        let columns = self.banner().columns;
        if column >= columns {
            return Err(CoreError::Validation(format!(
                "Column {column} is out of range for {columns} columns"
            )));
        }
        Ok(())
    }

    fn ensure_item(&self, item_id: &str) -> Result<&ContentItem, CoreError> {
        layout::find_item(&self.banner().content, item_id).ok_or_else(|| CoreError::NotFound {
            entity: "content item",
            id: item_id.to_string(),
        })
    }

    /// Generated ids may collide with those of an opened banner.
    fn ensure_unique_id(&self, item_id: &str) -> Result<(), CoreError> {
        if layout::find_item(&self.banner().content, item_id).is_some() {
            return Err(CoreError::Conflict(format!(
                "Content item '{item_id}' already exists"
            )));
        }
        Ok(())
    }

    fn push_item(&mut self, item: ContentItem) -> Result<EntityId, CoreError> {
        self.ensure_unique_id(&item.id)?;
        let id = item.id.clone();
        let content = layout::add_item(&self.banner().content, item);
        self.workflow.update_config(ConfigPatch::content(content));
        Ok(id)
    }

    fn accept_ticket(&self, ticket: &AsyncTicket, operation: &'static str) -> Result<(), CoreError> {
        self.workflow.check_ticket(ticket).inspect_err(|_| {
            tracing::warn!(
                operation,
                issued = ticket.generation,
                current = self.workflow.generation(),
                step_id = %ticket.step_id,
                "Discarding stale result",
            );
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use banner_core::ids::SequentialIdGenerator;
    use banner_store::{InMemoryDocumentStore, InMemoryFileStorage};

    /// Echoes requests back.
    struct EchoAi;

    impl AiService for EchoAi {
        async fn optimize_text(&self, request: &AiTextRequest) -> Result<AiTextResponse, CoreError> {
            Ok(AiTextResponse {
                optimized_text: format!("{}!", request.original_text),
                suggestions: vec![],
            })
        }

        async fn generate_image(&self, request: &AiImageRequest) -> Result<AiImageResponse, CoreError> {
            Ok(AiImageResponse {
                image_url: format!("https://cdn.test/{}.png", request.prompt),
                prompt: request.prompt.clone(),
            })
        }
    }

    type TestSession = EditorSession<EchoAi, InMemoryDocumentStore, InMemoryFileStorage>;

    fn session() -> TestSession {
        EditorSession::new(
            EchoAi,
            InMemoryDocumentStore::new(),
            InMemoryFileStorage::new(),
            EditorConfig::default(),
        )
        .with_id_generator(Arc::new(SequentialIdGenerator::new()))
    }

    #[test]
    fn set_columns_validates_range() {
        let mut s = session();
        assert_matches!(s.set_columns(0), Err(CoreError::Validation(_)));
        assert_matches!(s.set_columns(4), Err(CoreError::Validation(_)));
        assert_eq!(s.banner().columns, 1);
        s.set_columns(3).unwrap();
        assert_eq!(s.banner().columns, 3);
    }

    #[test]
    fn set_background_validates_value() {
        let mut s = session();
        assert!(s.set_background(BackgroundType::Solid, "not-a-colour").is_err());
        s.set_background(BackgroundType::Solid, "#123abc").unwrap();
        assert_eq!(s.banner().background_value, "#123abc");
    }

    #[test]
    fn add_item_requires_existing_column() {
        let mut s = session();
        assert_matches!(s.add_text(1), Err(CoreError::Validation(_)));
        let id = s.add_text(0).unwrap();
        assert_eq!(id, "text-1");
        assert_eq!(s.banner().content.len(), 1);
    }

    #[test]
    fn shrinking_columns_hides_but_keeps_items() {
        let mut s = session();
        s.set_columns(2).unwrap();
        s.add_text(1).unwrap();
        s.set_columns(1).unwrap();

        assert_eq!(s.banner().content.len(), 1);
        assert_eq!(s.hidden_items().len(), 1);
        assert_eq!(s.preview().hidden_count, 1);

        s.set_columns(2).unwrap();
        assert!(s.hidden_items().is_empty());
    }

    #[test]
    fn update_item_checks_target_and_position() {
        let mut s = session();
        let id = s.add_image(0).unwrap();
        assert_matches!(
            s.update_item("missing", ContentPatch::text("x")),
            Err(CoreError::NotFound { .. })
        );

        let mut position = s.banner().content[0].position;
        position.column = 2;
        assert_matches!(
            s.update_item(&id, ContentPatch::position(position)),
            Err(CoreError::Validation(_))
        );

        s.update_item(&id, ContentPatch::text("https://cdn.test/a.png")).unwrap();
        assert_eq!(s.banner().content[0].content, "https://cdn.test/a.png");
    }

    #[test]
    fn remove_item_reports_presence() {
        let mut s = session();
        let id = s.add_text(0).unwrap();
        assert!(!s.remove_item("missing"));
        assert!(s.remove_item(&id));
        assert!(s.banner().content.is_empty());
    }

    #[test]
    fn try_next_step_respects_gate() {
        let mut s = session();
        s.go_to_step("content");
        assert_matches!(s.try_next_step(), Err(CoreError::Validation(msg)) if msg.contains("content"));
        s.add_text(0).unwrap();
        s.try_next_step().unwrap();
        assert_eq!(s.workflow().current().unwrap().id, "ai-image");
    }

    #[test]
    fn stale_text_result_is_discarded() {
        let mut s = session();
        let id = s.add_text(0).unwrap();
        let (ticket, request) = s.begin_text_optimization(&id, "", None).unwrap();
        assert_eq!(request.original_text, "New text");

        s.next_step();

        let response = AiTextResponse {
            optimized_text: "Shop now".to_string(),
            suggestions: vec![],
        };
        assert_matches!(
            s.finish_text_optimization(&ticket, &id, Ok(response)),
            Err(CoreError::Stale { .. })
        );
        assert_eq!(s.banner().content[0].content, "New text");
    }

    #[test]
    fn failed_image_generation_leaves_banner_untouched() {
        let mut s = session();
        let before = s.banner().clone();
        let (ticket, _) = s.begin_image_generation("shoe", 0, None).unwrap();
        let result = s.finish_image_generation(&ticket, 0, Err(CoreError::Service("boom".to_string())));
        assert_matches!(result, Err(CoreError::Service(_)));
        assert_eq!(s.banner(), &before);
    }

    #[test]
    fn text_optimization_rejects_image_items() {
        let s = {
            let mut s = session();
            s.add_image(0).unwrap();
            s
        };
        assert_matches!(
            s.begin_text_optimization("image-1", "", None),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn start_from_template_clears_id() {
        let mut s = session();
        let template = BannerConfig::seeded(ConfigPatch {
            id: Some("tpl-1".to_string()),
            columns: Some(3),
            ..Default::default()
        });
        s.start_from_template(&template);
        assert!(!s.banner().is_persisted());
        assert_eq!(s.banner().columns, 3);
        s.set_columns(1).unwrap();
        s.reset();
        assert_eq!(s.banner().columns, 3);
    }

    #[test]
    fn colliding_generated_id_is_a_conflict() {
        let mut s = session();
        let ids = SequentialIdGenerator::new();
        let template = BannerConfig::seeded(ConfigPatch {
            content: Some(vec![layout::new_text_item(&ids, 0)]),
            ..Default::default()
        });
        s.start_from_template(&template);
        let before = s.banner().clone();

        assert_matches!(s.add_text(0), Err(CoreError::Conflict(msg)) if msg.contains("text-1"));
        assert_eq!(s.banner(), &before);

        let mut resumed = session().with_id_generator(Arc::new(SequentialIdGenerator::starting_after(1)));
        resumed.start_from_template(&template);
        assert_eq!(resumed.add_text(0).unwrap(), "text-2");
        assert_eq!(resumed.banner().content.len(), 2);
    }

    #[test]
    fn export_request_uses_current_banner() {
        let mut s = session();
        s.set_columns(2).unwrap();
        let request = s.export_request(ExportFormat::Png);
        assert_eq!(request.tree.columns.len(), 2);
    }
}
