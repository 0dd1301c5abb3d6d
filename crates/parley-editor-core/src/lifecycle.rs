//! Editor-instance lifecycle.
//!
//! An editor goes `Uninitialized -> Mounting -> Ready -> Disposed`. Loading
//! the text-editing widget is asynchronous, so calls made before it is ready
//! are queued and replayed in order once the document arrives. After
//! disposal every call is rejected.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;

use crate::document::EditorDocument;
use crate::error::EditorError;
use crate::placeholders::Placeholders;
use crate::toolbar::ToolbarCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPhase {
    Uninitialized,
    Mounting,
    Ready,
    Disposed,
}

/// Events emitted by a ready editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// The full text after a change.
    Change(String),
    Focus,
    Blur,
}

pub type EventListener = Box<dyn FnMut(&EditorEvent) + Send>;

/// Loads the text-editing widget and hands back its document.
pub trait WidgetLoader {
    type Document: EditorDocument;

    /// Load the widget along with its language and placeholder resources for
    /// `locale`.
    fn load(
        &self,
        locale: &str,
    ) -> impl Future<Output = Result<Self::Document, EditorError>> + Send;
}

#[derive(Debug, Clone)]
enum QueuedCall {
    Command(ToolbarCommand),
    SetValue(String),
}

pub struct EditorInstance<D: EditorDocument> {
    phase: EditorPhase,
    doc: Option<D>,
    queue: VecDeque<QueuedCall>,
    placeholders: Placeholders,
    listeners: Vec<EventListener>,
}

impl<D: EditorDocument> fmt::Debug for EditorInstance<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorInstance")
            .field("phase", &self.phase)
            .field("queued", &self.queue.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<D: EditorDocument> EditorInstance<D> {
    pub fn new(placeholders: Placeholders) -> Self {
        Self {
            phase: EditorPhase::Uninitialized,
            doc: None,
            queue: VecDeque::new(),
            placeholders,
            listeners: Vec::new(),
        }
    }

    pub fn phase(&self) -> EditorPhase {
        self.phase
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn document(&self) -> Option<&D> {
        self.doc.as_ref()
    }

    pub fn document_mut(&mut self) -> Option<&mut D> {
        self.doc.as_mut()
    }

    /// Current text, once ready.
    pub fn value(&self) -> Option<String> {
        self.doc.as_ref().map(|doc| doc.get_value())
    }

    pub fn on_event(&mut self, listener: impl FnMut(&EditorEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn begin_mount(&mut self) -> Result<(), EditorError> {
        match self.phase {
            EditorPhase::Uninitialized => {
                self.phase = EditorPhase::Mounting;
                Ok(())
            }
            EditorPhase::Disposed => Err(EditorError::Disposed),
            phase => Err(EditorError::InvalidPhase {
                action: "mount",
                phase,
            }),
        }
    }

    /// Load the widget through `loader` and become ready.
    ///
    /// A failed load leaves the instance in `Mounting` with its queue intact,
    /// so mounting can simply be retried.
    pub async fn mount_with<L>(&mut self, loader: &L, locale: &str) -> Result<(), EditorError>
    where
        L: WidgetLoader<Document = D>,
    {
        if self.phase == EditorPhase::Uninitialized {
            self.begin_mount()?;
        }
        match self.phase {
            EditorPhase::Mounting => {}
            EditorPhase::Disposed => return Err(EditorError::Disposed),
            phase => {
                return Err(EditorError::InvalidPhase {
                    action: "mount",
                    phase,
                });
            }
        }

        match loader.load(locale).await {
            Ok(doc) => self.ready(doc),
            Err(err) => {
                tracing::warn!(error = %err, locale, "editor widget failed to load");
                Err(err)
            }
        }
    }

    /// Attach the loaded document and replay everything queued so far.
    pub fn ready(&mut self, doc: D) -> Result<(), EditorError> {
        if self.phase == EditorPhase::Disposed {
            return Err(EditorError::Disposed);
        }
        self.doc = Some(doc);
        self.phase = EditorPhase::Ready;

        let queued = self.queue.len();
        while let Some(call) = self.queue.pop_front() {
            self.apply(call);
        }
        tracing::debug!(queued, "editor ready");
        Ok(())
    }

    pub fn execute(&mut self, command: ToolbarCommand) -> Result<(), EditorError> {
        self.submit(QueuedCall::Command(command))
    }

    pub fn set_value(&mut self, value: impl Into<String>) -> Result<(), EditorError> {
        self.submit(QueuedCall::SetValue(value.into()))
    }

    /// Emit a focus event. Only a ready editor can take focus.
    pub fn focus(&mut self) -> bool {
        self.emit_if_ready(EditorEvent::Focus)
    }

    pub fn blur(&mut self) -> bool {
        self.emit_if_ready(EditorEvent::Blur)
    }

    /// Tear the editor down, handing back the document if there was one.
    pub fn dispose(&mut self) -> Option<D> {
        self.phase = EditorPhase::Disposed;
        self.queue.clear();
        self.listeners.clear();
        self.doc.take()
    }

    fn submit(&mut self, call: QueuedCall) -> Result<(), EditorError> {
        match self.phase {
            EditorPhase::Ready => {
                self.apply(call);
                Ok(())
            }
            EditorPhase::Uninitialized | EditorPhase::Mounting => {
                tracing::debug!(phase = ?self.phase, "editor not ready, queueing call");
                self.queue.push_back(call);
                Ok(())
            }
            EditorPhase::Disposed => Err(EditorError::Disposed),
        }
    }

    fn apply(&mut self, call: QueuedCall) {
        let Some(doc) = self.doc.as_mut() else {
            return;
        };
        let before = doc.get_value();
        match call {
            QueuedCall::Command(command) => command.execute(doc, &self.placeholders),
            QueuedCall::SetValue(value) => doc.set_value(&value),
        }
        let after = doc.get_value();
        if after != before {
            self.emit(EditorEvent::Change(after));
        }
    }

    fn emit_if_ready(&mut self, event: EditorEvent) -> bool {
        if self.phase != EditorPhase::Ready {
            return false;
        }
        self.emit(event);
        true
    }

    fn emit(&mut self, event: EditorEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlainEditor;
    use std::sync::{Arc, Mutex};

    struct StaticLoader(&'static str);

    impl WidgetLoader for StaticLoader {
        type Document = PlainEditor;

        fn load(
            &self,
            _locale: &str,
        ) -> impl Future<Output = Result<PlainEditor, EditorError>> + Send {
            let text = self.0;
            async move { Ok(PlainEditor::from_text(text)) }
        }
    }

    struct FailingLoader;

    impl WidgetLoader for FailingLoader {
        type Document = PlainEditor;

        fn load(
            &self,
            _locale: &str,
        ) -> impl Future<Output = Result<PlainEditor, EditorError>> + Send {
            async { Err(EditorError::WidgetLoad("network unreachable".into())) }
        }
    }

    fn record(editor: &mut EditorInstance<PlainEditor>) -> Arc<Mutex<Vec<EditorEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        editor.on_event(move |event| sink.lock().unwrap().push(event.clone()));
        events
    }

    #[tokio::test]
    async fn test_calls_before_ready_are_replayed_in_order() {
        let mut editor = EditorInstance::new(Placeholders::default());
        let events = record(&mut editor);

        editor.set_value("hello").unwrap();
        editor.execute(ToolbarCommand::Bold).unwrap();
        assert_eq!(editor.queued_len(), 2);
        assert_eq!(editor.value(), None);

        editor.mount_with(&StaticLoader(""), "en_US").await.unwrap();
        assert_eq!(editor.phase(), EditorPhase::Ready);
        assert_eq!(editor.queued_len(), 0);
        assert_eq!(editor.value().as_deref(), Some("hello**strong text**"));
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                EditorEvent::Change("hello".into()),
                EditorEvent::Change("hello**strong text**".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_load_can_be_retried() {
        let mut editor = EditorInstance::new(Placeholders::default());
        editor.execute(ToolbarCommand::HorizontalRule).unwrap();

        let err = editor.mount_with(&FailingLoader, "en_US").await;
        assert!(matches!(err, Err(EditorError::WidgetLoad(_))));
        assert_eq!(editor.phase(), EditorPhase::Mounting);
        assert_eq!(editor.queued_len(), 1);

        editor.mount_with(&StaticLoader("text"), "en_US").await.unwrap();
        assert_eq!(editor.value().as_deref(), Some("text\n\n----"));
    }

    #[tokio::test]
    async fn test_disposed_editor_rejects_calls() {
        let mut editor = EditorInstance::new(Placeholders::default());
        editor.mount_with(&StaticLoader("draft"), "en_US").await.unwrap();

        let doc = editor.dispose();
        assert_eq!(doc.map(|d| d.get_value()).as_deref(), Some("draft"));
        assert!(matches!(
            editor.execute(ToolbarCommand::Bold),
            Err(EditorError::Disposed)
        ));
        assert!(matches!(
            editor.mount_with(&StaticLoader(""), "en_US").await,
            Err(EditorError::Disposed)
        ));
        assert!(!editor.focus());
    }

    #[tokio::test]
    async fn test_focus_and_blur_only_when_ready() {
        let mut editor = EditorInstance::new(Placeholders::default());
        let events = record(&mut editor);
        assert!(!editor.focus());

        editor.mount_with(&StaticLoader(""), "en_US").await.unwrap();
        assert!(editor.focus());
        assert!(editor.blur());
        assert_eq!(
            *events.lock().unwrap(),
            vec![EditorEvent::Focus, EditorEvent::Blur]
        );
    }

    #[test]
    fn test_mount_twice_is_rejected() {
        let mut editor: EditorInstance<PlainEditor> = EditorInstance::new(Placeholders::default());
        editor.begin_mount().unwrap();
        assert!(matches!(
            editor.begin_mount(),
            Err(EditorError::InvalidPhase {
                phase: EditorPhase::Mounting,
                ..
            })
        ));
    }
}
