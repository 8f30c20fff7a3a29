use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;

use crate::payload::SubmissionPayload;

/// A binary field value, as produced by a file input.
#[derive(Debug, Clone, PartialEq)]
pub struct FileBlob {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FileBlob {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    File(FileBlob),
}

/// A form whose fields the user may edit at any time.
///
/// Field order is insertion order and duplicate names are kept, the same way
/// an HTML form enumerates its controls.
#[derive(Debug)]
pub struct Form {
    id: String,
    fields: RwLock<Vec<(String, FieldValue)>>,
}

impl Form {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: RwLock::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Add a field after the existing ones, even if the name is taken.
    pub fn append(&self, name: impl Into<String>, value: FieldValue) {
        self.write().push((name.into(), value));
    }

    /// Replace the first field with this name, or append it.
    pub fn set(&self, name: &str, value: FieldValue) {
        let mut fields = self.write();
        match fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => fields.push((name.to_string(), value)),
        }
    }

    pub fn set_text(&self, name: &str, value: impl Into<String>) {
        self.set(name, FieldValue::Text(value.into()));
    }

    pub fn set_file(&self, name: &str, blob: FileBlob) {
        self.set(name, FieldValue::File(blob));
    }

    /// Remove every field with this name. Returns how many were removed.
    pub fn remove(&self, name: &str) -> usize {
        let mut fields = self.write();
        let before = fields.len();
        fields.retain(|(n, _)| n != name);
        before - fields.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Capture the current field values into a fresh payload.
    pub fn snapshot(&self) -> SubmissionPayload {
        SubmissionPayload::new(self.read().clone())
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<(String, FieldValue)>> {
        // A writer that panicked mid-edit leaves a complete Vec behind.
        self.fields.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<(String, FieldValue)>> {
        self.fields.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// The set of forms a bridge can attach to, addressed by id.
#[derive(Debug, Default)]
pub struct Document {
    forms: HashMap<String, Arc<Form>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a form, replacing any form with the same id, and return a handle to it.
    pub fn insert(&mut self, form: Form) -> Arc<Form> {
        let form = Arc::new(form);
        self.forms.insert(form.id().to_string(), form.clone());
        form
    }

    pub fn form(&self, id: &str) -> Option<Arc<Form>> {
        self.forms.get(id).cloned()
    }
}

/// A submit event dispatched at a form.
#[derive(Debug, Clone)]
pub struct SubmitEvent {
    target: String,
    trusted: bool,
    default_prevented: bool,
}

impl SubmitEvent {
    /// An event produced by the user activating a submit control.
    pub fn user(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            trusted: true,
            default_prevented: false,
        }
    }

    /// An event produced by script rather than by the user.
    pub fn synthetic(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            trusted: false,
            default_prevented: false,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
