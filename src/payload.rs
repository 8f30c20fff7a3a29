use reqwest::multipart;

use crate::form::FieldValue;
use crate::outcome::SubmitError;

/// The field values of one form, captured for exactly one submission.
///
/// Not `Clone`: each submission owns its own payload and consumes it when
/// the request body is built.
#[derive(Debug, PartialEq)]
pub struct SubmissionPayload {
    entries: Vec<(String, FieldValue)>,
}

impl SubmissionPayload {
    pub fn new(entries: Vec<(String, FieldValue)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, FieldValue)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Encode as a `multipart/form-data` body, one part per entry, in order.
    pub fn into_multipart(self) -> Result<multipart::Form, SubmitError> {
        let mut form = multipart::Form::new();

        for (name, value) in self.entries {
            form = match value {
                FieldValue::Text(text) => form.text(name, text),
                FieldValue::File(blob) => {
                    let mut part =
                        multipart::Part::bytes(blob.bytes.to_vec()).file_name(blob.file_name);
                    if let Some(content_type) = blob.content_type {
                        part = part.mime_str(&content_type).map_err(|e| {
                            SubmitError::InvalidPayload(format!(
                                "Invalid content type for field {name}: {e}"
                            ))
                        })?;
                    }
                    form.part(name, part)
                }
            };
        }

        Ok(form)
    }
}
