//! Multipart request folding.
//!
//! Content mutations arrive as one multipart body mixing scalar text
//! fields, relation id lists and binary attachments. This module folds
//! the stream into a [`ContentForm`] the handlers hand to the
//! coordinator.
//!
//! Presence semantics matter: a text field that was sent, even empty,
//! counts as supplied. For relation lists that is the difference between
//! clearing the set and leaving it untouched.

use std::collections::HashMap;

use axum::extract::Multipart;

use atlas_content::model::{AttachmentSet, AttachmentUpload, ContentPatch, NewContent};
use atlas_core::{ContentKind, Id, PostKind, ValidationErrors};

use crate::error::ApiError;

/// Everything one multipart content request carried.
#[derive(Debug, Default)]
pub struct ContentForm {
    fields: HashMap<String, String>,
    pub attachments: AttachmentSet,
    pub gallery_ids_to_delete: Vec<Id>,
    relations: HashMap<ContentKind, Vec<Id>>,
}

impl ContentForm {
    /// Drain an incoming multipart stream.
    pub async fn collect(mut multipart: Multipart) -> Result<ContentForm, ApiError> {
        let mut form = ContentForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("multipart error: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match name.as_str() {
                "profileImage" | "headerImage" | "footerImage" | "gallery" => {
                    let filename = field.file_name().unwrap_or("upload").to_string();
                    let content_type = match field.content_type() {
                        Some(ct) => ct.to_string(),
                        None => atlas_assets::content_type_for(&filename),
                    };
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("read failure: {}", e)))?;
                    let upload = AttachmentUpload::new(filename, content_type, data);

                    match name.as_str() {
                        "profileImage" => form.attachments.profile = Some(upload),
                        "headerImage" => form.attachments.header = Some(upload),
                        "footerImage" => form.attachments.footer = Some(upload),
                        _ => form.attachments.gallery.push(upload),
                    }
                }
                "galleryImagesToDelete" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("read failure: {}", e)))?;
                    form.gallery_ids_to_delete.extend(parse_id_list(&text)?);
                }
                "classIds" | "unitIds" | "postIds" => {
                    let target = match name.as_str() {
                        "classIds" => ContentKind::Class,
                        "unitIds" => ContentKind::Unit,
                        _ => ContentKind::Post,
                    };
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("read failure: {}", e)))?;
                    let ids = parse_id_list(&text)?;
                    form.relations.entry(target).or_default().extend(ids);
                }
                _ => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("read failure: {}", e)))?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    fn take_post_kind(&mut self) -> Result<Option<PostKind>, ApiError> {
        match self.take("kind") {
            None => Ok(None),
            Some(raw) => PostKind::parse(&raw)
                .map(Some)
                .ok_or_else(|| ApiError::bad_request(format!("unknown post kind: {}", raw))),
        }
    }

    fn take_bool(&mut self, name: &str) -> Result<Option<bool>, ApiError> {
        match self.take(name) {
            None => Ok(None),
            Some(raw) => match raw.as_str() {
                "true" | "1" => Ok(Some(true)),
                "false" | "0" => Ok(Some(false)),
                _ => Err(ApiError::bad_request(format!(
                    "{} must be a boolean, got {:?}",
                    name, raw
                ))),
            },
        }
    }

    /// Creation input. Required fields are checked here so the error
    /// carries every missing field at once.
    pub fn into_new_content(mut self) -> Result<(NewContent, AttachmentSet), ApiError> {
        let mut errors = ValidationErrors::new();
        let title = self.take("title").unwrap_or_default();
        let intro = self.take("intro").unwrap_or_default();
        if title.trim().is_empty() {
            errors.add("title", "can't be blank");
        }
        if intro.trim().is_empty() {
            errors.add("intro", "can't be blank");
        }
        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        let input = NewContent {
            title,
            intro,
            subtitle: self.take("subtitle"),
            story: self.take("story"),
            bio: self.take("bio"),
            body: self.take("body"),
            quote: self.take("quote"),
            color: self.take("color"),
            post_kind: self.take_post_kind()?,
            is_published: self.take_bool("isPublished")?.unwrap_or(false),
            relations: self.relations,
        };
        Ok((input, self.attachments))
    }

    /// Update input: everything optional, absent fields untouched.
    pub fn into_patch(mut self) -> Result<(ContentPatch, AttachmentSet, Vec<Id>), ApiError> {
        let patch = ContentPatch {
            title: self.take("title"),
            intro: self.take("intro"),
            subtitle: self.take("subtitle"),
            story: self.take("story"),
            bio: self.take("bio"),
            body: self.take("body"),
            quote: self.take("quote"),
            color: self.take("color"),
            post_kind: self.take_post_kind()?,
            is_published: self.take_bool("isPublished")?,
            relations: self.relations,
        };
        Ok((patch, self.attachments, self.gallery_ids_to_delete))
    }
}

/// Id lists arrive as a JSON array ("[1,2]"), a comma-separated string
/// ("1,2") or a single id. An empty string is an empty list.
pub fn parse_id_list(raw: &str) -> Result<Vec<Id>, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "[]" {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str::<Vec<Id>>(trimmed)
            .map_err(|e| ApiError::bad_request(format!("malformed id list: {}", e)));
    }

    trimmed
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<Id>()
                .map_err(|_| ApiError::bad_request(format!("malformed id: {:?}", part)))
        })
        .collect()
}
