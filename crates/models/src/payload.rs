//! Validation gate for content mutations.
//!
//! Inbound JSON is split into the placement envelope (`order`, `parentId`,
//! `mediaAssetId`) and kind-specific fields. The fields are deserialized into
//! the typed payload of the kind, checked, and re-serialized; unknown keys are
//! dropped on the way. Checks stop at the first violation.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{errors::ModelError, kind::EntityKind};

/// Body of a create request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInput {
    pub order: Option<i32>,
    pub parent_id: Option<Uuid>,
    pub media_asset_id: Option<Uuid>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Body of a partial update. `null` clears `parentId` / `mediaAssetId`;
/// an absent key leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    pub order: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub media_asset_id: Option<Option<Uuid>>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Keeps an explicit `null` apart from an absent key.
pub fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Kind-specific fields after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFields {
    pub data: Value,
    pub unique_key: Option<String>,
}

trait ContentPayload: DeserializeOwned + Serialize {
    fn check(&self) -> Result<(), ModelError>;

    fn unique_key(&self) -> Option<String> { None }
}

/// Validate the kind-specific fields of an entry.
pub fn validate(kind: EntityKind, fields: &Map<String, Value>) -> Result<ValidatedFields, ModelError> {
    match kind {
        EntityKind::Faq => typed::<FaqPayload>(fields),
        EntityKind::Service => typed::<ServicePayload>(fields),
        EntityKind::Testimonial => typed::<TestimonialPayload>(fields),
        EntityKind::GalleryAlbum => typed::<GalleryAlbumPayload>(fields),
        EntityKind::GalleryImage => typed::<GalleryImagePayload>(fields),
        EntityKind::MenuItem => typed::<MenuItemPayload>(fields),
        EntityKind::PageHero => typed::<PageHeroPayload>(fields),
        EntityKind::ContentBlock => typed::<ContentBlockPayload>(fields),
        EntityKind::SiteSetting => typed::<SettingPayload>(fields),
    }
}

/// Structural rules on the envelope that do not need the database.
pub fn validate_placement(kind: EntityKind, parent_id: Option<Uuid>, media_asset_id: Option<Uuid>) -> Result<(), ModelError> {
    if parent_id.is_some() && kind.parent_kind().is_none() {
        return Err(ModelError::validation(format!("{kind} entries cannot have a parentId")));
    }
    if parent_id.is_none() && kind.requires_parent() {
        return Err(ModelError::validation("parentId is required"));
    }
    if media_asset_id.is_none() && kind.requires_media() {
        return Err(ModelError::validation("mediaAssetId is required"));
    }
    Ok(())
}

/// Overlay `patch` onto the stored `data` object, key by key.
pub fn merge_fields(stored: &Value, patch: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = stored.as_object().cloned().unwrap_or_default();
    for (k, v) in patch {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

fn typed<P: ContentPayload>(fields: &Map<String, Value>) -> Result<ValidatedFields, ModelError> {
    let payload: P = serde_json::from_value(Value::Object(fields.clone()))
        .map_err(|e| ModelError::Validation(e.to_string()))?;
    payload.check()?;
    let data = serde_json::to_value(&payload).map_err(|e| ModelError::Validation(e.to_string()))?;
    Ok(ValidatedFields { unique_key: payload.unique_key(), data })
}

fn yes() -> bool { true }

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaqPayload {
    question: String,
    answer: String,
    #[serde(default = "yes")]
    published: bool,
}

impl ContentPayload for FaqPayload {
    fn check(&self) -> Result<(), ModelError> {
        require_text("question", &self.question, 500)?;
        require_text("answer", &self.answer, 5000)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServicePayload {
    title: String,
    slug: String,
    summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    price_from: Option<f64>,
    #[serde(default = "yes")]
    published: bool,
}

impl ContentPayload for ServicePayload {
    fn check(&self) -> Result<(), ModelError> {
        require_text("title", &self.title, 200)?;
        check_slug(&self.slug)?;
        require_text("summary", &self.summary, 1000)?;
        optional_text("description", self.description.as_deref(), 20_000)?;
        optional_text("icon", self.icon.as_deref(), 100)?;
        if let Some(p) = self.price_from {
            if !p.is_finite() || p < 0.0 {
                return Err(ModelError::validation("priceFrom must be a non-negative number"));
            }
        }
        Ok(())
    }

    fn unique_key(&self) -> Option<String> { Some(self.slug.clone()) }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestimonialPayload {
    author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    quote: String,
    rating: i32,
    /// Percentage of satisfied customers shown next to the quote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    satisfaction: Option<i32>,
    #[serde(default = "yes")]
    published: bool,
}

impl ContentPayload for TestimonialPayload {
    fn check(&self) -> Result<(), ModelError> {
        require_text("author", &self.author, 200)?;
        optional_text("role", self.role.as_deref(), 200)?;
        require_text("quote", &self.quote, 2000)?;
        check_range("rating", self.rating, 1, 5)?;
        if let Some(s) = self.satisfaction {
            check_range("satisfaction", s, 0, 100)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GalleryAlbumPayload {
    title: String,
    slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl ContentPayload for GalleryAlbumPayload {
    fn check(&self) -> Result<(), ModelError> {
        require_text("title", &self.title, 200)?;
        check_slug(&self.slug)?;
        optional_text("description", self.description.as_deref(), 2000)
    }

    fn unique_key(&self) -> Option<String> { Some(self.slug.clone()) }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GalleryImagePayload {
    alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    caption: Option<String>,
}

impl ContentPayload for GalleryImagePayload {
    fn check(&self) -> Result<(), ModelError> {
        require_text("alt", &self.alt, 300)?;
        optional_text("caption", self.caption.as_deref(), 1000)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MenuItemPayload {
    label: String,
    path: String,
    #[serde(default)]
    open_in_new_tab: bool,
}

impl ContentPayload for MenuItemPayload {
    fn check(&self) -> Result<(), ModelError> {
        require_text("label", &self.label, 100)?;
        check_link("path", &self.path)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageHeroPayload {
    page: String,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cta_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cta_href: Option<String>,
}

impl ContentPayload for PageHeroPayload {
    fn check(&self) -> Result<(), ModelError> {
        check_page_path("page", &self.page)?;
        require_text("title", &self.title, 200)?;
        optional_text("subtitle", self.subtitle.as_deref(), 500)?;
        optional_text("ctaLabel", self.cta_label.as_deref(), 100)?;
        if let Some(href) = &self.cta_href {
            check_link("ctaHref", href)?;
        }
        Ok(())
    }

    fn unique_key(&self) -> Option<String> { Some(self.page.clone()) }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum BlockType {
    HeroText,
    RichText,
    Image,
    Cta,
    Stats,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentBlockPayload {
    page: String,
    block_type: BlockType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    heading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(default)]
    settings: Map<String, Value>,
}

impl ContentPayload for ContentBlockPayload {
    fn check(&self) -> Result<(), ModelError> {
        check_page_path("page", &self.page)?;
        optional_text("heading", self.heading.as_deref(), 300)?;
        optional_text("body", self.body.as_deref(), 50_000)?;
        if matches!(self.block_type, BlockType::RichText) && self.body.is_none() {
            return Err(ModelError::validation("body is required for rich-text blocks"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingPayload {
    key: String,
    value: String,
}

impl ContentPayload for SettingPayload {
    fn check(&self) -> Result<(), ModelError> {
        if self.key.is_empty() || self.key.len() > 100 {
            return Err(ModelError::validation("key must be 1-100 characters"));
        }
        if !self.key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-')) {
            return Err(ModelError::validation("key may only contain a-z, 0-9, '_', '.' and '-'"));
        }
        if self.value.len() > 10_000 {
            return Err(ModelError::validation("value must be at most 10000 characters"));
        }
        Ok(())
    }

    fn unique_key(&self) -> Option<String> { Some(self.key.clone()) }
}

fn require_text(field: &str, value: &str, max: usize) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::validation(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(ModelError::validation(format!("{field} must be at most {max} characters")));
    }
    Ok(())
}

fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<(), ModelError> {
    match value {
        Some(v) if v.chars().count() > max => Err(ModelError::validation(format!("{field} must be at most {max} characters"))),
        _ => Ok(()),
    }
}

fn check_range(field: &str, value: i32, min: i32, max: i32) -> Result<(), ModelError> {
    if value < min || value > max {
        return Err(ModelError::validation(format!("{field} must be between {min} and {max}")));
    }
    Ok(())
}

fn check_slug(slug: &str) -> Result<(), ModelError> {
    let valid_chars = slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if slug.is_empty() || slug.len() > 120 || !valid_chars || slug.starts_with('-') || slug.ends_with('-') {
        return Err(ModelError::validation("slug must be 1-120 characters of a-z, 0-9 and inner '-'"));
    }
    Ok(())
}

fn check_page_path(field: &str, path: &str) -> Result<(), ModelError> {
    if !path.starts_with('/') {
        return Err(ModelError::validation(format!("{field} must start with '/'")));
    }
    if path.len() > 256 || path.chars().any(char::is_whitespace) {
        return Err(ModelError::validation(format!("{field} must be a path of at most 256 characters without spaces")));
    }
    Ok(())
}

fn check_link(field: &str, link: &str) -> Result<(), ModelError> {
    if link.starts_with("http://") || link.starts_with("https://") {
        return Ok(());
    }
    check_page_path(field, link)
        .map_err(|_| ModelError::validation(format!("{field} must start with '/' or http(s)://")))
}
