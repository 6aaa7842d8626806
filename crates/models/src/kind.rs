use std::{fmt, str::FromStr};

use sea_orm::{entity::prelude::*, Iterable};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Every content collection managed through the admin panel.
///
/// The serde name doubles as the URL segment (`/api/faqs`, `/admin/menu-items`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum EntityKind {
    #[sea_orm(string_value = "faq")]
    #[serde(rename = "faqs")]
    Faq,
    #[sea_orm(string_value = "service")]
    #[serde(rename = "services")]
    Service,
    #[sea_orm(string_value = "testimonial")]
    #[serde(rename = "testimonials")]
    Testimonial,
    #[sea_orm(string_value = "gallery_album")]
    #[serde(rename = "gallery-albums")]
    GalleryAlbum,
    #[sea_orm(string_value = "gallery_image")]
    #[serde(rename = "gallery-images")]
    GalleryImage,
    #[sea_orm(string_value = "menu_item")]
    #[serde(rename = "menu-items")]
    MenuItem,
    #[sea_orm(string_value = "page_hero")]
    #[serde(rename = "page-heroes")]
    PageHero,
    #[sea_orm(string_value = "content_block")]
    #[serde(rename = "content-blocks")]
    ContentBlock,
    #[sea_orm(string_value = "site_setting")]
    #[serde(rename = "settings")]
    SiteSetting,
}

impl EntityKind {
    pub fn slug(self) -> &'static str {
        match self {
            EntityKind::Faq => "faqs",
            EntityKind::Service => "services",
            EntityKind::Testimonial => "testimonials",
            EntityKind::GalleryAlbum => "gallery-albums",
            EntityKind::GalleryImage => "gallery-images",
            EntityKind::MenuItem => "menu-items",
            EntityKind::PageHero => "page-heroes",
            EntityKind::ContentBlock => "content-blocks",
            EntityKind::SiteSetting => "settings",
        }
    }

    /// Kind that `parentId` must point at, if this kind may have a parent.
    pub fn parent_kind(self) -> Option<EntityKind> {
        match self {
            EntityKind::MenuItem => Some(EntityKind::MenuItem),
            EntityKind::GalleryImage => Some(EntityKind::GalleryAlbum),
            _ => None,
        }
    }

    /// Parent links of this kind point at the same kind, so cycles are possible.
    pub fn is_tree(self) -> bool {
        self.parent_kind() == Some(self)
    }

    pub fn requires_parent(self) -> bool {
        matches!(self, EntityKind::GalleryImage)
    }

    pub fn requires_media(self) -> bool {
        matches!(self, EntityKind::GalleryImage)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for EntityKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::iter()
            .find(|k| k.slug() == s)
            .ok_or_else(|| ModelError::validation(format!("unknown content kind '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_round_trips_through_from_str_and_serde() {
        for kind in EntityKind::iter() {
            assert_eq!(kind.slug().parse::<EntityKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.slug()));
        }
    }

    #[test]
    fn unknown_slug_is_a_validation_error() {
        assert!(matches!("blog".parse::<EntityKind>(), Err(ModelError::Validation(_))));
    }

    #[test]
    fn only_menu_items_form_a_tree() {
        let trees: Vec<_> = EntityKind::iter().filter(|k| k.is_tree()).collect();
        assert_eq!(trees, vec![EntityKind::MenuItem]);
        assert_eq!(EntityKind::GalleryImage.parent_kind(), Some(EntityKind::GalleryAlbum));
        assert_eq!(EntityKind::Faq.parent_kind(), None);
    }
}
