//! Slug uniqueness under repeated names

mod helpers;

use cmm_catalog::db::{composers, works};
use cmm_catalog::models::{ComposerUpdate, WorkCreate};
use helpers::TestCatalog;
use std::collections::HashSet;

#[tokio::test]
async fn test_same_base_name_never_collides() {
    let t = TestCatalog::new().await;
    let composer = t.composer("Гайдн").await;

    let mut slugs = HashSet::new();
    for _ in 0..25 {
        let work = works::create_work(
            t.db(),
            composer.id,
            WorkCreate {
                name: Some("String Quartet".into()),
                name_ru: "Струнный квартет".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let slug = work.work.slug.unwrap();
        assert!(slug.starts_with("string-quartet"));
        assert!(slugs.insert(slug), "slug generated twice");
    }
    assert_eq!(slugs.len(), 25);
}

#[tokio::test]
async fn test_cyrillic_only_names_get_ascii_slugs() {
    let t = TestCatalog::new().await;
    let a = t.composer("Чайковский").await;
    let b = t.composer("Чайковский").await;

    let (a, b) = (a.slug.unwrap(), b.slug.unwrap());
    assert_ne!(a, b);
    assert!(a.is_ascii() && b.is_ascii());
}

#[tokio::test]
async fn test_rename_into_taken_slug_gets_suffix() {
    let t = TestCatalog::new().await;
    let first = t.composer("Mozart").await;
    let second = t.composer("Salieri").await;
    assert_eq!(first.slug.as_deref(), Some("mozart"));

    let renamed = composers::update_composer(
        t.db(),
        second.id,
        ComposerUpdate {
            name_ru: Some("Mozart".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let slug = renamed.slug.unwrap();
    assert_ne!(slug, "mozart");
    assert!(slug.starts_with("mozart-"));
}
