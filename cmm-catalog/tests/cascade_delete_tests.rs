//! Cascade deletion across the catalog hierarchy, including media files

mod helpers;

use cmm_catalog::db::{composers, compositions, playlists, users, works};
use cmm_catalog::ApiError;
use helpers::TestCatalog;

#[tokio::test]
async fn test_delete_composer_removes_descendants_and_files() {
    let t = TestCatalog::new().await;
    let media = &t.state.media;

    let composer = t.composer("Рахманинов").await;
    let portrait = t.cover("composers", "rachmaninoff.jpg");
    composers::set_composer_portrait(t.db(), media, composer.id, Some(&portrait))
        .await
        .unwrap();

    let work = t.work(composer.id, "Концерт № 2").await;
    let work_cover = t.cover("works", "concerto2.jpg");
    works::set_work_cover(t.db(), media, work.work.id, Some(&work_cover))
        .await
        .unwrap();

    let first = t.composition(work.work.id, "Moderato").await;
    let second = t.composition(work.work.id, "Adagio sostenuto").await;
    let a = t.audio(first.id, "Рихтер", Some(1959)).await;
    let b = t.audio(second.id, "Рихтер", Some(1959)).await;
    t.video(second.id, "Мацуев").await;

    let audio_files: Vec<_> = [&a, &b]
        .iter()
        .map(|r| media.resolve_url(&r.file_path).unwrap())
        .collect();
    assert!(audio_files.iter().all(|p| p.exists()));

    // Memberships that must disappear with the recordings
    let user = users::create_user(t.db(), "fan@example.com", "pw").await.unwrap();
    users::add_favorite(t.db(), user.id, a.id).await.unwrap();
    let playlist = playlists::create_playlist(t.db(), user.id, "Любимое")
        .await
        .unwrap();
    playlists::add_recording_to_playlist(t.db(), playlist.id, user.id, b.id)
        .await
        .unwrap();

    // An unrelated composer survives
    let other = t.composer("Скрябин").await;
    let other_work = t.work(other.id, "Поэма экстаза").await;

    composers::delete_composer(t.db(), media, composer.id)
        .await
        .unwrap();

    assert!(matches!(
        composers::get_composer(t.db(), composer.id).await,
        Err(ApiError::NotFound(_))
    ));
    assert_eq!(t.count("works").await, 1);
    assert_eq!(t.count("compositions").await, 0);
    assert_eq!(t.count("recordings").await, 0);
    assert_eq!(t.count("recording_favorites").await, 0);
    assert_eq!(t.count("playlist_recording").await, 0);

    // The playlist itself belongs to the user and stays
    assert!(playlists::get_owned_playlist(t.db(), playlist.id, user.id)
        .await
        .is_ok());
    assert!(works::get_work(t.db(), other_work.work.id).await.is_ok());

    assert!(audio_files.iter().all(|p| !p.exists()));
    assert!(!media.resolve_url(&portrait).unwrap().exists());
    assert!(!media.resolve_url(&work_cover).unwrap().exists());
}

#[tokio::test]
async fn test_delete_work_keeps_composer() {
    let t = TestCatalog::new().await;
    let composer = t.composer("Шуберт").await;
    let work = t.work(composer.id, "Зимний путь").await;
    let song = t.composition(work.work.id, "Спокойной ночи").await;
    let cover = t.cover("compositions", "gute_nacht.jpg");
    compositions::set_composition_cover(t.db(), &t.state.media, song.id, Some(&cover))
        .await
        .unwrap();
    let rec = t.audio(song.id, "Фишер-Дискау", Some(1962)).await;
    let file = t.state.media.resolve_url(&rec.file_path).unwrap();

    works::delete_work(t.db(), &t.state.media, work.work.id)
        .await
        .unwrap();

    assert!(composers::get_composer(t.db(), composer.id).await.is_ok());
    assert_eq!(t.count("compositions").await, 0);
    assert_eq!(t.count("recordings").await, 0);
    assert!(!file.exists());
    assert!(!t.state.media.resolve_url(&cover).unwrap().exists());
}

#[tokio::test]
async fn test_delete_composition_with_video_only_recording() {
    let t = TestCatalog::new().await;
    let composer = t.composer("Малер").await;
    let work = t.work(composer.id, "Симфония № 5").await;
    let adagietto = t.composition(work.work.id, "Adagietto").await;
    t.video(adagietto.id, "Караян").await;

    compositions::delete_composition(t.db(), &t.state.media, adagietto.id)
        .await
        .unwrap();
    assert_eq!(t.count("recordings").await, 0);

    assert!(matches!(
        compositions::delete_composition(t.db(), &t.state.media, adagietto.id).await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_replacing_cover_removes_old_file() {
    let t = TestCatalog::new().await;
    let composer = t.composer("Лист").await;
    let work = t.work(composer.id, "Годы странствий").await;

    let old = t.cover("works", "old.jpg");
    let new = t.cover("works", "new.jpg");
    works::set_work_cover(t.db(), &t.state.media, work.work.id, Some(&old))
        .await
        .unwrap();
    let updated = works::set_work_cover(t.db(), &t.state.media, work.work.id, Some(&new))
        .await
        .unwrap();

    assert_eq!(updated.cover_art_url.as_deref(), Some(new.as_str()));
    assert!(!t.state.media.resolve_url(&old).unwrap().exists());
    assert!(t.state.media.resolve_url(&new).unwrap().exists());
}
