//! Random playable work selection

mod helpers;

use cmm_catalog::db::random_work::random_playable_work;
use helpers::TestCatalog;

#[tokio::test]
async fn test_nothing_playable() {
    let t = TestCatalog::new().await;
    assert!(random_playable_work(t.db(), &[]).await.unwrap().is_none());

    // Video alone is not playable
    let composer = t.composer("Барток").await;
    let work = t.work(composer.id, "Концерт для оркестра").await;
    let finale = t.composition(work.work.id, "Finale").await;
    t.video(finale.id, "Шолти").await;

    assert!(random_playable_work(t.db(), &[]).await.unwrap().is_none());
}

#[tokio::test]
async fn test_video_only_work_never_picked() {
    let t = TestCatalog::new().await;
    let composer = t.composer("Брамс").await;

    let silent = t.work(composer.id, "Симфония № 1").await;
    let movement = t.composition(silent.work.id, "Un poco sostenuto").await;
    t.video(movement.id, "Аббадо").await;

    let playable = t.work(composer.id, "Симфония № 4").await;
    let movement = t.composition(playable.work.id, "Allegro non troppo").await;
    t.audio(movement.id, "Клайбер", Some(1980)).await;

    for _ in 0..10 {
        let picked = random_playable_work(t.db(), &[]).await.unwrap().unwrap();
        assert_eq!(picked.work.work.id, playable.work.id);
        assert!(picked.recordings.iter().all(|r| r.recording.duration > 0));
    }
}

#[tokio::test]
async fn test_exclusion_with_fallback() {
    let t = TestCatalog::new().await;
    let composer = t.composer("Гендель").await;

    let mut ids = Vec::new();
    for name in ["Музыка на воде", "Музыка для королевского фейерверка"] {
        let work = t.work(composer.id, name).await;
        let movement = t.composition(work.work.id, "Overture").await;
        t.audio(movement.id, "Пиннок", Some(1984)).await;
        ids.push(work.work.id);
    }

    for _ in 0..10 {
        let picked = random_playable_work(t.db(), &ids[..1]).await.unwrap().unwrap();
        assert_eq!(picked.work.work.id, ids[1]);
    }

    // Everything excluded: still returns something
    let picked = random_playable_work(t.db(), &ids).await.unwrap().unwrap();
    assert!(ids.contains(&picked.work.work.id));
}

#[tokio::test]
async fn test_single_performance_in_movement_order() {
    let t = TestCatalog::new().await;
    let composer = t.composer("Бетховен").await;
    let sonata = t.work(composer.id, "Соната № 23").await;
    let first = t.composition(sonata.work.id, "Allegro assai").await;
    let second = t.composition(sonata.work.id, "Andante con moto").await;

    // Recorded out of movement order
    t.audio(second.id, "Рихтер", Some(1960)).await;
    t.audio(second.id, "Гилельс", Some(1973)).await;
    t.audio(first.id, "Рихтер", Some(1960)).await;
    t.audio(first.id, "Гилельс", Some(1973)).await;

    for _ in 0..10 {
        let picked = random_playable_work(t.db(), &[]).await.unwrap().unwrap();
        let recordings = &picked.recordings;
        assert_eq!(recordings.len(), 2);

        let performers = &recordings[0].recording.performers;
        let year = recordings[0].recording.recording_year;
        assert!(recordings
            .iter()
            .all(|r| &r.recording.performers == performers && r.recording.recording_year == year));

        assert_eq!(recordings[0].composition.id, first.id);
        assert_eq!(recordings[1].composition.id, second.id);
    }
}
