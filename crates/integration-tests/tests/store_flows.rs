//! Store scenario suite: caches, toggles, lists and follows against the
//! in-memory backend.

use backend_adapters::memory::FailPoint;
use integration_tests::signed_in_fixture;
use services::DEFAULT_LIST_NAME;

#[tokio::test]
async fn bootstrap_loads_the_full_user_context() {
    let fx = signed_in_fixture().await;
    let state = fx.store.snapshot();

    assert!(!state.loading);
    let me = state.current_user.expect("current user loaded");
    assert_eq!(me.profile.username, "analima");
    assert_eq!(me.stats.reviews_count, 0);
    assert_eq!(me.stats.following_count, 0);
    assert_eq!(state.reviews.len(), 1);
    assert_eq!(state.reviews[0].id, fx.seeded_review);
    assert!(state.following.is_empty());
}

#[tokio::test]
async fn sign_out_clears_every_cache() {
    let fx = signed_in_fixture().await;
    fx.store.toggle_save_restaurant(fx.cantina).await.unwrap();

    fx.store.sign_out().await;
    let state = fx.store.snapshot();
    assert!(state.current_user.is_none());
    assert!(state.lists.is_empty());
    assert!(state.reviews.is_empty());
    assert!(state.following.is_empty());
    assert!(!state.loading);
}

#[tokio::test]
async fn list_count_always_matches_items() {
    let fx = signed_in_fixture().await;
    let list = fx.store.create_list("Favoritas", false, None).await.unwrap();
    assert_eq!((list.count, list.items.len()), (0, 0));

    fx.store
        .add_restaurant_to_list(list.id, fx.cantina)
        .await
        .unwrap();
    fx.store
        .add_restaurant_to_list(list.id, fx.sushi)
        .await
        .unwrap();
    fx.store
        .remove_restaurant_from_list(list.id, fx.cantina)
        .await
        .unwrap();

    for l in fx.store.snapshot().lists {
        assert_eq!(l.count, l.items.len(), "list {} diverged", l.name);
    }
    let state = fx.store.snapshot();
    let l = state.lists.iter().find(|l| l.id == list.id).unwrap();
    assert_eq!(l.items, vec![fx.sushi]);
}

#[tokio::test]
async fn save_toggle_autovivifies_the_default_list() {
    let fx = signed_in_fixture().await;
    assert!(fx.store.snapshot().lists.is_empty());

    let saved = fx.store.toggle_save_restaurant(fx.cantina).await.unwrap();
    assert!(saved);

    let state = fx.store.snapshot();
    assert_eq!(state.lists.len(), 1);
    let default = &state.lists[0];
    assert!(default.is_default);
    assert_eq!(default.name, DEFAULT_LIST_NAME);
    assert_eq!(default.items, vec![fx.cantina]);
    assert_eq!(default.count, 1);
    // The cached review of that restaurant flips too.
    assert!(state.reviews[0].is_saved);

    // A second save reuses the list instead of creating another.
    fx.store.toggle_save_restaurant(fx.sushi).await.unwrap();
    assert_eq!(fx.store.snapshot().lists.len(), 1);
}

#[tokio::test]
async fn save_toggle_is_an_involution() {
    let fx = signed_in_fixture().await;

    assert!(fx.store.toggle_save_restaurant(fx.cantina).await.unwrap());
    assert!(!fx.store.toggle_save_restaurant(fx.cantina).await.unwrap());

    let state = fx.store.snapshot();
    let default = state.lists.iter().find(|l| l.is_default).unwrap();
    assert!(default.items.is_empty());
    assert_eq!(default.count, 0);
    assert!(!state.reviews[0].is_saved);
}

#[tokio::test]
async fn like_toggle_is_optimistic_with_rollback() {
    let fx = signed_in_fixture().await;

    // Happy path first.
    fx.store.toggle_like(fx.seeded_review).await.unwrap();
    let state = fx.store.snapshot();
    assert!(state.reviews[0].is_liked);
    assert_eq!(state.reviews[0].likes_count, 1);

    // A failing unlike write restores the exact pre-toggle values.
    fx.backend.fail_once(FailPoint::DeleteLike);
    let err = fx.store.toggle_like(fx.seeded_review).await;
    assert!(err.is_err());
    let state = fx.store.snapshot();
    assert!(state.reviews[0].is_liked);
    assert_eq!(state.reviews[0].likes_count, 1);
}

#[tokio::test]
async fn like_toggle_rolls_back_a_failed_like() {
    let fx = signed_in_fixture().await;

    fx.backend.fail_once(FailPoint::InsertLike);
    assert!(fx.store.toggle_like(fx.seeded_review).await.is_err());

    let state = fx.store.snapshot();
    assert!(!state.reviews[0].is_liked);
    assert_eq!(state.reviews[0].likes_count, 0);
}

#[tokio::test]
async fn like_toggle_ignores_unknown_reviews() {
    let fx = signed_in_fixture().await;
    // Unknown review id: documented no-op, not an error.
    fx.store.toggle_like(uuid::Uuid::new_v4()).await.unwrap();
    assert_eq!(fx.store.snapshot().reviews[0].likes_count, 0);
}

#[tokio::test]
async fn refresh_feed_is_idempotent() {
    let fx = signed_in_fixture().await;
    fx.store.toggle_like(fx.seeded_review).await.unwrap();
    fx.store.toggle_save_restaurant(fx.cantina).await.unwrap();

    fx.store.refresh_feed().await;
    let first = fx.store.snapshot().reviews;
    fx.store.refresh_feed().await;
    let second = fx.store.snapshot().reviews;
    assert_eq!(first, second);
    // Annotations survive the round-trip: they are recomputed, not cached.
    assert!(first[0].is_liked && first[0].is_saved);
}

#[tokio::test]
async fn feed_keeps_previous_cache_when_the_fetch_fails() {
    let fx = signed_in_fixture().await;
    assert_eq!(fx.store.snapshot().reviews.len(), 1);

    fx.backend.fail_once(FailPoint::LatestReviews);
    fx.store.refresh_feed().await;
    assert_eq!(fx.store.snapshot().reviews.len(), 1);
}

#[tokio::test]
async fn blocked_authors_never_reach_the_feed() {
    let fx = signed_in_fixture().await;
    fx.backend.seed_block(fx.ana, fx.bruno);

    fx.store.refresh_feed().await;
    assert!(fx.store.snapshot().reviews.is_empty());
}

#[tokio::test]
async fn follow_tracks_only_the_viewers_side() {
    let fx = signed_in_fixture().await;

    fx.store.follow_user(fx.bruno).await.unwrap();
    let state = fx.store.snapshot();
    assert_eq!(state.following, vec![fx.bruno]);
    assert_eq!(state.current_user.as_ref().unwrap().stats.following_count, 1);

    // The backend knows both sides; the local cache deliberately tracked
    // only the viewer's. The counterpart count appears on a fresh load.
    let (_, bruno_stats) = fx.store.load_profile(fx.bruno).await.unwrap();
    assert_eq!(bruno_stats.followers_count, 1);

    // Re-following is a no-op, not a double count.
    fx.store.follow_user(fx.bruno).await.unwrap();
    assert_eq!(
        fx.store
            .snapshot()
            .current_user
            .unwrap()
            .stats
            .following_count,
        1
    );
}

#[tokio::test]
async fn unfollow_clamps_at_zero() {
    let fx = signed_in_fixture().await;
    fx.store.follow_user(fx.bruno).await.unwrap();
    fx.store.unfollow_user(fx.bruno).await.unwrap();
    // Second unfollow is a no-op.
    fx.store.unfollow_user(fx.bruno).await.unwrap();

    let state = fx.store.snapshot();
    assert!(state.following.is_empty());
    assert_eq!(state.current_user.unwrap().stats.following_count, 0);
}

#[tokio::test]
async fn deleting_the_default_list_is_refused() {
    let fx = signed_in_fixture().await;
    fx.store.toggle_save_restaurant(fx.cantina).await.unwrap();
    let default_id = fx.store.snapshot().lists[0].id;

    fx.store.delete_list(default_id).await.unwrap();

    // Still there, locally and remotely.
    assert_eq!(fx.store.snapshot().lists.len(), 1);
    fx.store.refresh_feed().await;
    assert_eq!(fx.store.snapshot().lists.len(), 1);
}

#[tokio::test]
async fn deleting_a_regular_list_removes_it_everywhere() {
    let fx = signed_in_fixture().await;
    let list = fx.store.create_list("Baratos", true, None).await.unwrap();

    fx.store.delete_list(list.id).await.unwrap();
    assert!(fx.store.snapshot().lists.is_empty());
    fx.store.refresh_feed().await;
    assert!(fx.store.snapshot().lists.is_empty());
}

#[tokio::test]
async fn update_list_merges_the_backend_row() {
    let fx = signed_in_fixture().await;
    let list = fx.store.create_list("Rodízios", false, None).await.unwrap();
    fx.store
        .add_restaurant_to_list(list.id, fx.sushi)
        .await
        .unwrap();

    let patch = domains::models::ListPatch {
        name: Some("Rodízios bons".into()),
        is_private: Some(true),
        ..Default::default()
    };
    let updated = fx.store.update_list(list.id, &patch).await.unwrap();
    assert_eq!(updated.name, "Rodízios bons");
    assert!(updated.is_private);
    // Membership survives the authoritative merge.
    assert_eq!(updated.items, vec![fx.sushi]);
    assert_eq!(updated.count, 1);

    let state = fx.store.snapshot();
    let cached = state.lists.iter().find(|l| l.id == list.id).unwrap();
    assert_eq!(cached, &updated);
}

#[tokio::test]
async fn comments_bump_only_their_review() {
    let fx = signed_in_fixture().await;
    let second = fx
        .backend
        .seed_review(fx.bruno, fx.sushi, "Peixe fresco", "Vale a fila.");
    fx.store.refresh_feed().await;

    let comment = fx
        .store
        .add_comment(fx.seeded_review, "Concordo demais!")
        .await
        .unwrap();
    assert_eq!(comment.author.username, "analima");
    assert_eq!(comment.review_id, fx.seeded_review);

    let state = fx.store.snapshot();
    let commented = state.reviews.iter().find(|r| r.id == fx.seeded_review).unwrap();
    let untouched = state.reviews.iter().find(|r| r.id == second).unwrap();
    assert_eq!(commented.comments_count, 1);
    assert_eq!(untouched.comments_count, 0);

    let listed = fx.store.load_comments(fx.seeded_review).await.unwrap();
    assert_eq!(listed, vec![comment]);
}

#[tokio::test]
async fn empty_comments_are_rejected_before_the_backend() {
    let fx = signed_in_fixture().await;
    let err = fx.store.add_comment(fx.seeded_review, "   ").await;
    assert!(err.is_err());
    assert_eq!(fx.store.snapshot().reviews[0].comments_count, 0);
}

#[tokio::test]
async fn preferences_propagate_errors_and_merge_on_success() {
    let fx = signed_in_fixture().await;

    fx.backend.fail_once(FailPoint::UpdateProfile);
    let prefs = domains::models::OnboardingPreferences {
        dislikes: vec!["coentro".into()],
        ..Default::default()
    };
    assert!(fx.store.set_preferences(prefs.clone()).await.is_err());
    let me = fx.store.snapshot().current_user.unwrap();
    assert!(!me.profile.onboarding_completed);
    assert!(me.profile.dislikes.is_empty());

    fx.store.set_preferences(prefs).await.unwrap();
    let me = fx.store.snapshot().current_user.unwrap();
    assert!(me.profile.onboarding_completed);
    assert_eq!(me.profile.dislikes, vec!["coentro".to_string()]);
}
