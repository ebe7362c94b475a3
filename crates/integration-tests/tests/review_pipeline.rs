//! The three-phase review authoring pipeline end to end.

use backend_adapters::memory::FailPoint;
use bytes::Bytes;
use domains::models::{NewReview, PhotoUpload, ReviewKind, ReviewScores};
use integration_tests::{signed_in_fixture, Fixture};

fn draft(fx: &Fixture, photos: Vec<PhotoUpload>) -> NewReview {
    NewReview {
        restaurant_id: fx.cantina,
        title: "Tortellini de respeito".into(),
        body: "Caldo denso, casa cheia, voltaria.".into(),
        kind: ReviewKind::InPerson,
        scores: ReviewScores {
            food: 8,
            service: 7,
            ambience: 9,
            value: 6,
        },
        photos,
        tagged_user_ids: Vec::new(),
    }
}

#[tokio::test]
async fn review_without_photos_lands_in_the_feed() {
    let fx = signed_in_fixture().await;
    let id = fx.store.add_review(draft(&fx, Vec::new())).await.unwrap();

    let state = fx.store.snapshot();
    // Newest first: the fresh review tops the seeded one.
    assert_eq!(state.reviews[0].id, id);
    assert!(state.reviews[0].photos.is_empty());
    assert_eq!(state.reviews[0].scores.average(), 7.5);
    assert_eq!(state.reviews.len(), 2);
}

#[tokio::test]
async fn photos_upload_in_order_with_sizes() {
    let fx = signed_in_fixture().await;
    let photos = vec![
        PhotoUpload {
            bytes: Bytes::from_static(b"front"),
            extension: "jpg".into(),
        },
        PhotoUpload {
            bytes: Bytes::from_static(b"dessert!"),
            extension: "png".into(),
        },
    ];
    let id = fx.store.add_review(draft(&fx, photos)).await.unwrap();

    let state = fx.store.snapshot();
    let review = state.reviews.iter().find(|r| r.id == id).unwrap();
    assert_eq!(review.photos.len(), 2);
    assert_eq!(review.photos[0].order, 0);
    assert_eq!(review.photos[0].size_bytes, Some(5));
    assert_eq!(
        review.photos[0].url,
        format!("memory://review-photos/{}/{}_0.jpg", fx.ana, id)
    );
    assert_eq!(review.photos[1].order, 1);
    assert_eq!(review.photos[1].size_bytes, Some(8));

    assert_eq!(
        fx.backend
            .uploaded_size("review-photos", &format!("{}/{}_1.png", fx.ana, id)),
        Some(8)
    );
}

#[tokio::test]
async fn failed_uploads_drop_the_photo_but_keep_the_review() {
    let fx = signed_in_fixture().await;
    let photos = vec![
        PhotoUpload {
            bytes: Bytes::from_static(b"lost"),
            extension: "jpg".into(),
        },
        PhotoUpload {
            bytes: Bytes::from_static(b"kept"),
            extension: "jpg".into(),
        },
    ];
    // First upload fails, second succeeds.
    fx.backend.fail_once(FailPoint::Upload);
    let id = fx.store.add_review(draft(&fx, photos)).await.unwrap();

    let state = fx.store.snapshot();
    let review = state.reviews.iter().find(|r| r.id == id).unwrap();
    assert_eq!(review.photos.len(), 1);
    assert_eq!(review.photos[0].order, 1);
}

#[tokio::test]
async fn failed_insert_aborts_the_pipeline() {
    let fx = signed_in_fixture().await;
    fx.backend.fail_once(FailPoint::InsertReview);

    let err = fx.store.add_review(draft(&fx, Vec::new())).await;
    assert!(err.is_err());
    // Nothing new in the feed.
    fx.store.refresh_feed().await;
    assert_eq!(fx.store.snapshot().reviews.len(), 1);
}

#[tokio::test]
async fn tag_failures_do_not_lose_the_review() {
    let fx = signed_in_fixture().await;
    let mut review = draft(&fx, Vec::new());
    review.tagged_user_ids = vec![fx.bruno];
    fx.backend.fail_once(FailPoint::InsertReviewTags);

    let id = fx.store.add_review(review).await.unwrap();
    assert!(fx.store.snapshot().reviews.iter().any(|r| r.id == id));
}

#[tokio::test]
async fn authoring_bumps_the_authors_review_count_on_next_load() {
    let fx = signed_in_fixture().await;
    fx.store.add_review(draft(&fx, Vec::new())).await.unwrap();

    // The cached count is not maintained incrementally; a profile reload
    // reconciles it.
    let (_, stats) = fx.store.load_profile(fx.ana).await.unwrap();
    assert_eq!(stats.reviews_count, 1);

    let mine = fx.store.load_user_reviews(fx.ana).await.unwrap();
    assert_eq!(mine.len(), 1);
}
