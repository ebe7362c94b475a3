//! Shared fixtures for the store scenario suites.
//!
//! Every suite runs the real [`services::AppStore`] against the in-memory
//! backend: two seeded users, two restaurants, and one pre-existing review
//! by the second user, with the first user signed in.

use std::sync::Arc;

use backend_adapters::memory::MemoryBackend;
use services::AppStore;
use uuid::Uuid;

pub struct Fixture {
    pub backend: Arc<MemoryBackend>,
    pub store: AppStore,
    /// Signed-in viewer.
    pub ana: Uuid,
    /// Second user; author of the seeded review.
    pub bruno: Uuid,
    /// Restaurant of the seeded review.
    pub cantina: Uuid,
    pub sushi: Uuid,
    /// The seeded review by `bruno` about `cantina`.
    pub seeded_review: Uuid,
}

/// Seeds the backend and signs `ana` in, so the store is fully
/// bootstrapped (profile, counts, lists, follow set, feed).
pub async fn signed_in_fixture() -> Fixture {
    let backend = Arc::new(MemoryBackend::new());
    let ana = backend.seed_user("ana@example.com", "segredo", "Ana Lima", "analima");
    let bruno = backend.seed_user("bruno@example.com", "segredo", "Bruno Reis", "brunoreis");
    let cantina = backend.seed_restaurant("Cantina da Nona", -23.561, -46.656, &["italiana"]);
    let sushi = backend.seed_restaurant("Sushi Koba", -23.563, -46.654, &["japonesa"]);
    let seeded_review = backend.seed_review(
        bruno,
        cantina,
        "Massa fresca impecável",
        "Nhoque no ponto e atendimento atencioso.",
    );

    let store = AppStore::new(backend.clone(), backend.clone(), backend.clone());
    store
        .sign_in("ana@example.com", "segredo")
        .await
        .expect("fixture sign-in");

    Fixture {
        backend,
        store,
        ana,
        bruno,
        cantina,
        sushi,
        seeded_review,
    }
}
